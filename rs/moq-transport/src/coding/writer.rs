use std::fmt::Debug;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{Error, coding::*};

/// A wrapper around an [AsyncWrite] stream that writes whole messages.
pub struct Writer<S> {
	stream: S,
	buffer: bytes::BytesMut,
}

impl<S: AsyncWrite + Unpin> Writer<S> {
	/// Create a new writer for the given stream.
	pub fn new(stream: S) -> Self {
		Self {
			stream,
			buffer: Default::default(),
		}
	}

	/// Encode the given message to the stream.
	pub async fn encode<T: Encode + Debug>(&mut self, msg: &T) -> Result<(), Error> {
		self.buffer.clear();
		msg.encode(&mut self.buffer);

		self.stream.write_all(&self.buffer).await?;
		self.stream.flush().await?;

		Ok(())
	}

	/// Write an already encoded buffer to the stream.
	pub async fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
		self.stream.write_all(buf).await?;
		self.stream.flush().await?;
		Ok(())
	}

	/// Mark the stream as finished.
	pub async fn finish(&mut self) -> Result<(), Error> {
		self.stream.shutdown().await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_encode_finish() {
		let (send, recv) = tokio::io::duplex(64);
		let mut writer = Writer::new(send);
		let mut reader = Reader::new(recv);

		writer.encode(&"hello".to_string()).await.unwrap();
		writer.encode(&16384u64).await.unwrap();
		writer.finish().await.unwrap();

		assert_eq!(reader.decode::<String>().await.unwrap(), "hello");
		assert_eq!(reader.decode::<u64>().await.unwrap(), 16384);
		assert!(reader.decode_maybe::<u64>().await.unwrap().is_none());
	}
}
