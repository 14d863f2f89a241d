use std::{fmt::Debug, io};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Error, coding::*};

/// A reader for decoding messages from a stream.
pub struct Reader<S> {
	stream: S,
	buffer: BytesMut,
}

impl<S: AsyncRead + Unpin> Reader<S> {
	pub fn new(stream: S) -> Self {
		Self {
			stream,
			buffer: Default::default(),
		}
	}

	/// Decode the next message from the stream.
	///
	/// Returns [DecodeError::Short] if the stream ends before the message is complete.
	pub async fn decode<T: Decode + Debug>(&mut self) -> Result<T, Error> {
		loop {
			let mut cursor = io::Cursor::new(&self.buffer);
			match T::decode(&mut cursor) {
				Ok(msg) => {
					self.buffer.advance(cursor.position() as usize);
					return Ok(msg);
				}
				Err(DecodeError::Short) => {
					if !self.fill().await? {
						// Stream closed while we still need more data
						return Err(Error::Decode(DecodeError::Short));
					}
				}
				Err(e) => return Err(Error::Decode(e)),
			}
		}
	}

	/// Decode the next message unless the stream ended cleanly on a message boundary.
	pub async fn decode_maybe<T: Decode + Debug>(&mut self) -> Result<Option<T>, Error> {
		if self.buffer.is_empty() && !self.fill().await? {
			return Ok(None);
		}

		Ok(Some(self.decode().await?))
	}

	// Read more data into the buffer, returning false once the stream is finished.
	async fn fill(&mut self) -> Result<bool, Error> {
		let size = self.stream.read_buf(&mut self.buffer).await?;
		Ok(size > 0)
	}
}
