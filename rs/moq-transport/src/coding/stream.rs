use std::sync::Arc;

use crate::Error;
use crate::coding::{Reader, Writer};
use crate::transport::Connection;

/// A [Writer] and [Reader] pair for a single bidirectional stream.
pub struct Stream<C: Connection> {
	pub writer: Writer<C::SendStream>,
	pub reader: Reader<C::RecvStream>,
}

impl<C: Connection> Stream<C> {
	/// Open a new bidirectional stream.
	pub async fn open(conn: &C) -> Result<Self, Error> {
		let (send, recv) = conn.open_bi().await.map_err(|err| Error::Transport(Arc::new(err)))?;

		Ok(Stream {
			writer: Writer::new(send),
			reader: Reader::new(recv),
		})
	}

	/// Accept the next bidirectional stream opened by the remote.
	pub async fn accept(conn: &C) -> Result<Self, Error> {
		let (send, recv) = conn.accept_bi().await.map_err(|err| Error::Transport(Arc::new(err)))?;

		Ok(Stream {
			writer: Writer::new(send),
			reader: Reader::new(recv),
		})
	}
}
