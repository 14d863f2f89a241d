use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::{
	Error,
	coding::{Decode, Reader},
	message::Message,
	transport::Connection,
};

use super::ReceiveTracks;

/// Accepts data streams and datagrams, routing each object to its receive track.
#[derive(Clone)]
pub(super) struct Mux<C: Connection> {
	conn: C,
	tracks: ReceiveTracks,
}

impl<C: Connection> Mux<C> {
	pub fn new(conn: C, tracks: ReceiveTracks) -> Self {
		Self { conn, tracks }
	}

	pub fn start(self, datagrams: bool) {
		web_async::spawn(self.clone().run_bi());
		web_async::spawn(self.clone().run_uni());

		if datagrams {
			web_async::spawn(self.run_datagrams());
		}
	}

	async fn run_bi(self) {
		loop {
			let (_send, recv) = match self.conn.accept_bi().await {
				Ok(stream) => stream,
				Err(err) => {
					tracing::debug!(%err, "stopped accepting bidirectional streams");
					return;
				}
			};

			web_async::spawn(self.clone().run_stream(recv));
		}
	}

	async fn run_uni(self) {
		loop {
			let recv = match self.conn.accept_uni().await {
				Ok(stream) => stream,
				Err(err) => {
					tracing::debug!(%err, "stopped accepting unidirectional streams");
					return;
				}
			};

			web_async::spawn(self.clone().run_stream(recv));
		}
	}

	async fn run_datagrams(self) {
		loop {
			let datagram = match self.conn.recv_datagram().await {
				Ok(datagram) => datagram,
				Err(err) => {
					tracing::debug!(%err, "stopped receiving datagrams");
					return;
				}
			};

			if let Err(err) = self.recv_datagram(datagram) {
				tracing::warn!(%err, "error reading datagram");
			}
		}
	}

	async fn run_stream<S: AsyncRead + Unpin + Send>(self, stream: S) {
		let mut reader = Reader::new(stream);

		if let Err(err) = self.recv_stream(&mut reader).await {
			tracing::warn!(%err, "error reading data stream");
		}
	}

	async fn recv_stream<S: AsyncRead + Unpin>(&self, reader: &mut Reader<S>) -> Result<(), Error> {
		while let Some(msg) = reader.decode_maybe::<Message>().await? {
			self.recv_object(msg)?;
		}

		Ok(())
	}

	fn recv_datagram(&self, mut datagram: Bytes) -> Result<(), Error> {
		let msg = Message::decode(&mut datagram)?;
		self.recv_object(msg)
	}

	fn recv_object(&self, msg: Message) -> Result<(), Error> {
		let object = match msg {
			Message::Object(object) => object,
			msg => return Err(Error::UnexpectedMessage(msg.id())),
		};

		tracing::trace!(
			track = object.track_id,
			group = object.group_id,
			object = object.object_id,
			size = object.payload.len(),
			"received object"
		);

		self.tracks.append(object)
	}
}
