//! Binds a [quinn::Connection] to the [Connection] capability.

use bytes::Bytes;

use super::Connection;

#[derive(thiserror::Error, Debug, Clone)]
pub enum QuinnError {
	#[error("connection error: {0}")]
	Connection(#[from] quinn::ConnectionError),

	#[error("datagram error: {0}")]
	Datagram(#[from] quinn::SendDatagramError),
}

impl Connection for quinn::Connection {
	type SendStream = quinn::SendStream;
	type RecvStream = quinn::RecvStream;
	type Error = QuinnError;

	async fn open_bi(&self) -> Result<(quinn::SendStream, quinn::RecvStream), QuinnError> {
		Ok(quinn::Connection::open_bi(self).await?)
	}

	async fn open_uni(&self) -> Result<quinn::SendStream, QuinnError> {
		Ok(quinn::Connection::open_uni(self).await?)
	}

	async fn accept_bi(&self) -> Result<(quinn::SendStream, quinn::RecvStream), QuinnError> {
		Ok(quinn::Connection::accept_bi(self).await?)
	}

	async fn accept_uni(&self) -> Result<quinn::RecvStream, QuinnError> {
		Ok(quinn::Connection::accept_uni(self).await?)
	}

	fn send_datagram(&self, payload: Bytes) -> Result<(), QuinnError> {
		Ok(quinn::Connection::send_datagram(self, payload)?)
	}

	async fn recv_datagram(&self) -> Result<Bytes, QuinnError> {
		Ok(quinn::Connection::read_datagram(self).await?)
	}

	fn close(&self, code: u32, reason: &str) {
		quinn::Connection::close(self, quinn::VarInt::from_u32(code), reason.as_bytes());
	}

	async fn closed(&self) -> QuinnError {
		quinn::Connection::closed(self).await.into()
	}
}
