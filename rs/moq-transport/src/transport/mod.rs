//! The transport capability consumed by a [crate::Peer].
//!
//! Any multiplexed transport with bidirectional streams, unidirectional streams and
//! datagrams can carry a session. Two implementations are provided:
//! - [memory::pair] for an in-process connection, mostly used for testing.
//! - `quinn::Connection`, behind the `quinn` feature.

pub mod memory;

#[cfg(feature = "quinn")]
pub mod quinn;

use std::{future::Future, sync::Arc};

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::Error;

/// A connection handle, cheaply cloned and shared between tasks.
pub trait Connection: Clone + Send + Sync + 'static {
	type SendStream: AsyncWrite + Unpin + Send + 'static;
	type RecvStream: AsyncRead + Unpin + Send + 'static;
	type Error: std::error::Error + Send + Sync + 'static;

	/// Open a bidirectional stream, waiting for stream credit if needed.
	fn open_bi(&self) -> impl Future<Output = Result<(Self::SendStream, Self::RecvStream), Self::Error>> + Send;

	/// Open a unidirectional stream, waiting for stream credit if needed.
	fn open_uni(&self) -> impl Future<Output = Result<Self::SendStream, Self::Error>> + Send;

	/// Accept the next bidirectional stream opened by the remote.
	fn accept_bi(&self) -> impl Future<Output = Result<(Self::SendStream, Self::RecvStream), Self::Error>> + Send;

	/// Accept the next unidirectional stream opened by the remote.
	fn accept_uni(&self) -> impl Future<Output = Result<Self::RecvStream, Self::Error>> + Send;

	/// Send an unreliable datagram.
	fn send_datagram(&self, payload: Bytes) -> Result<(), Self::Error>;

	/// Receive the next datagram.
	fn recv_datagram(&self) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;

	/// Close the connection with an application error code and reason.
	fn close(&self, code: u32, reason: &str);

	/// Wait until the connection is closed, returning the reason.
	fn closed(&self) -> impl Future<Output = Self::Error> + Send;
}

pub(crate) type BoxSendStream = Box<dyn AsyncWrite + Send + Unpin>;

// A type-erased connection, so handles like SendTrack don't carry the transport type.
pub(crate) trait ConnectionInner: Send + Sync {
	fn open_uni(&self) -> BoxFuture<'_, Result<BoxSendStream, Error>>;
	fn send_datagram(&self, payload: Bytes) -> Result<(), Error>;
	fn close(&self, code: u32, reason: &str);
}

impl<C: Connection> ConnectionInner for C {
	fn open_uni(&self) -> BoxFuture<'_, Result<BoxSendStream, Error>> {
		Box::pin(async move {
			let stream = Connection::open_uni(self)
				.await
				.map_err(|err| Error::Transport(Arc::new(err)))?;
			Ok(Box::new(stream) as BoxSendStream)
		})
	}

	fn send_datagram(&self, payload: Bytes) -> Result<(), Error> {
		Connection::send_datagram(self, payload).map_err(|err| Error::Transport(Arc::new(err)))
	}

	fn close(&self, code: u32, reason: &str) {
		Connection::close(self, code, reason)
	}
}
