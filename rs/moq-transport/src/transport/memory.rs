//! An in-process connection built on [tokio::io::duplex] pipes.

use std::sync::Arc;

use bytes::Bytes;
use tokio::{
	io::{DuplexStream, ReadHalf, WriteHalf},
	sync::{Mutex, mpsc, watch},
};

use super::Connection;

// The capacity of each stream pipe before writes apply backpressure.
const STREAM_BUFFER: usize = 64 * 1024;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
	#[error("closed: code={code} reason={reason}")]
	Closed { code: u32, reason: String },

	#[error("connection lost")]
	Lost,
}

type SendStream = WriteHalf<DuplexStream>;
type RecvStream = ReadHalf<DuplexStream>;

struct Inner {
	// Handed to the remote.
	bi: mpsc::UnboundedSender<(SendStream, RecvStream)>,
	uni: mpsc::UnboundedSender<RecvStream>,
	datagrams: mpsc::UnboundedSender<Bytes>,

	// Opened by the remote.
	accept_bi: Mutex<mpsc::UnboundedReceiver<(SendStream, RecvStream)>>,
	accept_uni: Mutex<mpsc::UnboundedReceiver<RecvStream>>,
	recv_datagrams: Mutex<mpsc::UnboundedReceiver<Bytes>>,

	// Shared by both ends, set once by whichever side closes first.
	closed: Arc<watch::Sender<Option<MemoryError>>>,
}

/// One end of an in-memory connection.
#[derive(Clone)]
pub struct MemoryConnection {
	inner: Arc<Inner>,
}

/// Create a connected pair; either end may act as client or server.
pub fn pair() -> (MemoryConnection, MemoryConnection) {
	let (a_bi, b_accept_bi) = mpsc::unbounded_channel();
	let (b_bi, a_accept_bi) = mpsc::unbounded_channel();
	let (a_uni, b_accept_uni) = mpsc::unbounded_channel();
	let (b_uni, a_accept_uni) = mpsc::unbounded_channel();
	let (a_datagrams, b_recv_datagrams) = mpsc::unbounded_channel();
	let (b_datagrams, a_recv_datagrams) = mpsc::unbounded_channel();

	let closed = Arc::new(watch::Sender::new(None));

	let a = Inner {
		bi: a_bi,
		uni: a_uni,
		datagrams: a_datagrams,
		accept_bi: Mutex::new(a_accept_bi),
		accept_uni: Mutex::new(a_accept_uni),
		recv_datagrams: Mutex::new(a_recv_datagrams),
		closed: closed.clone(),
	};

	let b = Inner {
		bi: b_bi,
		uni: b_uni,
		datagrams: b_datagrams,
		accept_bi: Mutex::new(b_accept_bi),
		accept_uni: Mutex::new(b_accept_uni),
		recv_datagrams: Mutex::new(b_recv_datagrams),
		closed,
	};

	(
		MemoryConnection { inner: Arc::new(a) },
		MemoryConnection { inner: Arc::new(b) },
	)
}

impl MemoryConnection {
	fn check(&self) -> Result<(), MemoryError> {
		match &*self.inner.closed.borrow() {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}

	async fn wait_closed(&self) -> MemoryError {
		let mut closed = self.inner.closed.subscribe();
		let result = match closed.wait_for(|closed| closed.is_some()).await {
			Ok(err) => err.clone().unwrap_or(MemoryError::Lost),
			Err(_) => MemoryError::Lost,
		};
		result
	}
}

impl Connection for MemoryConnection {
	type SendStream = SendStream;
	type RecvStream = RecvStream;
	type Error = MemoryError;

	async fn open_bi(&self) -> Result<(SendStream, RecvStream), MemoryError> {
		self.check()?;

		let (local, remote) = tokio::io::duplex(STREAM_BUFFER);
		self.inner
			.bi
			.send(swap(tokio::io::split(remote)))
			.map_err(|_| MemoryError::Lost)?;

		Ok(swap(tokio::io::split(local)))
	}

	async fn open_uni(&self) -> Result<SendStream, MemoryError> {
		self.check()?;

		let (local, remote) = tokio::io::duplex(STREAM_BUFFER);
		let (recv, _) = tokio::io::split(remote);
		self.inner.uni.send(recv).map_err(|_| MemoryError::Lost)?;

		let (_, send) = tokio::io::split(local);
		Ok(send)
	}

	async fn accept_bi(&self) -> Result<(SendStream, RecvStream), MemoryError> {
		self.check()?;

		let mut accept = self.inner.accept_bi.lock().await;
		tokio::select! {
			stream = accept.recv() => stream.ok_or(MemoryError::Lost),
			err = self.wait_closed() => Err(err),
		}
	}

	async fn accept_uni(&self) -> Result<RecvStream, MemoryError> {
		self.check()?;

		let mut accept = self.inner.accept_uni.lock().await;
		tokio::select! {
			stream = accept.recv() => stream.ok_or(MemoryError::Lost),
			err = self.wait_closed() => Err(err),
		}
	}

	fn send_datagram(&self, payload: Bytes) -> Result<(), MemoryError> {
		self.check()?;
		self.inner.datagrams.send(payload).map_err(|_| MemoryError::Lost)
	}

	async fn recv_datagram(&self) -> Result<Bytes, MemoryError> {
		self.check()?;

		let mut recv = self.inner.recv_datagrams.lock().await;
		tokio::select! {
			datagram = recv.recv() => datagram.ok_or(MemoryError::Lost),
			err = self.wait_closed() => Err(err),
		}
	}

	// Only new opens and accepts fail; streams already open keep their pipes until dropped.
	fn close(&self, code: u32, reason: &str) {
		self.inner.closed.send_if_modified(|closed| {
			if closed.is_some() {
				return false;
			}

			*closed = Some(MemoryError::Closed {
				code,
				reason: reason.to_string(),
			});
			true
		});
	}

	async fn closed(&self) -> MemoryError {
		self.wait_closed().await
	}
}

// tokio::io::split returns (read, write), streams are conventionally (send, recv).
fn swap((recv, send): (RecvStream, SendStream)) -> (SendStream, RecvStream) {
	(send, recv)
}
