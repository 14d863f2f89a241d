use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
	sync::{mpsc, watch},
	time::Instant,
};

use crate::{
	Error, ErrorCode,
	coding::{Encode, Reader, Writer},
	message::{self, Message},
	transport::Connection,
};

use super::{
	Handlers, ReceiveTracks, SendTrack,
	handler::GENERIC_ERROR_CODE,
	transaction::{Reply, RequestKey, Transactions},
};

/// Work submitted to the dispatch loop by the [super::Peer] handle and handler tasks.
pub(super) enum Command {
	/// Write a request and deliver the matching response.
	Request { msg: Message, reply: Reply },

	/// Write a message that expects no response.
	Send(Message),

	/// The caller stopped waiting for this request.
	Cancel(RequestKey),

	/// The application closed the session.
	Close,
}

#[derive(Clone, Debug)]
pub(super) enum Status {
	Running,
	Draining(String),
	Closed(Result<(), Error>),
}

enum Event {
	Inbound(Option<Result<Message, Error>>),
	Command(Command),
	Close,
	Closed(Error),
	Drained,
}

/// The dispatch loop: the only writer of the control stream.
pub(super) struct Control<C: Connection> {
	conn: C,
	writer: Writer<C::SendStream>,
	commands: mpsc::UnboundedSender<Command>,

	transactions: Transactions,

	// Inbound subscriptions by subscribe id, removed only when rejected.
	// Accepted ones live until the session ends, as there is no unsubscribe.
	send_tracks: HashMap<u64, SendTrack>,
	receive_tracks: ReceiveTracks,
	handlers: Handlers,

	status: watch::Sender<Status>,
	drain_timeout: Duration,
	drain: Option<Instant>,
}

impl<C: Connection> Control<C> {
	pub fn new(
		conn: C,
		writer: Writer<C::SendStream>,
		commands: mpsc::UnboundedSender<Command>,
		receive_tracks: ReceiveTracks,
		handlers: Handlers,
		status: watch::Sender<Status>,
		drain_timeout: Duration,
	) -> Self {
		Self {
			conn,
			writer,
			commands,
			transactions: Transactions::default(),
			send_tracks: HashMap::new(),
			receive_tracks,
			handlers,
			status,
			drain_timeout,
			drain: None,
		}
	}

	pub fn start(self, reader: Reader<C::RecvStream>, commands: mpsc::UnboundedReceiver<Command>) {
		web_async::spawn(self.run(reader, commands));
	}

	async fn run(mut self, reader: Reader<C::RecvStream>, commands: mpsc::UnboundedReceiver<Command>) {
		let (inbound_tx, inbound) = mpsc::channel(32);

		let read = async move {
			Self::run_read(reader, inbound_tx).await;
			// Keep dispatching whatever was queued before the stream ended.
			std::future::pending::<Result<(), Error>>().await
		};

		let res = tokio::select! {
			res = self.run_dispatch(inbound, commands) => res,
			res = read => res,
		};

		match &res {
			Ok(()) => {
				tracing::info!("session closed");
				Connection::close(&self.conn, ErrorCode::NoError.into(), "");
			}
			Err(Error::Transport(err)) => {
				tracing::info!(%err, "session terminated");
				Connection::close(&self.conn, ErrorCode::InternalError.into(), "");
			}
			Err(err) => {
				tracing::warn!(%err, "session error");
				Connection::close(&self.conn, err.to_code(), &err.to_string());
			}
		}

		self.receive_tracks.close();
		self.status.send_replace(Status::Closed(res));
	}

	async fn run_read(mut reader: Reader<C::RecvStream>, inbound: mpsc::Sender<Result<Message, Error>>) {
		while let Some(res) = reader.decode_maybe::<Message>().await.transpose() {
			let fatal = res.is_err();
			if inbound.send(res).await.is_err() || fatal {
				return;
			}
		}
	}

	async fn run_dispatch(
		&mut self,
		mut inbound: mpsc::Receiver<Result<Message, Error>>,
		mut commands: mpsc::UnboundedReceiver<Command>,
	) -> Result<(), Error> {
		loop {
			let drain = self.drain;

			let event = tokio::select! {
				msg = inbound.recv() => Event::Inbound(msg),
				Some(cmd) = commands.recv() => match cmd {
					Command::Close => Event::Close,
					cmd => Event::Command(cmd),
				},
				err = self.conn.closed() => Event::Closed(Error::Transport(Arc::new(err))),
				_ = drained(drain) => Event::Drained,
			};

			match event {
				Event::Inbound(Some(msg)) => self.recv_message(msg?).await?,
				// The remote finished the control stream.
				Event::Inbound(None) => return Ok(()),
				Event::Command(cmd) => self.recv_command(cmd).await?,
				Event::Close => return Ok(()),
				Event::Closed(err) => return Err(err),
				Event::Drained => return Err(Error::GoingAway),
			}
		}
	}

	async fn recv_message(&mut self, msg: Message) -> Result<(), Error> {
		tracing::debug!(message = ?msg, "received control message");

		match msg {
			Message::Subscribe(msg) => self.recv_subscribe(msg).await,
			Message::Announce(msg) => self.recv_announce(msg).await,
			Message::GoAway(msg) => {
				self.recv_go_away(msg);
				Ok(())
			}
			Message::AnnounceOk(_)
			| Message::AnnounceError(_)
			| Message::SubscribeOk(_)
			| Message::SubscribeError(_) => self.recv_response(msg),
			Message::ClientSetup(_) | Message::ServerSetup(_) | Message::Object(_) => {
				Err(Error::UnexpectedMessage(msg.id()))
			}
		}
	}

	fn recv_response(&mut self, msg: Message) -> Result<(), Error> {
		let key = RequestKey::response(&msg).ok_or(Error::UnexpectedMessage(msg.id()))?;
		self.transactions.complete(&key, msg)
	}

	async fn recv_subscribe(&mut self, msg: message::Subscribe) -> Result<(), Error> {
		if self.drain.is_some() {
			return self.reject_subscribe(msg.id, "going away").await;
		}

		// Subscribe ids must not be reused while the subscription is active.
		if self.send_tracks.contains_key(&msg.id) {
			return Err(Error::Duplicate);
		}

		let Some(handler) = self.handlers.subscription() else {
			return self.reject_subscribe(msg.id, "no subscription handler").await;
		};

		let track = SendTrack::new(msg.id, msg.track_name.clone(), Arc::new(self.conn.clone()));
		self.send_tracks.insert(msg.id, track.clone());

		let commands = self.commands.clone();

		web_async::spawn(async move {
			let reply: Message = match handler(msg.track_name.clone(), track).await {
				Ok(reply) => message::SubscribeOk {
					id: msg.id,
					expires: reply.expires,
					group_order: reply.group_order,
					final_location: reply.final_location,
				}
				.into(),
				Err(err) => {
					tracing::warn!(%err, track = %msg.track_name, "subscription rejected");
					message::SubscribeError {
						id: msg.id,
						error_code: err.code,
						reason: err.reason,
					}
					.into()
				}
			};

			commands.send(Command::Send(reply)).ok();
		});

		Ok(())
	}

	async fn reject_subscribe(&mut self, id: u64, reason: &str) -> Result<(), Error> {
		let msg = message::SubscribeError {
			id,
			error_code: GENERIC_ERROR_CODE,
			reason: reason.to_string(),
		};

		self.send(msg.into()).await
	}

	async fn recv_announce(&mut self, msg: message::Announce) -> Result<(), Error> {
		let Some(handler) = self.handlers.announcement() else {
			let msg = message::AnnounceError {
				namespace: msg.namespace,
				error_code: GENERIC_ERROR_CODE,
				reason: "no announcement handler".to_string(),
			};
			return self.send(msg.into()).await;
		};

		let commands = self.commands.clone();

		web_async::spawn(async move {
			let reply: Message = match handler(msg.namespace.clone()).await {
				Ok(()) => message::AnnounceOk {
					namespace: msg.namespace,
				}
				.into(),
				Err(err) => {
					tracing::warn!(%err, namespace = %msg.namespace, "announcement rejected");
					message::AnnounceError {
						namespace: msg.namespace,
						error_code: err.code,
						reason: err.reason,
					}
					.into()
				}
			};

			commands.send(Command::Send(reply)).ok();
		});

		Ok(())
	}

	fn recv_go_away(&mut self, msg: message::GoAway) {
		if self.drain.is_some() {
			return;
		}

		tracing::info!(uri = %msg.uri, timeout = ?self.drain_timeout, "draining session");

		self.drain = Some(Instant::now() + self.drain_timeout);
		self.status.send_replace(Status::Draining(msg.uri));
	}

	async fn recv_command(&mut self, cmd: Command) -> Result<(), Error> {
		match cmd {
			Command::Request { msg, reply } => {
				if self.drain.is_some() {
					reply.send(Err(Error::GoingAway)).ok();
					return Ok(());
				}

				let Some(key) = RequestKey::request(&msg) else {
					reply.send(Err(Error::UnexpectedMessage(msg.id()))).ok();
					return Ok(());
				};

				// Recorded before the write, so the response can't race the table.
				if let Err(reply) = self.transactions.insert(key, reply) {
					reply.send(Err(Error::Duplicate)).ok();
					return Ok(());
				}

				self.send(msg).await
			}
			Command::Send(msg) => {
				if let Message::SubscribeError(err) = &msg {
					self.send_tracks.remove(&err.id);
				}

				self.send(msg).await
			}
			Command::Cancel(key) => {
				tracing::debug!(?key, "request timed out");
				self.transactions.cancel(key);
				Ok(())
			}
			// Intercepted by the dispatch loop.
			Command::Close => Ok(()),
		}
	}

	async fn send(&mut self, msg: Message) -> Result<(), Error> {
		tracing::debug!(message = ?msg, "sending control message");

		let buf = msg.encode_bytes();
		tracing::trace!(id = msg.id(), size = buf.len(), hex = %hex::encode(&buf), "encoded control message");

		self.writer.write_all(&buf).await
	}
}

async fn drained(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => tokio::time::sleep_until(deadline).await,
		None => std::future::pending().await,
	}
}
