//! A session with a remote endpoint.
//!
//! A [Peer] is created by [Peer::connect] (client) or [Peer::accept] (server), which perform
//! the setup handshake on the first bidirectional stream. That stream then becomes the
//! control stream, owned by a single dispatch task that writes every request and matches
//! every response. Data streams and datagrams are accepted independently and routed to
//! the [ReceiveTrack] with the matching track id.

mod config;
mod control;
mod handler;
mod mux;
mod setup;
mod track;
mod transaction;

pub use config::*;
pub use handler::{GENERIC_ERROR_CODE, HandlerError, SubscribeReply};
pub use track::{ObjectWriter, ReceiveTrack, SendTrack};
pub use transaction::RequestKey;

use handler::Handlers;
use track::ReceiveTracks;

use std::{
	future::Future,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};

use tokio::sync::{mpsc, oneshot, watch};

use crate::{
	Error, ErrorCode,
	coding::Stream,
	message::{self, Message, Role},
	transport::{Connection, ConnectionInner},
};

use control::{Command, Control, Status};
use mux::Mux;
use setup::Setup;

/// An established session, cheaply cloned.
#[derive(Clone)]
pub struct Peer {
	role: Role,
	remote_role: Option<Role>,
	config: PeerConfig,

	session: Arc<dyn ConnectionInner>,
	commands: mpsc::UnboundedSender<Command>,
	status: watch::Receiver<Status>,

	receive_tracks: ReceiveTracks,
	handlers: Handlers,
	next_subscribe_id: Arc<AtomicU64>,
}

impl Peer {
	/// Perform the client side of the handshake over the given connection.
	pub async fn connect<C: Connection>(conn: C, config: PeerConfig) -> Result<Self, Error> {
		let res = tokio::time::timeout(config.setup_timeout, setup::connect(&conn, &config)).await;
		let setup = Self::check_setup(&conn, res.unwrap_or(Err(Error::Timeout)))?;

		tracing::debug!(role = ?config.role, remote_role = ?setup.remote_role, "connected");
		Ok(Self::start(conn, setup, config))
	}

	/// Perform the server side of the handshake over the given connection.
	pub async fn accept<C: Connection>(conn: C, config: PeerConfig) -> Result<Self, Error> {
		let res = tokio::time::timeout(config.setup_timeout, setup::accept(&conn, &config)).await;
		let setup = Self::check_setup(&conn, res.unwrap_or(Err(Error::Timeout)))?;

		tracing::debug!(role = ?config.role, remote_role = ?setup.remote_role, "accepted");
		Ok(Self::start(conn, setup, config))
	}

	fn check_setup<C: Connection>(conn: &C, res: Result<Setup<C>, Error>) -> Result<Setup<C>, Error> {
		if let Err(err) = &res {
			tracing::warn!(%err, "setup failed");
			Connection::close(conn, err.to_code(), &err.to_string());
		}

		res
	}

	fn start<C: Connection>(conn: C, setup: Setup<C>, config: PeerConfig) -> Self {
		let (commands_tx, commands_rx) = mpsc::unbounded_channel();
		let (status_tx, status_rx) = watch::channel(Status::Running);

		let receive_tracks = ReceiveTracks::default();
		let handlers = Handlers::default();
		let session: Arc<dyn ConnectionInner> = Arc::new(conn.clone());

		Mux::new(conn.clone(), receive_tracks.clone()).start(config.datagrams);

		let Stream { writer, reader } = setup.stream;
		let control = Control::new(
			conn,
			writer,
			commands_tx.clone(),
			receive_tracks.clone(),
			handlers.clone(),
			status_tx,
			config.drain_timeout,
		);
		control.start(reader, commands_rx);

		Self {
			role: config.role,
			remote_role: setup.remote_role,
			config,
			session,
			commands: commands_tx,
			status: status_rx,
			receive_tracks,
			handlers,
			next_subscribe_id: Default::default(),
		}
	}

	/// The role advertised by this endpoint.
	pub fn role(&self) -> Role {
		self.role
	}

	/// The role advertised by the remote, if it sent one.
	pub fn remote_role(&self) -> Option<Role> {
		self.remote_role
	}

	/// Announce a track namespace, waiting for the remote to accept it.
	pub async fn announce(&self, namespace: impl Into<String>) -> Result<(), Error> {
		let namespace = namespace.into();
		if namespace.is_empty() {
			return Err(Error::InvalidName);
		}

		let msg = message::Announce {
			namespace,
			parameters: Default::default(),
		};

		match self.request(msg.into()).await? {
			Message::AnnounceOk(_) => Ok(()),
			Message::AnnounceError(err) => Err(Error::Rejected {
				code: err.error_code,
				reason: err.reason,
			}),
			msg => Err(Error::UnexpectedMessage(msg.id())),
		}
	}

	/// Subscribe to a track, returning once the remote accepts.
	///
	/// Objects that arrive before the response are buffered in the returned track.
	pub async fn subscribe(&self, track_name: impl Into<String>) -> Result<ReceiveTrack, Error> {
		let name = track_name.into();
		if name.is_empty() {
			return Err(Error::InvalidName);
		}

		self.check_running()?;

		let id = self.next_subscribe_id.fetch_add(1, Ordering::Relaxed);
		let objects = self.receive_tracks.insert(id)?;

		let msg = message::Subscribe {
			id,
			track_name: name.clone(),
			parameters: Default::default(),
		};

		let err = match self.request(msg.into()).await {
			Ok(Message::SubscribeOk(ok)) => {
				tracing::debug!(id, track = %name, "subscribed");
				return Ok(ReceiveTrack::new(id, name, &ok, objects));
			}
			Ok(Message::SubscribeError(err)) => Error::Rejected {
				code: err.error_code,
				reason: err.reason,
			},
			Ok(msg) => Error::UnexpectedMessage(msg.id()),
			Err(err) => err,
		};

		self.receive_tracks.remove(id);
		Err(err)
	}

	async fn request(&self, msg: Message) -> Result<Message, Error> {
		self.check_running()?;

		let key = RequestKey::request(&msg).ok_or(Error::UnexpectedMessage(msg.id()))?;

		let (tx, rx) = oneshot::channel();
		self.commands
			.send(Command::Request { msg, reply: tx })
			.map_err(|_| Error::Closed)?;

		match tokio::time::timeout(self.config.request_timeout, rx).await {
			Ok(Ok(res)) => res,
			// The dispatch loop exited and dropped the transaction.
			Ok(Err(_)) => Err(Error::Closed),
			Err(_) => {
				self.commands.send(Command::Cancel(key)).ok();
				Err(Error::Timeout)
			}
		}
	}

	fn check_running(&self) -> Result<(), Error> {
		match &*self.status.borrow() {
			Status::Running => Ok(()),
			Status::Draining(_) => Err(Error::GoingAway),
			Status::Closed(_) => Err(Error::Closed),
		}
	}

	/// Register the handler that accepts or rejects announcements from the remote.
	pub fn on_announcement<F, Fut>(&self, handler: F)
	where
		F: Fn(String) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
	{
		self.handlers.set_announcement(handler);
	}

	/// Register the handler that serves subscriptions from the remote.
	///
	/// The handler receives the track name and a [SendTrack] to publish objects on.
	pub fn on_subscription<F, Fut>(&self, handler: F)
	where
		F: Fn(String, SendTrack) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<SubscribeReply, HandlerError>> + Send + 'static,
	{
		self.handlers.set_subscription(handler);
	}

	/// Ask the remote to move to a new session, an empty uri meaning the current one.
	pub fn go_away(&self, uri: impl Into<String>) -> Result<(), Error> {
		let msg = message::GoAway { uri: uri.into() };
		self.commands
			.send(Command::Send(msg.into()))
			.map_err(|_| Error::Closed)
	}

	/// Wait until the remote sends a GOAWAY, returning the new session uri.
	///
	/// Returns [None] if the session closed first.
	pub async fn going_away(&self) -> Option<String> {
		let mut status = self.status.clone();
		let status = status.wait_for(|status| !matches!(status, Status::Running)).await.ok()?;

		match &*status {
			Status::Draining(uri) => Some(uri.clone()),
			_ => None,
		}
	}

	/// Close the session immediately.
	///
	/// Pending requests fail with [Error::Closed] and [Peer::closed] returns `Ok`.
	pub fn close(&self) {
		if self.commands.send(Command::Close).is_err() {
			// The dispatch loop is already gone.
			self.session.close(ErrorCode::NoError.into(), "");
		}
	}

	/// Wait until the session is closed, returning the error that closed it.
	pub async fn closed(&self) -> Result<(), Error> {
		let mut status = self.status.clone();
		let status = match status.wait_for(|status| matches!(status, Status::Closed(_))).await {
			Ok(status) => status.clone(),
			Err(_) => return Err(Error::Closed),
		};

		match status {
			Status::Closed(res) => res,
			_ => Err(Error::Closed),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use futures::StreamExt;
	use tokio::io::AsyncWriteExt;

	use super::*;
	use crate::{
		coding::{Encode, Version, Writer},
		message::{GroupOrder, Location, Object, Parameters, ServerSetup},
		transport::memory::{self, MemoryConnection, MemoryError},
	};

	async fn pair(config: PeerConfig) -> (Peer, Peer) {
		let (a, b) = memory::pair();
		let (client, server) = tokio::join!(Peer::connect(a, config.clone()), Peer::accept(b, config));
		(client.unwrap(), server.unwrap())
	}

	// A server that speaks the wire format by hand.
	async fn raw_server(conn: &MemoryConnection) -> Stream<MemoryConnection> {
		let mut stream = Stream::accept(conn).await.unwrap();

		let msg = stream.reader.decode::<Message>().await.unwrap();
		assert!(matches!(msg, Message::ClientSetup(_)));

		let mut parameters = Parameters::default();
		parameters.set_role(Role::Publisher);

		let reply = ServerSetup {
			version: Version::DRAFT_00,
			parameters,
		};
		stream.writer.encode(&Message::from(reply)).await.unwrap();

		stream
	}

	async fn raw_pair(config: PeerConfig) -> (Peer, MemoryConnection, Stream<MemoryConnection>) {
		let (a, b) = memory::pair();
		let (client, stream) = tokio::join!(Peer::connect(a, config), raw_server(&b));
		(client.unwrap(), b, stream)
	}

	async fn raw_client(conn: &MemoryConnection, setup: message::ClientSetup) -> Stream<MemoryConnection> {
		let mut stream = Stream::open(conn).await.unwrap();
		stream.writer.encode(&Message::from(setup)).await.unwrap();
		stream
	}

	fn client_setup(versions: &[Version], role: Option<Role>) -> message::ClientSetup {
		let mut parameters = Parameters::default();
		if let Some(role) = role {
			parameters.set_role(role);
		}

		message::ClientSetup {
			versions: versions.to_vec().into(),
			parameters,
		}
	}

	#[tokio::test]
	async fn test_handshake() {
		let config = PeerConfig {
			role: Role::Subscriber,
			..Default::default()
		};

		let (a, b) = memory::pair();
		let server_config = PeerConfig {
			role: Role::Publisher,
			..Default::default()
		};

		let (client, server) = tokio::join!(Peer::connect(a, config), Peer::accept(b, server_config));
		let (client, server) = (client.unwrap(), server.unwrap());

		assert_eq!(client.role(), Role::Subscriber);
		assert_eq!(client.remote_role(), Some(Role::Publisher));
		assert_eq!(server.role(), Role::Publisher);
		assert_eq!(server.remote_role(), Some(Role::Subscriber));
	}

	#[tokio::test]
	async fn test_subscribe() {
		let (client, server) = pair(PeerConfig::default()).await;

		server.on_subscription(|name, track| async move {
			assert_eq!(name, track.name());
			Ok::<_, HandlerError>(SubscribeReply {
				expires: Duration::from_secs(30),
				group_order: GroupOrder::Descending,
				final_location: Some(Location::new(4, 2)),
			})
		});

		let video = client.subscribe("video").await.unwrap();
		assert_eq!(video.id(), 0);
		assert_eq!(video.name(), "video");
		assert_eq!(video.expires(), Duration::from_secs(30));
		assert_eq!(video.group_order(), GroupOrder::Descending);
		assert_eq!(video.final_location(), Some(Location::new(4, 2)));

		let audio = client.subscribe("audio").await.unwrap();
		assert_eq!(audio.id(), 1);
	}

	#[tokio::test]
	async fn test_subscribe_concurrent() {
		let (client, server) = pair(PeerConfig::default()).await;

		server.on_subscription(|name, _track| async move {
			// Answer out of order: the first request is the slowest.
			if name == "slow" {
				tokio::time::sleep(Duration::from_millis(50)).await;
			}
			Ok::<_, HandlerError>(SubscribeReply::default())
		});

		let (slow, fast) = tokio::join!(client.subscribe("slow"), client.subscribe("fast"));
		assert_eq!(slow.unwrap().name(), "slow");
		assert_eq!(fast.unwrap().name(), "fast");
	}

	#[tokio::test]
	async fn test_objects_over_stream() {
		let (client, server) = pair(PeerConfig::default()).await;

		server.on_subscription(|_name, track| async move {
			tokio::spawn(async move {
				let mut stream = track.open_stream().await.unwrap();
				for object_id in 0..3u64 {
					stream.write_object(0, object_id, 0, vec![object_id as u8; 4]).await.unwrap();
				}
				stream.finish().await.unwrap();
			});

			Ok::<_, HandlerError>(SubscribeReply::default())
		});

		let mut track = client.subscribe("video").await.unwrap();
		let replay = track.reader();

		for expected in 0..3u64 {
			let object = track.next().await.unwrap();
			assert_eq!(object.track_id, track.id());
			assert_eq!(object.group_id, 0);
			assert_eq!(object.object_id, expected);
			assert_eq!(object.payload, vec![expected as u8; 4]);
		}

		// A second reader starts from the beginning.
		let ids: Vec<u64> = replay
			.into_stream()
			.take(3)
			.map(|object| object.object_id)
			.collect()
			.await;
		assert_eq!(ids, vec![0, 1, 2]);
	}

	#[tokio::test]
	async fn test_objects_over_datagram() {
		let (client, server) = pair(PeerConfig::default()).await;

		server.on_subscription(|_name, track| async move {
			track.send_datagram(7, 1, 0, "hello").unwrap();
			Ok::<_, HandlerError>(SubscribeReply::default())
		});

		let mut track = client.subscribe("chat").await.unwrap();
		let object = track.next().await.unwrap();
		assert_eq!(object.group_id, 7);
		assert_eq!(object.object_id, 1);
		assert_eq!(object.payload, "hello");
	}

	#[tokio::test]
	async fn test_objects_over_bi_stream() {
		let (client, conn, mut control) = raw_pair(PeerConfig::default()).await;

		let serve = async {
			let subscribe = match control.reader.decode::<Message>().await.unwrap() {
				Message::Subscribe(subscribe) => subscribe,
				msg => panic!("unexpected message: {msg:?}"),
			};

			let (send, _recv) = conn.open_bi().await.unwrap();
			let mut writer = Writer::new(send);
			let object = Object {
				track_id: subscribe.id,
				group_id: 1,
				object_id: 0,
				send_order: 0,
				payload: "bi".into(),
			};
			writer.encode(&Message::from(object)).await.unwrap();
			writer.finish().await.unwrap();

			let ok = message::SubscribeOk {
				id: subscribe.id,
				expires: Duration::ZERO,
				group_order: GroupOrder::Ascending,
				final_location: None,
			};
			control.writer.encode(&Message::from(ok)).await.unwrap();
		};

		let (track, ()) = tokio::join!(client.subscribe("video"), serve);
		let mut track = track.unwrap();

		let object = track.next().await.unwrap();
		assert_eq!(object.group_id, 1);
		assert_eq!(object.payload, "bi");
	}

	#[tokio::test]
	async fn test_subscribe_rejected() {
		let (client, server) = pair(PeerConfig::default()).await;

		server.on_subscription(|name, _track| async move {
			match name.as_str() {
				"exists" => Ok(SubscribeReply::default()),
				_ => Err(HandlerError::new("not found").with_code(404)),
			}
		});

		let err = client.subscribe("missing").await.unwrap_err();
		assert!(matches!(err, Error::Rejected { code: 404, ref reason } if reason == "not found"));

		// The failed subscription doesn't leak its id or block later requests.
		let track = client.subscribe("exists").await.unwrap();
		assert_eq!(track.id(), 1);
	}

	#[tokio::test]
	async fn test_subscribe_without_handler() {
		let (client, _server) = pair(PeerConfig::default()).await;

		let err = client.subscribe("video").await.unwrap_err();
		assert!(matches!(err, Error::Rejected { code: GENERIC_ERROR_CODE, .. }));
	}

	#[tokio::test]
	async fn test_announce() {
		let (client, server) = pair(PeerConfig::default()).await;

		server.on_announcement(|namespace| async move {
			match namespace.as_str() {
				"live" => Ok(()),
				_ => Err(HandlerError::new("unknown namespace")),
			}
		});

		client.announce("live").await.unwrap();

		let err = client.announce("archive").await.unwrap_err();
		assert!(matches!(err, Error::Rejected { code: 0, ref reason } if reason == "unknown namespace"));

		// Both directions work over the same control stream.
		client.on_announcement(|_| async { Ok::<_, HandlerError>(()) });
		server.announce("events").await.unwrap();
	}

	#[tokio::test]
	async fn test_invalid_name() {
		let (client, _server) = pair(PeerConfig::default()).await;

		assert!(matches!(client.announce("").await, Err(Error::InvalidName)));
		assert!(matches!(client.subscribe("").await, Err(Error::InvalidName)));
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_releases_request() {
		let (client, _conn, mut control) = raw_pair(PeerConfig::default()).await;

		// Nobody answers.
		assert!(matches!(client.announce("ns").await, Err(Error::Timeout)));
		assert!(matches!(
			control.reader.decode::<Message>().await.unwrap(),
			Message::Announce(_)
		));

		// An identical request is written again instead of being refused as a duplicate.
		assert!(matches!(client.announce("ns").await, Err(Error::Timeout)));
		assert!(matches!(
			control.reader.decode::<Message>().await.unwrap(),
			Message::Announce(_)
		));

		// A late response is dropped without tearing down the session.
		let late = message::AnnounceOk {
			namespace: "ns".to_string(),
		};
		control.writer.encode(&Message::from(late)).await.unwrap();
		tokio::time::sleep(Duration::from_millis(10)).await;

		let serve = async {
			let announce = match control.reader.decode::<Message>().await.unwrap() {
				Message::Announce(announce) => announce,
				msg => panic!("unexpected message: {msg:?}"),
			};

			let ok = message::AnnounceOk {
				namespace: announce.namespace,
			};
			control.writer.encode(&Message::from(ok)).await.unwrap();
		};

		let (res, ()) = tokio::join!(client.announce("ns"), serve);
		res.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn test_stray_response_after_retry() {
		let (client, conn, mut control) = raw_pair(PeerConfig::default()).await;

		// The first attempt goes unanswered.
		assert!(matches!(client.announce("ns").await, Err(Error::Timeout)));
		assert!(matches!(
			control.reader.decode::<Message>().await.unwrap(),
			Message::Announce(_)
		));

		// The retry is answered.
		let serve = async {
			let announce = match control.reader.decode::<Message>().await.unwrap() {
				Message::Announce(announce) => announce,
				msg => panic!("unexpected message: {msg:?}"),
			};

			let ok = message::AnnounceOk {
				namespace: announce.namespace,
			};
			control.writer.encode(&Message::from(ok)).await.unwrap();
		};

		let (res, ()) = tokio::join!(client.announce("ns"), serve);
		res.unwrap();

		// Nothing is outstanding any more, so another response is a violation.
		let stray = message::AnnounceOk {
			namespace: "ns".to_string(),
		};
		control.writer.encode(&Message::from(stray)).await.unwrap();

		assert!(matches!(client.closed().await, Err(Error::UnsolicitedResponse)));
		assert!(matches!(conn.closed().await, MemoryError::Closed { code: 3, .. }));
	}

	#[tokio::test]
	async fn test_local_close() {
		let config = PeerConfig {
			request_timeout: Duration::from_secs(3600),
			..Default::default()
		};
		let (client, conn, mut control) = raw_pair(config).await;

		let pending = tokio::spawn({
			let client = client.clone();
			async move { client.announce("ns").await }
		});

		assert!(matches!(
			control.reader.decode::<Message>().await.unwrap(),
			Message::Announce(_)
		));
		client.close();

		client.closed().await.unwrap();
		assert!(matches!(pending.await.unwrap(), Err(Error::Closed)));
		assert!(matches!(conn.closed().await, MemoryError::Closed { code: 0, .. }));
		assert!(matches!(client.announce("ns").await, Err(Error::Closed)));
	}

	#[tokio::test]
	async fn test_unsolicited_response() {
		let (client, conn, mut control) = raw_pair(PeerConfig::default()).await;

		let msg = message::SubscribeOk {
			id: 9,
			expires: Duration::ZERO,
			group_order: GroupOrder::Ascending,
			final_location: None,
		};
		control.writer.encode(&Message::from(msg)).await.unwrap();

		assert!(matches!(client.closed().await, Err(Error::UnsolicitedResponse)));
		assert!(matches!(conn.closed().await, MemoryError::Closed { code: 3, .. }));
		assert!(matches!(client.announce("ns").await, Err(Error::Closed)));
	}

	#[tokio::test]
	async fn test_unexpected_message() {
		let (client, conn, mut control) = raw_pair(PeerConfig::default()).await;

		let setup = client_setup(&[Version::DRAFT_00], Some(Role::Both));
		control.writer.encode(&Message::from(setup)).await.unwrap();

		assert!(matches!(client.closed().await, Err(Error::UnexpectedMessage(0x40))));
		assert!(matches!(conn.closed().await, MemoryError::Closed { code: 3, .. }));
	}

	#[tokio::test]
	async fn test_malformed_control_stream() {
		let (client, _conn, mut control) = raw_pair(PeerConfig::default()).await;

		// An unknown message type.
		control.writer.write_all(&[0x3f]).await.unwrap();

		assert!(matches!(
			client.closed().await,
			Err(Error::Decode(crate::coding::DecodeError::InvalidMessage(0x3f)))
		));
	}

	#[tokio::test]
	async fn test_close_releases_pending() {
		let config = PeerConfig {
			request_timeout: Duration::from_secs(3600),
			..Default::default()
		};
		let (client, conn, mut control) = raw_pair(config).await;

		let pending = tokio::spawn({
			let client = client.clone();
			async move { client.subscribe("video").await }
		});

		assert!(matches!(
			control.reader.decode::<Message>().await.unwrap(),
			Message::Subscribe(_)
		));
		Connection::close(&conn, 0, "");

		assert!(matches!(pending.await.unwrap(), Err(Error::Closed)));
		assert!(matches!(client.subscribe("audio").await, Err(Error::Closed)));
	}

	#[tokio::test]
	async fn test_remote_finish_closes_tracks() {
		let (client, _conn, mut control) = raw_pair(PeerConfig::default()).await;

		let serve = async {
			let subscribe = match control.reader.decode::<Message>().await.unwrap() {
				Message::Subscribe(subscribe) => subscribe,
				msg => panic!("unexpected message: {msg:?}"),
			};

			let ok = message::SubscribeOk {
				id: subscribe.id,
				expires: Duration::ZERO,
				group_order: GroupOrder::Ascending,
				final_location: None,
			};
			control.writer.encode(&Message::from(ok)).await.unwrap();
		};

		let (track, ()) = tokio::join!(client.subscribe("video"), serve);
		let mut track = track.unwrap();

		// Finishing the control stream ends the session cleanly.
		control.writer.finish().await.unwrap();

		assert!(track.next().await.is_none());
		client.closed().await.unwrap();
	}

	#[tokio::test]
	async fn test_unknown_track_is_ignored() {
		let (client, conn, mut control) = raw_pair(PeerConfig::default()).await;

		let mut send = Connection::open_uni(&conn).await.unwrap();
		let object = Object {
			track_id: 99,
			group_id: 0,
			object_id: 0,
			send_order: 0,
			payload: "lost".into(),
		};
		send.write_all(&Message::from(object).encode_bytes()).await.unwrap();
		send.shutdown().await.unwrap();

		// The session is still usable.
		let serve = async {
			let announce = match control.reader.decode::<Message>().await.unwrap() {
				Message::Announce(announce) => announce,
				msg => panic!("unexpected message: {msg:?}"),
			};

			let ok = message::AnnounceOk {
				namespace: announce.namespace,
			};
			control.writer.encode(&Message::from(ok)).await.unwrap();
		};

		let (res, ()) = tokio::join!(client.announce("ns"), serve);
		res.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn test_go_away() {
		let (client, server) = pair(PeerConfig::default()).await;

		server.go_away("https://relay.example/next").unwrap();
		assert_eq!(client.going_away().await.as_deref(), Some("https://relay.example/next"));

		// No new requests once draining, in either direction.
		assert!(matches!(client.subscribe("video").await, Err(Error::GoingAway)));

		client.on_subscription(|_, _| async { Ok::<_, HandlerError>(SubscribeReply::default()) });
		let err = server.subscribe("video").await.unwrap_err();
		assert!(matches!(err, Error::Rejected { ref reason, .. } if reason == "going away"));

		// The drain is bounded.
		assert!(matches!(client.closed().await, Err(Error::GoingAway)));
		assert!(server.closed().await.is_err());
	}

	#[tokio::test]
	async fn test_setup_version_mismatch() {
		let (a, b) = memory::pair();

		let setup = client_setup(&[Version(0xff000001)], Some(Role::Both));
		let (server, _stream) = tokio::join!(Peer::accept(b, PeerConfig::default()), raw_client(&a, setup));

		assert!(matches!(server, Err(Error::Version(..))));
		assert!(matches!(a.closed().await, MemoryError::Closed { code: 3, .. }));
	}

	#[tokio::test]
	async fn test_setup_missing_role() {
		let (a, b) = memory::pair();

		let setup = client_setup(&[Version::DRAFT_00], None);
		let (server, _stream) = tokio::join!(Peer::accept(b, PeerConfig::default()), raw_client(&a, setup));

		assert!(matches!(server, Err(Error::MissingRole)));
	}

	#[tokio::test]
	async fn test_setup_invalid_role() {
		let (a, b) = memory::pair();

		let mut setup = client_setup(&[Version::DRAFT_00], None);
		setup.parameters.set_varint(message::ParameterVarInt::Role, 9);
		let (server, _stream) = tokio::join!(Peer::accept(b, PeerConfig::default()), raw_client(&a, setup));

		assert!(matches!(server, Err(Error::InvalidRole(9))));
	}

	#[tokio::test]
	async fn test_setup_unexpected_message() {
		let (a, b) = memory::pair();

		let open = async {
			let mut stream = Stream::open(&a).await.unwrap();
			let msg = message::AnnounceOk {
				namespace: "ns".to_string(),
			};
			stream.writer.encode(&Message::from(msg)).await.unwrap();
			stream
		};

		let (server, _stream) = tokio::join!(Peer::accept(b, PeerConfig::default()), open);
		assert!(matches!(server, Err(Error::UnexpectedMessage(0x07))));
	}

	#[tokio::test(start_paused = true)]
	async fn test_setup_timeout() {
		let (a, b) = memory::pair();

		// The stream is opened but the client setup never arrives.
		let (server, _stream) = tokio::join!(Peer::accept(b, PeerConfig::default()), Stream::open(&a));
		assert!(matches!(server, Err(Error::Timeout)));
	}
}
