//! # moq-transport: Media over QUIC Transport, draft-00
//!
//! A symmetric peer for the first draft of the IETF Media over QUIC transport.
//! Either endpoint may announce namespaces, subscribe to tracks and serve subscriptions.
//!
//! ## API
//!
//! A session is established over any [transport::Connection]:
//! - [Peer::connect] performs the client side of the setup handshake.
//! - [Peer::accept] performs the server side.
//!
//! Once established:
//! - [Peer::announce] advertises a track namespace to the remote.
//! - [Peer::subscribe] requests a track, returning a [ReceiveTrack] of objects.
//! - [Peer::on_announcement] and [Peer::on_subscription] register handlers for requests from the remote.
//! - [SendTrack] is handed to the subscription handler to publish objects over streams or datagrams.
//! - [Peer::go_away] asks the remote to migrate, and [Peer::going_away] waits for the remote to ask.
//!
//! The wire format lives in [message] and [coding], and can be used on its own.

mod error;
mod model;

pub mod coding;
pub mod message;
pub mod peer;
pub mod transport;

pub use error::*;
pub use model::*;
pub use peer::*;
