use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;

use crate::{Error, message::Message};

/// Identifies an outstanding request, and the response that completes it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestKey {
	Announce(String),
	Subscribe(u64),
}

impl RequestKey {
	/// The key of a request message, or None if the message is not a request.
	pub fn request(msg: &Message) -> Option<Self> {
		match msg {
			Message::Announce(msg) => Some(Self::Announce(msg.namespace.clone())),
			Message::Subscribe(msg) => Some(Self::Subscribe(msg.id)),
			_ => None,
		}
	}

	/// The key of a response message, or None if the message is not a response.
	pub fn response(msg: &Message) -> Option<Self> {
		match msg {
			Message::AnnounceOk(msg) => Some(Self::Announce(msg.namespace.clone())),
			Message::AnnounceError(msg) => Some(Self::Announce(msg.namespace.clone())),
			Message::SubscribeOk(msg) => Some(Self::Subscribe(msg.id)),
			Message::SubscribeError(msg) => Some(Self::Subscribe(msg.id)),
			_ => None,
		}
	}
}

pub(super) type Reply = oneshot::Sender<Result<Message, Error>>;

// The number of timed out requests remembered, oldest forgotten first.
const MAX_ABANDONED: usize = 64;

/// The table of requests awaiting a response.
///
/// Owned by the dispatch loop. Dropping it releases every waiting caller.
#[derive(Default)]
pub(super) struct Transactions {
	pending: HashMap<RequestKey, Reply>,

	// Requests that timed out locally; a late response is dropped instead of being unsolicited.
	abandoned: VecDeque<RequestKey>,
}

impl Transactions {
	/// Record a request, handing the reply back if the key is already pending.
	///
	/// A reissued request takes over the key, so a timed out attempt no longer excuses a stray response.
	pub fn insert(&mut self, key: RequestKey, reply: Reply) -> Result<(), Reply> {
		if self.pending.contains_key(&key) {
			return Err(reply);
		}

		self.abandoned.retain(|abandoned| abandoned != &key);
		self.pending.insert(key, reply);

		Ok(())
	}

	/// Deliver a response to the matching request.
	pub fn complete(&mut self, key: &RequestKey, msg: Message) -> Result<(), Error> {
		if let Some(reply) = self.pending.remove(key) {
			// The caller may have given up already.
			reply.send(Ok(msg)).ok();
			return Ok(());
		}

		if let Some(index) = self.abandoned.iter().position(|abandoned| abandoned == key) {
			self.abandoned.remove(index);
			tracing::debug!(?key, "dropping late response");
			return Ok(());
		}

		Err(Error::UnsolicitedResponse)
	}

	/// Forget a request whose caller stopped waiting.
	pub fn cancel(&mut self, key: RequestKey) {
		if self.pending.remove(&key).is_none() {
			return;
		}

		if self.abandoned.len() >= MAX_ABANDONED {
			self.abandoned.pop_front();
		}
		self.abandoned.push_back(key);
	}
}
