use std::{
	future::Future,
	sync::{Arc, Mutex},
	time::Duration,
};

use futures::{FutureExt, future::BoxFuture};

use crate::{
	message::{GroupOrder, Location},
	peer::SendTrack,
};

/// The generic error code sent when a handler rejects a request.
pub const GENERIC_ERROR_CODE: u64 = 0;

/// Returned by an application handler to reject an announce or subscribe.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} (code={code})")]
pub struct HandlerError {
	pub code: u64,
	pub reason: String,
}

impl HandlerError {
	pub fn new(reason: impl Into<String>) -> Self {
		Self {
			code: GENERIC_ERROR_CODE,
			reason: reason.into(),
		}
	}

	pub fn with_code(mut self, code: u64) -> Self {
		self.code = code;
		self
	}
}

/// The parameters of a successful subscription, sent back in SubscribeOk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscribeReply {
	/// How long the subscription is valid for, zero meaning forever.
	pub expires: Duration,
	pub group_order: GroupOrder,

	/// The last group and object, if the track has already ended.
	pub final_location: Option<Location>,
}

pub(super) type AnnouncementHandler = Arc<dyn Fn(String) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

pub(super) type SubscriptionHandler =
	Arc<dyn Fn(String, SendTrack) -> BoxFuture<'static, Result<SubscribeReply, HandlerError>> + Send + Sync>;

#[derive(Default)]
struct HandlersState {
	announcement: Option<AnnouncementHandler>,
	subscription: Option<SubscriptionHandler>,
}

/// The application callbacks, shared between the [crate::Peer] handle and the dispatch loop.
#[derive(Clone, Default)]
pub(super) struct Handlers {
	state: Arc<Mutex<HandlersState>>,
}

impl Handlers {
	pub fn set_announcement<F, Fut>(&self, f: F)
	where
		F: Fn(String) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
	{
		let handler: AnnouncementHandler = Arc::new(move |namespace| f(namespace).boxed());
		self.state.lock().unwrap().announcement = Some(handler);
	}

	pub fn set_subscription<F, Fut>(&self, f: F)
	where
		F: Fn(String, SendTrack) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<SubscribeReply, HandlerError>> + Send + 'static,
	{
		let handler: SubscriptionHandler = Arc::new(move |name, track| f(name, track).boxed());
		self.state.lock().unwrap().subscription = Some(handler);
	}

	pub fn announcement(&self) -> Option<AnnouncementHandler> {
		self.state.lock().unwrap().announcement.clone()
	}

	pub fn subscription(&self) -> Option<SubscriptionHandler> {
		self.state.lock().unwrap().subscription.clone()
	}
}
