use std::{
	collections::{HashMap, hash_map},
	sync::{Arc, Mutex},
	time::Duration,
};

use bytes::Bytes;

use crate::{
	BufferConsumer, BufferProducer, Error,
	coding::{Encode, Writer},
	message::{GroupOrder, Location, Message, Object},
	transport::{BoxSendStream, ConnectionInner},
};

/// A subscribed track, yielding objects in the order they were received.
#[derive(Debug)]
pub struct ReceiveTrack {
	id: u64,
	name: String,
	expires: Duration,
	group_order: GroupOrder,
	final_location: Option<Location>,
	objects: BufferConsumer<Object>,
}

impl ReceiveTrack {
	pub(super) fn new(
		id: u64,
		name: String,
		ok: &crate::message::SubscribeOk,
		objects: BufferConsumer<Object>,
	) -> Self {
		Self {
			id,
			name,
			expires: ok.expires,
			group_order: ok.group_order,
			final_location: ok.final_location,
			objects,
		}
	}

	/// The numeric id carried by every object of this track.
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn expires(&self) -> Duration {
		self.expires
	}

	pub fn group_order(&self) -> GroupOrder {
		self.group_order
	}

	pub fn final_location(&self) -> Option<Location> {
		self.final_location
	}

	/// Return the next object, or None once the track is closed and fully read.
	pub async fn next(&mut self) -> Option<Object> {
		self.objects.next().await
	}

	/// Create an independent reader that starts from the first object.
	pub fn reader(&self) -> BufferConsumer<Object> {
		self.objects.rewind()
	}

	/// Adapt the track into a [futures::Stream] of objects.
	pub fn into_stream(self) -> impl futures::Stream<Item = Object> {
		self.objects.into_stream()
	}
}

/// The receive tracks of a session, keyed by track id.
///
/// Shared between the subscribe path, which registers tracks, and the stream readers.
#[derive(Clone, Default)]
pub(super) struct ReceiveTracks {
	state: Arc<Mutex<HashMap<u64, BufferProducer<Object>>>>,
}

impl ReceiveTracks {
	pub fn insert(&self, id: u64) -> Result<BufferConsumer<Object>, Error> {
		let mut state = self.state.lock().unwrap();
		match state.entry(id) {
			hash_map::Entry::Occupied(_) => Err(Error::Duplicate),
			hash_map::Entry::Vacant(entry) => Ok(entry.insert(BufferProducer::new()).consume()),
		}
	}

	pub fn remove(&self, id: u64) {
		// Dropping the producer closes the track.
		self.state.lock().unwrap().remove(&id);
	}

	pub fn append(&self, object: Object) -> Result<(), Error> {
		let state = self.state.lock().unwrap();
		let track = state.get(&object.track_id).ok_or(Error::UnknownTrack(object.track_id))?;
		track.append(object)
	}

	/// Close every track, ending their consumers.
	pub fn close(&self) {
		self.state.lock().unwrap().clear();
	}
}

/// A track requested by the remote, handed to the subscription handler to publish objects.
#[derive(Clone)]
pub struct SendTrack {
	id: u64,
	name: String,
	conn: Arc<dyn ConnectionInner>,
}

impl SendTrack {
	pub(super) fn new(id: u64, name: String, conn: Arc<dyn ConnectionInner>) -> Self {
		Self { id, name, conn }
	}

	/// The subscribe id chosen by the remote; every object is tagged with it.
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	fn object(&self, group_id: u64, object_id: u64, send_order: u64, payload: Bytes) -> Message {
		Object {
			track_id: self.id,
			group_id,
			object_id,
			send_order,
			payload,
		}
		.into()
	}

	/// Open a unidirectional stream to carry any number of objects.
	pub async fn open_stream(&self) -> Result<ObjectWriter, Error> {
		let stream = self.conn.open_uni().await?;

		Ok(ObjectWriter {
			track: self.clone(),
			writer: Writer::new(stream),
		})
	}

	/// Write a single object on its own unidirectional stream.
	pub async fn write_object(
		&self,
		group_id: u64,
		object_id: u64,
		send_order: u64,
		payload: impl Into<Bytes>,
	) -> Result<(), Error> {
		let mut stream = self.open_stream().await?;
		stream.write_object(group_id, object_id, send_order, payload).await?;
		stream.finish().await
	}

	/// Send a single object as an unreliable datagram.
	pub fn send_datagram(
		&self,
		group_id: u64,
		object_id: u64,
		send_order: u64,
		payload: impl Into<Bytes>,
	) -> Result<(), Error> {
		let msg = self.object(group_id, object_id, send_order, payload.into());
		tracing::trace!(track = self.id, group = group_id, object = object_id, "sending datagram");
		self.conn.send_datagram(msg.encode_bytes())
	}
}

/// A unidirectional stream carrying objects for a single track.
pub struct ObjectWriter {
	track: SendTrack,
	writer: Writer<BoxSendStream>,
}

impl ObjectWriter {
	pub async fn write_object(
		&mut self,
		group_id: u64,
		object_id: u64,
		send_order: u64,
		payload: impl Into<Bytes>,
	) -> Result<(), Error> {
		let msg = self.track.object(group_id, object_id, send_order, payload.into());
		tracing::trace!(track = self.track.id, group = group_id, object = object_id, "writing object");
		self.writer.encode(&msg).await
	}

	/// Finish the stream once every object has been written.
	pub async fn finish(mut self) -> Result<(), Error> {
		self.writer.finish().await
	}
}
