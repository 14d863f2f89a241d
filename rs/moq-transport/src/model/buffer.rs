//! An append-only sequence shared between one producer and any number of consumers.
//!
//! Elements are never removed or reordered, so every consumer observes the same
//! sequence no matter when it was created or how fast it reads.

use futures::Stream;
use tokio::sync::watch;

use crate::{Error, Produce};

#[derive(Debug)]
struct State<T> {
	elements: Vec<T>,
	closed: bool,
}

impl<T> Default for State<T> {
	fn default() -> Self {
		Self {
			elements: Vec::new(),
			closed: false,
		}
	}
}

/// Constructor for a producer/consumer pair.
pub struct Buffer;

impl Buffer {
	pub fn produce<T>() -> Produce<BufferProducer<T>, BufferConsumer<T>> {
		let producer = BufferProducer::new();
		let consumer = producer.consume();
		Produce { producer, consumer }
	}
}

/// The writing half of a buffer. Dropping it closes the buffer.
pub struct BufferProducer<T> {
	state: watch::Sender<State<T>>,
}

impl<T> BufferProducer<T> {
	pub fn new() -> Self {
		Self {
			state: watch::Sender::new(State::default()),
		}
	}

	/// Append a value to the tail, waking every waiting consumer.
	pub fn append(&self, value: T) -> Result<(), Error> {
		let mut result = Ok(());

		self.state.send_if_modified(|state| {
			if state.closed {
				result = Err(Error::Closed);
				return false;
			}

			state.elements.push(value);
			true
		});

		result
	}

	/// Close the buffer; consumers end once they reach the tail.
	pub fn close(&self) {
		self.state.send_if_modified(|state| !std::mem::replace(&mut state.closed, true));
	}

	/// Create a new consumer starting at the first element.
	pub fn consume(&self) -> BufferConsumer<T> {
		BufferConsumer {
			state: self.state.subscribe(),
			index: 0,
		}
	}
}

impl<T> Default for BufferProducer<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Drop for BufferProducer<T> {
	fn drop(&mut self) {
		self.close();
	}
}

/// The reading half of a buffer, with its own cursor.
///
/// Cloning a consumer copies its cursor.
#[derive(Debug)]
pub struct BufferConsumer<T> {
	state: watch::Receiver<State<T>>,
	index: usize,
}

impl<T: Clone> BufferConsumer<T> {
	/// Return the element at the cursor, waiting until one is appended.
	///
	/// Returns [None] once the cursor reaches the tail of a closed buffer.
	pub async fn next(&mut self) -> Option<T> {
		let index = self.index;

		let value = {
			// Err means the producer is gone, which always closes the buffer first.
			let state = self
				.state
				.wait_for(|state| state.elements.len() > index || state.closed)
				.await
				.ok()?;

			state.elements.get(index).cloned()?
		};

		self.index += 1;
		Some(value)
	}

	/// Adapt the consumer into a [Stream].
	pub fn into_stream(self) -> impl Stream<Item = T> {
		futures::stream::unfold(self, |mut consumer| async move {
			let value = consumer.next().await?;
			Some((value, consumer))
		})
	}
}

impl<T> BufferConsumer<T> {
	/// The index of the next element to be returned.
	pub fn position(&self) -> usize {
		self.index
	}

	/// Create a new consumer over the same buffer, starting at the first element.
	pub fn rewind(&self) -> Self {
		Self {
			state: self.state.clone(),
			index: 0,
		}
	}
}

impl<T> Clone for BufferConsumer<T> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			index: self.index,
		}
	}
}
