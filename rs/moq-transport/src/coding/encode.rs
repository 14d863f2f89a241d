use std::sync::Arc;

use bytes::{Bytes, BytesMut};

/// Write the value to the buffer.
///
/// Encoding only ever appends; bytes already in the buffer are left untouched.
pub trait Encode: Sized {
	/// Encode the value to the given writer.
	///
	/// This will panic if the [bytes::BufMut] does not have enough capacity,
	/// or if an integer field exceeds the varint range.
	fn encode<W: bytes::BufMut>(&self, w: &mut W);

	/// Encode the value into a [Bytes] buffer.
	///
	/// NOTE: This will allocate.
	fn encode_bytes(&self) -> Bytes {
		let mut buf = BytesMut::new();
		self.encode(&mut buf);
		buf.freeze()
	}
}

impl Encode for bool {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		w.put_u8(*self as u8);
	}
}

impl Encode for u8 {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		w.put_u8(*self);
	}
}

impl Encode for String {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.as_str().encode(w)
	}
}

impl Encode for &str {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.len().encode(w);
		w.put(self.as_bytes());
	}
}

impl Encode for Vec<u8> {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.len().encode(w);
		w.put_slice(self);
	}
}

impl Encode for bytes::Bytes {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.len().encode(w);
		w.put_slice(self);
	}
}

impl<T: Encode> Encode for Arc<T> {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		(**self).encode(w);
	}
}
