use bytes::Bytes;

use crate::coding::*;

/// A chunk of media for a track, delivered on a data stream or datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
	/// The subscribe id of the track this object belongs to.
	pub track_id: u64,
	pub group_id: u64,
	pub object_id: u64,
	pub send_order: u64,
	pub payload: Bytes,
}

impl Decode for Object {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let track_id = u64::decode(r)?;
		let group_id = u64::decode(r)?;
		let object_id = u64::decode(r)?;
		let send_order = u64::decode(r)?;
		let payload = Bytes::decode(r)?;

		Ok(Self {
			track_id,
			group_id,
			object_id,
			send_order,
			payload,
		})
	}
}

impl Encode for Object {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.track_id.encode(w);
		self.group_id.encode(w);
		self.object_id.encode(w);
		self.send_order.encode(w);
		self.payload.encode(w);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_object() {
		let object = Object {
			track_id: 1,
			group_id: 2,
			object_id: 3,
			send_order: 64,
			payload: Bytes::from_static(b"abc"),
		};

		let mut buf = object.encode_bytes();
		assert_eq!(buf, &[0x01, 0x02, 0x03, 0x40, 0x40, 0x03, b'a', b'b', b'c'][..]);
		assert_eq!(Object::decode(&mut buf).unwrap(), object);
	}

	#[test]
	fn test_object_payload_short() {
		let mut buf = &[0x01, 0x02, 0x03, 0x04, 0x05, b'a'][..];
		assert_eq!(Object::decode(&mut buf), Err(DecodeError::Short));
	}
}
