use std::time::Duration;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::coding::*;
use crate::message::Parameters;

/// The order in which the publisher delivers groups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum GroupOrder {
	#[default]
	Ascending = 0x1,
	Descending = 0x2,
}

impl Encode for GroupOrder {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		u8::from(*self).encode(w);
	}
}

impl Decode for GroupOrder {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let v = u8::decode(r)?;
		Self::try_from(v).map_err(|_| DecodeError::InvalidGroupOrder(v))
	}
}

/// A position within a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
	pub group: u64,
	pub object: u64,
}

impl Location {
	pub const fn new(group: u64, object: u64) -> Self {
		Self { group, object }
	}
}

impl Encode for Location {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.group.encode(w);
		self.object.encode(w);
	}
}

impl Decode for Location {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let group = u64::decode(r)?;
		let object = u64::decode(r)?;
		Ok(Self { group, object })
	}
}

/// Sent by the subscriber to request all objects for the given track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscribe {
	/// Chosen by the subscriber, echoed in the reply and used as the track id of every object.
	pub id: u64,
	pub track_name: String,
	pub parameters: Parameters,
}

impl Decode for Subscribe {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let track_name = String::decode(r)?;
		let parameters = Parameters::decode(r)?;

		Ok(Self {
			id,
			track_name,
			parameters,
		})
	}
}

impl Encode for Subscribe {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.id.encode(w);
		self.track_name.encode(w);
		self.parameters.encode(w);
	}
}

/// Sent by the publisher to accept a [Subscribe].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeOk {
	pub id: u64,

	/// How long the subscription is valid for, zero meaning forever.
	/// Carried on the wire in milliseconds.
	pub expires: Duration,
	pub group_order: GroupOrder,

	/// The last group and object of the track, when the track has ended.
	pub final_location: Option<Location>,
}

impl Decode for SubscribeOk {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let expires = Duration::from_millis(u64::decode(r)?);
		let group_order = GroupOrder::decode(r)?;

		let final_location = match u8::decode(r)? {
			0 => None,
			1 => Some(Location::decode(r)?),
			value => return Err(DecodeError::InvalidContentExists { value, group_order }),
		};

		Ok(Self {
			id,
			expires,
			group_order,
			final_location,
		})
	}
}

impl Encode for SubscribeOk {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.id.encode(w);

		let expires = self.expires.as_millis().min(VarInt::MAX.into_inner() as u128) as u64;
		expires.encode(w);

		self.group_order.encode(w);

		match &self.final_location {
			Some(location) => {
				1u8.encode(w);
				location.encode(w);
			}
			None => 0u8.encode(w),
		}
	}
}

/// Sent by the publisher to reject a [Subscribe].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeError {
	pub id: u64,
	pub error_code: u64,
	pub reason: String,
}

impl Decode for SubscribeError {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let error_code = u64::decode(r)?;
		let reason = String::decode(r)?;

		Ok(Self { id, error_code, reason })
	}
}

impl Encode for SubscribeError {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.id.encode(w);
		self.error_code.encode(w);
		self.reason.encode(w);
	}
}
