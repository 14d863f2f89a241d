// QUIC variable-length integers, as defined in RFC 9000 section 16.
// The two most significant bits of the first byte encode the length.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::coding::{Decode, DecodeError, Encode};

/// An integer less than 2^62, encoded in 1, 2, 4 or 8 bytes.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarInt(u64);

impl VarInt {
	/// The largest representable value.
	pub const MAX: Self = Self((1 << 62) - 1);

	/// The smallest representable value.
	pub const ZERO: Self = Self(0);

	/// Construct a `VarInt` infallibly from the largest available type.
	pub const fn from_u32(x: u32) -> Self {
		Self(x as u64)
	}

	/// Construct a `VarInt` if the value fits in 62 bits.
	pub const fn from_u64(x: u64) -> Option<Self> {
		if x <= Self::MAX.0 { Some(Self(x)) } else { None }
	}

	/// Extract the integer value.
	pub const fn into_inner(self) -> u64 {
		self.0
	}

	/// The number of bytes used to encode this value.
	pub const fn size(self) -> usize {
		if self.0 < (1 << 6) {
			1
		} else if self.0 < (1 << 14) {
			2
		} else if self.0 < (1 << 30) {
			4
		} else {
			8
		}
	}
}

impl From<VarInt> for u64 {
	fn from(x: VarInt) -> Self {
		x.0
	}
}

impl From<u8> for VarInt {
	fn from(x: u8) -> Self {
		Self(x.into())
	}
}

impl From<u16> for VarInt {
	fn from(x: u16) -> Self {
		Self(x.into())
	}
}

impl From<u32> for VarInt {
	fn from(x: u32) -> Self {
		Self::from_u32(x)
	}
}

impl TryFrom<u64> for VarInt {
	type Error = DecodeError;

	fn try_from(x: u64) -> Result<Self, Self::Error> {
		Self::from_u64(x).ok_or(DecodeError::BoundsExceeded)
	}
}

impl TryFrom<usize> for VarInt {
	type Error = DecodeError;

	fn try_from(x: usize) -> Result<Self, Self::Error> {
		Self::try_from(x as u64)
	}
}

impl fmt::Debug for VarInt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl fmt::Display for VarInt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl Decode for VarInt {
	fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
		if !r.has_remaining() {
			return Err(DecodeError::Short);
		}

		let size = 1 << (r.chunk()[0] >> 6);
		if r.remaining() < size {
			return Err(DecodeError::Short);
		}

		let mut buf = [0u8; 8];
		r.copy_to_slice(&mut buf[8 - size..]);
		buf[8 - size] &= 0b0011_1111;

		Ok(Self(u64::from_be_bytes(buf)))
	}
}

impl Encode for VarInt {
	fn encode<W: BufMut>(&self, w: &mut W) {
		let x = self.0;
		match self.size() {
			1 => w.put_u8(x as u8),
			2 => w.put_u16((0b01 << 14) | x as u16),
			4 => w.put_u32((0b10 << 30) | x as u32),
			_ => w.put_u64((0b11 << 62) | x),
		}
	}
}

impl Decode for u64 {
	fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
		VarInt::decode(r).map(u64::from)
	}
}

impl Encode for u64 {
	fn encode<W: BufMut>(&self, w: &mut W) {
		match VarInt::from_u64(*self) {
			Some(v) => v.encode(w),
			None => panic!("varint overflow: {self}"),
		}
	}
}

impl Decode for usize {
	fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let v = u64::decode(r)?;
		usize::try_from(v).map_err(|_| DecodeError::BoundsExceeded)
	}
}

impl Encode for usize {
	fn encode<W: BufMut>(&self, w: &mut W) {
		(*self as u64).encode(w)
	}
}
