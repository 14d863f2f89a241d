use std::string::FromUtf8Error;
use thiserror::Error;

use crate::message::GroupOrder;

/// Read the value from the buffer.
///
/// If [DecodeError::Short] is returned, the caller should try again with more data.
pub trait Decode: Sized {
	/// Decode the value from the given buffer.
	fn decode<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError>;
}

/// A decode error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	#[error("short buffer")]
	Short,

	#[error("invalid string")]
	InvalidString(#[from] FromUtf8Error),

	#[error("invalid message: {0:#x}")]
	InvalidMessage(u64),

	#[error("invalid group order: {0}")]
	InvalidGroupOrder(u8),

	/// The group order preceding the bad byte was already decoded and is kept for diagnostics.
	#[error("invalid content exists: {value} (group order {group_order:?})")]
	InvalidContentExists { value: u8, group_order: GroupOrder },

	#[error("invalid value")]
	InvalidValue,

	#[error("too many")]
	TooMany,

	#[error("bounds exceeded")]
	BoundsExceeded,

	#[error("duplicate")]
	Duplicate,
}

impl Decode for bool {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		match u8::decode(r)? {
			0 => Ok(false),
			1 => Ok(true),
			_ => Err(DecodeError::InvalidValue),
		}
	}
}

impl Decode for u8 {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		match r.has_remaining() {
			true => Ok(r.get_u8()),
			false => Err(DecodeError::Short),
		}
	}
}

impl Decode for String {
	/// Decode a string with a varint length prefix.
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let v = Vec::<u8>::decode(r)?;
		let str = String::from_utf8(v)?;

		Ok(str)
	}
}

impl Decode for Vec<u8> {
	fn decode<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError> {
		let bytes = bytes::Bytes::decode(buf)?;
		Ok(bytes.to_vec())
	}
}

impl Decode for bytes::Bytes {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let len = usize::decode(r)?;
		if r.remaining() < len {
			return Err(DecodeError::Short);
		}

		Ok(r.copy_to_bytes(len))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_bool() {
		assert!(!bool::decode(&mut &[0x00][..]).unwrap());
		assert!(bool::decode(&mut &[0x01][..]).unwrap());
		assert_eq!(bool::decode(&mut &[0x02][..]), Err(DecodeError::InvalidValue));
	}

	#[test]
	fn test_string() {
		let mut buf = &[0x05, b'h', b'e', b'l', b'l', b'o', 0xff][..];
		assert_eq!(String::decode(&mut buf).unwrap(), "hello");
		assert_eq!(buf, &[0xff]);
	}

	#[test]
	fn test_string_short() {
		let mut buf = &[0x05, b'h', b'e'][..];
		assert_eq!(String::decode(&mut buf), Err(DecodeError::Short));
	}

	#[test]
	fn test_string_invalid_utf8() {
		let mut buf = &[0x02, 0xc3, 0x28][..];
		assert!(matches!(String::decode(&mut buf), Err(DecodeError::InvalidString(_))));
	}

	#[test]
	fn test_empty() {
		let mut buf: &[u8] = &[];
		assert_eq!(u8::decode(&mut buf), Err(DecodeError::Short));
		assert_eq!(bytes::Bytes::decode(&mut buf), Err(DecodeError::Short));
	}
}
