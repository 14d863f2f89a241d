//! Control and data messages exchanged between peers.
//!
//! Each message is prefixed with a varint type tag, followed by the message body.
//! The body encoders live next to each message type; [Message] adds the tag.

mod announce;
mod go_away;
mod object;
mod parameters;
mod setup;
mod subscribe;

pub use announce::*;
pub use go_away::*;
pub use object::*;
pub use parameters::*;
pub use setup::*;
pub use subscribe::*;

use crate::coding::{Decode, DecodeError, Encode};

// Generates the Message enum, its tag based codec and a From impl for each body.
macro_rules! message_types {
	{$($name:ident = $val:literal,)*} => {
		/// Every message that can be sent over the wire.
		#[derive(Clone, Debug, PartialEq, Eq)]
		pub enum Message {
			$($name($name)),*
		}

		impl Message {
			/// The type tag written before the body.
			pub fn id(&self) -> u64 {
				match self {
					$(Self::$name(_) => $val,)*
				}
			}

			pub fn name(&self) -> &'static str {
				match self {
					$(Self::$name(_) => stringify!($name),)*
				}
			}
		}

		$(impl $name {
			pub const ID: u64 = $val;
		})*

		impl Decode for Message {
			fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
				let id = u64::decode(r)?;
				match id {
					$($val => Ok(Self::$name($name::decode(r)?)),)*
					_ => Err(DecodeError::InvalidMessage(id)),
				}
			}
		}

		impl Encode for Message {
			fn encode<W: bytes::BufMut>(&self, w: &mut W) {
				match self {
					$(Self::$name(m) => {
						($val as u64).encode(w);
						m.encode(w);
					},)*
				}
			}
		}

		$(impl From<$name> for Message {
			fn from(m: $name) -> Self {
				Self::$name(m)
			}
		})*
	}
}

message_types! {
	Object = 0x00,
	Subscribe = 0x03,
	SubscribeOk = 0x04,
	SubscribeError = 0x05,
	Announce = 0x06,
	AnnounceOk = 0x07,
	AnnounceError = 0x08,
	GoAway = 0x10,
	ClientSetup = 0x40,
	ServerSetup = 0x41,
}
