use crate::coding::*;

/// Sent by the server to ask the client to migrate to a new session.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct GoAway {
	/// The URI of the new session, empty to reuse the current one.
	pub uri: String,
}

impl Decode for GoAway {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let uri = String::decode(r)?;
		Ok(Self { uri })
	}
}

impl Encode for GoAway {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.uri.encode(w);
	}
}
