use crate::coding::*;
use crate::message::Parameters;

/// Sent by the publisher to advertise a track namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announce {
	pub namespace: String,
	pub parameters: Parameters,
}

impl Decode for Announce {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let namespace = String::decode(r)?;
		let parameters = Parameters::decode(r)?;

		Ok(Self { namespace, parameters })
	}
}

impl Encode for Announce {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.namespace.encode(w);
		self.parameters.encode(w);
	}
}

/// Sent by the subscriber to accept an [Announce].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnounceOk {
	pub namespace: String,
}

impl Decode for AnnounceOk {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let namespace = String::decode(r)?;
		Ok(Self { namespace })
	}
}

impl Encode for AnnounceOk {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.namespace.encode(w);
	}
}

/// Sent by the subscriber to reject an [Announce].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnounceError {
	pub namespace: String,
	pub error_code: u64,
	pub reason: String,
}

impl Decode for AnnounceError {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let namespace = String::decode(r)?;
		let error_code = u64::decode(r)?;
		let reason = String::decode(r)?;

		Ok(Self {
			namespace,
			error_code,
			reason,
		})
	}
}

impl Encode for AnnounceError {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.namespace.encode(w);
		self.error_code.encode(w);
		self.reason.encode(w);
	}
}
