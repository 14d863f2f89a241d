use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::coding::*;
use crate::message::Parameters;

/// The role advertised by each endpoint during setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, clap::ValueEnum)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u64)]
pub enum Role {
	/// Ingestion: the endpoint only publishes tracks.
	Publisher = 0x01,
	/// Delivery: the endpoint only subscribes to tracks.
	Subscriber = 0x02,
	Both = 0x03,
}

/// Sent by the client on the control stream to start the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSetup {
	/// The versions the client supports, in preferred order.
	pub versions: Versions,
	pub parameters: Parameters,
}

impl Decode for ClientSetup {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let versions = Versions::decode(r)?;
		let parameters = Parameters::decode(r)?;

		Ok(Self { versions, parameters })
	}
}

impl Encode for ClientSetup {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.versions.encode(w);
		self.parameters.encode(w);
	}
}

/// Sent by the server in reply to [ClientSetup].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSetup {
	/// The version selected by the server.
	pub version: Version,
	pub parameters: Parameters,
}

impl Decode for ServerSetup {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let version = Version::decode(r)?;
		let parameters = Parameters::decode(r)?;

		Ok(Self { version, parameters })
	}
}

impl Encode for ServerSetup {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		self.version.encode(w);
		self.parameters.encode(w);
	}
}
