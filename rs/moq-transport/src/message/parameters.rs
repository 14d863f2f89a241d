use std::collections::{BTreeMap, btree_map};

use num_enum::{FromPrimitive, IntoPrimitive};

use crate::{Error, coding::*, message::Role};

const MAX_PARAMS: u64 = 64;

/// Parameter keys with a varint value; always even.
#[derive(Debug, Copy, Clone, FromPrimitive, IntoPrimitive, Eq, Hash, PartialEq, Ord, PartialOrd)]
#[repr(u64)]
pub enum ParameterVarInt {
	Role = 0,
	#[num_enum(catch_all)]
	Unknown(u64),
}

/// Parameter keys with a length prefixed value; always odd.
#[derive(Debug, Copy, Clone, FromPrimitive, IntoPrimitive, Eq, Hash, PartialEq, Ord, PartialOrd)]
#[repr(u64)]
pub enum ParameterBytes {
	Path = 1,
	#[num_enum(catch_all)]
	Unknown(u64),
}

/// Key/value parameters attached to setup, announce and subscribe messages.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
	vars: BTreeMap<ParameterVarInt, u64>,
	bytes: BTreeMap<ParameterBytes, Vec<u8>>,
}

impl Decode for Parameters {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let mut vars = BTreeMap::new();
		let mut bytes = BTreeMap::new();

		let count = u64::decode(r)?;
		if count > MAX_PARAMS {
			return Err(DecodeError::TooMany);
		}

		for _ in 0..count {
			let kind = u64::decode(r)?;

			if kind % 2 == 0 {
				match vars.entry(ParameterVarInt::from(kind)) {
					btree_map::Entry::Occupied(_) => return Err(DecodeError::Duplicate),
					btree_map::Entry::Vacant(entry) => entry.insert(u64::decode(r)?),
				};
			} else {
				match bytes.entry(ParameterBytes::from(kind)) {
					btree_map::Entry::Occupied(_) => return Err(DecodeError::Duplicate),
					btree_map::Entry::Vacant(entry) => entry.insert(Vec::<u8>::decode(r)?),
				};
			}
		}

		Ok(Parameters { vars, bytes })
	}
}

impl Encode for Parameters {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) {
		(self.vars.len() + self.bytes.len()).encode(w);

		for (kind, value) in self.vars.iter() {
			u64::from(*kind).encode(w);
			value.encode(w);
		}

		for (kind, value) in self.bytes.iter() {
			u64::from(*kind).encode(w);
			value.encode(w);
		}
	}
}

impl Parameters {
	pub fn get_varint(&self, kind: ParameterVarInt) -> Option<u64> {
		self.vars.get(&kind).copied()
	}

	pub fn set_varint(&mut self, kind: ParameterVarInt, value: u64) {
		self.vars.insert(kind, value);
	}

	pub fn get_bytes(&self, kind: ParameterBytes) -> Option<&[u8]> {
		self.bytes.get(&kind).map(|v| v.as_slice())
	}

	pub fn set_bytes(&mut self, kind: ParameterBytes, value: Vec<u8>) {
		self.bytes.insert(kind, value);
	}

	/// The advertised role, if any.
	pub fn role(&self) -> Result<Option<Role>, Error> {
		match self.get_varint(ParameterVarInt::Role) {
			Some(role) => Role::try_from(role).map(Some).map_err(|_| Error::InvalidRole(role)),
			None => Ok(None),
		}
	}

	pub fn set_role(&mut self, role: Role) {
		self.set_varint(ParameterVarInt::Role, role.into());
	}

	pub fn is_empty(&self) -> bool {
		self.vars.is_empty() && self.bytes.is_empty()
	}
}
