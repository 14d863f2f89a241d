use std::sync::Arc;

use num_enum::IntoPrimitive;

use crate::coding;

/// A transport error that can be shared between tasks.
pub trait SendSyncError: std::error::Error + Send + Sync {}

impl<T> SendSyncError for T where T: std::error::Error + Send + Sync {}

/// Session close codes, sent to the remote when the connection is terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive)]
#[repr(u32)]
pub enum ErrorCode {
	NoError = 0x0,
	InternalError = 0x1,
	ProtocolViolation = 0x3,
	GoAwayTimeout = 0x10,
}

/// A list of possible errors that can occur during the session.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
	#[error("transport error: {0}")]
	Transport(Arc<dyn SendSyncError>),

	#[error("decode error: {0}")]
	Decode(#[from] coding::DecodeError),

	#[error("unsupported versions: client={0:?} server={1:?}")]
	Version(coding::Versions, coding::Versions),

	#[error("missing role parameter")]
	MissingRole,

	#[error("invalid role: {0}")]
	InvalidRole(u64),

	#[error("unexpected message: {0:#x}")]
	UnexpectedMessage(u64),

	#[error("unsolicited response")]
	UnsolicitedResponse,

	#[error("unknown track: {0}")]
	UnknownTrack(u64),

	#[error("duplicate request")]
	Duplicate,

	#[error("invalid name")]
	InvalidName,

	#[error("rejected: code={code} reason={reason}")]
	Rejected { code: u64, reason: String },

	#[error("timeout")]
	Timeout,

	#[error("going away")]
	GoingAway,

	#[error("closed")]
	Closed,
}

impl Error {
	/// An integer code that is sent over the wire when closing the session.
	pub fn to_code(&self) -> u32 {
		let code = match self {
			Self::Closed => ErrorCode::NoError,
			Self::Transport(_) | Self::Timeout => ErrorCode::InternalError,
			Self::GoingAway => ErrorCode::GoAwayTimeout,
			Self::Decode(_)
			| Self::Version(..)
			| Self::MissingRole
			| Self::InvalidRole(_)
			| Self::UnexpectedMessage(_)
			| Self::UnsolicitedResponse
			| Self::UnknownTrack(_)
			| Self::Duplicate => ErrorCode::ProtocolViolation,
			Self::InvalidName | Self::Rejected { .. } => ErrorCode::InternalError,
		};

		code.into()
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Error::Transport(Arc::new(err))
	}
}
