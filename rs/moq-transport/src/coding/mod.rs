//! Low-level encoding and decoding of the wire format.
//!
//! Every integer is a QUIC varint and every string or byte payload is length prefixed.

mod decode;
mod encode;
mod reader;
mod stream;
mod varint;
mod version;
mod writer;

pub use decode::*;
pub use encode::*;
pub use reader::*;
pub use stream::*;
pub use varint::*;
pub use version::*;
pub use writer::*;
