mod buffer;
mod produce;

pub use buffer::*;
pub use produce::*;
