//! Wire message definitions and the frame codec.

pub mod codec;
pub mod types;

pub use codec::{Decoded, decode, encode};
pub use types::{Progress, WireMessage};
