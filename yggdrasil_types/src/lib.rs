//! Wire vocabulary and value model of the Yggdrasil object-graph format.

mod error;
pub mod serde;
pub mod types;

pub use error::*;
