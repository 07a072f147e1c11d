//! Doubles of the chain for driving pools without a node.

mod logs;
mod reader;

pub use logs::LogBuilder;
pub use reader::{MockReader, OfferSpec};
