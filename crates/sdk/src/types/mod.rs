mod event;
mod market;

use std::fmt::Display;

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
pub use event::*;
pub use market::Market;

/// Handle of an offer, unique within one offer list.
pub type OfferId = U256;

/// Discretized log-price coordinate of an offer.
/// Lower tick means better price for the taker.
pub type Tick = i32;

/// Instant in chain history the event batch is up to date with.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct StateInstant {
    block_number: u64,
    block_timestamp: u64,
}

impl StateInstant {
    pub fn new(block_number: u64, block_timestamp: u64) -> Self {
        Self { block_number, block_timestamp }
    }

    pub fn block_number(&self) -> u64 { self.block_number }

    pub fn block_timestamp(&self) -> u64 { self.block_timestamp }

    pub fn next(&self) -> Self {
        Self { block_number: self.block_number + 1, block_timestamp: self.block_timestamp }
    }
}

impl Display for StateInstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match DateTime::<Utc>::from_timestamp(self.block_timestamp as i64, 0) {
            Some(ts) if self.block_timestamp > 0 => {
                write!(f, "#{} @ {}", self.block_number, ts.format("%Y-%m-%d %H:%M:%S"))
            },
            _ => write!(f, "#{}", self.block_number),
        }
    }
}
