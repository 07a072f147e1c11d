//! [`Mangrove`] order book SDK.
//!
//! # Overview
//!
//! Block-indexed in-memory replica of on-chain order book markets.
//!
//! Use [`state::PoolRegistry`] (or a single [`state::EventPool`]) to seed a
//! market's book with a batched read of the reader contract, then feed it the
//! order book contract's logs, e.g. from [`stream::raw`], to keep the book up
//! to date. Recent snapshots stay queryable by block number.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Initial state is a single `offerList` page ([`PoolConfig::page_size`]),
//!   markets with more resting offers are truncated.
//!
//! * Nested-order bookkeeping is not persisted, so a pool must not be cold
//!   started while an order is still executing at the requested block.
//!
//! * Current version relies on log polling to implement reliably continuous
//!   stream of events.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for state types. |
//! | `testing` | yes | Enables [`testing`] module. |
//!
//! [`Mangrove`]: https://mangrove.exchange

pub mod abi;
pub mod error;
pub mod state;
pub mod stream;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;

use alloy::primitives::{Address, address};

/// Default number of calls to get-or-create between two initialization
/// attempts of a pool which failed to initialize.
pub const DEFAULT_INIT_RETRY_FREQUENCY: u32 = 10;

/// Default number of snapshots retained per pool.
pub const DEFAULT_RETAINED_SNAPSHOTS: usize = 30;

/// Default number of offers requested from the reader contract.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Chain the order book is deployed on.
#[derive(Clone, Debug)]
pub struct Chain {
    chain_id: u64,
    mangrove: Address,
    reader: Address,
    multicall: Address,
}

impl Chain {
    pub fn arbitrum() -> Self {
        Self {
            chain_id: 42161,
            mangrove: address!("0x109d9CDFA4aC534354873EF634EF63C235F93f61"),
            reader: address!("0x7E108d7C9CADb03E026075Bf242aC2353d0D1875"),
            multicall: address!("0xcA11bde05977b3631167028862bE2a173976CA11"),
        }
    }

    pub fn custom(chain_id: u64, mangrove: Address, reader: Address, multicall: Address) -> Self {
        Self { chain_id, mangrove, reader, multicall }
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    /// Order book contract emitting offer and order events.
    pub fn mangrove(&self) -> Address { self.mangrove }

    /// Reader contract serving `offerList` views.
    pub fn reader(&self) -> Address { self.reader }

    /// Multicall3 contract used to batch remote reads.
    pub fn multicall(&self) -> Address { self.multicall }
}

/// Per-pool tuning shared by all pools of a [`state::PoolRegistry`].
#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    init_retry_frequency: u32,
    retained_snapshots: usize,
    page_size: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            init_retry_frequency: DEFAULT_INIT_RETRY_FREQUENCY,
            retained_snapshots: DEFAULT_RETAINED_SNAPSHOTS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PoolConfig {
    /// Only every `frequency`-th get-or-create call on a pool that failed to
    /// initialize re-attempts the initialization, the others serve the
    /// last known state.
    pub fn with_init_retry_frequency(mut self, frequency: u32) -> Self {
        self.init_retry_frequency = frequency.max(1);
        self
    }

    /// Maximal number of snapshots kept per pool, oldest evicted first.
    pub fn with_retained_snapshots(mut self, retained: usize) -> Self {
        self.retained_snapshots = retained.max(1);
        self
    }

    /// Number of offers requested by the initial `offerList` read.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn init_retry_frequency(&self) -> u32 { self.init_retry_frequency }

    pub fn retained_snapshots(&self) -> usize { self.retained_snapshots }

    pub fn page_size(&self) -> u64 { self.page_size }
}
