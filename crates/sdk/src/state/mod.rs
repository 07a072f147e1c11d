//! Order book replication.
//!
//! [`EventPool`] keeps a bounded, block-indexed [`SnapshotHistory`] of one
//! market's [`PoolState`]. The history is seeded by [`StateFetcher`] through
//! a [`BatchReader`] and advanced by applying the order book contract's logs.
//! [`PoolRegistry`] creates pools on demand and remembers the markets which
//! do not exist.

mod book;
mod fetcher;
mod handlers;
mod history;
mod nesting;
mod pool;
mod registry;
mod router;
#[cfg(feature = "display")]
mod view;

pub use book::{DEFAULT_KILO_OFFER_GASBASE, Offer, OfferDetail, PoolState};
pub use fetcher::{BatchReader, MulticallReader, StateFetcher};
pub use history::SnapshotHistory;
pub use nesting::OrderNesting;
pub use pool::EventPool;
pub use registry::PoolRegistry;
#[cfg(feature = "display")]
pub use view::PoolStateView;
