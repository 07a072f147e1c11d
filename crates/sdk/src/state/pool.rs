use alloy::{primitives::Address, rpc::types::Log};
use tracing::{debug, warn};

use super::{
    BatchReader, OrderNesting, PoolState, SnapshotHistory, StateFetcher, handlers,
    router::{EventRouter, Route},
};
use crate::{
    Chain, PoolConfig,
    error::DexError,
    types::{self, BookEvent, Market},
};

/// Replica of one market's order book.
///
/// Seeded from the reader contract by [`EventPool::initialize`], then kept up
/// to date by feeding it the order book contract's logs in chain order with
/// [`EventPool::on_log`]. Logs of other markets may be fed as well, they only
/// advance the block the latest snapshot is valid for.
///
/// Pool is driven from a single task: `initialize` borrows it mutably for the
/// whole fetch, so logs arriving in the meantime have to be buffered by the
/// caller and fed once it resolves.
#[derive(Clone, derive_more::Debug)]
pub struct EventPool {
    dex_key: String,
    market: Market,
    #[debug(skip)]
    fetcher: StateFetcher,
    #[debug(skip)]
    router: EventRouter,
    #[debug(skip)]
    history: SnapshotHistory,
    nesting: OrderNesting,
    seeded_at: Option<u64>,
    last_log: Option<(u64, u64)>,
    init_failed: bool,
    init_retry_attempts: u32,
}

impl EventPool {
    pub fn new(dex_key: &str, chain: &Chain, market: Market, config: &PoolConfig) -> Self {
        Self {
            dex_key: dex_key.to_string(),
            market,
            fetcher: StateFetcher::new(chain.reader(), market, config.page_size()),
            router: EventRouter::new(&market),
            history: SnapshotHistory::new(config.retained_snapshots()),
            nesting: OrderNesting::default(),
            seeded_at: None,
            last_log: None,
            init_failed: false,
            init_retry_attempts: 0,
        }
    }

    /// Market the pool replicates.
    pub fn market(&self) -> Market { self.market }

    /// On-chain key of the market: outbound (destination) token, inbound
    /// (source) token, tick spacing.
    pub fn market_key(&self) -> (Address, Address, u64) { self.market.key() }

    /// Key correlating quotes back to this pool.
    pub fn cache_key(&self) -> String { self.market.cache_key(&self.dex_key) }

    /// Whether the last initialization attempt failed with a transient error.
    pub fn init_failed(&self) -> bool { self.init_failed }

    pub fn init_retry_attempts(&self) -> u32 { self.init_retry_attempts }

    /// Whether the pool was seeded and its last initialization succeeded.
    pub fn is_ready(&self) -> bool { self.seeded_at.is_some() && !self.init_failed }

    pub(crate) fn mark_init_failed(&mut self) { self.init_failed = true; }

    /// Counts one more get-or-create request served while the pool is in
    /// failed state, returning the updated count.
    pub(crate) fn next_retry_attempt(&mut self) -> u32 {
        self.init_retry_attempts = self.init_retry_attempts.wrapping_add(1);
        self.init_retry_attempts
    }

    /// Block the current history was seeded from, `None` until the first
    /// successful initialization.
    pub fn seeded_at(&self) -> Option<u64> { self.seeded_at }

    pub fn history(&self) -> &SnapshotHistory { &self.history }

    pub fn nesting(&self) -> &OrderNesting { &self.nesting }

    /// (Re)builds the book from the reader contract as of `block_number`.
    ///
    /// On success the history is replaced by the fetched snapshot and the
    /// nested-order bookkeeping is reset. On [`DexError::MarketNotFound`] the
    /// market should be considered dead. Any other error marks the pool as
    /// failed and keeps the previous history, if any, in place.
    pub async fn initialize<R: BatchReader>(
        &mut self,
        reader: &R,
        block_number: u64,
    ) -> Result<(), DexError> {
        match self.fetcher.try_fetch(reader, block_number).await {
            Ok(state) => {
                self.history.clear();
                self.history.insert(state);
                self.nesting.reset();
                self.seeded_at = Some(block_number);
                self.last_log = None;
                self.init_failed = false;
                self.init_retry_attempts = 0;
                Ok(())
            },
            Err(err) if err.is_permanent() => Err(err),
            Err(err) => {
                self.init_failed = true;
                Err(err)
            },
        }
    }

    /// Snapshot valid at `block_number`, `None` if the pool knows nothing
    /// about that block.
    pub fn get_state(&self, block_number: u64) -> Option<&PoolState> {
        self.history.at_or_before(block_number)
    }

    /// Most recent snapshot.
    pub fn latest_state(&self) -> Option<&PoolState> { self.history.latest() }

    /// Block and index of the last log taken into account since seeding.
    pub fn last_log(&self) -> Option<(u64, u64)> { self.last_log }

    /// Applies the log to the latest snapshot and stores the result at the
    /// log's block.
    ///
    /// Returns the event applied, if the log was one of this market's book
    /// events. Logs which cannot be decoded are logged and skipped. Logs
    /// removed by a reorg, or at or before the last log taken into account,
    /// are ignored.
    pub fn on_log(&mut self, log: &Log) -> Option<types::EventContext<BookEvent>> {
        let Some(block_number) = log.block_number else {
            warn!(market = %self.market, "log without block number, ignoring");
            return None;
        };
        if log.removed {
            warn!(
                market = %self.market,
                block_number,
                log_index = log.log_index,
                "log removed by reorg, ignoring"
            );
            return None;
        }
        let Some(latest) = self.history.latest() else {
            debug!(market = %self.market, block_number, "pool not initialized, ignoring log");
            return None;
        };
        let position = log.log_index.map(|log_index| (block_number, log_index));
        if block_number < latest.block_number()
            || self.seeded_at.is_some_and(|seeded| block_number <= seeded)
            || position.zip(self.last_log).is_some_and(|(position, last)| position <= last)
        {
            debug!(
                market = %self.market,
                block_number,
                log_index = log.log_index,
                latest = latest.block_number(),
                "log already reflected in state, ignoring"
            );
            return None;
        }

        let applied = match self.router.route(log) {
            Route::Apply(event) => {
                let next = handlers::apply(latest.clone(), &mut self.nesting, &event);
                self.history.insert(next.at_block(block_number));
                Some(types::EventContext::new(
                    block_number,
                    log.transaction_hash.unwrap_or_default(),
                    log.transaction_index.unwrap_or_default(),
                    log.log_index.unwrap_or_default(),
                    event,
                ))
            },
            Route::Foreign | Route::Unhandled | Route::Malformed => {
                if block_number > latest.block_number() {
                    let next = latest.clone().at_block(block_number);
                    self.history.insert(next);
                }
                None
            },
        };
        if position.is_some() {
            self.last_log = position;
        }
        applied
    }

    /// Applies logs of one block in order, returning the events applied.
    pub fn on_logs<'a>(
        &mut self,
        logs: impl IntoIterator<Item = &'a Log>,
    ) -> Vec<types::EventContext<BookEvent>> {
        logs.into_iter()
            .filter_map(|log| self.on_log(log))
            .collect()
    }
}
