use std::{collections::HashMap, sync::Arc};

use alloy::{primitives::Address, rpc::types::Log};
use dashmap::DashSet;
use tracing::{debug, trace, warn};

use super::{BatchReader, EventPool};
use crate::{
    Chain, PoolConfig,
    types::{BookEvent, EventContext, Market},
};

/// Get-or-create access to the pools of one order book deployment.
///
/// Pools are created and seeded on first request. A pool whose
/// initialization failed transiently keeps being served with its last known
/// state, and only every [`PoolConfig::init_retry_frequency`]-th request
/// re-attempts the initialization. Markets reported as nonexistent are
/// recorded in a set which can be shared between registries, and never
/// requested again.
#[derive(derive_more::Debug)]
pub struct PoolRegistry<R> {
    dex_key: String,
    chain: Chain,
    config: PoolConfig,
    #[debug(skip)]
    reader: R,
    // None marks a market known not to exist
    pools: HashMap<Market, Option<EventPool>>,
    missing: Arc<DashSet<String>>,
}

impl<R: BatchReader> PoolRegistry<R> {
    pub fn new(dex_key: &str, chain: Chain, config: PoolConfig, reader: R) -> Self {
        Self {
            dex_key: dex_key.to_string(),
            chain,
            config,
            reader,
            pools: HashMap::new(),
            missing: Arc::new(DashSet::new()),
        }
    }

    /// Shares the set of nonexistent markets, keyed by cache key, with other
    /// registries or call sites.
    pub fn with_missing_markets(mut self, missing: Arc<DashSet<String>>) -> Self {
        self.missing = missing;
        self
    }

    pub fn dex_key(&self) -> &str { &self.dex_key }

    pub fn chain(&self) -> &Chain { &self.chain }

    pub fn config(&self) -> &PoolConfig { &self.config }

    pub fn reader(&self) -> &R { &self.reader }

    /// Cache keys of the markets known not to exist.
    pub fn missing_markets(&self) -> &Arc<DashSet<String>> { &self.missing }

    /// Pool of the market trading `src` for `dest`, created and seeded at
    /// `block_number` (chain head if `None`) on first request.
    ///
    /// Returns `None` if the market does not exist. A returned pool may have
    /// failed to initialize, in which case its state is the last known one,
    /// possibly none at all.
    pub async fn get_pool(
        &mut self,
        src: Address,
        dest: Address,
        tick_spacing: u64,
        block_number: Option<u64>,
    ) -> Option<&mut EventPool> {
        let market = Market::new(src, dest, tick_spacing);
        let cache_key = market.cache_key(&self.dex_key);
        if self.missing.contains(&cache_key) {
            trace!(%market, "market is known not to exist");
            return None;
        }

        let frequency = self.config.init_retry_frequency();
        let slot = self.pools.entry(market).or_insert_with(|| {
            trace!(%market, dex = %self.dex_key, "creating pool");
            Some(EventPool::new(&self.dex_key, &self.chain, market, &self.config))
        });
        let pool = slot.as_mut()?;

        let initialize = if pool.init_failed() {
            pool.next_retry_attempt() % frequency == 0
        } else {
            pool.seeded_at().is_none()
        };
        if initialize {
            let block_number = match block_number {
                Some(block_number) => Some(block_number),
                None => match self.reader.block_number().await {
                    Ok(block_number) => Some(block_number),
                    Err(err) => {
                        warn!(%market, %err, "failed to resolve chain head");
                        pool.mark_init_failed();
                        None
                    },
                },
            };
            if let Some(block_number) = block_number {
                match pool.initialize(&self.reader, block_number).await {
                    Ok(()) => debug!(%market, block_number, "pool initialized"),
                    Err(err) if err.is_permanent() => {
                        warn!(%market, block_number, %err, "market does not exist");
                        // Losing a race here only costs a redundant attempt elsewhere
                        self.missing.insert(cache_key);
                        *slot = None;
                    },
                    Err(err) => warn!(
                        %market,
                        block_number,
                        attempts = pool.init_retry_attempts(),
                        %err,
                        "failed to initialize pool"
                    ),
                }
            }
        }

        self.pools.get_mut(&market).and_then(Option::as_mut)
    }

    /// Pool of the market if it was created and the market exists.
    pub fn pool(&self, market: &Market) -> Option<&EventPool> {
        self.pools.get(market).and_then(Option::as_ref)
    }

    /// Pools of the markets known to exist.
    pub fn pools(&self) -> impl Iterator<Item = &EventPool> { self.pools.values().flatten() }

    /// Feeds the log to every live pool, returning the events applied and
    /// the market of the pool each was applied to.
    ///
    /// Logs of other contracts are ignored.
    pub fn on_log(&mut self, log: &Log) -> Vec<(Market, EventContext<BookEvent>)> {
        if log.address() != self.chain.mangrove() {
            debug!(address = %log.address(), "log of another contract, ignoring");
            return Vec::new();
        }
        self.pools
            .values_mut()
            .flatten()
            .filter_map(|pool| pool.on_log(log).map(|ctx| (pool.market(), ctx)))
            .collect()
    }
}
