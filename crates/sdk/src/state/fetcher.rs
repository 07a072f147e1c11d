use alloy::{
    eips::BlockId,
    primitives::{Address, U256},
    providers::Provider,
    sol_types::SolCall,
};
use tracing::{error, warn};

use super::PoolState;
use crate::{
    Chain,
    abi::{MgvReader, Multicall3},
    error::DexError,
    types::Market,
};

/// Batched read access to the chain, pinned to a block.
///
/// Implemented by [`MulticallReader`] on top of any [`Provider`], and by
/// in-memory doubles in tests.
pub trait BatchReader {
    /// Current chain head.
    fn block_number(&self) -> impl Future<Output = Result<u64, DexError>>;

    /// Executes all calls as of `block_number`. Failure of an individual call
    /// is reported in its result, not as an error.
    fn try_aggregate(
        &self,
        calls: Vec<Multicall3::Call>,
        block_number: u64,
    ) -> impl Future<Output = Result<Vec<Multicall3::Result>, DexError>>;
}

/// [`BatchReader`] aggregating calls with the chain's Multicall3 contract.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::RetryBackoffLayer`].
#[derive(Clone, Debug)]
pub struct MulticallReader<P> {
    multicall: Address,
    provider: P,
}

impl<P> MulticallReader<P> {
    pub fn new(chain: &Chain, provider: P) -> Self {
        Self { multicall: chain.multicall(), provider }
    }
}

impl<P: Provider> BatchReader for MulticallReader<P> {
    async fn block_number(&self) -> Result<u64, DexError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn try_aggregate(
        &self,
        calls: Vec<Multicall3::Call>,
        block_number: u64,
    ) -> Result<Vec<Multicall3::Result>, DexError> {
        let multicall = Multicall3::new(self.multicall, &self.provider);
        Ok(multicall
            .tryAggregate(false, calls)
            .block(BlockId::number(block_number))
            .call()
            .await?)
    }
}

/// Rebuilds a market's book from the reader contract.
///
/// Requests a single `offerList` page starting at the best offer, offers past
/// the page are not fetched.
#[derive(Clone, Debug)]
pub struct StateFetcher {
    market: Market,
    page_size: u64,
    call: Multicall3::Call,
}

impl StateFetcher {
    pub fn new(reader: Address, market: Market, page_size: u64) -> Self {
        let call_data = MgvReader::offerListCall {
            olKey: market.ol_key(),
            fromId: U256::ZERO,
            maxOffers: U256::from(page_size),
        }
        .abi_encode();
        Self {
            market,
            page_size,
            call: Multicall3::Call { target: reader, callData: call_data.into() },
        }
    }

    pub fn market(&self) -> Market { self.market }

    /// Batch describing the market's book: exactly one `offerList` call.
    pub fn request(&self) -> Vec<Multicall3::Call> { vec![self.call.clone()] }

    /// Book as of `block_number`.
    ///
    /// Fails with [`DexError::MarketNotFound`] if the reader call reverts,
    /// with other errors if the batch could not be executed or decoded.
    pub async fn try_fetch<R: BatchReader>(
        &self,
        reader: &R,
        block_number: u64,
    ) -> Result<PoolState, DexError> {
        let result = reader
            .try_aggregate(self.request(), block_number)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DexError::Decode("empty batch response".to_string()))?;
        if !result.success {
            return Err(DexError::MarketNotFound(self.market));
        }

        let list = MgvReader::offerListCall::abi_decode_returns(&result.returnData)?;
        if list.offerIds.len() as u64 >= self.page_size && !list.nextOffer.is_zero() {
            warn!(
                market = %self.market,
                block_number,
                page_size = self.page_size,
                "offer list does not fit a single page, book is truncated"
            );
        }

        // Tagged with the requested block even if served from another node view
        PoolState::from_offer_list(block_number, &list)
    }

    /// Book as of `block_number`, or an empty book at that block if it could
    /// not be fetched for any reason.
    pub async fn fetch<R: BatchReader>(&self, reader: &R, block_number: u64) -> PoolState {
        match self.try_fetch(reader, block_number).await {
            Ok(state) => state,
            Err(err) => {
                error!(market = %self.market, block_number, %err, "failed to fetch pool state");
                PoolState::empty(block_number)
            },
        }
    }
}
