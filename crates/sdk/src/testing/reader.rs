use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use alloy::{
    primitives::{Address, Bytes, I256, U256, address},
    sol_types::SolCall,
    transports::TransportErrorKind,
};
use dashmap::DashMap;

use crate::{
    abi::{MgvReader, Multicall3, OLKey, OfferDetailUnpacked, OfferUnpacked},
    error::DexError,
    state::BatchReader,
    types::{Market, Tick},
};

/// Resting offer served by [`MockReader`].
#[derive(Clone, Copy, Debug)]
pub struct OfferSpec {
    pub id: u64,
    pub tick: Tick,
    pub gives: u64,
    pub maker: Address,
    pub gasreq: u64,
    pub kilo_offer_gasbase: u64,
    pub gasprice: u64,
}

impl OfferSpec {
    pub const MAKER: Address = address!("0x00000000000000000000000000000000000000bb");
    pub const GASREQ: u64 = 150_000;
    pub const KILO_OFFER_GASBASE: u64 = 300;
    pub const GASPRICE: u64 = 3;

    pub fn new(id: u64, tick: Tick, gives: u64) -> Self {
        Self {
            id,
            tick,
            gives,
            maker: Self::MAKER,
            gasreq: Self::GASREQ,
            kilo_offer_gasbase: Self::KILO_OFFER_GASBASE,
            gasprice: Self::GASPRICE,
        }
    }
}

/// In-memory [`BatchReader`] serving `offerList` views of configured markets.
///
/// Calls for markets which were not configured report failure, the way the
/// reader contract reverts for unknown offer lists. Offers are served in the
/// configured order, truncated to the requested page size.
#[derive(Debug, Default)]
pub struct MockReader {
    head: AtomicU64,
    markets: DashMap<OLKey, (U256, Vec<OfferSpec>)>,
    failing: AtomicBool,
    corrupt: AtomicBool,
    calls: AtomicUsize,
}

impl MockReader {
    pub fn new(head: u64) -> Self { Self { head: AtomicU64::new(head), ..Default::default() } }

    pub fn with_market(self, market: Market, next_offer: u64, offers: Vec<OfferSpec>) -> Self {
        self.set_market(market, next_offer, offers);
        self
    }

    /// Every request fails with a transport error.
    pub fn failing(self) -> Self {
        self.set_failing(true);
        self
    }

    /// Calls of configured markets succeed with data which does not decode.
    pub fn corrupt(self) -> Self {
        self.set_corrupt(true);
        self
    }

    pub fn set_market(&self, market: Market, next_offer: u64, offers: Vec<OfferSpec>) {
        self.markets
            .insert(market.ol_key(), (U256::from(next_offer), offers));
    }

    pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

    pub fn set_corrupt(&self, corrupt: bool) { self.corrupt.store(corrupt, Ordering::SeqCst); }

    pub fn set_head(&self, head: u64) { self.head.store(head, Ordering::SeqCst); }

    /// Number of batches requested so far, failed ones included.
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    fn check(&self) -> Result<(), DexError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportErrorKind::custom_str("mock transport failure").into());
        }
        Ok(())
    }

    fn offer_list(&self, call: &Multicall3::Call) -> Multicall3::Result {
        let Ok(request) = MgvReader::offerListCall::abi_decode(&call.callData) else {
            return Multicall3::Result { success: false, returnData: Bytes::new() };
        };
        let Some(market) = self.markets.get(&request.olKey) else {
            return Multicall3::Result { success: false, returnData: Bytes::new() };
        };
        if self.corrupt.load(Ordering::SeqCst) {
            let garbage = Bytes::from_static(&[0xde, 0xad]);
            return Multicall3::Result { success: true, returnData: garbage };
        }
        let (next_offer, offers) = market.value();

        let page = offers
            .iter()
            .take(request.maxOffers.saturating_to())
            .collect::<Vec<_>>();
        let id_at = |idx: Option<usize>| {
            idx.and_then(|idx| page.get(idx))
                .map_or(U256::ZERO, |offer| U256::from(offer.id))
        };
        let list = MgvReader::offerListReturn {
            nextOffer: *next_offer,
            offerIds: page.iter().map(|offer| U256::from(offer.id)).collect(),
            offers: page
                .iter()
                .enumerate()
                .map(|(idx, offer)| OfferUnpacked {
                    prev: id_at(idx.checked_sub(1)),
                    next: id_at(Some(idx + 1)),
                    tick: I256::try_from(offer.tick).unwrap_or_default(),
                    gives: U256::from(offer.gives),
                })
                .collect(),
            details: page
                .iter()
                .map(|offer| OfferDetailUnpacked {
                    maker: offer.maker,
                    gasreq: U256::from(offer.gasreq),
                    kilo_offer_gasbase: U256::from(offer.kilo_offer_gasbase),
                    gasprice: U256::from(offer.gasprice),
                })
                .collect(),
        };
        Multicall3::Result {
            success: true,
            returnData: MgvReader::offerListCall::abi_encode_returns(&list).into(),
        }
    }
}

impl BatchReader for MockReader {
    async fn block_number(&self) -> Result<u64, DexError> {
        self.check()?;
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn try_aggregate(
        &self,
        calls: Vec<Multicall3::Call>,
        _block_number: u64,
    ) -> Result<Vec<Multicall3::Result>, DexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(calls.iter().map(|call| self.offer_list(call)).collect())
    }
}
