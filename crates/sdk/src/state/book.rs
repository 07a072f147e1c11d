use alloy::primitives::{Address, U256};
use itertools::{Itertools, multiunzip};

use crate::{
    abi::{MgvReader::offerListReturn, OfferDetailUnpacked, OfferUnpacked},
    error::DexError,
    types::{OfferId, Tick},
};

/// Gas base (in thousands of gas units) assumed for offers written by
/// events, which do not carry it.
pub const DEFAULT_KILO_OFFER_GASBASE: u64 = 250;

/// Resting offer in the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offer {
    tick: Tick,
    gives: U256,
    // Neighbours in global book order.
    // Available from snapshot, None for offers written by events.
    prev: Option<OfferId>,
    next: Option<OfferId>,
}

impl Offer {
    pub(crate) fn from_snapshot(offer: &OfferUnpacked) -> Result<Self, DexError> {
        let tick = Tick::try_from(offer.tick)
            .map_err(|err| DexError::Decode(format!("offer tick {}: {}", offer.tick, err)))?;
        Ok(Self {
            tick,
            gives: offer.gives,
            // Reader uses 0 for "no neighbour"
            prev: (!offer.prev.is_zero()).then_some(offer.prev),
            next: (!offer.next.is_zero()).then_some(offer.next),
        })
    }

    pub(crate) fn written(tick: Tick, gives: U256) -> Self {
        Self { tick, gives, prev: None, next: None }
    }

    pub fn tick(&self) -> Tick { self.tick }

    /// Amount of outbound token offered.
    pub fn gives(&self) -> U256 { self.gives }

    pub fn prev(&self) -> Option<OfferId> { self.prev }

    pub fn next(&self) -> Option<OfferId> { self.next }
}

/// Execution metadata of an offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OfferDetail {
    maker: Address,
    gasreq: u64,
    kilo_offer_gasbase: u64,
    gasprice: u64,
}

impl OfferDetail {
    pub(crate) fn from_snapshot(detail: &OfferDetailUnpacked) -> Self {
        Self {
            maker: detail.maker,
            gasreq: detail.gasreq.saturating_to(),
            kilo_offer_gasbase: detail.kilo_offer_gasbase.saturating_to(),
            gasprice: detail.gasprice.saturating_to(),
        }
    }

    pub(crate) fn written(
        maker: Address,
        gasreq: u64,
        kilo_offer_gasbase: u64,
        gasprice: u64,
    ) -> Self {
        Self { maker, gasreq, kilo_offer_gasbase, gasprice }
    }

    pub fn maker(&self) -> Address { self.maker }

    pub fn gasreq(&self) -> u64 { self.gasreq }

    /// Gas overhead of the offer in thousands of gas units.
    pub fn kilo_offer_gasbase(&self) -> u64 { self.kilo_offer_gasbase }

    /// Gas overhead of the offer in gas units.
    pub fn offer_gasbase(&self) -> u64 { self.kilo_offer_gasbase.saturating_mul(1000) }

    pub fn gasprice(&self) -> u64 { self.gasprice }
}

/// Snapshot of one market's order book at a particular block.
///
/// Offers are kept as three parallel sequences where index `i` of each
/// describes the same offer, sorted by ascending tick (best price first),
/// offers at equal tick in arrival order. Offer IDs are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolState {
    block_number: u64,
    next_offer: OfferId,
    offer_ids: Vec<OfferId>,
    offers: Vec<Offer>,
    offers_detail: Vec<OfferDetail>,
}

impl PoolState {
    /// Book without offers, as known at `block_number`.
    pub fn empty(block_number: u64) -> Self { Self { block_number, ..Default::default() } }

    pub(crate) fn from_offer_list(
        block_number: u64,
        list: &offerListReturn,
    ) -> Result<Self, DexError> {
        if list.offerIds.len() != list.offers.len() || list.offers.len() != list.details.len() {
            return Err(DexError::Decode(format!(
                "offer list of misaligned length: {} ids, {} offers, {} details",
                list.offerIds.len(),
                list.offers.len(),
                list.details.len()
            )));
        }

        let mut triples = Vec::with_capacity(list.offerIds.len());
        for ((id, offer), detail) in list.offerIds.iter().zip(&list.offers).zip(&list.details) {
            triples.push((*id, Offer::from_snapshot(offer)?, OfferDetail::from_snapshot(detail)));
        }
        if !triples.iter().map(|(_, offer, _)| offer.tick).tuple_windows().all(|(a, b)| a <= b) {
            // Stable, so equal ticks keep the reader's order
            triples.sort_by_key(|(_, offer, _)| offer.tick);
        }
        let (offer_ids, offers, offers_detail): (Vec<_>, Vec<_>, Vec<_>) = multiunzip(triples);

        Ok(Self { block_number, next_offer: list.nextOffer, offer_ids, offers, offers_detail })
    }

    /// Block the snapshot is valid for.
    pub fn block_number(&self) -> u64 { self.block_number }

    /// Next offer ID hint as reported by the reader. Advisory only.
    pub fn next_offer(&self) -> OfferId { self.next_offer }

    pub fn offer_ids(&self) -> &[OfferId] { &self.offer_ids }

    pub fn offers(&self) -> &[Offer] { &self.offers }

    pub fn offers_detail(&self) -> &[OfferDetail] { &self.offers_detail }

    pub fn len(&self) -> usize { self.offer_ids.len() }

    pub fn is_empty(&self) -> bool { self.offer_ids.is_empty() }

    /// Offers in book order, best price first.
    pub fn iter(&self) -> impl Iterator<Item = (OfferId, &Offer, &OfferDetail)> {
        self.offer_ids
            .iter()
            .zip(&self.offers)
            .zip(&self.offers_detail)
            .map(|((id, offer), detail)| (*id, offer, detail))
    }

    /// Index of the offer in book order.
    pub fn position(&self, id: OfferId) -> Option<usize> {
        self.offer_ids.iter().position(|i| *i == id)
    }

    pub fn offer(&self, id: OfferId) -> Option<(&Offer, &OfferDetail)> {
        self.position(id)
            .map(|idx| (&self.offers[idx], &self.offers_detail[idx]))
    }

    /// Offer with the lowest tick.
    pub fn best_offer(&self) -> Option<(OfferId, &Offer, &OfferDetail)> { self.iter().next() }

    /// Total outbound volume offered.
    pub fn total_gives(&self) -> U256 {
        self.offers
            .iter()
            .fold(U256::ZERO, |acc, offer| acc.saturating_add(offer.gives))
    }

    /// Checks the sequences are aligned, sorted by tick and free of
    /// duplicate IDs.
    pub fn is_consistent(&self) -> bool {
        self.offer_ids.len() == self.offers.len()
            && self.offers.len() == self.offers_detail.len()
            && self.offers.iter().tuple_windows().all(|(a, b)| a.tick <= b.tick)
            && self.offer_ids.iter().all_unique()
    }

    pub(crate) fn at_block(mut self, block_number: u64) -> Self {
        self.block_number = block_number;
        self
    }

    /// Removes the offer, returning its detail if it was in the book.
    pub(crate) fn remove(&mut self, id: OfferId) -> Option<OfferDetail> {
        let idx = self.position(id)?;
        self.offer_ids.remove(idx);
        self.offers.remove(idx);
        Some(self.offers_detail.remove(idx))
    }

    /// Inserts the offer after all offers with lower or equal tick.
    /// The ID must not be in the book.
    pub(crate) fn insert(&mut self, id: OfferId, offer: Offer, detail: OfferDetail) {
        let idx = self.offers.partition_point(|o| o.tick <= offer.tick);
        self.offer_ids.insert(idx, id);
        self.offers.insert(idx, offer);
        self.offers_detail.insert(idx, detail);
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{I256, address};

    use super::*;

    const MAKER: Address = address!("0x00000000000000000000000000000000000000aa");

    fn id(n: u64) -> OfferId { U256::from(n) }

    fn detail() -> OfferDetail {
        OfferDetail::written(MAKER, 100_000, DEFAULT_KILO_OFFER_GASBASE, 1)
    }

    fn with_offers(offers: &[(u64, Tick)]) -> PoolState {
        let mut state = PoolState::empty(1);
        for (n, tick) in offers {
            state.insert(id(*n), Offer::written(*tick, U256::from(10)), detail());
        }
        state
    }

    #[test]
    fn test_insert_keeps_tick_order() {
        let state = with_offers(&[(1, 5), (2, -3), (3, 10), (4, 0)]);
        assert_eq!(state.offer_ids(), &[id(2), id(4), id(1), id(3)]);
        assert!(state.is_consistent());
        assert_eq!(state.best_offer().map(|(id, ..)| id), Some(id(2)));
    }

    #[test]
    fn test_equal_ticks_keep_arrival_order() {
        let state = with_offers(&[(1, 7), (2, 7), (3, 6), (4, 7)]);
        assert_eq!(state.offer_ids(), &[id(3), id(1), id(2), id(4)]);
    }

    #[test]
    fn test_remove() {
        let mut state = with_offers(&[(1, 1), (2, 2), (3, 3)]);
        assert!(state.remove(id(2)).is_some());
        assert!(state.remove(id(2)).is_none());
        assert_eq!(state.offer_ids(), &[id(1), id(3)]);
        assert_eq!(state.offers().len(), 2);
        assert_eq!(state.offers_detail().len(), 2);
        assert_eq!(state.total_gives(), U256::from(20));
    }

    #[test]
    fn test_from_offer_list() {
        let list = offerListReturn {
            nextOffer: U256::from(9),
            offerIds: vec![id(4), id(8)],
            offers: vec![
                OfferUnpacked {
                    prev: U256::ZERO,
                    next: id(8),
                    tick: I256::try_from(-20).unwrap(),
                    gives: U256::from(1000),
                },
                OfferUnpacked {
                    prev: id(4),
                    next: U256::ZERO,
                    tick: I256::try_from(15).unwrap(),
                    gives: U256::from(500),
                },
            ],
            details: vec![
                OfferDetailUnpacked {
                    maker: MAKER,
                    gasreq: U256::from(50_000),
                    kilo_offer_gasbase: U256::from(200),
                    gasprice: U256::from(3),
                },
                OfferDetailUnpacked {
                    maker: MAKER,
                    gasreq: U256::from(60_000),
                    kilo_offer_gasbase: U256::from(200),
                    gasprice: U256::from(4),
                },
            ],
        };

        let state = PoolState::from_offer_list(42, &list).unwrap();
        assert_eq!(state.block_number(), 42);
        assert_eq!(state.next_offer(), U256::from(9));
        assert_eq!(state.offer_ids(), &[id(4), id(8)]);
        assert_eq!(state.offers()[0].tick(), -20);
        assert_eq!(state.offers()[0].prev(), None);
        assert_eq!(state.offers()[0].next(), Some(id(8)));
        assert_eq!(state.offers_detail()[1].gasreq(), 60_000);
        assert_eq!(state.offers_detail()[1].offer_gasbase(), 200_000);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_from_unsorted_offer_list() {
        let offer = |tick: i64| OfferUnpacked {
            prev: U256::ZERO,
            next: U256::ZERO,
            tick: I256::try_from(tick).unwrap(),
            gives: U256::from(1),
        };
        let detail = |gasreq: u64| OfferDetailUnpacked {
            maker: MAKER,
            gasreq: U256::from(gasreq),
            kilo_offer_gasbase: U256::ZERO,
            gasprice: U256::ZERO,
        };
        let list = offerListReturn {
            nextOffer: U256::ZERO,
            offerIds: vec![id(1), id(2), id(3)],
            offers: vec![offer(3), offer(-1), offer(3)],
            details: vec![detail(1), detail(2), detail(3)],
        };

        let state = PoolState::from_offer_list(1, &list).unwrap();
        assert_eq!(state.offer_ids(), &[id(2), id(1), id(3)]);
        // Triples move together
        assert_eq!(state.offers_detail().iter().map(|d| d.gasreq()).collect::<Vec<_>>(), vec![
            2, 1, 3
        ]);
    }

    #[test]
    fn test_misaligned_offer_list() {
        let list = offerListReturn {
            nextOffer: U256::ZERO,
            offerIds: vec![id(1)],
            offers: vec![],
            details: vec![],
        };
        assert!(matches!(PoolState::from_offer_list(1, &list), Err(DexError::Decode(_))));
    }
}
