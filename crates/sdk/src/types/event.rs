use alloy::primitives::{Address, TxHash, U256};

use super::{OfferId, StateInstant, Tick};

/// Order book event relevant to a single market, decoded from a log.
///
/// The set is closed: every kind the book reacts to has a variant, anything
/// else emitted by the contract is not a [`BookEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookEvent {
    /// Market order starts executing, possibly nested into another one.
    OrderStart,
    /// Innermost executing market order completed.
    OrderComplete,
    /// Offer created or updated.
    OfferWrite {
        id: OfferId,
        maker: Address,
        tick: Tick,
        gives: U256,
        gasreq: u64,
        gasprice: u64,
    },
    /// Offer removed by its maker.
    OfferRetract { id: OfferId },
    /// Offer taken successfully.
    OfferSuccess { id: OfferId },
    /// Offer taken successfully, maker's posthook returned data.
    OfferSuccessWithPosthookData { id: OfferId },
    /// Offer failed to deliver.
    OfferFail { id: OfferId },
    /// Offer failed to deliver, maker's posthook returned data.
    OfferFailWithPosthookData { id: OfferId },
}

impl BookEvent {
    /// Offer the event is about, if any.
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            BookEvent::OrderStart | BookEvent::OrderComplete => None,
            BookEvent::OfferWrite { id, .. }
            | BookEvent::OfferRetract { id }
            | BookEvent::OfferSuccess { id }
            | BookEvent::OfferSuccessWithPosthookData { id }
            | BookEvent::OfferFail { id }
            | BookEvent::OfferFailWithPosthookData { id } => Some(*id),
        }
    }
}

/// Event with the position of the log it was decoded from.
#[derive(Clone, Debug)]
pub struct EventContext<T> {
    block_number: u64,
    tx_hash: TxHash,
    tx_index: u64,
    log_index: u64,
    event: T,
}

impl<T> EventContext<T> {
    pub fn new(
        block_number: u64,
        tx_hash: TxHash,
        tx_index: u64,
        log_index: u64,
        event: T,
    ) -> Self {
        Self { block_number, tx_hash, tx_index, log_index, event }
    }

    pub fn block_number(&self) -> u64 { self.block_number }

    pub fn tx_hash(&self) -> TxHash { self.tx_hash }

    pub fn tx_index(&self) -> u64 { self.tx_index }

    pub fn log_index(&self) -> u64 { self.log_index }

    pub fn event(&self) -> &T { &self.event }

    pub fn into_event(self) -> T { self.event }

    /// Same position, different payload.
    pub fn pass<U>(&self, event: U) -> EventContext<U> {
        EventContext {
            block_number: self.block_number,
            tx_hash: self.tx_hash,
            tx_index: self.tx_index,
            log_index: self.log_index,
            event,
        }
    }
}

/// Events emitted within a single block.
#[derive(Clone, Debug)]
pub struct BlockEvents<T> {
    instant: StateInstant,
    events: Vec<T>,
}

impl<T> BlockEvents<T> {
    pub fn new(instant: StateInstant, events: Vec<T>) -> Self { Self { instant, events } }

    pub fn instant(&self) -> StateInstant { self.instant }

    pub fn events(&self) -> &[T] { &self.events }
}
