//! Delta handlers: apply one [`BookEvent`] to a snapshot.
//!
//! Handlers take the snapshot by value (a private copy of the stored one) and
//! return the next version. They run to completion synchronously, the only
//! side state they touch is the pool's [`OrderNesting`].

use tracing::{debug, warn};

use super::{
    DEFAULT_KILO_OFFER_GASBASE, Offer, OfferDetail, OrderNesting, PoolState,
    nesting::Settlement,
};
use crate::types::{BookEvent, OfferId};

pub(crate) fn apply(
    mut state: PoolState,
    nesting: &mut OrderNesting,
    event: &BookEvent,
) -> PoolState {
    match event {
        BookEvent::OrderStart => nesting.start(),
        BookEvent::OrderComplete => {
            if !nesting.complete() {
                warn!(
                    block_number = state.block_number(),
                    "order completed with no order open, ignoring"
                );
            }
        },
        BookEvent::OfferWrite { id, maker, tick, gives, gasreq, gasprice } => {
            // A write is a creation or an update of the same ID
            let kilo_offer_gasbase = state
                .remove(*id)
                .map_or(DEFAULT_KILO_OFFER_GASBASE, |prev| prev.kilo_offer_gasbase());
            state.insert(
                *id,
                Offer::written(*tick, *gives),
                OfferDetail::written(*maker, *gasreq, kilo_offer_gasbase, *gasprice),
            );
            nesting.touch(*id);
        },
        BookEvent::OfferRetract { id } => retract(&mut state, *id),
        BookEvent::OfferSuccess { id } => match nesting.settle(*id) {
            // Written during this very order, the write already placed it
            Settlement::Touched => (),
            Settlement::Untouched => retract(&mut state, *id),
            Settlement::NoOpenOrder => {
                warn!(%id, depth = nesting.depth(), "offer success with no order open, ignoring");
            },
        },
        BookEvent::OfferFail { id } => {
            if nesting.settle(*id) == Settlement::NoOpenOrder {
                debug!(%id, depth = nesting.depth(), "offer fail with no order open");
            }
            // Failed offers leave the book whatever the bookkeeping says
            retract(&mut state, *id);
        },
        BookEvent::OfferSuccessWithPosthookData { id }
        | BookEvent::OfferFailWithPosthookData { id } => retract(&mut state, *id),
    }
    state
}

fn retract(state: &mut PoolState, id: OfferId) {
    if state.remove(id).is_none() {
        debug!(%id, "retracted offer is not in the book");
    }
}
