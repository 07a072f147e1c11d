use alloy::{
    primitives::{B256, I256},
    rpc::types::Log,
    sol_types::SolEventInterface,
};
use tracing::{debug, warn};

use crate::{
    abi::Mangrove::MangroveEvents,
    error::DexError,
    types::{BookEvent, Market, Tick},
};

/// Outcome of routing one log to a pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    /// Event of the pool's market to apply.
    Apply(BookEvent),
    /// Event of another market sharing the transport.
    Foreign,
    /// Event kind without a handler.
    Unhandled,
    /// Log could not be decoded.
    Malformed,
}

/// Decodes order book logs and keeps those of a single market.
#[derive(Clone, Debug)]
pub(crate) struct EventRouter {
    market_hash: B256,
}

impl EventRouter {
    pub(crate) fn new(market: &Market) -> Self { Self { market_hash: market.hash() } }

    pub(crate) fn route(&self, log: &Log) -> Route {
        let Some(selector) = log.inner.data.topics().first() else {
            debug!(block_number = log.block_number, "anonymous log, ignoring");
            return Route::Unhandled;
        };
        if !MangroveEvents::SELECTORS.contains(&selector.0) {
            debug!(block_number = log.block_number, %selector, "no binding for event");
            return Route::Unhandled;
        }
        let event = match MangroveEvents::decode_log(&log.inner) {
            Ok(decoded) => decoded.data,
            Err(err) => {
                warn!(
                    block_number = log.block_number,
                    log_index = log.log_index,
                    %err,
                    "failed to decode log, ignoring"
                );
                return Route::Malformed;
            },
        };
        match decode(&event) {
            Ok(Some((hash, _))) if hash != self.market_hash => Route::Foreign,
            Ok(Some((_, event))) => Route::Apply(event),
            Ok(None) => {
                debug!(block_number = log.block_number, ?event, "no handler for event");
                Route::Unhandled
            },
            Err(err) => {
                warn!(block_number = log.block_number, %err, "failed to decode event, ignoring");
                Route::Malformed
            },
        }
    }
}

/// Market hash and book event carried by a raw event, `None` for kinds the
/// book does not react to.
fn decode(event: &MangroveEvents) -> Result<Option<(B256, BookEvent)>, DexError> {
    let decoded = match event {
        MangroveEvents::OrderStart(e) => (e.olKeyHash, BookEvent::OrderStart),
        MangroveEvents::OrderComplete(e) => (e.olKeyHash, BookEvent::OrderComplete),
        MangroveEvents::OfferWrite(e) => (e.olKeyHash, BookEvent::OfferWrite {
            id: e.id,
            maker: e.maker,
            tick: tick(e.tick)?,
            gives: e.gives,
            gasreq: e.gasreq.saturating_to(),
            gasprice: e.gasprice.saturating_to(),
        }),
        MangroveEvents::OfferRetract(e) => (e.olKeyHash, BookEvent::OfferRetract { id: e.id }),
        MangroveEvents::OfferSuccess(e) => (e.olKeyHash, BookEvent::OfferSuccess { id: e.id }),
        MangroveEvents::OfferSuccessWithPosthookData(e) => {
            (e.olKeyHash, BookEvent::OfferSuccessWithPosthookData { id: e.id })
        },
        MangroveEvents::OfferFail(e) => (e.olKeyHash, BookEvent::OfferFail { id: e.id }),
        MangroveEvents::OfferFailWithPosthookData(e) => {
            (e.olKeyHash, BookEvent::OfferFailWithPosthookData { id: e.id })
        },
        MangroveEvents::SetActive(_)
        | MangroveEvents::SetFee(_)
        | MangroveEvents::Credit(_)
        | MangroveEvents::Debit(_) => return Ok(None),
    };
    Ok(Some(decoded))
}

fn tick(value: I256) -> Result<Tick, DexError> {
    Tick::try_from(value).map_err(|err| DexError::Decode(format!("tick {}: {}", value, err)))
}

#[cfg(all(test, feature = "testing"))]
mod tests {
    use alloy::primitives::{Address, U256, address};

    use super::*;
    use crate::testing::LogBuilder;

    const WETH: Address = address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1");
    const USDC: Address = address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831");
    const MAKER: Address = address!("0x00000000000000000000000000000000000000aa");

    #[test]
    fn test_routes_own_market() {
        let market = Market::new(USDC, WETH, 1);
        let router = EventRouter::new(&market);
        let log = LogBuilder::new(market, 10).offer_write(7, MAKER, -3, 100);

        assert_eq!(
            router.route(&log),
            Route::Apply(BookEvent::OfferWrite {
                id: U256::from(7),
                maker: MAKER,
                tick: -3,
                gives: U256::from(100),
                gasreq: LogBuilder::GASREQ,
                gasprice: LogBuilder::GASPRICE,
            })
        );
    }

    #[test]
    fn test_filters_other_markets() {
        let router = EventRouter::new(&Market::new(USDC, WETH, 1));
        // Opposite side of the same pair is another offer list
        let log = LogBuilder::new(Market::new(WETH, USDC, 1), 10).offer_retract(7);

        assert_eq!(router.route(&log), Route::Foreign);
    }

    #[test]
    fn test_unhandled_and_malformed() {
        let market = Market::new(USDC, WETH, 1);
        let router = EventRouter::new(&market);
        let builder = LogBuilder::new(market, 10);

        assert_eq!(router.route(&builder.set_active(true)), Route::Unhandled);
        assert_eq!(router.route(&builder.unknown()), Route::Unhandled);
        assert_eq!(router.route(&builder.garbage()), Route::Malformed);
    }

    #[test]
    fn test_out_of_range_tick_is_malformed() {
        let market = Market::new(USDC, WETH, 1);
        let router = EventRouter::new(&market);
        let log = LogBuilder::new(market, 10).offer_write_raw(
            U256::from(1),
            MAKER,
            I256::MAX,
            U256::from(1),
        );

        assert_eq!(router.route(&log), Route::Malformed);
    }
}
