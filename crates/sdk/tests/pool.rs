use alloy::primitives::{Address, U256, address};
use mangrove_sdk::{
    Chain, PoolConfig,
    error::DexError,
    state::{DEFAULT_KILO_OFFER_GASBASE, EventPool},
    testing::{LogBuilder, MockReader, OfferSpec},
    types::{BookEvent, Market, OfferId},
};

const WETH: Address = address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1");
const USDC: Address = address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831");
const MAKER: Address = address!("0x00000000000000000000000000000000000000aa");

fn id(n: u64) -> OfferId { U256::from(n) }

fn market() -> Market { Market::new(USDC, WETH, 1) }

fn pool(config: PoolConfig) -> EventPool {
    EventPool::new("mangrove", &Chain::arbitrum(), market(), &config)
}

async fn seeded_pool(block_number: u64, offers: Vec<OfferSpec>) -> EventPool {
    let reader = MockReader::new(block_number).with_market(market(), 0, offers);
    let mut pool = pool(PoolConfig::default());
    pool.initialize(&reader, block_number).await.unwrap();
    pool
}

fn ticks(pool: &EventPool) -> Vec<i32> {
    pool.latest_state()
        .unwrap()
        .offers()
        .iter()
        .map(|o| o.tick())
        .collect()
}

/// Writes then a retract, each block keeping its own snapshot.
#[tokio::test]
async fn test_writes_and_retract() {
    let mut pool = seeded_pool(100, vec![]).await;
    assert_eq!(pool.get_state(100).unwrap().len(), 0);

    let logs = LogBuilder::new(market(), 101);
    let applied = pool.on_logs(&[
        logs.offer_write(1, MAKER, -10, 1000),
        logs.clone().with_log_index(0, 1).offer_write(2, MAKER, -5, 500),
    ]);
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].block_number(), 101);
    assert_eq!(applied[1].log_index(), 1);

    let state = pool.get_state(101).unwrap();
    assert_eq!(state.block_number(), 101);
    assert_eq!(state.offer_ids(), &[id(1), id(2)]);
    assert_eq!(ticks(&pool), vec![-10, -5]);
    let (offer, detail) = state.offer(id(1)).unwrap();
    assert_eq!(offer.gives(), U256::from(1000));
    assert_eq!(detail.maker(), MAKER);
    assert_eq!(detail.gasreq(), LogBuilder::GASREQ);
    assert_eq!(detail.kilo_offer_gasbase(), DEFAULT_KILO_OFFER_GASBASE);

    pool.on_log(&logs.at_block(102).offer_retract(1));
    assert_eq!(pool.latest_state().unwrap().offer_ids(), &[id(2)]);
    assert_eq!(ticks(&pool), vec![-5]);

    // Earlier snapshots are untouched
    assert_eq!(pool.get_state(101).unwrap().len(), 2);
    assert_eq!(pool.get_state(100).unwrap().len(), 0);
    assert_eq!(pool.get_state(500).unwrap().block_number(), 102);
}

/// Offer taken during the order which wrote it stays in the book.
#[tokio::test]
async fn test_nested_order_keeps_written_offer() {
    let mut pool = seeded_pool(100, vec![]).await;
    let logs = LogBuilder::new(market(), 101);

    pool.on_log(&logs.order_start());
    assert_eq!(pool.nesting().depth(), 1);

    pool.on_log(&logs.offer_write(3, MAKER, 0, 200));
    assert!(pool.nesting().touched().unwrap().contains(&id(3)));

    let applied = pool.on_log(&logs.offer_success(3)).unwrap();
    assert_eq!(applied.event(), &BookEvent::OfferSuccess { id: id(3) });
    assert!(pool.nesting().touched().unwrap().is_empty());

    pool.on_log(&logs.order_complete());
    assert!(pool.nesting().is_idle());
    assert_eq!(pool.latest_state().unwrap().offer_ids(), &[id(3)]);
}

#[tokio::test]
async fn test_failed_offer_leaves_book() {
    let mut pool = seeded_pool(100, vec![OfferSpec::new(9, 4, 50)]).await;
    let logs = LogBuilder::new(market(), 101);

    pool.on_logs(&[
        logs.order_start(),
        logs.offer_write(1, MAKER, 0, 100),
        logs.offer_fail(1),
        logs.offer_fail_with_posthook_data(9),
        logs.order_complete(),
    ]);

    assert!(pool.nesting().is_idle());
    assert!(pool.latest_state().unwrap().is_empty());
}

#[tokio::test]
async fn test_cold_start_from_fetched_book() {
    let mut pool = seeded_pool(200, vec![
        OfferSpec::new(4, 2, 40),
        OfferSpec::new(5, 2, 50),
        OfferSpec::new(6, 8, 60),
    ])
    .await;
    assert_eq!(pool.seeded_at(), Some(200));
    assert!(pool.is_ready());

    let state = pool.latest_state().unwrap();
    assert_eq!(state.offer_ids(), &[id(4), id(5), id(6)]);
    assert_eq!(state.offers()[0].next(), Some(id(5)));
    assert_eq!(state.offers()[0].prev(), None);
    assert_eq!(state.offers_detail()[0].offer_gasbase(), OfferSpec::KILO_OFFER_GASBASE * 1000);

    // Already reflected in the fetched book
    let logs = LogBuilder::new(market(), 200);
    assert!(pool.on_log(&logs.offer_retract(4)).is_none());
    assert_eq!(pool.latest_state().unwrap().len(), 3);

    // Update keeps the fetched gas base and moves the offer to the end of its new tick
    let logs = logs.at_block(201);
    pool.on_log(&logs.offer_write(4, MAKER, 8, 45));
    let state = pool.latest_state().unwrap();
    assert_eq!(state.offer_ids(), &[id(5), id(6), id(4)]);
    assert_eq!(
        state.offer(id(4)).unwrap().1.kilo_offer_gasbase(),
        OfferSpec::KILO_OFFER_GASBASE
    );
    assert_eq!(state.offer(id(4)).unwrap().0.prev(), None);
    assert!(state.is_consistent());
}

#[tokio::test]
async fn test_other_logs_advance_block() {
    let mut pool = seeded_pool(100, vec![OfferSpec::new(1, 0, 10)]).await;
    let other = Market::new(WETH, USDC, 1);

    assert!(pool.on_log(&LogBuilder::new(other, 150).offer_retract(1)).is_none());
    assert_eq!(pool.latest_state().unwrap().block_number(), 150);
    assert_eq!(pool.latest_state().unwrap().offer_ids(), &[id(1)]);
    assert_eq!(pool.get_state(149).unwrap().block_number(), 100);

    let logs = LogBuilder::new(market(), 151);
    assert!(pool.on_log(&logs.set_active(false)).is_none());
    assert_eq!(pool.latest_state().unwrap().block_number(), 151);

    assert!(pool.on_log(&logs.at_block(152).garbage()).is_none());
    assert_eq!(pool.latest_state().unwrap().block_number(), 152);
    assert_eq!(pool.history().len(), 4);

    // Stale
    assert!(pool.on_log(&logs.at_block(120).offer_retract(1)).is_none());
    assert_eq!(pool.latest_state().unwrap().block_number(), 152);
    assert_eq!(pool.latest_state().unwrap().offer_ids(), &[id(1)]);
}

/// Redelivered logs are applied once.
#[tokio::test]
async fn test_duplicate_logs() {
    let mut pool = seeded_pool(100, vec![OfferSpec::new(9, 4, 50)]).await;
    let logs = LogBuilder::new(market(), 101);
    let start = logs.order_start();

    assert!(pool.on_log(&start).is_some());
    assert!(pool.on_log(&start).is_none());
    assert_eq!(pool.nesting().depth(), 1);
    assert_eq!(pool.last_log(), Some((101, 0)));

    pool.on_log(&logs.order_complete());
    assert!(pool.nesting().is_idle());

    // Lower index within the block was already taken into account
    let early = logs.clone().with_log_index(0, 0).offer_retract(9);
    assert!(pool.on_log(&early).is_none());

    // No order left open for a success to settle against
    pool.on_log(&logs.at_block(102).offer_success(9));
    assert_eq!(pool.latest_state().unwrap().offer_ids(), &[id(9)]);
    assert_eq!(pool.latest_state().unwrap().block_number(), 102);
}

#[tokio::test]
async fn test_reorged_logs_are_ignored() {
    let mut pool = seeded_pool(100, vec![OfferSpec::new(9, 4, 50)]).await;
    let logs = LogBuilder::new(market(), 101);

    let removed = LogBuilder::removed(logs.offer_write(1, MAKER, 0, 10));
    assert!(pool.on_log(&removed).is_none());
    assert_eq!(pool.latest_state().unwrap().offer_ids(), &[id(9)]);
    assert_eq!(pool.latest_state().unwrap().block_number(), 100);
    assert_eq!(pool.last_log(), None);

    // Canonical log at the same position still applies
    let canonical = logs.clone().with_log_index(0, 0).offer_write(2, MAKER, 8, 10);
    assert!(pool.on_log(&canonical).is_some());
    assert_eq!(pool.latest_state().unwrap().offer_ids(), &[id(9), id(2)]);
}

#[tokio::test]
async fn test_history_window() {
    let reader = MockReader::new(10).with_market(market(), 0, vec![]);
    let mut pool = pool(PoolConfig::default().with_retained_snapshots(3));
    pool.initialize(&reader, 10).await.unwrap();

    let logs = LogBuilder::new(market(), 10);
    for block in 11..=15 {
        pool.on_log(&logs.at_block(block).offer_write(block, MAKER, 0, 1));
    }

    assert_eq!(pool.history().len(), 3);
    assert_eq!(pool.history().oldest_block(), Some(13));
    assert!(pool.get_state(12).is_none());
    assert!(pool.get_state(10).is_none());
    assert_eq!(pool.get_state(13).unwrap().len(), 3);
    assert_eq!(pool.get_state(15).unwrap().len(), 5);
}

#[tokio::test]
async fn test_initialize_failures() {
    let mut pool = pool(PoolConfig::default());
    assert!(pool.latest_state().is_none());
    assert!(pool.on_log(&LogBuilder::new(market(), 5).order_start()).is_none());
    assert_eq!(pool.nesting().depth(), 0);

    let err = pool
        .initialize(&MockReader::new(10), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, DexError::MarketNotFound(m) if m == market()));
    assert!(!pool.init_failed());
    assert!(pool.get_state(10).is_none());

    let reader = MockReader::new(10)
        .with_market(market(), 0, vec![OfferSpec::new(1, 0, 10)])
        .corrupt();
    let err = pool.initialize(&reader, 10).await.unwrap_err();
    assert!(matches!(err, DexError::Abi(_)));
    assert!(pool.init_failed());
    assert!(pool.get_state(10).is_none());

    let reader = MockReader::new(10)
        .with_market(market(), 0, vec![OfferSpec::new(1, 0, 10)])
        .failing();
    let err = pool.initialize(&reader, 10).await.unwrap_err();
    assert!(!err.is_permanent());
    assert!(pool.init_failed());
    assert!(!pool.is_ready());

    reader.set_failing(false);
    pool.initialize(&reader, 10).await.unwrap();
    assert!(pool.is_ready());

    // Failed refresh keeps serving the last known book
    reader.set_failing(true);
    assert!(pool.initialize(&reader, 20).await.is_err());
    assert!(pool.init_failed());
    assert_eq!(pool.get_state(20).unwrap().offer_ids(), &[id(1)]);
}

#[tokio::test]
async fn test_initialize_resets_nesting() {
    let reader = MockReader::new(10).with_market(market(), 0, vec![]);
    let mut pool = pool(PoolConfig::default());
    pool.initialize(&reader, 10).await.unwrap();

    pool.on_log(&LogBuilder::new(market(), 11).order_start());
    assert_eq!(pool.nesting().depth(), 1);

    pool.initialize(&reader, 12).await.unwrap();
    assert!(pool.nesting().is_idle());
    assert_eq!(pool.history().len(), 1);
    assert!(pool.get_state(11).is_none());
}

#[test]
fn test_market_key_and_cache_key() {
    let pool = pool(PoolConfig::default());
    assert_eq!(pool.market_key(), (WETH, USDC, 1));
    assert_eq!(
        pool.cache_key(),
        format!("mangrove_{}_{}_1", WETH, USDC).to_lowercase()
    );
}
