use std::time::Duration;

use alloy::{
    eips::BlockId,
    providers::Provider,
    rpc::types::{Filter, Log},
};
use futures::{Stream, stream};
use tracing::debug;

use crate::{Chain, error::DexError, types};

pub type RawBlockLogs = types::BlockEvents<Log>;

/// Returns stream of raw logs emitted by the order book contract,
/// batched per block, starting from the specified block.
///
/// Polls logs via the given [`Provider`] to produce strictly continuous
/// log sequence, with [`Provider`]-configured interval. Logs removed by a
/// reorg are dropped, the rest are left undecoded: each
/// [`crate::state::EventPool`] decodes and filters them for its own market.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::FallbackLayer`]
/// and/or [`alloy::transports::layers::RetryBackoffLayer`].
pub fn raw<P, S, SFut>(
    chain: &Chain,
    provider: P,
    from: types::StateInstant,
    sleep: S,
) -> impl Stream<Item = Result<RawBlockLogs, DexError>>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let address = chain.mangrove();
    stream::unfold((provider, from.block_number()), move |(provider, mut block_num)| async move {
        let filter = Filter::new()
            .address(address)
            .from_block(block_num)
            .to_block(block_num);
        loop {
            // Some RPC providers produce empty response instead of error in case
            // the block in the filter does not exist yet, so checking the block
            // presence explicitly
            let result = futures::try_join!(
                provider.get_block(BlockId::number(block_num)).into_future(),
                provider.get_logs(&filter)
            )
            .map_err(DexError::from)
            .and_then(|(block, logs)| {
                let block_header = block
                    .ok_or(DexError::InvalidRequest("block is not available yet".to_string()))?
                    .header;
                Ok(RawBlockLogs::new(
                    types::StateInstant::new(block_num, block_header.timestamp),
                    canonical(logs),
                ))
            });
            if result.is_ok() {
                block_num += 1;
                return Some((result, (provider, block_num)));
            }
            if matches!(result, Err(DexError::InvalidRequest(_))) {
                // Block is not available yet
                sleep(provider.client().poll_interval()).await;
                continue;
            }
            return Some((result, (provider, block_num)));
        }
    })
}

/// Drops logs removed by a reorg and restores emission order.
fn canonical(logs: Vec<Log>) -> Vec<Log> {
    let mut logs = logs
        .into_iter()
        .filter(|log| {
            if log.removed {
                debug!(
                    block_number = log.block_number,
                    log_index = log.log_index,
                    "dropping removed log"
                );
            }
            !log.removed
        })
        .collect::<Vec<_>>();
    logs.sort_by_key(|log| log.log_index);
    logs
}

#[cfg(test)]
mod tests {
    use alloy::{
        providers::ProviderBuilder, rpc::client::RpcClient, transports::layers::RetryBackoffLayer,
    };
    use futures::StreamExt;

    use super::*;

    #[test]
    fn test_canonical_logs() {
        let log = |log_index, removed| Log {
            log_index: Some(log_index),
            removed,
            ..Default::default()
        };
        let logs = canonical(vec![log(2, false), log(0, false), log(1, true)]);

        let indices = logs.iter().map(|log| log.log_index).collect::<Vec<_>>();
        assert_eq!(indices, vec![Some(0), Some(2)]);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_stream_recent_blocks() {
        let client = RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect("https://arb1.arbitrum.io/rpc")
            .await
            .unwrap();
        client.set_poll_interval(Duration::from_millis(100));
        let provider = ProviderBuilder::new().connect_client(client);

        let chain = Chain::arbitrum();
        let mut block_num = provider.get_block_number().await.unwrap() + 1;
        let from = types::StateInstant::new(block_num, 0);
        let stream = raw(&chain, provider, from, tokio::time::sleep);
        let block_results = stream.take(5).collect::<Vec<_>>().await;

        for b in &block_results {
            let batch = b.as_ref().unwrap();
            assert_eq!(batch.instant().block_number(), block_num);
            assert!(batch.events().iter().all(|log| log.address() == chain.mangrove()));
            block_num += 1;
        }
    }
}
