pub mod args;
mod book;
mod snapshot;
mod trace;

use std::time::Duration;

use alloy::{
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use anyhow::Context;
use args::Cli;
use mangrove_sdk::{
    Chain, PoolConfig,
    state::{MulticallReader, PoolRegistry},
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::args::Commands;

const DEX_KEY: &str = "mangrove";

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let (Some(src), Some(dest)) = (cli.src, cli.dest) else {
        return Err(anyhow::anyhow!("market tokens should be provided, see `--src` and `--dest`"));
    };

    let client = if cli.rpc == args::DEFAULT_RPC_PROVIDER || cli.rpc_throttle.is_some() {
        // Apply throttling with default RPC
        RpcClient::builder()
            .layer(ThrottleLayer::new(cli.rpc_throttle.unwrap_or(args::DEFAULT_RPC_THROTTLING)))
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    } else {
        RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    };
    client.set_poll_interval(Duration::from_millis(100));
    let provider = ProviderBuilder::new().connect_client(client);

    let arbitrum = Chain::arbitrum();
    let chain = Chain::custom(
        provider.get_chain_id().await?,
        cli.mangrove.unwrap_or(arbitrum.mangrove()),
        cli.reader.unwrap_or(arbitrum.reader()),
        cli.multicall.unwrap_or(arbitrum.multicall()),
    );
    let config = PoolConfig::default()
        .with_page_size(cli.page_size)
        .with_retained_snapshots(cli.retained_snapshots);

    let block_number = match cli.block {
        Some(block_number) => block_number,
        None => provider
            .get_block_number()
            .await
            .context("fetching latest block number")?,
    };

    let mut registry = PoolRegistry::new(
        DEX_KEY,
        chain.clone(),
        config,
        MulticallReader::new(&chain, provider.clone()),
    );
    let pool = registry
        .get_pool(src, dest, cli.tick_spacing, Some(block_number))
        .await
        .ok_or_else(|| anyhow::anyhow!("market {}/{} does not exist", dest, src))?;
    if !pool.is_ready() {
        return Err(anyhow::anyhow!(
            "failed to fetch book of {} at block {}",
            pool.market(),
            block_number
        ));
    }
    info!(market = %pool.market(), cache_key = %pool.cache_key(), block_number, "pool initialized");

    let cancellation_signal = CancellationToken::new();
    let cancellation_token = cancellation_signal.child_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancellation_signal.cancel();
        }
    });

    match &cli.command {
        Commands::Snapshot => snapshot::render(pool),
        Commands::Trace => {
            trace::render(&chain, provider, pool, cli.num_blocks, cancellation_token).await?
        },
        Commands::Book { depth } => {
            book::render(
                &chain,
                provider,
                pool,
                if *depth > 0 { Some(*depth) } else { None },
                cli.num_blocks,
                cancellation_token,
            )
            .await?
        },
    }

    Ok(())
}
