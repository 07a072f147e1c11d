use std::pin::pin;

use alloy::providers::Provider;
use colored::Colorize;
use futures::StreamExt;
use mangrove_sdk::{
    Chain,
    error::DexError,
    state::EventPool,
    stream,
    types::{BookEvent, StateInstant},
};
use tokio_util::sync::CancellationToken;

pub(crate) async fn render<P: Provider>(
    chain: &Chain,
    provider: P,
    pool: &mut EventPool,
    num_blocks: Option<u64>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let initial = pool.latest_state().ok_or(DexError::NotInitialized)?;
    println!("{}\n", format!("{:#^144}", " Initial Book ").bold().purple());
    println!("{}", initial);

    let from = StateInstant::new(initial.block_number(), 0).next();
    let stream = stream::raw(chain, provider, from, tokio::time::sleep);
    let mut stream = pin!(stream);

    let mut blocks_left = num_blocks;
    let mut depth = 0usize;

    while let Some(res) = stream.next().await {
        if cancellation_token.is_cancelled() || blocks_left.is_some_and(|count| count == 0) {
            break;
        }

        let block_logs = res?;
        println!("\n\n{}\n", format!("{:=^144}", " Block Events ").bold().purple());
        println!("{}", format!("{}", block_logs.instant()).bold().purple());

        let mut prev_tx = None;
        for event in pool.on_logs(block_logs.events()) {
            if prev_tx.is_none_or(|tx| tx < event.tx_index()) {
                println!(
                    "\n{}\n",
                    format!("**** Tx #{} ({})", event.tx_index(), event.tx_hash()).bright_blue()
                );
            }
            prev_tx = Some(event.tx_index());

            if *event.event() == BookEvent::OrderComplete {
                depth = depth.saturating_sub(1);
            }
            let line =
                format!("  {}{}: {:?}", "   ↳ ".repeat(depth), event.log_index(), event.event());
            match event.event() {
                BookEvent::OrderStart | BookEvent::OrderComplete => println!("{}", line.cyan()),
                BookEvent::OfferWrite { .. } => println!("{}", line.bright_green()),
                _ => println!("{}", line.bright_cyan()),
            }
            if *event.event() == BookEvent::OrderStart {
                depth += 1;
            }
        }

        if let Some(ref mut count) = blocks_left {
            *count -= 1;
        }
    }

    if let Some(last) = pool.latest_state() {
        println!("\n{}\n", format!("{:#^144}", " Final Book ").bold().purple());
        println!("{}", last);
    }

    Ok(())
}
