use std::{io::Write, pin::pin};

use alloy::providers::Provider;
use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    execute,
    style::Print,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use mangrove_sdk::{Chain, error::DexError, state::EventPool, stream, types::StateInstant};
use tokio_util::sync::CancellationToken;

pub(crate) async fn render<P: Provider>(
    chain: &Chain,
    provider: P,
    pool: &mut EventPool,
    depth: Option<usize>,
    num_blocks: Option<u64>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let from = pool
        .latest_state()
        .map(|state| StateInstant::new(state.block_number(), 0).next())
        .ok_or(DexError::NotInitialized)?;
    let stream = stream::raw(chain, provider, from, tokio::time::sleep);
    let mut stream = pin!(stream);

    let mut blocks_left = num_blocks;

    let mut stdout = std::io::stdout();

    execute!(stdout, EnterAlternateScreen, Clear(ClearType::All), MoveTo(0, 0))?;

    while let Some(res) = stream.next().await {
        if cancellation_token.is_cancelled() || blocks_left.is_some_and(|count| count == 0) {
            break;
        }

        let block_logs = res?;
        let applied = pool.on_logs(block_logs.events()).len();

        stdout.queue(Clear(ClearType::All))?;
        stdout.queue(MoveTo(0, 0))?;
        stdout.queue(Print(format!(
            "{} :: {} :: {} events applied\n",
            pool.market(),
            block_logs.instant(),
            applied
        )))?;
        if let Some(state) = pool.latest_state() {
            stdout.queue(Print(format!("{:#}", state.view(depth))))?;
        }

        stdout.flush()?;

        if let Some(ref mut count) = blocks_left {
            *count -= 1;
        }
    }

    execute!(stdout, LeaveAlternateScreen)?;

    Ok(())
}
