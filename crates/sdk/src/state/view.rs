use std::iter;

use alloy::primitives::U256;
use colored::Colorize;
use tabled::{
    Table,
    settings::{Alignment, Panel, Style, Width, object::Rows},
};

use super::PoolState;

/// View of a pool's book.
///
/// Rendered as a full table of offers by default, or as a compact table of
/// tick levels with cumulative volume in alternate mode (`{:#}`), limited to
/// `depth` levels if set.
pub struct PoolStateView<'a> {
    state: &'a PoolState,
    depth: Option<usize>,
}

impl<'a> PoolStateView<'a> {
    pub fn new(state: &'a PoolState, depth: Option<usize>) -> Self { Self { state, depth } }
}

impl PoolState {
    /// View of the book limited to `depth` tick levels.
    pub fn view(&self, depth: Option<usize>) -> PoolStateView<'_> {
        PoolStateView::new(self, depth)
    }
}

impl std::fmt::Display for PoolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.view(None).fmt(f) }
}

impl<'a> std::fmt::Display for PoolStateView<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header = format!(
            "Block: {} :: Offers: {} :: Total gives: {} :: Next offer: {}",
            self.state.block_number(),
            self.state.len(),
            self.state.total_gives(),
            self.state.next_offer(),
        );

        let mut table = if f.alternate() {
            // Offers aggregated per tick, best first
            let mut levels: Vec<(i32, U256, usize)> = Vec::new();
            for (_, offer, _) in self.state.iter() {
                match levels.last_mut() {
                    Some((tick, gives, count)) if *tick == offer.tick() => {
                        *gives = gives.saturating_add(offer.gives());
                        *count += 1;
                    },
                    _ => levels.push((offer.tick(), offer.gives(), 1)),
                }
            }

            let mut cumulative = U256::ZERO;
            let rows = levels
                .iter()
                .take(self.depth.unwrap_or(levels.len()))
                .map(|(tick, gives, count)| {
                    cumulative = cumulative.saturating_add(*gives);
                    vec![
                        tick.to_string().green().to_string(),
                        gives.to_string(),
                        cumulative.to_string(),
                        count.to_string(),
                    ]
                })
                .collect::<Vec<_>>();

            let mut table = Table::from_iter(
                iter::once(vec![
                    "Tick".to_string(),
                    "Gives".to_string(),
                    "Cum Gives".to_string(),
                    "Num Offers".to_string(),
                ])
                .chain(rows),
            );
            table.with(Style::modern());
            table
        } else {
            let rows = self.state.iter().map(|(id, offer, detail)| {
                vec![
                    id.to_string(),
                    offer.tick().to_string(),
                    offer.gives().to_string(),
                    detail.maker().to_string(),
                    detail.gasreq().to_string(),
                    detail.offer_gasbase().to_string(),
                    detail.gasprice().to_string(),
                ]
            });
            let mut table = Table::from_iter(
                iter::once(
                    ["ID", "Tick", "Gives", "Maker", "Gas Req", "Gas Base", "Gas Price"]
                        .map(str::to_string)
                        .to_vec(),
                )
                .chain(rows),
            );
            table.with(Style::sharp());
            table
        };

        table.with(Panel::header(header));
        table.modify(Rows::first(), Alignment::right());
        if let Some(max_width) = f.width() {
            table.with(Width::wrap(max_width));
        }
        writeln!(f, "{}", table)
    }
}
