use std::collections::VecDeque;

use tracing::debug;

use super::PoolState;

/// Bounded history of one pool's snapshots, ordered by block number.
///
/// Holds at most one snapshot per block. Once full, the oldest snapshot is
/// evicted on every insertion of a new block.
#[derive(Clone, Debug)]
pub struct SnapshotHistory {
    capacity: usize,
    snapshots: VecDeque<PoolState>,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, snapshots: VecDeque::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn len(&self) -> usize { self.snapshots.len() }

    pub fn is_empty(&self) -> bool { self.snapshots.is_empty() }

    /// Most recent snapshot.
    pub fn latest(&self) -> Option<&PoolState> { self.snapshots.back() }

    /// Oldest block the history can answer for.
    pub fn oldest_block(&self) -> Option<u64> {
        self.snapshots.front().map(PoolState::block_number)
    }

    /// Snapshot valid at `block_number`: the latest one taken at or before it.
    ///
    /// Returns `None` for blocks older than the retained window, the state
    /// there is unknown.
    pub fn at_or_before(&self, block_number: u64) -> Option<&PoolState> {
        let idx = self
            .snapshots
            .partition_point(|s| s.block_number() <= block_number);
        idx.checked_sub(1).and_then(|idx| self.snapshots.get(idx))
    }

    /// Stores the snapshot under its own block number.
    ///
    /// A snapshot for the latest block replaces it. A snapshot for an older
    /// block is a correction: every retained snapshot from that block on is
    /// discarded before storing it.
    pub fn insert(&mut self, snapshot: PoolState) {
        let block_number = snapshot.block_number();
        if let Some(latest) = self.latest().map(PoolState::block_number)
            && block_number < latest
        {
            let keep = self
                .snapshots
                .partition_point(|s| s.block_number() < block_number);
            debug!(
                block_number,
                latest,
                discarded = self.snapshots.len() - keep,
                "correcting snapshot history"
            );
            self.snapshots.truncate(keep);
        }

        match self.snapshots.back_mut() {
            Some(latest) if latest.block_number() == block_number => *latest = snapshot,
            _ => {
                self.snapshots.push_back(snapshot);
                while self.snapshots.len() > self.capacity {
                    self.snapshots.pop_front();
                }
            },
        }
    }

    pub fn clear(&mut self) { self.snapshots.clear(); }
}
