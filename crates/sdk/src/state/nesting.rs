use std::collections::{HashMap, HashSet};

use crate::types::OfferId;

/// Bookkeeping of market orders executing within each other.
///
/// A market order may trigger maker hooks which write offers or start orders
/// of their own. Every started order opens a frame at the next nesting depth
/// which records the offers written during it, so that the outcome of those
/// offers can be told apart from the outcome of resting ones.
///
/// Not part of any snapshot and never persisted: a freshly seeded pool starts
/// at depth 0 with no frames.
#[derive(Clone, Debug, Default)]
pub struct OrderNesting {
    depth: u32,
    frames: HashMap<u32, OrderFrame>,
}

#[derive(Clone, Debug)]
struct OrderFrame {
    locked: bool,
    touched: HashSet<OfferId>,
}

/// How an offer taken at the current depth relates to the open frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Settlement {
    /// No order is open at the current depth.
    NoOpenOrder,
    /// Offer was written during the open order, its entry is now consumed.
    Touched,
    /// Offer was not written during the open order.
    Untouched,
}

impl OrderNesting {
    pub fn depth(&self) -> u32 { self.depth }

    /// Whether no order is executing.
    pub fn is_idle(&self) -> bool { self.depth == 0 && self.frames.is_empty() }

    /// Offers written so far within the order open at the current depth.
    pub fn touched(&self) -> Option<&HashSet<OfferId>> {
        self.frames.get(&self.depth).map(|frame| &frame.touched)
    }

    pub fn reset(&mut self) {
        self.depth = 0;
        self.frames.clear();
    }

    pub(crate) fn start(&mut self) {
        self.depth += 1;
        self.frames
            .insert(self.depth, OrderFrame { locked: true, touched: HashSet::new() });
    }

    /// Closes the innermost order. Returns false, leaving the state
    /// untouched, if no order is open.
    pub(crate) fn complete(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.frames.remove(&self.depth);
        self.depth -= 1;
        true
    }

    /// Records an offer write within the order open at the current depth.
    pub(crate) fn touch(&mut self, id: OfferId) {
        if let Some(frame) = self.frames.get_mut(&self.depth)
            && frame.locked
        {
            frame.touched.insert(id);
        }
    }

    pub(crate) fn settle(&mut self, id: OfferId) -> Settlement {
        match self.frames.get_mut(&self.depth) {
            None => Settlement::NoOpenOrder,
            Some(frame) => {
                if frame.touched.remove(&id) {
                    Settlement::Touched
                } else {
                    Settlement::Untouched
                }
            },
        }
    }
}
