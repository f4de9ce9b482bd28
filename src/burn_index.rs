// 🔥 Burn-Match Index - consumable pool of burns keyed by correlation token
//
// A burn matches at most one mint per pass. Several burns may share a token
// (multiple payments in one transaction); they are consumed in ingestion order.

use crate::events::BurnEvent;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Default)]
pub struct BurnMatchIndex {
    /// token → (ingestion sequence, burn), oldest first
    pending: HashMap<String, VecDeque<(usize, BurnEvent)>>,
    next_seq: usize,
    remaining: usize,
}

impl BurnMatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a burn to the pool
    pub fn insert(&mut self, burn: BurnEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.remaining += 1;
        self.pending
            .entry(burn.id.clone())
            .or_default()
            .push_back((seq, burn));
    }

    /// Remove and return the oldest pending burn for `token`
    pub fn try_consume(&mut self, token: &str) -> Option<BurnEvent> {
        let queue = self.pending.get_mut(token)?;
        let (_, burn) = queue.pop_front()?;
        if queue.is_empty() {
            self.pending.remove(token);
        }
        self.remaining -= 1;
        Some(burn)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.pending.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Burns never consumed, in the order they were inserted
    pub fn into_unmatched(self) -> Vec<BurnEvent> {
        let mut left: Vec<(usize, BurnEvent)> =
            self.pending.into_values().flatten().collect();
        left.sort_by_key(|(seq, _)| *seq);
        left.into_iter().map(|(_, burn)| burn).collect()
    }
}

impl FromIterator<BurnEvent> for BurnMatchIndex {
    fn from_iter<I: IntoIterator<Item = BurnEvent>>(iter: I) -> Self {
        let mut index = BurnMatchIndex::new();
        for burn in iter {
            index.insert(burn);
        }
        index
    }
}
