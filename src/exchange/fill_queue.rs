//! Mutex-protected queue the exchange client's fill callback pushes onto;
//! the core loop drains it at the start of every tick before computing
//! intents.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::types::Fill;

#[derive(Clone, Default)]
pub struct FillQueue {
    inner: Arc<Mutex<VecDeque<Fill>>>,
}

impl FillQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, fill: Fill) {
        self.inner.lock().unwrap().push_back(fill);
    }

    /// Remove and return every fill queued since the last drain, oldest
    /// first.
    pub fn drain(&self) -> Vec<Fill> {
        self.inner.lock().unwrap().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn fill(ts_ms: i64) -> Fill {
        Fill { fill_id: ts_ms.to_string(), order_id: "o".into(), token_id: "yes".into(), side: Side::Buy, price: 0.5, size: 1.0, fee: 0.0, ts_ms }
    }

    #[test]
    fn drain_returns_fills_in_push_order_and_empties_queue() {
        let q = FillQueue::new();
        q.push(fill(1));
        q.push(fill(2));
        let drained = q.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].fill_id, "1");
        assert!(q.drain().is_empty());
    }
}
