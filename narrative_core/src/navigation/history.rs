//! Per-node record of recently shown content variants.

use std::collections::HashMap;

/// Recently shown variant IDs, bounded per node. Owned by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHistory {
    limit: usize,
    shown: HashMap<String, Vec<String>>,
}

impl ContentHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            shown: HashMap::new(),
        }
    }

    /// Variant IDs recently shown for a node, oldest first.
    pub fn recent(&self, node_id: &str) -> &[String] {
        self.shown.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remember that `variant_id` was shown; evicts the oldest beyond the limit.
    pub fn record(&mut self, node_id: &str, variant_id: &str) {
        if self.limit == 0 {
            return;
        }
        let recent = self.shown.entry(node_id.to_string()).or_default();
        recent.retain(|v| v != variant_id);
        recent.push(variant_id.to_string());
        if recent.len() > self.limit {
            let excess = recent.len() - self.limit;
            recent.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.shown.clear();
    }
}

impl Default for ContentHistory {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_bounded() {
        let mut history = ContentHistory::new(2);
        history.record("intro", "a");
        history.record("intro", "b");
        history.record("intro", "c");
        assert_eq!(history.recent("intro"), ["b".to_string(), "c".to_string()]);
        assert!(history.recent("other").is_empty());
    }

    #[test]
    fn test_repeat_moves_to_back() {
        let mut history = ContentHistory::new(3);
        history.record("intro", "a");
        history.record("intro", "b");
        history.record("intro", "a");
        assert_eq!(history.recent("intro"), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_zero_limit_records_nothing() {
        let mut history = ContentHistory::new(0);
        history.record("intro", "a");
        assert!(history.recent("intro").is_empty());
    }
}
