//! Run statistics

use std::collections::BTreeMap;
use std::fmt;

/// Named counters collected during a run
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    counters: BTreeMap<&'static str, u64>,
}

impl Statistics {
    pub const CALLS: &'static str = "calls";
    pub const CALLED_FUNCTIONS: &'static str = "called_functions";
    pub const BODY_WALKS: &'static str = "body_walks";
    pub const MEMO_HITS: &'static str = "memo_hits";
    pub const MODULES_LOADED: &'static str = "modules_loaded";
    pub const PARSE_FAILURES: &'static str = "parse_failures";
    pub const PROBLEMS: &'static str = "problems";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&mut self, key: &'static str) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &'static str, n: u64) {
        *self.counters.entry(key).or_insert(0) += n;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counters.iter().map(|(k, v)| (*k, *v))
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.counters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = Statistics::new();
        assert_eq!(stats.get(Statistics::CALLS), 0);
        stats.inc(Statistics::CALLS);
        stats.inc(Statistics::CALLS);
        stats.add(Statistics::MEMO_HITS, 3);
        assert_eq!(stats.get("calls"), 2);
        assert_eq!(stats.to_string(), "calls=2, memo_hits=3");
    }
}
