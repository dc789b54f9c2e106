//! Write-ahead logging hook.
//!
//! The buffer pool stores a [`LogManager`] handle for future WAL
//! integration but never calls into it; flush ordering against the log is
//! the recovery layer's concern.

use std::sync::atomic::{AtomicU64, Ordering};

use oxbow_common::types::Lsn;

/// Dispenses log sequence numbers.
#[derive(Debug)]
pub struct LogManager {
    /// Next LSN to hand out.
    next_lsn: AtomicU64,
}

impl LogManager {
    /// Creates a log manager starting at the first valid LSN.
    pub fn new() -> Self {
        Self {
            next_lsn: AtomicU64::new(Lsn::FIRST.as_u64()),
        }
    }

    /// Returns the next LSN, advancing the counter.
    pub fn next_lsn(&self) -> Lsn {
        Lsn::new(self.next_lsn.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the LSN that the next call to [`next_lsn`](Self::next_lsn)
    /// will return, without advancing.
    pub fn current_lsn(&self) -> Lsn {
        Lsn::new(self.next_lsn.load(Ordering::Relaxed))
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsn_dispensing() {
        let log = LogManager::new();
        assert_eq!(log.current_lsn(), Lsn::FIRST);

        let a = log.next_lsn();
        let b = log.next_lsn();
        assert_eq!(a, Lsn::FIRST);
        assert!(a < b);
        assert_eq!(log.current_lsn().as_u64(), b.as_u64() + 1);
    }
}
