//! Cache promotion policy

use std::time::Duration;

/// Lifetime of cached paste text
pub const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(15 * 60);

/// Lifetime of an access counter, measured from its first increment
pub const DEFAULT_ACCESS_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Number of reads within the window a key must exceed to be cached
pub const DEFAULT_PROMOTION_THRESHOLD: i64 = 10;

/// Frequency-gated cache fill policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// TTL applied to promoted text
    pub entry_ttl: Duration,
    /// TTL applied to a fresh access counter
    pub access_window: Duration,
    /// A key is promoted once its counter is strictly greater than this
    pub promotion_threshold: i64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            entry_ttl: DEFAULT_ENTRY_TTL,
            access_window: DEFAULT_ACCESS_WINDOW,
            promotion_threshold: DEFAULT_PROMOTION_THRESHOLD,
        }
    }
}

impl CachePolicy {
    pub fn should_promote(&self, access_count: i64) -> bool {
        access_count > self.promotion_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = CachePolicy::default();
        assert_eq!(policy.entry_ttl, Duration::from_secs(900));
        assert_eq!(policy.access_window, Duration::from_secs(600));
        assert_eq!(policy.promotion_threshold, 10);
    }

    #[test]
    fn test_promotion_is_strictly_above_threshold() {
        let policy = CachePolicy::default();
        assert!(!policy.should_promote(1));
        assert!(!policy.should_promote(10));
        assert!(policy.should_promote(11));
    }
}
