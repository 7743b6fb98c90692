//! Location quality heuristic.
//!
//! Decides whether a freshly reported [`Fix`] should replace the one the
//! listener currently trusts. Recency dominates when two fixes are far apart
//! in time; otherwise accuracy decides, with some slack for a newer fix that
//! is only slightly less precise.

use crate::models::Fix;
use serde::{Deserialize, Serialize};

/// Two minutes, in milliseconds.
pub const DEFAULT_TIME_THRESHOLD_MS: u64 = 1000 * 60 * 2;

/// Largest accuracy loss (metres) a newer fix may carry and still win.
pub const DEFAULT_DEGRADATION_THRESHOLD: u32 = 200;

/// Thresholds used by [`is_better_fix`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPolicy {
    pub time_threshold_ms: u64,
    pub degradation_threshold: u32,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            time_threshold_ms: DEFAULT_TIME_THRESHOLD_MS,
            degradation_threshold: DEFAULT_DEGRADATION_THRESHOLD,
        }
    }
}

impl FilterPolicy {
    /// Same policy with the time threshold given in seconds.
    ///
    /// Returns `None` when the value does not fit in milliseconds.
    pub fn with_time_threshold_secs(self, secs: u64) -> Option<Self> {
        secs.checked_mul(1000).map(|time_threshold_ms| Self {
            time_threshold_ms,
            ..self
        })
    }
}

/// Returns `true` when `new` should replace `old`.
///
/// # Arguments
///
/// * `old` - The current baseline, if any. An absent baseline always loses.
/// * `new` - The incoming fix.
/// * `policy` - Time and accuracy thresholds.
pub fn is_better_fix(old: Option<&Fix>, new: &Fix, policy: &FilterPolicy) -> bool {
    let old = match old {
        Some(old) => old,
        None => return true,
    };

    // Thresholds beyond i64::MAX can never be crossed anyway.
    let threshold = i64::try_from(policy.time_threshold_ms).unwrap_or(i64::MAX);
    let delta = new.timestamp.saturating_sub(old.timestamp);
    let is_really_new = delta > threshold;
    let is_really_old = delta < -threshold;
    let is_new = delta > 0;

    // Far enough apart that the older fix is stale, whichever it is.
    if is_really_new {
        return true;
    } else if is_really_old {
        return false;
    }

    // Whole metres; fractional differences count as equal.
    let accuracy = (new.accuracy - old.accuracy) as i32;
    let is_less_accurate = accuracy > 0;
    let is_more_accurate = accuracy < 0;
    let is_very_inaccurate = i64::from(accuracy) > i64::from(policy.degradation_threshold);

    if is_more_accurate {
        true
    } else if is_new && !is_less_accurate {
        true
    } else {
        is_new && !is_very_inaccurate
    }
}

/// Returns whichever of `old` and `new` the heuristic keeps.
pub fn select_fix(old: Option<&Fix>, new: &Fix, policy: &FilterPolicy) -> Fix {
    match old {
        Some(old) if !is_better_fix(Some(old), new, policy) => *old,
        _ => *new,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    const SECOND: i64 = 1000;
    const THRESHOLD: i64 = DEFAULT_TIME_THRESHOLD_MS as i64;

    fn fix(accuracy: f32, timestamp: i64) -> Fix {
        Fix::new(Provider::Network, 59.3293, 18.0686, accuracy, timestamp)
    }

    #[test]
    fn test_absent_old_always_loses() {
        let policy = FilterPolicy::default();
        for accuracy in [0.0, 5.0, 250.0, 10_000.0] {
            for timestamp in [-10 * 60 * SECOND, 0, 30 * SECOND, i64::MAX] {
                assert!(is_better_fix(None, &fix(accuracy, timestamp), &policy));
            }
        }
    }

    #[test]
    fn test_much_newer_wins_regardless_of_accuracy() {
        let policy = FilterPolicy::default();
        let old = fix(3.0, 0);
        for accuracy in [1.0, 3.0, 204.0, 5_000.0] {
            let new = fix(accuracy, THRESHOLD + 1);
            assert!(is_better_fix(Some(&old), &new, &policy));
        }
    }

    #[test]
    fn test_much_older_loses_regardless_of_accuracy() {
        let policy = FilterPolicy::default();
        let old = fix(5_000.0, 10 * 60 * SECOND);
        for accuracy in [0.0, 1.0, 5_000.0] {
            let new = fix(accuracy, old.timestamp - THRESHOLD - 1);
            assert!(!is_better_fix(Some(&old), &new, &policy));
            assert_eq!(select_fix(Some(&old), &new, &policy), old);
        }
    }

    #[test]
    fn test_threshold_boundary_falls_through_to_accuracy() {
        let policy = FilterPolicy::default();
        let old = fix(10.0, 0);
        // Exactly at the threshold is not "really new"; accuracy decides.
        let worse = fix(500.0, THRESHOLD);
        assert!(!is_better_fix(Some(&old), &worse, &policy));
        let better = fix(5.0, -THRESHOLD);
        assert!(is_better_fix(Some(&old), &better, &policy));
    }

    #[test]
    fn test_more_accurate_wins() {
        let policy = FilterPolicy::default();
        let old = fix(10.0, 0);
        let new = fix(5.0, 30 * SECOND);
        assert!(is_better_fix(Some(&old), &new, &policy));
        assert_eq!(select_fix(Some(&old), &new, &policy), new);
    }

    #[test]
    fn test_more_accurate_but_older_still_wins() {
        let policy = FilterPolicy::default();
        let old = fix(10.0, 30 * SECOND);
        let new = fix(5.0, 0);
        assert!(is_better_fix(Some(&old), &new, &policy));
    }

    #[test]
    fn test_badly_degraded_loses() {
        let policy = FilterPolicy::default();
        let old = fix(10.0, 0);
        let new = fix(250.0, 30 * SECOND);
        assert!(!is_better_fix(Some(&old), &new, &policy));
        assert_eq!(select_fix(Some(&old), &new, &policy), old);
    }

    #[test]
    fn test_newer_within_degradation_wins() {
        let policy = FilterPolicy::default();
        let old = fix(10.0, 0);
        assert!(is_better_fix(Some(&old), &fix(10.0, SECOND), &policy));
        assert!(is_better_fix(Some(&old), &fix(210.0, SECOND), &policy));
        assert!(!is_better_fix(Some(&old), &fix(211.0, SECOND), &policy));
    }

    #[test]
    fn test_older_and_less_accurate_loses() {
        let policy = FilterPolicy::default();
        let old = fix(10.0, 30 * SECOND);
        assert!(!is_better_fix(Some(&old), &fix(11.0, 0), &policy));
        assert!(!is_better_fix(Some(&old), &fix(10.0, 0), &policy));
    }

    #[test]
    fn test_sub_metre_difference_counts_as_equal() {
        let policy = FilterPolicy::default();
        let old = fix(10.0, 0);
        // Slightly more precise but not newer: truncates to zero, so it loses.
        assert!(!is_better_fix(Some(&old), &fix(9.5, 0), &policy));
        assert!(is_better_fix(Some(&old), &fix(9.0, 0), &policy));
    }

    #[test]
    fn test_same_fix_yields_itself() {
        let policy = FilterPolicy::default();
        for f in [fix(0.0, 0), fix(10.0, 30 * SECOND), fix(999.0, -5)] {
            assert_eq!(select_fix(Some(&f), &f, &policy), f);
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = FilterPolicy {
            time_threshold_ms: 10_000,
            degradation_threshold: 20,
        };
        let old = fix(10.0, 0);
        assert!(is_better_fix(Some(&old), &fix(500.0, 11 * SECOND), &policy));
        assert!(!is_better_fix(Some(&old), &fix(31.0, 5 * SECOND), &policy));
        assert!(is_better_fix(Some(&old), &fix(30.0, 5 * SECOND), &policy));
    }

    #[test]
    fn test_huge_time_threshold_does_not_overflow() {
        let policy = FilterPolicy {
            time_threshold_ms: u64::MAX,
            ..FilterPolicy::default()
        };
        let old = fix(10.0, 0);
        // Nothing is ever "really" new or old; accuracy decides.
        assert!(!is_better_fix(Some(&old), &fix(500.0, i64::MAX), &policy));
        assert!(is_better_fix(Some(&old), &fix(5.0, -i64::MAX), &policy));
    }

    #[test]
    fn test_zero_time_threshold_still_prefers_accuracy_at_same_time() {
        let policy = FilterPolicy {
            time_threshold_ms: 0,
            ..FilterPolicy::default()
        };
        let old = fix(5.0, 0);
        assert!(!is_better_fix(Some(&old), &fix(5_000.0, 0), &policy));
        assert!(is_better_fix(Some(&old), &fix(5_000.0, 1), &policy));
    }

    #[test]
    fn test_time_threshold_from_seconds() {
        let policy = FilterPolicy::default().with_time_threshold_secs(30).unwrap();
        assert_eq!(policy.time_threshold_ms, 30_000);
        assert_eq!(policy.degradation_threshold, DEFAULT_DEGRADATION_THRESHOLD);
        assert_eq!(FilterPolicy::default().with_time_threshold_secs(u64::MAX), None);
    }
}
