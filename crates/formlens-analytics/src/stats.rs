//! Small numeric helpers shared by the analyzers.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::hash::Hash;

/// Round half up to two decimals.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0 + 0.5).floor() / 100.0
}

/// `count / total * 100`, rounded; zero when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(count as f64 / total as f64 * 100.0)
    }
}

/// UTC calendar day, `YYYY-MM-DD`.
pub fn day_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Increment `key` in an insertion-ordered counter.
pub fn bump<K: Hash + Eq>(counts: &mut IndexMap<K, usize>, key: K) {
    *counts.entry(key).or_insert(0) += 1;
}

/// Entries sorted by count descending. The sort is stable, so ties keep
/// first-seen order.
pub fn rank_desc<K>(counts: IndexMap<K, usize>) -> Vec<(K, usize)> {
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(1.666_666), 1.67);
        assert_eq!(round2(30.0), 30.0);
        assert_eq!(round2(-2.125), -2.12);
        assert_eq!(round2(2.125), 2.13);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn test_percentage_handles_zero_total() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(4, 4), 100.0);
    }

    #[test]
    fn test_rank_desc_is_stable() {
        let mut counts = IndexMap::new();
        bump(&mut counts, "b");
        bump(&mut counts, "a");
        bump(&mut counts, "c");
        bump(&mut counts, "c");

        let ranked = rank_desc(counts);
        assert_eq!(ranked, vec![("c", 2), ("b", 1), ("a", 1)]);
    }

    #[test]
    fn test_day_key_is_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 0).unwrap();
        assert_eq!(day_key(&at), "2024-01-15");
    }
}
