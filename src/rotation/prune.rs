/// Picks the prefixes to delete so that only the newest `retention` remain.
///
/// Prefixes are sorted lexicographically, which is chronological for
/// timestamp labels, and the oldest `max(0, len - retention)` are returned.
/// A retention of zero or less selects every prefix.
pub fn select_expired(mut prefixes: Vec<String>, retention: i64) -> Vec<String> {
    prefixes.sort();
    prefixes.dedup();

    let total = prefixes.len() as i64;
    let excess = total.saturating_sub(retention).clamp(0, total) as usize;
    prefixes.truncate(excess);
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keeps_most_recent() {
        let prefixes = labels(&["2024-01-03T0900", "2024-01-01T0900", "2024-01-02T0900"]);
        assert_eq!(select_expired(prefixes, 2), labels(&["2024-01-01T0900"]));
    }

    #[test]
    fn test_zero_retention_selects_everything() {
        let prefixes = labels(&["2024-01-02T0900", "2024-01-01T0900"]);
        assert_eq!(
            select_expired(prefixes, 0),
            labels(&["2024-01-01T0900", "2024-01-02T0900"])
        );
    }

    #[test]
    fn test_negative_retention_selects_everything() {
        let prefixes = labels(&["2024-01-02T0900", "2024-01-01T0900"]);
        assert_eq!(select_expired(prefixes, -3).len(), 2);
        assert_eq!(select_expired(Vec::new(), i64::MIN), Vec::<String>::new());
    }

    #[test]
    fn test_retention_at_or_above_count_selects_nothing() {
        let prefixes = labels(&["2024-01-02T0900", "2024-01-01T0900"]);
        assert!(select_expired(prefixes.clone(), 2).is_empty());
        assert!(select_expired(prefixes, i64::MAX).is_empty());
    }

    #[test]
    fn test_selection_is_smallest_excess_for_every_retention() {
        let all = labels(&[
            "2023-12-31T2359/",
            "2024-01-01T0000/",
            "2024-01-01T0900/",
            "2024-02-10T1200/",
            "2024-11-30T0001/",
        ]);
        for retention in -1..=6i64 {
            let expected = (all.len() as i64 - retention).max(0).min(all.len() as i64) as usize;
            let mut shuffled = all.clone();
            shuffled.reverse();
            let expired = select_expired(shuffled, retention);
            assert_eq!(expired, all[..expected].to_vec(), "retention {}", retention);
        }
    }
}
