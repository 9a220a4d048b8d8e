use crate::contract::ValidationError;

/// Priority string the load balancer reports for a listener's default rule.
/// The default rule always exists and never occupies a numeric slot.
pub const DEFAULT_RULE_SENTINEL: &str = "default";

/// Priority assigned when a listener carries no numeric rules yet.
pub const FIRST_RULE_PRIORITY: i32 = 1;

/// Next unoccupied priority for a listener: one past the highest numeric
/// priority already in use, or [`FIRST_RULE_PRIORITY`] when only the default
/// rule exists.
///
/// `raw_priorities` is the priority column exactly as the load balancer
/// reports it, so entries are decimal strings plus the default-rule sentinel.
pub fn next_priority(raw_priorities: &[String]) -> Result<i32, ValidationError> {
    let mut numeric = Vec::with_capacity(raw_priorities.len());
    for raw in raw_priorities {
        if raw == DEFAULT_RULE_SENTINEL {
            continue;
        }
        let priority: i32 = raw.parse().map_err(|_| {
            ValidationError::new(format!("Listener rule priority '{raw}' is not numeric"))
        })?;
        numeric.push(priority);
    }

    numeric.sort_unstable();
    match numeric.last() {
        None => Ok(FIRST_RULE_PRIORITY),
        Some(&highest) => highest.checked_add(1).ok_or_else(|| {
            ValidationError::new(format!("Listener rule priority {highest} has no successor"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priorities(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn returns_one_past_highest_existing_priority() {
        let next = next_priority(&priorities(&["3", "1", "2"])).expect("priorities are numeric");

        assert_eq!(next, 4);
    }

    #[test]
    fn returns_first_priority_for_empty_listener() {
        let next = next_priority(&[]).expect("no priorities to parse");

        assert_eq!(next, FIRST_RULE_PRIORITY);
    }

    #[test]
    fn ignores_default_rule_sentinel() {
        let next = next_priority(&priorities(&["default"])).expect("sentinel is skipped");

        assert_eq!(next, FIRST_RULE_PRIORITY);
    }

    #[test]
    fn skips_sentinel_among_numeric_priorities() {
        let next =
            next_priority(&priorities(&["10", "default", "7"])).expect("sentinel is skipped");

        assert_eq!(next, 11);
    }

    #[test]
    fn tolerates_duplicate_priorities() {
        let next = next_priority(&priorities(&["2", "2"])).expect("duplicates are tolerated");

        assert_eq!(next, 3);
    }

    #[test]
    fn rejects_priority_without_a_successor() {
        let error = next_priority(&priorities(&["2147483647"]))
            .expect_err("i32::MAX has no next priority");

        assert_eq!(
            error.message(),
            "Listener rule priority 2147483647 has no successor"
        );
    }

    #[test]
    fn rejects_non_numeric_priority() {
        let error = next_priority(&priorities(&["1", "oops"])).expect_err("'oops' cannot parse");

        assert_eq!(
            error.message(),
            "Listener rule priority 'oops' is not numeric"
        );
    }
}
