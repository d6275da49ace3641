//! Issue aggregation: dedup, suppression filtering, grouping, ordering.
//!
//! Output order is total and deterministic: groups always appear in the
//! fixed `state`, `service`, `template` order, and issues within a group
//! sort by `(rule_id, path)` with the collection order breaking ties.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use vigil_core::{IssueKey, Severity, ValidationGroup, ValidationIssue};

/// One presentation group and its surviving issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedIssues {
    pub group: ValidationGroup,
    pub issues: Vec<ValidationIssue>,
}

impl GroupedIssues {
    /// The highest severity present, if the group is non-empty.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }
}

/// Deduplicate by identity key (keeping the higher severity), drop
/// suppressed identities, and group in the fixed order.
///
/// All three groups are always present so consumers can index positionally.
#[must_use]
pub fn aggregate(
    issues: Vec<ValidationIssue>,
    suppressed: &BTreeSet<IssueKey>,
) -> Vec<GroupedIssues> {
    let mut deduped: BTreeMap<IssueKey, ValidationIssue> = BTreeMap::new();
    for issue in issues {
        let key = issue.key();
        if suppressed.contains(&key) {
            continue;
        }
        match deduped.entry(key) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(issue);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                if issue.severity > slot.get().severity {
                    slot.insert(issue);
                }
            }
        }
    }

    ValidationGroup::ALL
        .iter()
        .map(|&group| {
            let mut issues: Vec<ValidationIssue> = deduped
                .values()
                .filter(|issue| issue.group() == group)
                .cloned()
                .collect();
            issues.sort_by(|a, b| (&a.rule_id, &a.path).cmp(&(&b.rule_id, &b.path)));
            GroupedIssues { group, issues }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    use super::aggregate;
    use vigil_core::{IssueType, Severity, ValidationGroup, ValidationIssue};

    fn issue(issue_type: IssueType, subject: &str, rule_id: &str, path: &str) -> ValidationIssue {
        ValidationIssue::new(issue_type, subject, rule_id, path, "test issue")
    }

    #[test]
    fn groups_come_in_fixed_order_even_when_empty() {
        let grouped = aggregate(Vec::new(), &BTreeSet::new());
        let order: Vec<_> = grouped.iter().map(|entry| entry.group).collect();
        assert_eq!(
            order,
            vec![
                ValidationGroup::State,
                ValidationGroup::Service,
                ValidationGroup::Template
            ]
        );
        assert!(grouped.iter().all(|entry| entry.issues.is_empty()));
    }

    #[test]
    fn duplicate_identities_collapse_keeping_higher_severity() {
        let mut low = issue(IssueType::UnknownState, "light.a", "r1", "trigger/0/to");
        low.severity = Severity::Warning;
        let high = issue(IssueType::UnknownState, "light.a", "r1", "trigger/0/to");
        assert_eq!(high.severity, Severity::Error);

        let grouped = aggregate(vec![low, high], &BTreeSet::new());
        assert_eq!(grouped[0].issues.len(), 1);
        assert_eq!(grouped[0].issues[0].severity, Severity::Error);
    }

    #[test]
    fn dedup_is_order_independent_for_severity() {
        let mut low = issue(IssueType::UnknownState, "light.a", "r1", "trigger/0/to");
        low.severity = Severity::Warning;
        let high = issue(IssueType::UnknownState, "light.a", "r1", "trigger/0/to");

        let grouped = aggregate(vec![high.clone(), low], &BTreeSet::new());
        assert_eq!(grouped[0].issues[0].severity, Severity::Error);
    }

    #[test]
    fn suppressed_identities_are_dropped() {
        let flagged = issue(IssueType::UnknownState, "light.a", "r1", "trigger/0/to");
        let kept = issue(IssueType::UnknownState, "light.b", "r1", "trigger/1/to");
        let suppressed = BTreeSet::from([flagged.key()]);

        let grouped = aggregate(vec![flagged, kept], &suppressed);
        assert_eq!(grouped[0].issues.len(), 1);
        assert_eq!(grouped[0].issues[0].subject, "light.b");
    }

    #[test]
    fn issues_sort_by_rule_then_path_within_a_group() {
        let grouped = aggregate(
            vec![
                issue(IssueType::UnknownState, "light.c", "r2", "trigger/0/to"),
                issue(IssueType::EntityNotFound, "light.b", "r1", "trigger/1"),
                issue(IssueType::EntityNotFound, "light.a", "r1", "trigger/0"),
            ],
            &BTreeSet::new(),
        );
        let order: Vec<_> = grouped[0]
            .issues
            .iter()
            .map(|issue| (issue.rule_id.clone(), issue.path.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("r1".to_string(), "trigger/0".to_string()),
                ("r1".to_string(), "trigger/1".to_string()),
                ("r2".to_string(), "trigger/0/to".to_string()),
            ]
        );
    }

    #[test]
    fn issues_land_in_their_type_group() {
        let grouped = aggregate(
            vec![
                issue(IssueType::UnknownState, "light.a", "r1", "trigger/0"),
                issue(IssueType::UnknownService, "light.flip", "r1", "action/0"),
                issue(IssueType::TemplateParseError, "template", "r1", "condition/0"),
            ],
            &BTreeSet::new(),
        );
        assert_eq!(grouped[0].issues.len(), 1);
        assert_eq!(grouped[1].issues.len(), 1);
        assert_eq!(grouped[2].issues.len(), 1);
    }
}
