//! Human-readable change summaries.

use crate::model::VersionDiff;

/// Summary used when the diff is empty and the caller gave no reason.
pub const NO_CHANGES_SUMMARY: &str = "No changes";

/// Build the `changes_summary` stored on a version.
///
/// A caller-supplied reason wins verbatim. Otherwise the summary is
/// `Updated: f1, f2 | Added tags: ... | Removed tags: ...`, omitting empty
/// clauses in that fixed order.
pub fn changes_summary(reason: Option<&str>, diff: &VersionDiff, tag_field: &str) -> String {
    if let Some(reason) = reason {
        return reason.to_string();
    }

    let mut clauses = Vec::with_capacity(3);
    if !diff.fields_changed.is_empty() {
        clauses.push(format!("Updated: {}", diff.fields_changed.join(", ")));
    }
    if let Some(added) = diff.added_list_items.get(tag_field).filter(|v| !v.is_empty()) {
        clauses.push(format!("Added tags: {}", added.join(", ")));
    }
    if let Some(removed) = diff
        .removed_list_items
        .get(tag_field)
        .filter(|v| !v.is_empty())
    {
        clauses.push(format!("Removed tags: {}", removed.join(", ")));
    }

    if clauses.is_empty() {
        NO_CHANGES_SUMMARY.to_string()
    } else {
        clauses.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff_with_tags(fields: &[&str], added: &[&str], removed: &[&str]) -> VersionDiff {
        let mut diff = VersionDiff {
            fields_changed: fields.iter().map(|s| s.to_string()).collect(),
            ..VersionDiff::default()
        };
        if !added.is_empty() {
            diff.added_list_items
                .insert("tags".into(), added.iter().map(|s| s.to_string()).collect());
        }
        if !removed.is_empty() {
            diff.removed_list_items
                .insert("tags".into(), removed.iter().map(|s| s.to_string()).collect());
        }
        diff
    }

    #[test]
    fn test_reason_wins() {
        let diff = diff_with_tags(&["title"], &[], &[]);
        assert_eq!(changes_summary(Some("typo fix"), &diff, "tags"), "typo fix");
    }

    #[test]
    fn test_full_summary_order() {
        let diff = diff_with_tags(&["title", "tags"], &["c"], &["b"]);
        assert_eq!(
            changes_summary(None, &diff, "tags"),
            "Updated: title, tags | Added tags: c | Removed tags: b"
        );
    }

    #[test]
    fn test_omits_empty_clauses() {
        let diff = diff_with_tags(&["tags"], &[], &["b", "d"]);
        assert_eq!(
            changes_summary(None, &diff, "tags"),
            "Updated: tags | Removed tags: b, d"
        );
    }

    #[test]
    fn test_empty_diff() {
        assert_eq!(
            changes_summary(None, &VersionDiff::default(), "tags"),
            NO_CHANGES_SUMMARY
        );
    }
}
