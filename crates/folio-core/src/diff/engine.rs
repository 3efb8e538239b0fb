//! Diff computation over field bags.

use crate::diff::schema::DiffSchema;
use crate::model::{FieldBag, FieldValue, VersionDiff};
use std::collections::BTreeSet;

/// Items of `b` not present in `a`, in `b`'s order, each reported once.
fn set_delta(a: &[String], b: &[String]) -> Vec<String> {
    let in_a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let mut seen = BTreeSet::new();
    b.iter()
        .filter(|item| !in_a.contains(item.as_str()) && seen.insert(item.as_str()))
        .cloned()
        .collect()
}

fn list_of<'a>(bag: &'a FieldBag, field: &str) -> &'a [String] {
    bag.get(field).and_then(FieldValue::as_list).unwrap_or(&[])
}

fn content_len(bag: &FieldBag, field: &str) -> i64 {
    bag.get(field)
        .and_then(FieldValue::as_text)
        .map(|s| s.chars().count() as i64)
        .unwrap_or(0)
}

/// Compute the diff from `old` to `new`.
///
/// `old == None` means there is no prior version: the diff is taken against
/// an empty bag, so every populated known field is reported as changed and
/// the items of every known list field of `new` as added.
///
/// A field counts as changed when it is present on one side only, or
/// present on both with unequal values. Between two versions only
/// `schema.tag_field` contributes to `added_list_items`/`removed_list_items`;
/// other lists and records are compared structurally and only appear in
/// `fields_changed`.
pub fn compute_diff(old: Option<&FieldBag>, new: &FieldBag, schema: &DiffSchema) -> VersionDiff {
    let empty = FieldBag::new();
    let is_first = old.is_none();
    let old = old.unwrap_or(&empty);

    let fields_changed: Vec<String> = schema
        .fields
        .iter()
        .filter(|field| old.get(field.as_str()) != new.get(field.as_str()))
        .cloned()
        .collect();

    let mut diff = VersionDiff {
        fields_changed,
        content_length_delta: content_len(new, &schema.content_field)
            - content_len(old, &schema.content_field),
        ..VersionDiff::default()
    };

    if is_first {
        for field in &schema.fields {
            let added = set_delta(&[], list_of(new, field));
            if !added.is_empty() {
                diff.added_list_items.insert(field.clone(), added);
            }
        }
        return diff;
    }

    let old_tags = list_of(old, &schema.tag_field);
    let new_tags = list_of(new, &schema.tag_field);
    let added = set_delta(old_tags, new_tags);
    let removed = set_delta(new_tags, old_tags);
    if !added.is_empty() {
        diff.added_list_items.insert(schema.tag_field.clone(), added);
    }
    if !removed.is_empty() {
        diff.removed_list_items.insert(schema.tag_field.clone(), removed);
    }

    diff
}
