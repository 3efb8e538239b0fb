use crate::diff::DiffSchema;
use crate::errors::{FolioError, Result};
use crate::model::{FieldBag, FieldValue};

/// Longest accepted field name
pub const MAX_FIELD_NAME_LEN: usize = 64;

/// Validate an optional edit reason against the configured length bound.
///
/// Length is measured in characters, not bytes.
///
/// # Errors
/// Returns `ReasonTooLong` when the reason exceeds `max_len`.
pub fn validate_reason(reason: Option<&str>, max_len: usize) -> Result<()> {
    if let Some(reason) = reason {
        let len = reason.chars().count();
        if len > max_len {
            return Err(FolioError::ReasonTooLong { len, max: max_len });
        }
    }
    Ok(())
}

/// Validate a field bag before it is persisted.
///
/// Unknown fields are accepted (they are stored and restored, just never
/// diffed), but every name must be usable and the designated tag and
/// content fields must carry the variant the diff engine expects.
///
/// # Errors
/// Returns `InvalidFieldBag` naming the first offending field.
pub fn validate_field_bag(bag: &FieldBag, schema: &DiffSchema) -> Result<()> {
    for name in bag.keys() {
        if name.trim().is_empty() {
            return Err(FolioError::InvalidFieldBag {
                reason: "field names cannot be empty".to_string(),
            });
        }
        if name.chars().count() > MAX_FIELD_NAME_LEN {
            return Err(FolioError::InvalidFieldBag {
                reason: format!(
                    "field name '{}' exceeds {} characters",
                    name, MAX_FIELD_NAME_LEN
                ),
            });
        }
    }

    expect_variant(bag, &schema.tag_field, "list", |v| {
        matches!(v, FieldValue::List(_))
    })?;
    expect_variant(bag, &schema.content_field, "text", |v| {
        matches!(v, FieldValue::Text(_))
    })?;

    Ok(())
}

fn expect_variant(
    bag: &FieldBag,
    field: &str,
    expected: &str,
    ok: impl Fn(&FieldValue) -> bool,
) -> Result<()> {
    match bag.get(field) {
        Some(value) if !ok(value) => Err(FolioError::InvalidFieldBag {
            reason: format!(
                "field '{}' must be {}, got {}",
                field,
                expected,
                value.type_name()
            ),
        }),
        _ => Ok(()),
    }
}
