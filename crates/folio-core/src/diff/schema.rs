use serde::{Deserialize, Serialize};

/// Fields compared by the default schema, in reporting order.
pub const DEFAULT_FIELDS: &[&str] = &[
    "title",
    "slug",
    "excerpt",
    "content",
    "category",
    "tags",
    "featured_image",
    "status",
    "featured",
    "seo",
    "recipe",
    "diy",
    "gallery",
    "author_note",
];

pub const DEFAULT_TAG_FIELD: &str = "tags";
pub const DEFAULT_CONTENT_FIELD: &str = "content";

/// The comparable-field allow-list.
///
/// `tag_field` is diffed as a set into added/removed items; `content_field`
/// feeds `content_length_delta`. Both are normally members of `fields` but
/// the engine does not require it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSchema {
    pub fields: Vec<String>,
    pub tag_field: String,
    pub content_field: String,
}

impl DiffSchema {
    pub fn new(
        fields: impl IntoIterator<Item = impl Into<String>>,
        tag_field: impl Into<String>,
        content_field: impl Into<String>,
    ) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            tag_field: tag_field.into(),
            content_field: content_field.into(),
        }
    }

    pub fn is_known(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

impl Default for DiffSchema {
    fn default() -> Self {
        Self::new(
            DEFAULT_FIELDS.iter().copied(),
            DEFAULT_TAG_FIELD,
            DEFAULT_CONTENT_FIELD,
        )
    }
}
