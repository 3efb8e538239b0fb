use folio_core::model::{FieldBag, FieldValue};

/// Build a field bag from `(name, value)` pairs
#[allow(dead_code)]
pub fn bag<V: Into<FieldValue>>(pairs: Vec<(&str, V)>) -> FieldBag {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect()
}

/// A typical blog post state
#[allow(dead_code)]
pub fn post(title: &str, content: &str, tags: Vec<&str>) -> FieldBag {
    let mut state = FieldBag::new();
    state.insert("title".to_string(), FieldValue::from(title));
    state.insert("content".to_string(), FieldValue::from(content));
    state.insert("tags".to_string(), FieldValue::from(tags));
    state
}
