//! Dot-path lookup into request payloads.

use serde_json::Value;

/// Resolve `path` inside `payload`.
///
/// A top-level key equal to the whole path wins, so flat keys such as
/// `"user.name"` coming from query strings resolve directly. Otherwise the
/// path is split on `.`, `[` and `]`; objects are walked by key and arrays
/// by numeric index.
pub fn resolve<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(value) = payload.as_object().and_then(|map| map.get(path)) {
        return Some(value);
    }

    let mut segments = path
        .split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty())
        .peekable();
    segments.peek()?;

    let mut current = payload;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String form written into the template.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
