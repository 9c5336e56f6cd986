use serde_json::Value;

/// A single path segment into a JSON value: an object key or a list index.
#[derive(Debug, Clone)]
pub enum Key<'a> {
    Field(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(s: &'a str) -> Self {
        Key::Field(s)
    }
}

impl From<usize> for Key<'_> {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

/// Recursively walks `keys` into `value`, returning `None` (rather than
/// erroring) at the first missing field, out-of-range index, or type
/// mismatch. Mirrors the dynamic-dict traversal the search engine's raw hit
/// structure requires, where every field along the path is optional.
#[must_use]
pub fn deep_get<'a>(value: &Value, keys: &[Key<'a>]) -> Option<Value> {
    let Some((head, rest)) = keys.split_first() else {
        return Some(value.clone());
    };
    let next = match head {
        Key::Field(name) => value.get(name)?,
        Key::Index(i) => value.get(i)?,
    };
    deep_get(next, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_lookup_by_field_and_index() {
        let d = json!({"meta": {"status": "OK", "messages": ["a", "b"]}});
        let result = deep_get(&d, &[Key::Field("meta"), Key::Field("messages"), Key::Index(1)]);
        assert_eq!(result, Some(json!("b")));
    }

    #[test]
    fn missing_path_returns_none_not_error() {
        let d = json!({"meta": {"status": "OK"}});
        let result = deep_get(&d, &[Key::Field("x"), Key::Field("y")]);
        assert_eq!(result, None);
    }
}
