//! Structural tree-walkers over JSON documents
//!
//! These know nothing about records. They operate on `serde_json::Value`
//! trees: normalize for hashing, merge-patch, rename keys, remove keys.

use crate::error::{IbGibError, Result};
use crate::model::TIMESTAMP_FIELD;
use serde_json::{Map, Value};

/// Rebuild a document with keys in ascending order and `null`-valued keys
/// dropped, at every keyed level including objects nested inside arrays.
///
/// Keys are inserted in sorted order so the output is canonical whether or
/// not `serde_json` was built with `preserve_order`.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                let v = &map[key];
                if v.is_null() {
                    continue;
                }
                out.insert(key.clone(), normalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

/// Whether a normalized payload contributes to the hash at all
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Merge `incoming` into `target`.
///
/// both arrays: replace; both objects: recurse key by key; otherwise replace.
pub fn patch(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(changes)) => {
            for (key, change) in changes {
                match existing.get_mut(key) {
                    Some(slot) => patch(slot, change),
                    None => {
                        existing.insert(key.clone(), change.clone());
                    }
                }
            }
        }
        (slot, change) => *slot = change.clone(),
    }
}

/// Apply a rename map. A string leaf `{"old": "new"}` renames the key; an
/// object leaf recurses into the same-named child object.
pub fn rename_keys(target: &mut Map<String, Value>, renames: &Map<String, Value>) -> Result<()> {
    rename_at(target, renames, true)
}

fn rename_at(
    target: &mut Map<String, Value>,
    renames: &Map<String, Value>,
    top_level: bool,
) -> Result<()> {
    for (old_key, entry) in renames {
        match entry {
            Value::String(new_key) => {
                if top_level && new_key == TIMESTAMP_FIELD {
                    return Err(IbGibError::Unsupported(format!(
                        "cannot rename '{}' to reserved field '{}'",
                        old_key, TIMESTAMP_FIELD
                    )));
                }
                if let Some(v) = target.remove(old_key) {
                    target.insert(new_key.clone(), v);
                }
            }
            Value::Object(nested) => {
                if let Some(Value::Object(child)) = target.get_mut(old_key) {
                    rename_at(child, nested, false)?;
                }
            }
            other => {
                return Err(IbGibError::Precondition(format!(
                    "rename entry for '{}' must be a new key name or a nested map, got {}",
                    old_key, other
                )));
            }
        }
    }
    Ok(())
}

/// Apply a remove map. A non-object leaf removes the key; an object leaf
/// recurses into the same-named child object.
pub fn remove_keys(target: &mut Map<String, Value>, removals: &Map<String, Value>) -> Result<()> {
    remove_at(target, removals, true)
}

fn remove_at(
    target: &mut Map<String, Value>,
    removals: &Map<String, Value>,
    top_level: bool,
) -> Result<()> {
    for (key, entry) in removals {
        if top_level && key == TIMESTAMP_FIELD {
            return Err(IbGibError::Unsupported(format!(
                "cannot remove reserved field '{}'",
                TIMESTAMP_FIELD
            )));
        }
        match entry {
            Value::Object(nested) => {
                if let Some(Value::Object(child)) = target.get_mut(key) {
                    remove_at(child, nested, false)?;
                }
            }
            _ => {
                target.remove(key);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"z":2,"y":[{"q":1,"p":2}]}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"y":[{"p":2,"q":1}],"z":2},"b":1}"#).unwrap();
        let ta = serde_json::to_string(&normalize(&a)).unwrap();
        let tb = serde_json::to_string(&normalize(&b)).unwrap();
        assert_eq!(ta, tb);
        assert_eq!(ta, r#"{"a":{"y":[{"p":2,"q":1}],"z":2},"b":1}"#);
    }

    #[test]
    fn test_normalize_drops_null_keys() {
        let v = json!({"a": null, "b": {"c": null, "d": 1}, "e": [null, {"f": null}]});
        let n = normalize(&v);
        // nulls survive as array elements; only keyed nulls are absent
        assert_eq!(n, json!({"b": {"d": 1}, "e": [null, {}]}));
    }

    #[test]
    fn test_has_content() {
        assert!(!has_content(&Value::Null));
        assert!(!has_content(&json!({})));
        assert!(!has_content(&json!("")));
        assert!(has_content(&json!({"x": 1})));
        assert!(has_content(&json!([])));
        assert!(has_content(&json!(0)));
    }

    #[test]
    fn test_patch_rules() {
        let mut doc = json!({"list": [1, 2, 3], "obj": {"a": 1, "b": 2}, "s": "x"});
        patch(
            &mut doc,
            &json!({"list": [9], "obj": {"b": 20, "c": 30}, "s": {"now": "object"}, "new": true}),
        );
        assert_eq!(
            doc,
            json!({
                "list": [9],
                "obj": {"a": 1, "b": 20, "c": 30},
                "s": {"now": "object"},
                "new": true
            })
        );
    }

    #[test]
    fn test_rename_nested() {
        let mut doc = json!({"a": 1, "inner": {"x": 2}});
        let renames = json!({"a": "b", "inner": {"x": "y"}});
        rename_keys(doc.as_object_mut().unwrap(), renames.as_object().unwrap()).unwrap();
        assert_eq!(doc, json!({"b": 1, "inner": {"y": 2}}));
    }

    #[test]
    fn test_rename_to_timestamp_rejected() {
        let mut doc = json!({"when": "now"});
        let renames = json!({"when": "timestamp"});
        let err = rename_keys(doc.as_object_mut().unwrap(), renames.as_object().unwrap());
        assert!(matches!(err, Err(IbGibError::Unsupported(_))));
    }

    #[test]
    fn test_remove_nested_and_reserved() {
        let mut doc = json!({"a": 1, "b": 2, "inner": {"x": 1, "y": 2}});
        let removals = json!({"a": true, "inner": {"x": ""}});
        remove_keys(doc.as_object_mut().unwrap(), removals.as_object().unwrap()).unwrap();
        assert_eq!(doc, json!({"b": 2, "inner": {"y": 2}}));

        let removals = json!({"timestamp": true});
        let err = remove_keys(doc.as_object_mut().unwrap(), removals.as_object().unwrap());
        assert!(matches!(err, Err(IbGibError::Unsupported(_))));
    }
}
