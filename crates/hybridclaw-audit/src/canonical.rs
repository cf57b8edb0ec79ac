//! Canonical JSON serialization used to hash wire records.
//!
//! Object keys are sorted lexicographically at every nesting level, arrays
//! keep their order, and non-finite numbers collapse to `null`. There is no
//! off-the-shelf crate for this in the dependency stack, so it is
//! hand-rolled over [`serde_json::Value`].

use serde_json::Value;

/// Render `value` as canonical JSON text.
#[must_use]
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if !f.is_finite() {
                    out.push_str("null");
                    return;
                }
            }
            out.push_str(&n.to_string());
        }
        Value::String(s) => write_json_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                write_value(&map[*key], out);
            }
            out.push('}');
        }
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let value = json!({"b": 1, "a": 2});
        assert_eq!(canonicalize(&value), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn nested_keys_are_sorted() {
        let value = json!({"outer": {"z": 1, "y": 2}});
        assert_eq!(canonicalize(&value), r#"{"outer":{"y":2,"z":1}}"#);
    }

    #[test]
    fn arrays_preserve_order() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonicalize(&value), "[3,1,2]");
    }

    #[test]
    fn non_finite_floats_become_null() {
        let value = Value::from(f64::NAN);
        assert_eq!(canonicalize(&value), "null");
    }

    #[test]
    fn strings_are_escaped() {
        let value = json!("line1\nline2\"quoted\"");
        assert_eq!(canonicalize(&value), r#""line1\nline2\"quoted\"""#);
    }

    #[test]
    fn same_object_different_key_order_hashes_identically() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(canonicalize(&a), canonicalize(&b));
    }
}
