//! Minimal XML rendering of JSON values for `xml` result formats.
//!
//! Objects become child elements, arrays repeat the enclosing element
//! name, scalars become escaped text and `null` becomes an empty element.

use serde_json::Value;

/// Renders `value` as an XML document rooted at `root`.
///
/// ```rust
/// use daedalus_core::xml::to_xml;
/// use serde_json::json;
///
/// let xml = to_xml("user", &json!({"id": 7, "tags": ["a", "b"]}));
/// assert_eq!(xml, "<user><id>7</id><tags>a</tags><tags>b</tags></user>");
/// ```
pub fn to_xml(root: &str, value: &Value) -> String {
    let mut out = String::new();
    let root = element_name(root);
    match value {
        Value::Array(items) => {
            open(&mut out, &root);
            for item in items {
                write_element(&mut out, "item", item);
            }
            close(&mut out, &root);
        }
        other => write_element(&mut out, &root, other),
    }
    out
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(name);
            out.push_str("/>");
        }
        Value::Array(items) => {
            for item in items {
                write_element(out, name, item);
            }
        }
        Value::Object(map) => {
            open(out, name);
            for (key, child) in map {
                write_element(out, &element_name(key), child);
            }
            close(out, name);
        }
        Value::String(s) => {
            open(out, name);
            escape_into(out, s);
            close(out, name);
        }
        Value::Bool(_) | Value::Number(_) => {
            open(out, name);
            out.push_str(&value.to_string());
            close(out, name);
        }
    }
}

fn open(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}

/// Replaces characters that cannot appear in an element name.
fn element_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escapes_text() {
        assert_eq!(to_xml("m", &json!("a<b & c")), "<m>a&lt;b &amp; c</m>");
    }

    #[test]
    fn test_null_and_nested() {
        let xml = to_xml("r", &json!({"a": null, "b": {"c": true}}));
        assert_eq!(xml, "<r><a/><b><c>true</c></b></r>");
    }

    #[test]
    fn test_top_level_array() {
        assert_eq!(to_xml("list", &json!([1, 2])), "<list><item>1</item><item>2</item></list>");
    }

    #[test]
    fn test_invalid_names_are_replaced() {
        assert_eq!(to_xml("9 lives", &json!(1)), "<_9_lives>1</_9_lives>");
        assert_eq!(to_xml("", &json!(1)), "<_>1</_>");
    }
}
