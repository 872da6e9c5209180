//! Decoding nodes into opaque values.

use serde_json::{Map, Number, Value};

use crate::node::tags;
use crate::{Node, NodeKind};

/// Decode a node into an untyped value.
///
/// Scalars are decoded according to their tag; unknown tags decode as
/// strings. Aliases decode as the node they refer to.
pub fn to_json_value(node: &Node) -> Value {
    let node = node.resolve_alias();
    match node.kind {
        NodeKind::Scalar => scalar_value(node),
        NodeKind::Sequence => Value::Array(node.content.iter().map(to_json_value).collect()),
        NodeKind::Mapping => {
            let mut map = Map::new();
            for (key, value) in node.pairs() {
                map.insert(key.resolve_alias().value.clone(), to_json_value(value));
            }
            Value::Object(map)
        }
        // resolve_alias only stops on an alias with no target
        NodeKind::Alias => Value::Null,
    }
}

fn scalar_value(node: &Node) -> Value {
    let text = node.value.as_str();
    match node.tag.as_str() {
        tags::NULL => Value::Null,
        tags::BOOL => Value::Bool(text.eq_ignore_ascii_case("true")),
        tags::INT => parse_int(text)
            .map(Value::from)
            .unwrap_or_else(|| Value::String(text.to_string())),
        tags::FLOAT => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        _ => Value::String(text.to_string()),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(oct) = text.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok();
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use serde_json::json;

    #[test]
    fn test_decode_mapping() {
        let root = parse("a: 1\nb: [true, null, x]\nc: {d: 2.5}\ne: '7'").unwrap();
        assert_eq!(
            to_json_value(&root),
            json!({"a": 1, "b": [true, null, "x"], "c": {"d": 2.5}, "e": "7"})
        );
    }

    #[test]
    fn test_decode_alias() {
        let root = parse("a: &x [1]\nb: *x").unwrap();
        assert_eq!(to_json_value(root.get("b").unwrap()), json!([1]));
    }

    #[test]
    fn test_non_finite_float_stays_text() {
        let root = parse("a: .nan").unwrap();
        assert_eq!(to_json_value(root.get("a").unwrap()), json!(".nan"));
    }
}
