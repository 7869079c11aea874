//! Untyped dashboard tree.

use std::collections::BTreeMap;

use serde_json::Value;

/// Leaf value of a dashboard tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// A node of a parsed dashboard document.
///
/// No schema is assumed: the extractor only looks at a handful of keys and
/// ignores every shape it does not recognise.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Mapping(BTreeMap<String, ConfigNode>),
    Sequence(Vec<ConfigNode>),
    Scalar(Scalar),
}

impl ConfigNode {
    /// Parse a JSON document into a tree.
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice::<Value>(bytes).map(Self::from)
    }

    /// Child under `key` when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigNode::Scalar(Scalar::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ConfigNode::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigNode::from(v)))
                    .collect(),
            ),
            Value::Array(items) => {
                ConfigNode::Sequence(items.into_iter().map(ConfigNode::from).collect())
            }
            Value::String(s) => ConfigNode::Scalar(Scalar::String(s)),
            Value::Number(n) => match n.as_f64() {
                Some(f) => ConfigNode::Scalar(Scalar::Number(f)),
                None => ConfigNode::Scalar(Scalar::Null),
            },
            Value::Bool(b) => ConfigNode::Scalar(Scalar::Bool(b)),
            Value::Null => ConfigNode::Scalar(Scalar::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let node = ConfigNode::from(json!({
            "title": "TiDB",
            "rows": [{ "step": 10 }, true, null]
        }));

        assert_eq!(node.get("title").and_then(ConfigNode::as_str), Some("TiDB"));
        match node.get("rows") {
            Some(ConfigNode::Sequence(rows)) => {
                assert_eq!(rows.len(), 3);
                assert_eq!(rows[0].get("step").and_then(ConfigNode::as_f64), Some(10.0));
                assert_eq!(rows[1], ConfigNode::Scalar(Scalar::Bool(true)));
                assert_eq!(rows[2], ConfigNode::Scalar(Scalar::Null));
            }
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_has_no_children() {
        let node = ConfigNode::Scalar(Scalar::String("panels".into()));
        assert!(node.get("panels").is_none());
        assert!(node.as_f64().is_none());
    }

    #[test]
    fn test_rejects_malformed_document() {
        assert!(ConfigNode::from_json_slice(b"{\"rows\": [").is_err());
    }
}
