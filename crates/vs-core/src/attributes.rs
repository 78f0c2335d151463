use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Integer screen position of a stimulus. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<[i64; 2]> for Position {
    fn from([x, y]: [i64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [i64; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

/// Properties of one stimulus.
///
/// The reserved names (`position`, `text`, `vis_delay`) live in dedicated
/// fields; `attributes` is the open, domain-specific part. Equality is
/// structural, which is what attention history membership relies on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeSet {
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vis_delay: Option<u64>,
    #[serde(flatten)]
    attributes: BTreeMap<String, Value>,
}

impl AttributeSet {
    pub fn at(x: i64, y: i64) -> Self {
        Self {
            position: Position::new(x, y),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_vis_delay(mut self, delay: u64) -> Self {
        self.vis_delay = Some(delay);
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute by name. Reserved names are routed to their
    /// dedicated fields: `text` takes the value's text form, `vis_delay`
    /// takes a non-negative integer, and `position` cannot be set from a
    /// single value and is ignored.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "text" => self.text = Some(value.to_string()),
            "vis_delay" => match value.as_int().and_then(|n| u64::try_from(n).ok()) {
                Some(delay) => self.vis_delay = Some(delay),
                None => tracing::debug!("ignoring non-integer vis_delay {value}"),
            },
            "position" => tracing::warn!("position must be set through the position field"),
            _ => {
                self.attributes.insert(name, value);
            }
        }
    }

    /// Look up a domain attribute. Reserved names are never found here.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The domain attributes with reserved names excluded: the free part of
    /// a location record.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_routes_reserved_names() {
        let attrs = AttributeSet::at(1, 2)
            .with("text", "A")
            .with("vis_delay", 50)
            .with("position", "ignored")
            .with("color", "red");

        assert_eq!(attrs.text.as_deref(), Some("A"));
        assert_eq!(attrs.vis_delay, Some(50));
        assert_eq!(attrs.position, Position::new(1, 2));
        assert_eq!(attrs.attributes().len(), 1);
        assert_eq!(attrs.get("color"), Some(&Value::from("red")));
        assert!(attrs.get("text").is_none());
    }

    #[test]
    fn test_negative_vis_delay_ignored() {
        let attrs = AttributeSet::at(0, 0).with("vis_delay", -5);
        assert_eq!(attrs.vis_delay, None);
    }

    #[test]
    fn test_structural_equality() {
        let a = AttributeSet::at(3, 4).with("color", "blue");
        let b = AttributeSet::at(3, 4).with("color", "blue");
        let c = AttributeSet::at(3, 4).with("color", "green");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_json_reserved_fields_stay_out_of_map() {
        let json = r#"{"position": [2, 3], "text": "X", "vis_delay": 10, "color": "red", "size": 4}"#;
        let attrs: AttributeSet = serde_json::from_str(json).unwrap();
        assert_eq!(attrs.position, Position::new(2, 3));
        assert_eq!(attrs.text.as_deref(), Some("X"));
        assert_eq!(attrs.vis_delay, Some(10));
        let keys: Vec<&str> = attrs.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["color", "size"]);
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let attrs = AttributeSet::at(5, 6).with_text("T").with("kind", "letter");
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["position"], serde_json::json!([5, 6]));
        assert_eq!(json["kind"], "letter");
        assert!(json.get("vis_delay").is_none());
    }
}
