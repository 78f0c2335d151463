use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete attribute value carried by a stimulus or required by a query.
///
/// Comparison is strict: `Int(5)` and `Text("5")` are different values. The
/// only place integers are recovered from text is coordinate filtering, see
/// [`Value::as_int`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Value {
    /// Parse a bare token from query text: canonical integers become `Int`,
    /// `True`/`False` become `Bool`, everything else is `Text`.
    ///
    /// The result always displays as the token it came from, so `007`,
    /// `+5` and `true` stay text.
    pub fn from_token(token: &str) -> Self {
        match token {
            "True" => return Value::Bool(true),
            "False" => return Value::Bool(false),
            _ => {}
        }
        match token.parse::<i64>() {
            Ok(n) if n.to_string() == token => Value::Int(n),
            _ => Value::Text(token.to_string()),
        }
    }

    /// Integer reading used by coordinate constraints.
    /// Text is parsed after trimming; booleans are never integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value reads as "no" for the attended flag.
    ///
    /// Mirrors the host runtime, where `False`, the string `"False"` and the
    /// integer `0` all compare equal to false.
    pub fn is_false_flag(&self) -> bool {
        matches!(self, Value::Bool(false) | Value::Int(0))
            || matches!(self, Value::Text(s) if s == "False")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_infers_types() {
        assert_eq!(Value::from_token("42"), Value::Int(42));
        assert_eq!(Value::from_token("-3"), Value::Int(-3));
        assert_eq!(Value::from_token("True"), Value::Bool(true));
        assert_eq!(Value::from_token("False"), Value::Bool(false));
        assert_eq!(Value::from_token("red"), Value::Text("red".into()));
    }

    #[test]
    fn test_from_token_keeps_spelling() {
        for token in ["007", "+5", "-0", "true", "FALSE", "1e3"] {
            let v = Value::from_token(token);
            assert_eq!(v, Value::Text(token.into()), "token {token}");
            assert_eq!(v.to_string(), token);
        }
        assert_eq!(Value::from_token("007").as_int(), Some(7));
    }

    #[test]
    fn test_as_int_is_lenient_for_text_only() {
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Text(" 12 ".into()).as_int(), Some(12));
        assert_eq!(Value::Text("left".into()).as_int(), None);
        assert_eq!(Value::Bool(true).as_int(), None);
    }

    #[test]
    fn test_false_flag() {
        assert!(Value::Bool(false).is_false_flag());
        assert!(Value::Text("False".into()).is_false_flag());
        assert!(Value::Int(0).is_false_flag());
        assert!(!Value::Text("false".into()).is_false_flag());
        assert!(!Value::Bool(true).is_false_flag());
        assert!(!Value::Int(1).is_false_flag());
    }

    #[test]
    fn test_untagged_json() {
        let v: Vec<Value> = serde_json::from_str(r#"[true, 3, "x"]"#).unwrap();
        assert_eq!(
            v,
            vec![Value::Bool(true), Value::Int(3), Value::Text("x".into())]
        );
        assert!(serde_json::from_str::<Value>("1.5").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::Int(-1).to_string(), "-1");
        assert_eq!(Value::from("abc").to_string(), "abc");
    }
}
