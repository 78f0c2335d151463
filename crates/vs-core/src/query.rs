//! Perceptual queries: the pattern a production requests from the visual
//! location buffer.
//!
//! A query has three fixed slots (`value`, `screen_x`, `screen_y`) and an
//! open map of attribute slots mirroring stimulus attributes. Slot text uses
//! the production-language conventions: `=x` is a variable, `~v` a negated
//! value, `~=x` a negated variable and `None` (or nothing) leaves the slot
//! empty.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::VISUAL_LOCATION;
use crate::error::{MatchError, Result};
use crate::value::Value;

static SLOT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_\-]*)\s+(\S.*)$").unwrap());

/// One query entry before variable resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Slot {
    #[default]
    Empty,
    Value(Value),
    Variable(String),
    Not(Value),
    NotVariable(String),
}

impl Slot {
    /// Parse slot text in production-language form.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() || token == "None" {
            return Slot::Empty;
        }
        if let Some(name) = token.strip_prefix("~=") {
            return Slot::NotVariable(name.to_string());
        }
        if let Some(name) = token.strip_prefix('=') {
            return Slot::Variable(name.to_string());
        }
        if let Some(rest) = token.strip_prefix('~') {
            return Slot::Not(Value::from_token(rest));
        }
        Slot::Value(Value::from_token(token))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn variable(&self) -> Option<&str> {
        match self {
            Slot::Variable(name) | Slot::NotVariable(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Empty => write!(f, "None"),
            Slot::Value(v) => write!(f, "{v}"),
            Slot::Variable(name) => write!(f, "={name}"),
            Slot::Not(v) => write!(f, "~{v}"),
            Slot::NotVariable(name) => write!(f, "~={name}"),
        }
    }
}

impl From<&str> for Slot {
    fn from(s: &str) -> Self {
        Slot::parse(s)
    }
}

impl From<Value> for Slot {
    fn from(v: Value) -> Self {
        Slot::Value(v)
    }
}

impl From<i64> for Slot {
    fn from(n: i64) -> Self {
        Slot::Value(Value::Int(n))
    }
}

impl From<i32> for Slot {
    fn from(n: i32) -> Self {
        Slot::Value(Value::Int(n as i64))
    }
}

impl From<bool> for Slot {
    fn from(b: bool) -> Self {
        Slot::Value(Value::Bool(b))
    }
}

/// A visual-location request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub value: Slot,
    pub screen_x: Slot,
    pub screen_y: Slot,
    slots: BTreeMap<String, Slot>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, slot: impl Into<Slot>) -> Self {
        self.set(name, slot);
        self
    }

    /// Set a slot by name; `value`, `screen_x` and `screen_y` go to their
    /// fixed fields, everything else to the open map.
    pub fn set(&mut self, name: impl Into<String>, slot: impl Into<Slot>) {
        let name = name.into();
        let slot = slot.into();
        match name.as_str() {
            "value" => self.value = slot,
            "screen_x" => self.screen_x = slot,
            "screen_y" => self.screen_y = slot,
            _ => {
                self.slots.insert(name, slot);
            }
        }
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        match name {
            "value" => Some(&self.value),
            "screen_x" => Some(&self.screen_x),
            "screen_y" => Some(&self.screen_y),
            other => self.slots.get(other),
        }
    }

    /// Open attribute slots, fixed slots excluded.
    pub fn slots(&self) -> &BTreeMap<String, Slot> {
        &self.slots
    }

    /// Every slot that actually constrains something, fixed slots first.
    pub fn used(&self) -> impl Iterator<Item = (&str, &Slot)> {
        [
            ("value", &self.value),
            ("screen_x", &self.screen_x),
            ("screen_y", &self.screen_y),
        ]
        .into_iter()
        .chain(self.slots.iter().map(|(k, v)| (k.as_str(), v)))
        .filter(|(_, slot)| !slot.is_empty())
    }

    /// Build a query from `(slot, value)` pairs. An `isa` pair, when
    /// present, must name the visual-location type.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Query::new();
        let mut seen = std::collections::HashSet::new();
        let mut count = 0;

        for (slot, value) in pairs {
            count += 1;
            let slot = slot.as_ref().trim();
            let value = value.as_ref().trim();
            if slot.is_empty() {
                return Err(MatchError::malformed("slot name is empty"));
            }
            if !seen.insert(slot.to_string()) {
                return Err(MatchError::malformed(format!("slot '{slot}' given twice")));
            }
            if slot == "isa" {
                check_type(value)?;
                continue;
            }
            query.set(slot, Slot::parse(value));
        }

        if count == 0 {
            return Err(MatchError::malformed(
                "at least one (slot, value) pair is required",
            ));
        }
        Ok(query)
    }

    /// Parse `slot value` entries separated by newlines or `;`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for segment in text.split(['\n', ';']) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let caps = SLOT_LINE.captures(segment).ok_or_else(|| {
                MatchError::malformed(format!("expected 'slot value', got '{segment}'"))
            })?;
            pairs.push((caps[1].to_string(), caps[2].to_string()));
        }
        Self::from_pairs(pairs)
    }

    /// Decode a JSON object of slots. `null` leaves a slot empty, strings
    /// use slot-text conventions, booleans and integers are concrete values.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| MatchError::malformed("expected a JSON object of slots"))?;

        let mut query = Query::new();
        for (name, raw) in object {
            if name == "isa" {
                check_type(raw.as_str().unwrap_or_default())?;
                continue;
            }
            let slot = match raw {
                serde_json::Value::Null => Slot::Empty,
                serde_json::Value::Bool(b) => Slot::Value(Value::Bool(*b)),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => Slot::Value(Value::Int(i)),
                    None => {
                        return Err(MatchError::malformed(format!(
                            "slot '{name}' holds non-integer number {n}"
                        )));
                    }
                },
                serde_json::Value::String(s) => Slot::parse(s),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(MatchError::malformed(format!(
                        "slot '{name}' must hold a scalar"
                    )));
                }
            };
            query.set(name.as_str(), slot);
        }
        Ok(query)
    }
}

fn check_type(type_name: &str) -> Result<()> {
    if type_name == VISUAL_LOCATION {
        Ok(())
    } else {
        Err(MatchError::malformed(format!(
            "query type '{type_name}' is not {VISUAL_LOCATION}"
        )))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "isa {VISUAL_LOCATION}")?;
        for (name, slot) in self.used() {
            write!(f, "; {name} {slot}")?;
        }
        Ok(())
    }
}
