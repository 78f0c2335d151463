use std::collections::BTreeMap;

use crate::constants::is_reserved;
use crate::error::{MatchError, Result};
use crate::query::{Query, Slot};
use crate::value::Value;

/// Variable name → bound value, as produced by the matching production.
pub type Bindings = BTreeMap<String, Value>;

/// What happens to a variable with no binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnboundPolicy {
    /// Fail with `UnboundVariable`.
    Strict,
    /// Leave the slot unconstrained. This is what visual search uses.
    #[default]
    Lenient,
}

/// A slot after variable substitution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Constraint {
    #[default]
    Any,
    Equals(Value),
    Differs(Value),
}

impl Constraint {
    pub fn is_any(&self) -> bool {
        matches!(self, Constraint::Any)
    }

    /// Whether an observed value (or its absence) meets the constraint.
    pub fn admits(&self, observed: Option<&Value>) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Equals(want) => observed == Some(want),
            Constraint::Differs(avoid) => observed != Some(avoid),
        }
    }
}

/// A query with every variable substituted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub value: Constraint,
    pub screen_x: Constraint,
    pub screen_y: Constraint,
    pub slots: BTreeMap<String, Constraint>,
}

impl ResolvedQuery {
    /// Open-slot constraints that actually restrict something.
    pub fn active_slots(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.slots
            .iter()
            .filter(|(_, c)| !c.is_any())
            .map(|(k, c)| (k.as_str(), c))
    }
}

/// Substitute bound variables in `query`, producing a fresh resolved copy.
///
/// Slot names are validated here; a query that cannot be read as a set of
/// named slots fails with `MalformedQuery` regardless of policy.
pub fn resolve(query: &Query, bindings: &Bindings, policy: UnboundPolicy) -> Result<ResolvedQuery> {
    let mut slots = BTreeMap::new();
    for (name, slot) in query.slots() {
        check_slot_name(name)?;
        slots.insert(name.clone(), resolve_slot(name, slot, bindings, policy)?);
    }

    Ok(ResolvedQuery {
        value: resolve_slot("value", &query.value, bindings, policy)?,
        screen_x: resolve_slot("screen_x", &query.screen_x, bindings, policy)?,
        screen_y: resolve_slot("screen_y", &query.screen_y, bindings, policy)?,
        slots,
    })
}

fn check_slot_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MatchError::malformed("slot name is empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(MatchError::malformed(format!(
            "slot name '{name}' contains whitespace"
        )));
    }
    if is_reserved(name) {
        return Err(MatchError::malformed(format!(
            "'{name}' is a stimulus field, not a location slot"
        )));
    }
    Ok(())
}

fn resolve_slot(
    slot_name: &str,
    slot: &Slot,
    bindings: &Bindings,
    policy: UnboundPolicy,
) -> Result<Constraint> {
    let bound = |var: &str| -> Result<Option<Value>> {
        if var.is_empty() {
            return Err(MatchError::malformed(format!(
                "slot '{slot_name}' names an empty variable"
            )));
        }
        match (bindings.get(var), policy) {
            (Some(v), _) => Ok(Some(v.clone())),
            (None, UnboundPolicy::Lenient) => Ok(None),
            (None, UnboundPolicy::Strict) => Err(MatchError::UnboundVariable {
                name: var.to_string(),
            }),
        }
    };

    Ok(match slot {
        Slot::Empty => Constraint::Any,
        Slot::Value(v) => Constraint::Equals(v.clone()),
        Slot::Not(v) => Constraint::Differs(v.clone()),
        Slot::Variable(var) => bound(var)?.map_or(Constraint::Any, Constraint::Equals),
        Slot::NotVariable(var) => bound(var)?.map_or(Constraint::Any, Constraint::Differs),
    })
}
