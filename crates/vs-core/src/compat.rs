//! One-directional subsumption between a candidate record and a query.
//!
//! The query is the more general side: every constraint it states must hold
//! on the candidate, while candidate attributes the query says nothing about
//! never block a match.

use std::collections::BTreeMap;

use crate::binder::ResolvedQuery;
use crate::value::Value;

/// Whether `candidate` satisfies every open-slot constraint of `query`.
///
/// The fixed `value`, `screen_x` and `screen_y` slots are not consulted;
/// they are enforced by the matcher's dedicated filters.
pub fn satisfies(candidate: &BTreeMap<String, Value>, query: &ResolvedQuery) -> bool {
    query
        .active_slots()
        .all(|(name, constraint)| constraint.admits(candidate.get(name)))
}
