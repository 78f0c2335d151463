//! Visual-location search: scan the stimuli on screen for the first one a
//! query accepts.
//!
//! Two strategies implement [`LocationMatcher`]. [`StimulusMatcher`] is the
//! default: attended-flag and FINST consistency, absolute screen
//! coordinates with lenient integer parsing, and structural subsumption on
//! the remaining attributes. [`ReferenceMatcher`] keeps the host runtime's
//! stock semantics for comparison runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeSet;
use crate::binder::{Bindings, Constraint, ResolvedQuery, UnboundPolicy, resolve};
use crate::compat::satisfies;
use crate::constants::{ATTENDED, LOCATION_FIELDS, VISUAL_LOCATION};
use crate::error::Result;
use crate::history::AttentionHistory;
use crate::query::Query;
use crate::stimulus::{StimulusId, StimulusStore};
use crate::value::Value;

/// Extra tests attached to a request, e.g. `{"attended": false}`.
pub type ExtraTests = BTreeMap<String, Value>;

/// Location chunk synthesized for a successful match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "isa")]
    pub kind: String,
    pub screen_x: i64,
    pub screen_y: i64,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl LocationRecord {
    /// The type marker and the stimulus position take precedence over
    /// same-named stimulus attributes.
    pub fn from_stimulus(attributes: &AttributeSet) -> Self {
        let mut loose = attributes.attributes().clone();
        loose.retain(|name, _| !LOCATION_FIELDS.contains(&name.as_str()));
        Self {
            kind: VISUAL_LOCATION.to_string(),
            screen_x: attributes.position.x,
            screen_y: attributes.position.y,
            attributes: loose,
        }
    }
}

/// A found stimulus: its location record plus the raw stimulus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub location: LocationRecord,
    pub stimulus_id: StimulusId,
    pub stimulus: AttributeSet,
}

/// Strategy for answering visual-location requests.
pub trait LocationMatcher: Send + Sync {
    /// Short identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Return the first stimulus, in store order, that the query accepts.
    fn find(
        &self,
        query: &Query,
        bindings: &Bindings,
        extra_tests: &ExtraTests,
        stimuli: &StimulusStore,
        history: Option<&AttentionHistory>,
    ) -> Result<Option<Match>>;
}

/// Attention requirement derived from the `attended` extra test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttendedFilter {
    Any,
    Attended,
    Unattended,
}

impl AttendedFilter {
    /// `false`, `"False"` or `0` ask for unattended stimuli; any other
    /// value asks for attended ones; no key means no filtering.
    pub fn from_tests(extra_tests: &ExtraTests) -> Self {
        match extra_tests.get(ATTENDED) {
            None => AttendedFilter::Any,
            Some(v) if v.is_false_flag() => AttendedFilter::Unattended,
            Some(_) => AttendedFilter::Attended,
        }
    }

    /// The stricter reading used by the reference matcher: only a literal
    /// boolean selects anything.
    pub fn from_tests_strict(extra_tests: &ExtraTests) -> Self {
        match extra_tests.get(ATTENDED) {
            Some(Value::Bool(true)) => AttendedFilter::Attended,
            Some(Value::Bool(false)) => AttendedFilter::Unattended,
            _ => AttendedFilter::Any,
        }
    }

    /// `history` must already be narrowed to an enabled one; `None` lets
    /// everything through.
    pub fn admits(self, attributes: &AttributeSet, history: Option<&AttentionHistory>) -> bool {
        let Some(history) = history else {
            return true;
        };
        match self {
            AttendedFilter::Any => true,
            AttendedFilter::Attended => history.contains(attributes),
            AttendedFilter::Unattended => !history.contains(attributes),
        }
    }
}

fn enabled(history: Option<&AttentionHistory>) -> Option<&AttentionHistory> {
    history.filter(|h| h.is_enabled())
}

/// Absolute coordinate requirement on one screen axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AxisFilter {
    Free,
    Exactly(i64),
    Not(i64),
}

impl AxisFilter {
    /// Constraints that do not read as integers impose nothing.
    fn lenient(axis: &str, constraint: &Constraint) -> Self {
        let (value, negated) = match constraint {
            Constraint::Any => return AxisFilter::Free,
            Constraint::Equals(v) => (v, false),
            Constraint::Differs(v) => (v, true),
        };
        match (value.as_int(), negated) {
            (Some(n), false) => AxisFilter::Exactly(n),
            (Some(n), true) => AxisFilter::Not(n),
            (None, _) => {
                tracing::debug!("ignoring non-integer {axis} constraint '{value}'");
                AxisFilter::Free
            }
        }
    }

    fn admits(self, coordinate: i64) -> bool {
        match self {
            AxisFilter::Free => true,
            AxisFilter::Exactly(n) => coordinate == n,
            AxisFilter::Not(n) => coordinate != n,
        }
    }
}

fn text_admits(constraint: &Constraint, text: Option<&str>) -> bool {
    match constraint {
        Constraint::Any => true,
        Constraint::Equals(want) => text == Some(want.to_string().as_str()),
        Constraint::Differs(avoid) => text != Some(avoid.to_string().as_str()),
    }
}

/// Default search strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct StimulusMatcher;

impl StimulusMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl LocationMatcher for StimulusMatcher {
    fn name(&self) -> &'static str {
        "stimulus"
    }

    fn find(
        &self,
        query: &Query,
        bindings: &Bindings,
        extra_tests: &ExtraTests,
        stimuli: &StimulusStore,
        history: Option<&AttentionHistory>,
    ) -> Result<Option<Match>> {
        let resolved = resolve(query, bindings, UnboundPolicy::Lenient)?;
        let attended = AttendedFilter::from_tests(extra_tests);
        let history = enabled(history);
        let screen_x = AxisFilter::lenient("screen_x", &resolved.screen_x);
        let screen_y = AxisFilter::lenient("screen_y", &resolved.screen_y);

        for stimulus in stimuli {
            let attrs = &stimulus.attributes;

            if !attended.admits(attrs, history) {
                tracing::trace!(id = %stimulus.id, "skip: attention");
                continue;
            }
            if !text_admits(&resolved.value, attrs.text.as_deref()) {
                tracing::trace!(id = %stimulus.id, "skip: text");
                continue;
            }
            if !screen_x.admits(attrs.position.x) || !screen_y.admits(attrs.position.y) {
                tracing::trace!(id = %stimulus.id, "skip: coordinates");
                continue;
            }
            if !satisfies(attrs.attributes(), &resolved) {
                tracing::trace!(id = %stimulus.id, "skip: attributes");
                continue;
            }

            tracing::debug!(id = %stimulus.id, "visual location found");
            return Ok(Some(Match {
                location: LocationRecord::from_stimulus(attrs),
                stimulus_id: stimulus.id.clone(),
                stimulus: attrs.clone(),
            }));
        }

        tracing::debug!("no stimulus matches {query}");
        Ok(None)
    }
}

/// The host runtime's stock search, kept for side-by-side comparison.
///
/// Coordinates and the text value are folded into the candidate record and
/// compared structurally: a `screen_x` of `"5"` does not match position 5,
/// and a non-numeric coordinate never matches. The attended test only
/// reacts to literal booleans.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceMatcher;

impl ReferenceMatcher {
    pub fn new() -> Self {
        Self
    }

    fn candidate_record(attrs: &AttributeSet) -> BTreeMap<String, Value> {
        let mut record = attrs.attributes().clone();
        record.insert("screen_x".into(), Value::Int(attrs.position.x));
        record.insert("screen_y".into(), Value::Int(attrs.position.y));
        if let Some(text) = &attrs.text {
            record.insert("value".into(), Value::Text(text.clone()));
        }
        record
    }

    fn fixed_slots_admit(resolved: &ResolvedQuery, record: &BTreeMap<String, Value>) -> bool {
        resolved.value.admits(record.get("value"))
            && resolved.screen_x.admits(record.get("screen_x"))
            && resolved.screen_y.admits(record.get("screen_y"))
    }
}

impl LocationMatcher for ReferenceMatcher {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn find(
        &self,
        query: &Query,
        bindings: &Bindings,
        extra_tests: &ExtraTests,
        stimuli: &StimulusStore,
        history: Option<&AttentionHistory>,
    ) -> Result<Option<Match>> {
        let resolved = resolve(query, bindings, UnboundPolicy::Lenient)?;
        let attended = AttendedFilter::from_tests_strict(extra_tests);
        let history = enabled(history);

        let found = stimuli.iter().find(|stimulus| {
            let attrs = &stimulus.attributes;
            if !attended.admits(attrs, history) {
                return false;
            }
            let record = Self::candidate_record(attrs);
            Self::fixed_slots_admit(&resolved, &record) && satisfies(&record, &resolved)
        });

        Ok(found.map(|stimulus| Match {
            location: LocationRecord::from_stimulus(&stimulus.attributes),
            stimulus_id: stimulus.id.clone(),
            stimulus: stimulus.attributes.clone(),
        }))
    }
}
