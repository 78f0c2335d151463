use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeSet;

/// Opaque stimulus identity assigned by the environment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StimulusId(pub String);

impl StimulusId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StimulusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StimulusId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StimulusId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub id: StimulusId,
    #[serde(flatten)]
    pub attributes: AttributeSet,
}

/// Stimuli currently on screen, in insertion order.
///
/// Enumeration order is what the matcher scans, so it must stay stable:
/// replacing an existing id keeps its slot and removal keeps the relative
/// order of everything else.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StimulusStore {
    stimuli: Vec<Stimulus>,
}

impl StimulusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous attributes when `id` existed.
    pub fn insert(
        &mut self,
        id: impl Into<StimulusId>,
        attributes: AttributeSet,
    ) -> Option<AttributeSet> {
        let id = id.into();
        if let Some(existing) = self.stimuli.iter_mut().find(|s| s.id == id) {
            return Some(std::mem::replace(&mut existing.attributes, attributes));
        }
        self.stimuli.push(Stimulus { id, attributes });
        None
    }

    pub fn remove(&mut self, id: &StimulusId) -> Option<AttributeSet> {
        let idx = self.stimuli.iter().position(|s| &s.id == id)?;
        Some(self.stimuli.remove(idx).attributes)
    }

    pub fn get(&self, id: &StimulusId) -> Option<&AttributeSet> {
        self.stimuli
            .iter()
            .find(|s| &s.id == id)
            .map(|s| &s.attributes)
    }

    pub fn contains(&self, id: &StimulusId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.iter()
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    pub fn clear(&mut self) {
        self.stimuli.clear();
    }
}

impl FromIterator<Stimulus> for StimulusStore {
    fn from_iter<I: IntoIterator<Item = Stimulus>>(iter: I) -> Self {
        let mut store = Self::new();
        for stimulus in iter {
            store.insert(stimulus.id, stimulus.attributes);
        }
        store
    }
}

impl<'a> IntoIterator for &'a StimulusStore {
    type Item = &'a Stimulus;
    type IntoIter = std::slice::Iter<'a, Stimulus>;

    fn into_iter(self) -> Self::IntoIter {
        self.stimuli.iter()
    }
}
