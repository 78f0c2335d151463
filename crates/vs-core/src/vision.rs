//! The perceptual module: a matcher strategy plus the FINST list it reads.
//!
//! The strategy is chosen when the module is built; nothing global is
//! patched, so two modules with different matchers can live side by side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeSet;
use crate::binder::Bindings;
use crate::constants::DEFAULT_FINST;
use crate::error::Result;
use crate::history::AttentionHistory;
use crate::matcher::{ExtraTests, LocationMatcher, Match, ReferenceMatcher, StimulusMatcher};
use crate::query::Query;
use crate::stimulus::StimulusStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    #[default]
    Stimulus,
    Reference,
}

impl MatcherKind {
    pub fn build(self) -> Box<dyn LocationMatcher> {
        match self {
            MatcherKind::Stimulus => Box::new(StimulusMatcher::new()),
            MatcherKind::Reference => Box::new(ReferenceMatcher::new()),
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherKind::Stimulus => write!(f, "stimulus"),
            MatcherKind::Reference => write!(f, "reference"),
        }
    }
}

impl FromStr for MatcherKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stimulus" => Ok(MatcherKind::Stimulus),
            "reference" => Ok(MatcherKind::Reference),
            other => Err(format!(
                "unknown matcher '{other}' (expected 'stimulus' or 'reference')"
            )),
        }
    }
}

/// Construction parameters for a [`VisionModule`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// FINST count; 0 turns attention tracking off.
    pub finst: usize,
    pub matcher: MatcherKind,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            finst: DEFAULT_FINST,
            matcher: MatcherKind::default(),
        }
    }
}

pub struct VisionModule {
    matcher: Box<dyn LocationMatcher>,
    history: AttentionHistory,
}

impl fmt::Debug for VisionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionModule")
            .field("matcher", &self.matcher.name())
            .field("finst", &self.history.capacity())
            .field("attended", &self.history.len())
            .finish()
    }
}

impl VisionModule {
    pub fn new(config: &VisionConfig) -> Self {
        Self::with_matcher(config.matcher.build(), config.finst)
    }

    /// Inject any matcher implementation.
    pub fn with_matcher(matcher: Box<dyn LocationMatcher>, finst: usize) -> Self {
        Self {
            matcher,
            history: AttentionHistory::new(finst),
        }
    }

    /// Start from an existing history (e.g. one restored from storage).
    pub fn with_history(mut self, history: AttentionHistory) -> Self {
        self.history = history;
        self
    }

    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }

    pub fn history(&self) -> &AttentionHistory {
        &self.history
    }

    pub fn into_history(self) -> AttentionHistory {
        self.history
    }

    /// Search `stimuli` with this module's matcher and history.
    pub fn find(
        &self,
        query: &Query,
        bindings: &Bindings,
        extra_tests: &ExtraTests,
        stimuli: &StimulusStore,
    ) -> Result<Option<Match>> {
        self.matcher
            .find(query, bindings, extra_tests, stimuli, Some(&self.history))
    }

    /// Move attention to a stimulus, recording it in the FINST list.
    pub fn attend(&mut self, attributes: AttributeSet) {
        self.history.record(attributes);
    }
}
