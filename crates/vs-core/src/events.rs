use serde::{Deserialize, Serialize};

const RULE_FIRED: &str = "RULE FIRED: ";
const KEY_PRESSED: &str = "KEY PRESSED:";

/// One entry of the simulation trace: `(time, module, action)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub time: f64,
    pub module: String,
    pub action: String,
}

impl SimEvent {
    pub fn new(time: f64, module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            time,
            module: module.into(),
            action: action.into(),
        }
    }
}

/// Name of the production fired by this event, if it is a firing: the
/// action with every `RULE FIRED: ` marker removed.
pub fn production_fired(event: &SimEvent) -> Option<String> {
    event
        .action
        .contains(RULE_FIRED)
        .then(|| event.action.replace(RULE_FIRED, ""))
}

/// The key pressed by the manual module. Multi-character key names yield
/// their last character.
pub fn key_pressed(event: &SimEvent) -> Option<char> {
    if event.module != "manual" || !event.action.contains(KEY_PRESSED) {
        return None;
    }
    event.action.chars().last()
}
