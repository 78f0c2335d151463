/// Type marker carried by every synthesized location record.
pub const VISUAL_LOCATION: &str = "_visuallocation";

/// Stimulus attributes that have dedicated fields and never appear as
/// loose keys of a location record.
pub const RESERVED_ATTRIBUTES: [&str; 3] = ["position", "text", "vis_delay"];

/// Fields a location record sets itself; stimulus attributes with these
/// names are overridden.
pub const LOCATION_FIELDS: [&str; 3] = ["isa", "screen_x", "screen_y"];

/// Default FINST count (attention history capacity).
pub const DEFAULT_FINST: usize = 4;

/// Agent type name denoting an externally controlled participant.
pub const HUMAN_AGENT: &str = "Human";

/// Extra-test key selecting attended or unattended stimuli.
pub const ATTENDED: &str = "attended";

pub fn is_reserved(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}
