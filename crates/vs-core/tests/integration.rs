//! Integration tests exercising the full search path:
//! scene → query → vision module → location record → attention.

use vs_core::{
    ATTENDED, AttributeSet, Bindings, ExtraTests, LocationMatcher, MatchError, MatcherKind, Query,
    StimulusMatcher, StimulusStore, Value, VisionConfig, VisionModule, import_json,
};

fn no_tests() -> ExtraTests {
    ExtraTests::new()
}

fn attended(flag: bool) -> ExtraTests {
    ExtraTests::from([(ATTENDED.to_string(), Value::Bool(flag))])
}

/// Scenario 1: a single stimulus and an unconstrained query.
#[test]
fn unconstrained_query_returns_location_record() {
    let mut stimuli = StimulusStore::new();
    stimuli.insert("s1", AttributeSet::at(2, 3).with_text("X"));

    let found = StimulusMatcher
        .find(&Query::new(), &Bindings::new(), &no_tests(), &stimuli, None)
        .unwrap()
        .expect("s1 should match");

    assert_eq!(found.location.screen_x, 2);
    assert_eq!(found.location.screen_y, 3);
    assert_eq!(found.stimulus_id.as_str(), "s1");
    assert_eq!(found.stimulus, AttributeSet::at(2, 3).with_text("X"));
}

/// Scenario 2: absolute x coordinate selects the second stimulus.
#[test]
fn screen_x_selects_matching_column() {
    let mut stimuli = StimulusStore::new();
    stimuli.insert("s1", AttributeSet::at(0, 0));
    stimuli.insert("s2", AttributeSet::at(5, 5));

    let found = StimulusMatcher
        .find(
            &Query::new().with("screen_x", 5),
            &Bindings::new(),
            &no_tests(),
            &stimuli,
            None,
        )
        .unwrap()
        .unwrap();
    assert_eq!(found.stimulus_id.as_str(), "s2");
}

/// Scenario 3: an attended stimulus is excluded from an unattended search.
#[test]
fn unattended_search_skips_finst_entries() {
    let scene = import_json(
        r#"{
            "name": "finst",
            "stimuli": [
                {"id": "s1", "position": [1, 1], "text": "A"},
                {"id": "s2", "position": [4, 1], "text": "B"}
            ],
            "attended": ["s1"]
        }"#,
        4,
    )
    .unwrap();

    let vision = VisionModule::new(&VisionConfig::default()).with_history(scene.history.clone());
    let found = vision
        .find(&Query::new(), &Bindings::new(), &attended(false), &scene.stimuli)
        .unwrap()
        .unwrap();
    assert_eq!(found.stimulus_id.as_str(), "s2");

    let found = vision
        .find(&Query::new(), &Bindings::new(), &attended(true), &scene.stimuli)
        .unwrap()
        .unwrap();
    assert_eq!(found.stimulus_id.as_str(), "s1");
}

/// Scenario 4: a text value nobody carries yields no match.
#[test]
fn absent_text_yields_no_match() {
    let mut stimuli = StimulusStore::new();
    stimuli.insert("s1", AttributeSet::at(0, 0).with_text("A"));
    stimuli.insert("s2", AttributeSet::at(1, 0).with_text("B"));

    let found = StimulusMatcher
        .find(
            &Query::new().with("value", "TARGET"),
            &Bindings::new(),
            &no_tests(),
            &stimuli,
            None,
        )
        .unwrap();
    assert!(found.is_none());
}

/// Scenario 5: a query that cannot be read as slot/value pairs is rejected
/// before any scanning happens.
#[test]
fn malformed_query_raises() {
    let err = Query::from_json(&serde_json::json!(["screen_x", 5])).unwrap_err();
    assert!(matches!(err, MatchError::MalformedQuery { .. }));

    let err = Query::parse("").unwrap_err();
    assert!(matches!(err, MatchError::MalformedQuery { .. }));

    let mut stimuli = StimulusStore::new();
    stimuli.insert("s1", AttributeSet::at(0, 0));
    let err = StimulusMatcher
        .find(
            &Query::new().with("vis_delay", 5),
            &Bindings::new(),
            &no_tests(),
            &stimuli,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, MatchError::MalformedQuery { .. }));
}

/// A visual search loop: keep asking for unattended letters until the
/// screen is exhausted, attending each one found.
#[test]
fn search_loop_visits_each_stimulus_once_in_order() {
    let mut stimuli = StimulusStore::new();
    for (i, letter) in ["Q", "R", "S", "T"].iter().enumerate() {
        stimuli.insert(format!("s{i}"), AttributeSet::at(i as i64, 0).with_text(*letter));
    }

    let mut vision = VisionModule::new(&VisionConfig {
        finst: 4,
        matcher: MatcherKind::Stimulus,
    });
    let mut visited = Vec::new();
    while let Some(found) = vision
        .find(&Query::new(), &Bindings::new(), &attended(false), &stimuli)
        .unwrap()
    {
        visited.push(found.stimulus.text.clone().unwrap());
        vision.attend(found.stimulus);
    }
    assert_eq!(visited, vec!["Q", "R", "S", "T"]);
}

/// With fewer FINSTs than stimuli the oldest attended item becomes novel
/// again and the scan revisits it.
#[test]
fn finst_capacity_limits_memory() {
    let mut stimuli = StimulusStore::new();
    for i in 0..3 {
        stimuli.insert(format!("s{i}"), AttributeSet::at(i, 0));
    }
    let mut vision = VisionModule::new(&VisionConfig {
        finst: 2,
        matcher: MatcherKind::Stimulus,
    });

    let mut order = Vec::new();
    for _ in 0..4 {
        let found = vision
            .find(&Query::new(), &Bindings::new(), &attended(false), &stimuli)
            .unwrap()
            .unwrap();
        order.push(found.stimulus_id.to_string());
        vision.attend(found.stimulus);
    }
    assert_eq!(order, vec!["s0", "s1", "s2", "s0"]);
}

/// Variables bound by the production constrain the search; unbound ones
/// do not.
#[test]
fn bound_and_unbound_variables() {
    let mut stimuli = StimulusStore::new();
    stimuli.insert("red", AttributeSet::at(0, 0).with("color", "red"));
    stimuli.insert("blue", AttributeSet::at(1, 0).with("color", "blue"));

    let query = Query::parse("color =c; screen_y =row").unwrap();
    let bindings = Bindings::from([("c".to_string(), Value::from("blue"))]);

    let found = StimulusMatcher
        .find(&query, &bindings, &no_tests(), &stimuli, None)
        .unwrap()
        .unwrap();
    assert_eq!(found.stimulus_id.as_str(), "blue");

    let found = StimulusMatcher
        .find(&query, &Bindings::new(), &no_tests(), &stimuli, None)
        .unwrap()
        .unwrap();
    assert_eq!(found.stimulus_id.as_str(), "red");
}

/// The two strategies agree on ordinary integer queries and differ on
/// textual coordinates.
#[test]
fn reference_and_stimulus_matchers_side_by_side() {
    let mut stimuli = StimulusStore::new();
    stimuli.insert("a", AttributeSet::at(3, 3).with("kind", "letter"));
    let reference = VisionModule::new(&VisionConfig {
        finst: 4,
        matcher: MatcherKind::Reference,
    });
    let stimulus = VisionModule::new(&VisionConfig::default());

    let int_query = Query::new().with("screen_x", 3).with("kind", "letter");
    assert!(reference.find(&int_query, &Bindings::new(), &no_tests(), &stimuli).unwrap().is_some());
    assert!(stimulus.find(&int_query, &Bindings::new(), &no_tests(), &stimuli).unwrap().is_some());

    let text_query = Query::from_json(&serde_json::json!({"screen_x": "=x"})).unwrap();
    let bindings = Bindings::from([("x".to_string(), Value::from("3"))]);
    assert!(reference.find(&text_query, &bindings, &no_tests(), &stimuli).unwrap().is_none());
    assert!(stimulus.find(&text_query, &bindings, &no_tests(), &stimuli).unwrap().is_some());
}
