//! End-to-end scenarios: authored JSON content, TOML config, a session walking
//! the graph, and saves written to disk between visits.

use narrative_core::{
    apply_state_change, evaluate, evaluate_access, evaluate_choices, AccessDenial,
    AccessRequirements, FileStorage, NarrativeGravity, NarrativeSession, SaveManager,
    SessionError,
};
use story_rules::{
    CharacterState, Condition, DialogueGraph, GravityEffect, NarrativeConfig,
    NervousSystemState, PatternType, PlayerState, RelationshipStatus, StateChange,
};

const MAYA_GRAPH: &str = r#"{
    "characterId": "maya",
    "startNodeId": "intro",
    "nodes": [
        {
            "nodeId": "intro",
            "speaker": "Maya Chen",
            "content": [
                {"variantId": "intro_a", "text": "Oh. Hi."},
                {"variantId": "intro_b", "text": "You again."}
            ],
            "onEnter": {"addGlobalFlags": ["met_maya"]},
            "choices": [
                {
                    "choiceId": "ask",
                    "text": "What are you building?",
                    "nextNodeId": "workshop",
                    "pattern": "exploring",
                    "consequence": {
                        "characterId": "maya",
                        "trustChange": 2,
                        "setRelationshipStatus": "acquaintance",
                        "patternChanges": {"exploring": 1}
                    }
                },
                {
                    "choiceId": "letter",
                    "text": "About that letter...",
                    "nextNodeId": "letter",
                    "enabledCondition": {"trust": {"min": 6}}
                },
                {
                    "choiceId": "hidden",
                    "text": "Ask about her brother",
                    "nextNodeId": "letter",
                    "visibleCondition": {"hasKnowledgeFlags": ["knows_brother"]}
                }
            ]
        },
        {
            "nodeId": "workshop",
            "speaker": "Maya Chen",
            "requiredState": {"trust": {"min": 2}},
            "content": [
                {"variantId": "workshop_warm", "text": "Want to see?", "condition": {"relationshipStatus": ["acquaintance"]}},
                {"variantId": "workshop_plain", "text": "Robots."}
            ],
            "choices": [
                {"choiceId": "back", "text": "Back", "nextNodeId": "intro"}
            ]
        },
        {"nodeId": "letter", "speaker": "Maya Chen"}
    ]
}"#;

fn maya_state(trust: i32) -> PlayerState {
    PlayerState::new("player_one").with_character(CharacterState::new("maya").with_trust(trust))
}

#[test]
fn test_play_save_and_resume() {
    let graph = DialogueGraph::from_json_str(MAYA_GRAPH).unwrap();
    assert!(graph.dangling_references().is_empty());
    let config = NarrativeConfig::from_toml_str(
        r#"
        [ordering]
        variant = "deterministic_shuffle"
        "#,
    )
    .unwrap();

    let mut session = NarrativeSession::new(&graph, maya_state(0), &config);
    session.start().unwrap();
    assert!(session.state().has_global_flag("met_maya"));

    let content = session.current_content().unwrap();
    assert!(content.variant_id.starts_with("intro_"));

    let choices = session.available_choices();
    let keys: Vec<_> = choices.iter().map(|c| c.key()).collect();
    assert_eq!(keys.len(), 2);
    assert!(!keys.contains(&"hidden"));
    let letter = choices.iter().find(|c| c.key() == "letter").unwrap();
    assert!(!letter.enabled);
    assert_eq!(letter.locked_reason.as_deref(), Some("Requires more trust (6+)"));

    let workshop = session.choose("ask").unwrap();
    assert_eq!(workshop.node_id, "workshop");
    let warm = session.current_content().unwrap();
    assert_eq!(warm.variant_id, "workshop_warm");

    let dir = tempfile::tempdir().unwrap();
    let mut saves = SaveManager::with_defaults(FileStorage::open(dir.path()).unwrap());
    assert!(saves.save(session.state()));

    let mut reopened = SaveManager::with_defaults(FileStorage::open(dir.path()).unwrap());
    let loaded = reopened.load().unwrap();
    assert_eq!(&loaded, session.state());

    let maya = loaded.character("maya").unwrap();
    assert_eq!(maya.trust, 2);
    assert_eq!(maya.relationship_status, RelationshipStatus::Acquaintance);
    assert_eq!(loaded.pattern(PatternType::Exploring), 1);

    let mut resumed = NarrativeSession::new(&graph, loaded, &config);
    resumed.resume_at("workshop").unwrap();
    resumed.mark_session_boundary();
    assert_eq!(resumed.choose("back").unwrap().node_id, "intro");
    assert_eq!(resumed.state().session.boundaries_crossed, 1);
    assert_eq!(
        resumed.state().character("maya").unwrap().conversation_history.len(),
        2
    );
}

#[test]
fn test_workshop_unreachable_without_trust() {
    let graph = DialogueGraph::from_json_str(MAYA_GRAPH).unwrap();
    let mut session = NarrativeSession::with_defaults(&graph, maya_state(0));
    session.resume_at("intro").unwrap();

    assert!(session.reachable_nodes().iter().all(|n| n.node_id != "workshop"));
    assert_eq!(
        session.choose("hidden"),
        Err(SessionError::UnknownChoice {
            choice: "hidden".to_string(),
            node: "intro".to_string(),
        })
    );
}

#[test]
fn test_fail_open_on_authoring_mistake() {
    let graph = DialogueGraph::from_json_str(
        r#"{
            "characterId": "maya",
            "startNodeId": "wall",
            "nodes": [{
                "nodeId": "wall",
                "speaker": "Maya Chen",
                "choices": [
                    {"choiceId": "a", "text": "A", "nextNodeId": "wall", "visibleCondition": {"trust": {"min": 10}}},
                    {"choiceId": "b", "text": "B", "nextNodeId": "wall", "visibleCondition": {"trust": {"min": 10}}}
                ]
            }]
        }"#,
    )
    .unwrap();
    let state = maya_state(0);

    let evaluated = evaluate_choices(graph.start_node().unwrap(), &state, Some("maya"));
    assert!(evaluated.iter().all(|c| c.visible && c.enabled));

    let mut session = NarrativeSession::with_defaults(&graph, state);
    session.start().unwrap();
    assert_eq!(session.available_choices().len(), 2);
    assert!(session.choose("a").is_ok());
}

#[test]
fn test_condition_and_mutation_scenario() {
    let state = maya_state(3).with_global_flag("test_flag");

    let passes = Condition::new().trust_at_least(2).with_global_flag("test_flag");
    assert!(evaluate(&passes, &state, Some("maya")));
    assert!(!evaluate(&Condition::new().trust_at_least(5), &state, Some("maya")));

    let change = StateChange::for_character("maya")
        .trust(2)
        .relationship(RelationshipStatus::Acquaintance);
    let next = apply_state_change(&state, &change);

    assert_eq!(next.character("maya").unwrap().trust, 5);
    assert_eq!(
        next.character("maya").unwrap().relationship_status,
        RelationshipStatus::Acquaintance
    );
    assert_eq!(state.character("maya").unwrap().trust, 3);
}

#[test]
fn test_gravity_fixture() {
    let state = PlayerState::new("p").with_character(
        CharacterState::new("maya").with_nervous_system(NervousSystemState::Sympathetic),
    );
    let gravity = NarrativeGravity::with_defaults().calculate_gravity(
        Some(PatternType::Helping),
        &state,
        "maya",
    );
    assert_eq!(gravity.effect, GravityEffect::Repel);
    assert_eq!(gravity.weight, 0.6);
}

#[test]
fn test_access_follows_story_progress() {
    let requirements = AccessRequirements::new()
        .trust_at_least(2)
        .after_stage("met_maya");
    let graph = DialogueGraph::from_json_str(MAYA_GRAPH).unwrap();
    let mut session = NarrativeSession::with_defaults(&graph, maya_state(0));

    let before = evaluate_access(&requirements, session.state(), "maya");
    assert!(!before.can_access);
    assert_eq!(before.reason, Some(AccessDenial::InsufficientTrust));

    session.start().unwrap();
    session.choose("ask").unwrap();
    let after = evaluate_access(&requirements, session.state(), "maya");
    assert!(after.can_access);
    assert_eq!(after.progress, 1.0);
}
