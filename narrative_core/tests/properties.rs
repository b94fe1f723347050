//! Property tests for ordering determinism, snapshot immutability and the
//! save round trip.

use narrative_core::{
    evaluate, evaluate_choices, order_choices_for_display, MemoryStorage, OrderingOptions,
    SaveManager, StateMutator,
};
use proptest::prelude::*;
use std::sync::Arc;
use story_rules::{
    CharacterState, Choice, Condition, ConversationRecord, DialogueNode, NervousSystemState,
    OrderingVariant, PatternType, PlayerState, RelationshipStatus, StateChange, TrustConfig,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_pattern() -> impl Strategy<Value = PatternType> {
    prop::sample::select(PatternType::ALL.to_vec())
}

fn arb_relationship() -> impl Strategy<Value = RelationshipStatus> {
    prop_oneof![
        Just(RelationshipStatus::Stranger),
        Just(RelationshipStatus::Acquaintance),
        Just(RelationshipStatus::Confidant),
    ]
}

fn arb_nervous_system() -> impl Strategy<Value = NervousSystemState> {
    prop::sample::select(NervousSystemState::ALL.to_vec())
}

fn arb_flags() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z_]{1,10}", 0..5)
}

fn arb_character(id: String) -> impl Strategy<Value = CharacterState> {
    (
        0..=10i32,
        arb_relationship(),
        arb_flags(),
        prop::collection::vec(("[a-z_]{1,8}", prop::option::of("[a-z]{1,6}")), 0..4),
        arb_nervous_system(),
    )
        .prop_map(move |(trust, relationship, flags, history, nervous)| {
            let mut character = flags.into_iter().fold(
                CharacterState::new(id.as_str())
                    .with_trust(trust)
                    .with_relationship(relationship)
                    .with_nervous_system(nervous),
                |c, f| c.with_knowledge(f),
            );
            character.conversation_history = history
                .into_iter()
                .map(|(node, choice)| match choice {
                    Some(choice) => ConversationRecord::new(node).with_choice(choice),
                    None => ConversationRecord::new(node),
                })
                .collect();
            character
        })
}

fn arb_state() -> impl Strategy<Value = PlayerState> {
    let characters = prop::collection::hash_set("[a-z]{1,8}", 0..4).prop_flat_map(|ids| {
        ids.into_iter()
            .map(arb_character)
            .collect::<Vec<_>>()
    });
    (
        "player_[a-z0-9]{1,12}",
        characters,
        arb_flags(),
        prop::collection::vec((arb_pattern(), 0..20i32), 0..5),
        prop::collection::hash_map("[a-z_]{1,8}", "[a-z]{1,8}", 0..3),
        0..5u32,
    )
        .prop_map(|(player_id, characters, flags, patterns, mysteries, boundaries)| {
            let mut state = characters
                .into_iter()
                .fold(PlayerState::new(player_id), |s, c| s.with_character(c));
            state = flags.into_iter().fold(state, |s, f| s.with_global_flag(f));
            state = patterns
                .into_iter()
                .fold(state, |s, (p, v)| s.with_pattern(p, v));
            state = mysteries
                .into_iter()
                .fold(state, |s, (k, v)| s.with_mystery(k, v));
            state.session.boundaries_crossed = boundaries;
            state
        })
}

fn arb_choice_keys() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{1,8}", 1..10).prop_map(|keys| keys.into_iter().collect())
}

fn choices_for(keys: &[String]) -> Vec<Choice> {
    keys.iter()
        .map(|k| Choice::new(k.as_str(), k.as_str(), "next"))
        .collect()
}

fn keys_of(choices: &[Choice]) -> Vec<String> {
    choices.iter().map(|c| c.stable_key().to_string()).collect()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn shuffle_ignores_input_order(
        (keys, shuffled) in arb_choice_keys()
            .prop_flat_map(|k| (Just(k.clone()), Just(k).prop_shuffle())),
        seed in "[a-z0-9:]{0,16}",
    ) {
        let options = OrderingOptions::new(OrderingVariant::DeterministicShuffle, seed);
        let first = order_choices_for_display(&choices_for(&keys), &options);
        let second = order_choices_for_display(&choices_for(&shuffled), &options);
        let again = order_choices_for_display(&choices_for(&keys), &options);

        prop_assert_eq!(keys_of(&first), keys_of(&second));
        prop_assert_eq!(keys_of(&first), keys_of(&again));
    }

    #[test]
    fn every_variant_is_a_permutation(keys in arb_choice_keys(), seed in "[a-z]{0,8}") {
        let mut expected = keys.clone();
        expected.sort();
        for variant in [
            OrderingVariant::DeterministicShuffle,
            OrderingVariant::GravityStrict,
            OrderingVariant::GravityBucketShuffle,
        ] {
            let ordered = order_choices_for_display(
                &choices_for(&keys),
                &OrderingOptions::new(variant, seed.clone()),
            );
            let mut got = keys_of(&ordered);
            got.sort();
            prop_assert_eq!(&got, &expected);
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation and mutation
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn empty_condition_always_holds(state in arb_state(), character in "[a-z]{1,8}") {
        prop_assert!(evaluate(&Condition::new(), &state, Some(character.as_str())));
        prop_assert!(evaluate(&Condition::new(), &state, None));
    }

    #[test]
    fn choice_list_never_empties(state in arb_state(), min in 0..=10i32, count in 1..5usize) {
        let node = (0..count).fold(DialogueNode::new("n", "Maya").for_character("maya"), |n, i| {
            n.with_choice(
                Choice::new(format!("c{}", i), "text", "n")
                    .visible_when(Condition::new().trust_at_least(min)),
            )
        });
        let evaluated = evaluate_choices(&node, &state, Some("maya"));
        prop_assert!(evaluated.iter().any(|c| c.visible));
    }

    #[test]
    fn mutation_leaves_input_untouched(
        state in arb_state(),
        delta in -15..15i32,
        flag in "[a-z_]{1,8}",
        pattern in arb_pattern(),
    ) {
        let snapshot = state.clone();
        let target = state.character_ids().first().map(|id| id.as_str().to_string());
        let mut change = StateChange::new().set_flag(flag).pattern(pattern, 1);
        if let Some(id) = &target {
            change = change.trust(delta);
            change.character_id = Some(id.as_str().into());
        }

        let mutator = StateMutator::new(TrustConfig::default());
        let next = mutator.apply(&state, &change);

        prop_assert_eq!(&state, &snapshot);
        prop_assert!(Arc::ptr_eq(&state.mysteries, &next.mysteries));
        if let Some(id) = target {
            let trust = next.character(&id).map(|c| c.trust).unwrap_or_default();
            prop_assert!((0..=10).contains(&trust));
        } else {
            prop_assert!(Arc::ptr_eq(&state.characters, &next.characters));
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn save_then_load_is_identity(state in arb_state()) {
        let mut saves = SaveManager::with_defaults(MemoryStorage::new());
        prop_assert!(saves.save(&state));
        prop_assert_eq!(saves.load(), Some(state));
    }
}
