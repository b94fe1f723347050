//! Graph Navigator - reachable nodes and content selection.

mod history;

pub use history::*;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use story_rules::{ContentVariant, DialogueGraph, DialogueNode, PlayerState};
use tracing::{debug, warn};

use crate::conditions::{evaluate, evaluate_optional};

/// Variant ID used when a node has no content at all.
pub const PLACEHOLDER_VARIANT_ID: &str = "__missing_content__";

/// Nodes reachable from `from_node_id`, highest priority first.
///
/// With no starting point, returns the graph's start node. Destinations that
/// do not exist are logged and skipped.
pub fn get_available_nodes<'g>(
    graph: &'g DialogueGraph,
    state: &PlayerState,
    from_node_id: Option<&str>,
) -> Vec<&'g DialogueNode> {
    let Some(from_node_id) = from_node_id else {
        return match graph.start_node() {
            Some(start) => vec![start],
            None => {
                warn!(start_node_id = %graph.start_node_id, "graph has no start node");
                Vec::new()
            }
        };
    };

    let Some(current) = graph.get_node(from_node_id) else {
        warn!(node_id = from_node_id, "navigating from a node that is not in the graph");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut available = Vec::new();
    for choice in &current.choices {
        let Some(destination) = graph.get_node(&choice.next_node_id) else {
            warn!(
                node_id = %current.node_id,
                next_node_id = %choice.next_node_id,
                "choice points at a missing node; skipping"
            );
            continue;
        };
        if !seen.insert(destination.node_id.as_str()) {
            continue;
        }
        let character_id = graph.character_for(destination);
        if evaluate_optional(
            destination.required_state.as_ref(),
            state,
            Some(character_id.as_str()),
        ) {
            available.push(destination);
        }
    }

    available.sort_by(|a, b| b.priority.cmp(&a.priority));
    available
}

/// The text chosen for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedContent {
    pub variant_id: String,
    pub text: String,
    pub emotion: Option<String>,
    /// True when the node had no content and this is a stand-in.
    pub placeholder: bool,
}

impl SelectedContent {
    fn from_variant(variant: &ContentVariant) -> Self {
        Self {
            variant_id: variant.variant_id.clone(),
            text: variant.text.clone(),
            emotion: variant.emotion.clone(),
            placeholder: false,
        }
    }

    fn placeholder(node_id: &str) -> Self {
        Self {
            variant_id: PLACEHOLDER_VARIANT_ID.to_string(),
            text: format!("[missing content for node '{}']", node_id),
            emotion: None,
            placeholder: true,
        }
    }
}

/// Pick which content variant to show for a node.
///
/// 1. The first conditioned variant whose condition holds wins.
/// 2. Otherwise a random unconditioned variant not recently shown.
/// 3. Otherwise a random unconditioned variant.
///
/// Without a state, conditioned variants are never chosen.
pub fn select_content(
    node: &DialogueNode,
    previously_shown: &[String],
    state: Option<&PlayerState>,
    character_id: Option<&str>,
) -> SelectedContent {
    select_content_with_rng(
        node,
        previously_shown,
        state,
        character_id,
        &mut rand::thread_rng(),
    )
}

pub fn select_content_with_rng<R: Rng + ?Sized>(
    node: &DialogueNode,
    previously_shown: &[String],
    state: Option<&PlayerState>,
    character_id: Option<&str>,
    rng: &mut R,
) -> SelectedContent {
    if node.content.is_empty() {
        warn!(node_id = %node.node_id, "node has no content; using placeholder");
        return SelectedContent::placeholder(&node.node_id);
    }

    if let Some(state) = state {
        let situational = node.content.iter().find(|variant| {
            variant
                .condition
                .as_ref()
                .is_some_and(|c| evaluate(c, state, character_id))
        });
        if let Some(variant) = situational {
            return SelectedContent::from_variant(variant);
        }
    }

    let pool: Vec<&ContentVariant> = node
        .content
        .iter()
        .filter(|v| v.condition.is_none())
        .collect();

    let fresh: Vec<&ContentVariant> = pool
        .iter()
        .copied()
        .filter(|v| !previously_shown.contains(&v.variant_id))
        .collect();

    let picked = if fresh.is_empty() {
        pool.choose(rng)
    } else {
        fresh.choose(rng)
    };

    match picked {
        Some(variant) => SelectedContent::from_variant(variant),
        None => {
            debug!(
                node_id = %node.node_id,
                "only conditioned variants and none hold; falling back to the first"
            );
            SelectedContent::from_variant(&node.content[0])
        }
    }
}
