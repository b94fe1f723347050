//! Narrative Session - one player's walk through one dialogue graph.
//!
//! The session is the single writer of its `PlayerState`. A choice is resolved
//! in a fixed order: its consequence, the node's exit consequence, the
//! conversation record, then navigation and the destination's entry
//! consequence. Nothing is committed unless the whole step succeeds.

use std::collections::HashMap;
use story_rules::{
    ConversationRecord, DialogueGraph, DialogueNode, NarrativeConfig, OrderingVariant,
    PlayerState,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::conditions::{evaluate_choices, evaluate_optional, mercy_unlock, EvaluatedChoice};
use crate::mutation::{cross_session_boundary, record_conversation, StateMutator};
use crate::navigation::{get_available_nodes, select_content, ContentHistory, SelectedContent};
use crate::ordering::{order_choices_for_display, NarrativeGravity, OrderingOptions};

/// Errors from driving a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has not started")]
    NotStarted,

    #[error("no choice '{choice}' on node '{node}'")]
    UnknownChoice { choice: String, node: String },

    #[error("choice '{choice}' is locked: {reason}")]
    ChoiceLocked { choice: String, reason: String },

    #[error("node '{0}' is not in the graph")]
    MissingNode(String),

    #[error("node '{0}' is not accessible from the current state")]
    NodeLocked(String),
}

pub struct NarrativeSession<'g> {
    graph: &'g DialogueGraph,
    state: PlayerState,
    current_node_id: Option<String>,
    content_history: ContentHistory,
    /// Snapshots preceding each committed transition, oldest first.
    timeline: Vec<PlayerState>,
    /// Node ID -> choice key enabled by mercy, so repeated renders agree.
    mercy_picks: HashMap<String, String>,
    mutator: StateMutator,
    gravity: NarrativeGravity,
    ordering: OrderingVariant,
}

impl<'g> NarrativeSession<'g> {
    pub fn new(graph: &'g DialogueGraph, state: PlayerState, config: &NarrativeConfig) -> Self {
        Self {
            graph,
            state,
            current_node_id: None,
            content_history: ContentHistory::new(config.content.recent_history_len),
            timeline: Vec::new(),
            mercy_picks: HashMap::new(),
            mutator: StateMutator::new(config.trust),
            gravity: NarrativeGravity::new(config.gravity.clone()),
            ordering: config.ordering.variant,
        }
    }

    pub fn with_defaults(graph: &'g DialogueGraph, state: PlayerState) -> Self {
        Self::new(graph, state, &NarrativeConfig::default())
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn into_state(self) -> PlayerState {
        self.state
    }

    pub fn timeline(&self) -> &[PlayerState] {
        &self.timeline
    }

    pub fn current_node(&self) -> Option<&'g DialogueNode> {
        self.current_node_id
            .as_deref()
            .and_then(|id| self.graph.get_node(id))
    }

    fn character_of(&self, node: &'g DialogueNode) -> &'g str {
        self.graph.character_for(node).as_str()
    }

    fn commit(&mut self, next: PlayerState) {
        let previous = std::mem::replace(&mut self.state, next);
        self.timeline.push(previous);
    }

    fn enter(&mut self, node: &'g DialogueNode) {
        if let Some(change) = &node.on_enter {
            let next = self.mutator.apply(&self.state, change);
            self.commit(next);
        }
        self.current_node_id = Some(node.node_id.clone());
        debug!(node_id = %node.node_id, "entered node");
    }

    /// Enter the graph's start node.
    pub fn start(&mut self) -> Result<&'g DialogueNode, SessionError> {
        let start = get_available_nodes(self.graph, &self.state, None)
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::MissingNode(self.graph.start_node_id.clone()))?;
        self.enter(start);
        Ok(start)
    }

    /// Place the session on a node without applying its entry consequence,
    /// e.g. after loading a save.
    pub fn resume_at(&mut self, node_id: &str) -> Result<&'g DialogueNode, SessionError> {
        let node = self
            .graph
            .get_node(node_id)
            .ok_or_else(|| SessionError::MissingNode(node_id.to_string()))?;
        self.current_node_id = Some(node.node_id.clone());
        Ok(node)
    }

    /// Count a pause/resume boundary on the active snapshot.
    pub fn mark_session_boundary(&mut self) {
        let next = cross_session_boundary(&self.state);
        self.commit(next);
    }

    /// Text for the current node, avoiding recently shown variants.
    pub fn current_content(&mut self) -> Option<SelectedContent> {
        let node = self.current_node()?;
        let selected = select_content(
            node,
            self.content_history.recent(&node.node_id),
            Some(&self.state),
            Some(self.character_of(node)),
        );
        if !selected.placeholder {
            self.content_history
                .record(&node.node_id, &selected.variant_id);
        }
        Some(selected)
    }

    /// Nodes reachable from the current node.
    pub fn reachable_nodes(&self) -> Vec<&'g DialogueNode> {
        get_available_nodes(self.graph, &self.state, self.current_node_id.as_deref())
    }

    /// Seed for display order: stable per player and node.
    pub fn ordering_seed(&self, node: &DialogueNode) -> String {
        format!("{}:{}", self.state.player_id, node.node_id)
    }

    /// Visible choices for the current node, in display order.
    pub fn available_choices(&mut self) -> Vec<EvaluatedChoice<'g>> {
        let Some(node) = self.current_node() else {
            return Vec::new();
        };
        let character_id = self.character_of(node);

        let mut choices = evaluate_choices(node, &self.state, Some(character_id));
        self.gravity
            .weigh_choices(&mut choices, &self.state, character_id);
        self.apply_mercy(node, &mut choices, character_id);

        let visible: Vec<_> = choices.into_iter().filter(|c| c.visible).collect();
        let options = OrderingOptions::new(self.ordering, self.ordering_seed(node));
        order_choices_for_display(&visible, &options)
    }

    fn apply_mercy(
        &mut self,
        node: &DialogueNode,
        choices: &mut [EvaluatedChoice<'g>],
        character_id: &str,
    ) {
        let all_locked = choices.iter().any(|c| c.visible)
            && choices.iter().filter(|c| c.visible).all(|c| !c.enabled);
        if !all_locked {
            self.mercy_picks.remove(&node.node_id);
            return;
        }

        if let Some(key) = self.mercy_picks.get(&node.node_id) {
            if let Some(pick) = choices.iter_mut().find(|c| c.visible && c.key() == key) {
                pick.enabled = true;
                pick.locked_reason = None;
                pick.mercy_unlocked = true;
                return;
            }
        }

        if let Some(index) = mercy_unlock(choices, &self.state, Some(character_id)) {
            self.mercy_picks
                .insert(node.node_id.clone(), choices[index].key().to_string());
        }
    }

    /// Take a choice on the current node and move to its destination.
    pub fn choose(&mut self, choice_key: &str) -> Result<&'g DialogueNode, SessionError> {
        let node = self.current_node().ok_or(SessionError::NotStarted)?;

        let choices = self.available_choices();
        let picked = choices
            .iter()
            .find(|c| c.key() == choice_key)
            .ok_or_else(|| SessionError::UnknownChoice {
                choice: choice_key.to_string(),
                node: node.node_id.clone(),
            })?;
        if !picked.enabled {
            return Err(SessionError::ChoiceLocked {
                choice: choice_key.to_string(),
                reason: picked.locked_reason.clone().unwrap_or_default(),
            });
        }
        let choice = picked.choice;
        let rescued = picked.mercy_unlocked
            || !evaluate_optional(
                choice.visible_condition.as_ref(),
                &self.state,
                Some(self.character_of(node)),
            );

        let destination = self
            .graph
            .get_node(&choice.next_node_id)
            .ok_or_else(|| SessionError::MissingNode(choice.next_node_id.clone()))?;

        let mut next = self.state.clone();
        if let Some(consequence) = &choice.consequence {
            next = self.mutator.apply(&next, consequence);
        }
        if let Some(exit) = &node.on_exit {
            next = self.mutator.apply(&next, exit);
        }
        next = record_conversation(
            &next,
            self.graph.character_for(node),
            ConversationRecord::new(node.node_id.clone()).with_choice(choice_key),
        );

        let destination_character = self.character_of(destination);
        if !evaluate_optional(
            destination.required_state.as_ref(),
            &next,
            Some(destination_character),
        ) {
            warn!(
                target: "content_qa",
                node_id = %node.node_id,
                choice = choice_key,
                next_node_id = %destination.node_id,
                rescued,
                "enabled choice leads to an inaccessible node"
            );
            return Err(SessionError::NodeLocked(destination.node_id.clone()));
        }

        self.commit(next);
        self.enter(destination);
        Ok(destination)
    }
}
