//! Dialogue graphs - nodes, content variants, and choices.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Condition, StateChange};
use crate::characters::CharacterId;
use crate::error::RulesError;
use crate::patterns::PatternType;

/// One authored rendition of a node's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVariant {
    pub variant_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// Situational override: shown in preference to unconditioned variants
    /// whenever it holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl ContentVariant {
    pub fn new(variant_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            variant_id: variant_id.into(),
            text: text.into(),
            emotion: None,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }
}

/// Locks a choice until a pattern accumulator reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLock {
    pub pattern: PatternType,
    pub threshold: i32,
}

/// A player choice on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<String>,

    pub text: String,

    pub next_node_id: String,

    /// Hidden entirely when this fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_condition: Option<Condition>,

    /// Shown but locked when this fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_condition: Option<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<StateChange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_lock: Option<PatternLock>,
}

impl Choice {
    pub fn new(
        choice_id: impl Into<String>,
        text: impl Into<String>,
        next_node_id: impl Into<String>,
    ) -> Self {
        Self {
            choice_id: Some(choice_id.into()),
            text: text.into(),
            next_node_id: next_node_id.into(),
            visible_condition: None,
            enabled_condition: None,
            pattern: None,
            consequence: None,
            pattern_lock: None,
        }
    }

    pub fn visible_when(mut self, condition: Condition) -> Self {
        self.visible_condition = Some(condition);
        self
    }

    pub fn enabled_when(mut self, condition: Condition) -> Self {
        self.enabled_condition = Some(condition);
        self
    }

    pub fn with_pattern(mut self, pattern: PatternType) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_consequence(mut self, change: StateChange) -> Self {
        self.consequence = Some(change);
        self
    }

    pub fn locked_until(mut self, pattern: PatternType, threshold: i32) -> Self {
        self.pattern_lock = Some(PatternLock { pattern, threshold });
        self
    }

    /// Identity used for ordering: the explicit ID, falling back to the text.
    pub fn stable_key(&self) -> &str {
        self.choice_id.as_deref().unwrap_or(&self.text)
    }
}

/// A single node in a dialogue graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueNode {
    pub node_id: String,

    /// Display label for the speaker. Never used to resolve the character.
    #[serde(default)]
    pub speaker: String,

    /// Character this node belongs to; falls back to the graph's character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,

    #[serde(default)]
    pub content: Vec<ContentVariant>,

    /// Access condition for the node itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state: Option<Condition>,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_enter: Option<StateChange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_exit: Option<StateChange>,

    /// Higher priority nodes are offered first.
    #[serde(default)]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl DialogueNode {
    pub fn new(node_id: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            speaker: speaker.into(),
            character_id: None,
            content: Vec::new(),
            required_state: None,
            choices: Vec::new(),
            on_enter: None,
            on_exit: None,
            priority: 0,
            tags: Vec::new(),
        }
    }

    pub fn for_character(mut self, id: impl Into<CharacterId>) -> Self {
        self.character_id = Some(id.into());
        self
    }

    pub fn with_content(mut self, variant: ContentVariant) -> Self {
        self.content.push(variant);
        self
    }

    pub fn with_text(self, variant_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_content(ContentVariant::new(variant_id, text))
    }

    pub fn requires(mut self, condition: Condition) -> Self {
        self.required_state = Some(condition);
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn on_enter(mut self, change: StateChange) -> Self {
        self.on_enter = Some(change);
        self
    }

    pub fn on_exit(mut self, change: StateChange) -> Self {
        self.on_exit = Some(change);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn find_choice(&self, key: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.stable_key() == key)
    }
}

/// On-disk authoring format: nodes as a list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDocument {
    character_id: CharacterId,
    start_node_id: String,
    nodes: Vec<DialogueNode>,
}

/// A read-only content graph for one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueGraph {
    pub character_id: CharacterId,
    pub start_node_id: String,
    pub nodes: HashMap<String, DialogueNode>,
}

impl DialogueGraph {
    pub fn new(character_id: impl Into<CharacterId>, start_node_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            start_node_id: start_node_id.into(),
            nodes: HashMap::new(),
        }
    }

    /// Parse an authored graph and check its start node exists.
    pub fn from_json_str(json: &str) -> Result<Self, RulesError> {
        let doc: GraphDocument = serde_json::from_str(json)?;
        let graph = doc
            .nodes
            .into_iter()
            .fold(Self::new(doc.character_id, doc.start_node_id), |g, n| {
                g.with_node(n)
            });

        if graph.start_node().is_none() {
            return Err(RulesError::InvalidTable(format!(
                "start node '{}' is not in the graph",
                graph.start_node_id
            )));
        }
        Ok(graph)
    }

    pub fn with_node(mut self, node: DialogueNode) -> Self {
        self.nodes.insert(node.node_id.clone(), node);
        self
    }

    pub fn get_node(&self, node_id: &str) -> Option<&DialogueNode> {
        self.nodes.get(node_id)
    }

    pub fn start_node(&self) -> Option<&DialogueNode> {
        self.nodes.get(&self.start_node_id)
    }

    /// The character a node's conditions are evaluated against.
    pub fn character_for<'a>(&'a self, node: &'a DialogueNode) -> &'a CharacterId {
        node.character_id.as_ref().unwrap_or(&self.character_id)
    }

    /// `(node_id, next_node_id)` pairs whose destination does not exist, sorted.
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        let mut dangling: Vec<_> = self
            .nodes
            .values()
            .flat_map(|node| {
                node.choices
                    .iter()
                    .filter(|c| !self.nodes.contains_key(&c.next_node_id))
                    .map(|c| (node.node_id.clone(), c.next_node_id.clone()))
            })
            .collect();
        dangling.sort();
        dangling
    }
}
