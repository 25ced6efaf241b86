//! Read-only content model: metadata and the node graph.
//!
//! The runtime loads a [`GameConfig`] once at startup (see `game-content`)
//! and shares it immutably with every engine invocation.
use std::collections::BTreeMap;

use crate::state::{DEFAULT_START_NODE, NodeId};

/// Seconds between purchased hints when the document does not say otherwise.
pub const DEFAULT_HINT_COOLDOWN_SECS: u64 = 300;

/// Speaker used for dialogue lines that omit one.
pub const DEFAULT_SPEAKER: &str = "NARRATOR";

/// Shown instead of a node's clock when none is configured.
pub const UNKNOWN_TIME: &str = "??:??";

/// Full content document: metadata plus nodes keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GameConfig {
    pub meta: MetaConfig,
    pub nodes: BTreeMap<NodeId, NodeConfig>,
}

impl GameConfig {
    pub fn node(&self, id: &str) -> Option<&NodeConfig> {
        self.nodes.get(id)
    }

    /// Returns the node's configuration, or an empty one for ids the
    /// document does not describe.
    pub fn node_or_empty(&self, id: &str) -> &NodeConfig {
        static EMPTY: NodeConfig = NodeConfig::empty();
        self.nodes.get(id).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn start_node(&self) -> NodeId {
        self.meta.start_node.clone()
    }

    /// Resolves user input to a configured node id, case-insensitively.
    pub fn resolve_node(&self, raw: &str) -> Option<NodeId> {
        let wanted = raw.trim();
        if wanted.is_empty() {
            return None;
        }
        self.nodes
            .keys()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .cloned()
    }

    /// Finds the node that owns puzzle `id`.
    pub fn find_puzzle(&self, id: &str) -> Option<(&NodeId, &PuzzleSpec)> {
        self.nodes
            .iter()
            .find_map(|(node_id, node)| node.puzzle(id).map(|spec| (node_id, spec)))
    }

    /// Nodes whose `games` list puzzle `id`.
    pub fn nodes_with_puzzle(&self, id: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.puzzle(id).is_some())
            .map(|(node_id, _)| node_id.clone())
            .collect()
    }

    /// Node where the final unlock is accepted: the configured goal, or the
    /// node hosting a [`PuzzleKind::Final`] puzzle.
    pub fn goal_node(&self) -> Option<NodeId> {
        if let Some(goal) = &self.meta.goal_node {
            return Some(goal.clone());
        }
        self.nodes
            .iter()
            .find(|(_, node)| node.games.iter().any(|g| g.kind() == PuzzleKind::Final))
            .map(|(id, _)| id.clone())
    }

    /// Lists structural problems: dangling routes and a missing start node.
    ///
    /// Problems are reported, never fatal; the engine tolerates all of them.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.nodes.is_empty() && !self.contains(self.meta.start_node.as_str()) {
            issues.push(format!(
                "start node {} is not defined",
                self.meta.start_node
            ));
        }
        for (id, node) in &self.nodes {
            for route in &node.routes {
                if !self.contains(route.as_str()) {
                    issues.push(format!("node {id} routes to undefined node {route}"));
                }
            }
        }
        issues
    }
}

/// Global settings from the `meta` section.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MetaConfig {
    pub title: String,
    pub hint_cooldown_seconds: u64,
    pub start_node: NodeId,
    pub goal_node: Option<NodeId>,
    pub final_unlock: FinalUnlockPolicy,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            title: "Jack's Time Terminal".to_owned(),
            hint_cooldown_seconds: DEFAULT_HINT_COOLDOWN_SECS,
            start_node: NodeId::from(DEFAULT_START_NODE),
            goal_node: None,
            final_unlock: FinalUnlockPolicy::default(),
        }
    }
}

/// How `unlock <password>` is checked in the goal node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum FinalUnlockPolicy {
    /// Any non-empty credential advances.
    #[default]
    AnyCredential,
    /// The credential must equal the password derived from name and tokens.
    DerivedPassword,
}

/// One node of the progression graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct NodeConfig {
    pub title: String,
    /// Fixed display clock (`"hh:mm"`).
    pub time: Option<String>,
    pub year: Option<i32>,
    /// Directed, possibly cyclic.
    pub routes: Vec<NodeId>,
    pub games: Vec<PuzzleSpec>,
    pub hints: Vec<HintSpec>,
    pub intro: Vec<DialogueLine>,
    /// Bypass code accepted by `godskip`.
    pub godskip: Option<String>,
}

impl NodeConfig {
    pub const fn empty() -> Self {
        Self {
            title: String::new(),
            time: None,
            year: None,
            routes: Vec::new(),
            games: Vec::new(),
            hints: Vec::new(),
            intro: Vec::new(),
            godskip: None,
        }
    }

    pub fn display_time(&self) -> &str {
        self.time.as_deref().unwrap_or(UNKNOWN_TIME)
    }

    /// Minutes component of the fixed clock, if it parses.
    pub fn minutes(&self) -> Option<u32> {
        let (_, minutes) = self.time.as_deref()?.split_once(':')?;
        minutes.trim().parse().ok()
    }

    pub fn puzzle(&self, id: &str) -> Option<&PuzzleSpec> {
        self.games.iter().find(|g| g.id == id)
    }

    pub fn hint(&self, id: &str) -> Option<&HintSpec> {
        self.hints.iter().find(|h| h.id == id)
    }

    pub fn first_puzzle(&self) -> Option<&PuzzleSpec> {
        self.games.first()
    }
}

/// Puzzle descriptor listed under a node's `games`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PuzzleSpec {
    pub id: String,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(alias = "points"))]
    pub solve_points: i64,
    /// Fragment granted on first solve.
    pub token: Option<String>,
    /// Accepted answers for exact-match puzzles, `|`-separated.
    pub answer: Option<String>,
    /// Wrong-answer penalty, charged once per sub-question.
    pub penalty: i64,
    /// Validator override. Inferred from the id when absent.
    pub kind: Option<PuzzleKind>,
}

impl PuzzleSpec {
    /// Validator used by `solve`.
    pub fn kind(&self) -> PuzzleKind {
        if let Some(kind) = self.kind {
            return kind;
        }
        match self.id.as_str() {
            "colors" => PuzzleKind::Combinatorics,
            "codes" | "code" => PuzzleKind::Routing,
            "regex" => PuzzleKind::Pattern,
            "final" => PuzzleKind::Final,
            _ if self.answer.is_some() => PuzzleKind::Exact,
            _ => PuzzleKind::Module,
        }
    }

    /// Normalized accepted answers for [`PuzzleKind::Exact`].
    pub fn accepted_answers(&self) -> Vec<String> {
        self.answer
            .as_deref()
            .unwrap_or_default()
            .split('|')
            .map(normalize_answer)
            .filter(|a| !a.is_empty())
            .collect()
    }
}

/// Lowercases and strips check/mate markers and surrounding whitespace.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '+' | '#'))
        .collect::<String>()
        .to_lowercase()
}

/// Validator families understood by `solve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PuzzleKind {
    /// Answer compared against the configured `answer` list.
    Exact,
    /// Count of colorings derived from the node clock.
    Combinatorics,
    /// Multi-question snippet-to-node routing.
    Routing,
    /// Chosen option compared with the stored correct pattern.
    Pattern,
    /// Success flag reported by the mounted puzzle module.
    Module,
    /// Checked by `unlock`, not `solve`.
    Final,
}

/// Purchasable hint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct HintSpec {
    pub id: String,
    pub cost: i64,
    pub text: String,
}

/// One line of a node's intro dialogue.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

impl Default for DialogueLine {
    fn default() -> Self {
        Self {
            speaker: DEFAULT_SPEAKER.to_owned(),
            text: String::new(),
        }
    }
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// `"SPEAKER: text"`, as printed.
    pub fn rendered(&self) -> String {
        format!("{}: {}", self.speaker, self.text)
    }
}
