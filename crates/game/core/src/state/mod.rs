//! Player progression state.
//!
//! [`PlayerState`] is the single document persisted between sessions. The
//! runtime owns one instance per session and mutates it exclusively through
//! [`crate::engine::ProgressionEngine`] and the puzzle-module answer scratch.
mod node_id;

pub use node_id::NodeId;

use std::collections::{BTreeMap, BTreeSet};

/// Node a fresh state starts in when the configuration names none.
pub const DEFAULT_START_NODE: &str = "N1";

/// Canonical snapshot of a player's progress.
///
/// Maps are ordered so the serialized form is canonical.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PlayerState {
    /// `None` until the player registers a name.
    pub player_name: Option<String>,
    /// Never negative.
    pub score: i64,
    pub current_node: NodeId,
    /// Insertion-ordered, deduplicated, monotonic.
    pub unlocked_nodes: Vec<NodeId>,
    /// Puzzle id → solved flag. A `true` entry means its points were applied.
    pub solved: BTreeMap<String, bool>,
    /// Insertion-ordered, deduplicated, monotonic.
    pub tokens: Vec<String>,
    /// Node id → next dialogue line index.
    pub story_index: BTreeMap<NodeId, usize>,
    /// Unix seconds of the last purchased hint.
    pub last_hint_ts: Option<u64>,
    /// Free-form scratch variables managed by `set`/`get`/`del`.
    pub vars: BTreeMap<String, String>,
    /// Puzzle-module answer scratch (`regex.correct`, `codes.A`, ...).
    pub answers: BTreeMap<String, String>,
    /// `puzzle:question` keys that already cost a wrong-answer penalty.
    pub penalized: BTreeSet<String>,
}

impl PlayerState {
    /// Creates the state of a first run: nothing solved, only `start` unlocked.
    pub fn fresh(start: NodeId) -> Self {
        Self {
            player_name: None,
            score: 0,
            current_node: start.clone(),
            unlocked_nodes: vec![start],
            solved: BTreeMap::new(),
            tokens: Vec::new(),
            story_index: BTreeMap::new(),
            last_hint_ts: None,
            vars: BTreeMap::new(),
            answers: BTreeMap::new(),
            penalized: BTreeSet::new(),
        }
    }

    pub fn is_unlocked(&self, node: &str) -> bool {
        self.unlocked_nodes.iter().any(|n| n.as_str() == node)
    }

    /// Adds `node` to the unlocked set. Returns `false` if it was already there.
    pub fn insert_unlocked(&mut self, node: NodeId) -> bool {
        if self.is_unlocked(node.as_str()) {
            return false;
        }
        self.unlocked_nodes.push(node);
        true
    }

    pub fn is_solved(&self, puzzle: &str) -> bool {
        self.solved.get(puzzle).copied().unwrap_or(false)
    }

    /// Adds a token fragment. Returns `false` if it was already held.
    pub fn insert_token(&mut self, token: &str) -> bool {
        if self.tokens.iter().any(|t| t == token) {
            return false;
        }
        self.tokens.push(token.to_owned());
        true
    }

    pub fn story_cursor(&self, node: &NodeId) -> usize {
        self.story_index.get(node).copied().unwrap_or(0)
    }

    /// Adds `delta` to the score, clamping at zero. Returns the new score.
    pub fn adjust_score(&mut self, delta: i64) -> i64 {
        self.score = self.score.saturating_add(delta).max(0);
        self.score
    }

    /// Restores the structural invariants of a state read from disk.
    ///
    /// Saves written by older builds (or edited by hand) may violate them:
    /// `start` and `current_node` must be unlocked, collections deduplicated,
    /// and the score non-negative.
    pub fn repair_invariants(&mut self, start: &NodeId) {
        let mut seen = BTreeSet::new();
        self.unlocked_nodes.retain(|n| seen.insert(n.clone()));
        let mut seen = BTreeSet::new();
        self.tokens.retain(|t| seen.insert(t.clone()));

        if !self.is_unlocked(start.as_str()) {
            self.unlocked_nodes.insert(0, start.clone());
        }
        let current = self.current_node.clone();
        self.insert_unlocked(current);
        self.score = self.score.max(0);
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::fresh(NodeId::from(DEFAULT_START_NODE))
    }
}
