//! Rejections surfaced by progression operations.
//!
//! Every variant renders as a single user-visible line carrying its
//! category prefix: `[ERR]` malformed input, `[NO]` rule-denied,
//! `[LOCKED]` progression-gated, `[COOLDOWN]` hint cooldown.
//! A rejected operation leaves the state untouched unless stated otherwise.
use crate::state::NodeId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("[ERR] Unknown node.")]
    UnknownNode(String),

    #[error("[LOCKED] No direct route. Use: routes")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("[LOCKED] Node not unlocked yet.")]
    NodeLocked(NodeId),

    #[error("[ERR] Unknown game '{0}'.")]
    UnknownPuzzle(String),

    #[error("[LOCKED] {puzzle} can only be solved in {node}.")]
    WrongNode { puzzle: String, node: NodeId },

    #[error("[HINT] No hints here.")]
    NoHints,

    #[error("[ERR] Unknown hint id '{0}'.")]
    UnknownHint(String),

    #[error("[COOLDOWN] Hint available in {remaining}s.")]
    Cooldown { remaining: u64 },

    #[error("[LOCKED] Need {cost} score for this hint.")]
    InsufficientScore { cost: i64 },

    /// Wrong answer. The penalty, if any, has already been applied.
    #[error("[NO] {0}")]
    Incorrect(String),

    #[error("[LOCKED] {0}")]
    Unavailable(String),

    #[error("[LOCKED] Final unlock is only available in {0}.")]
    NotInGoalNode(NodeId),

    #[error("[NO] Wrong password.")]
    WrongPassword,

    #[error("[NO] Invalid godskip code.")]
    InvalidBypass,

    #[error("[INFO] No further route from this node.")]
    NoFurtherRoute,

    #[error("[STORY] No dialogue here.")]
    NoDialogue,
}

impl ProgressionError {
    /// Whether the rejection is a plain notice rather than a failure.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            ProgressionError::NoHints | ProgressionError::NoFurtherRoute | ProgressionError::NoDialogue
        )
    }
}

pub type ProgressionResult<T> = Result<T, ProgressionError>;
