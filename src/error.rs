//! Engine error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed FEN or a position that violates board invariants.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// A caller-supplied move is not in the current legal move set.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// The search was cancelled before any iteration completed.
    #[error("search aborted before the first iteration completed")]
    SearchAborted,
}
