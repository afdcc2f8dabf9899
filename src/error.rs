//! Error types shared by the guess engine.

use thiserror::Error;

use crate::game_state::Side;
use crate::history::Contradiction;

/// Errors surfaced by the guess engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input is not four distinct decimal digits.
    #[error("invalid code {input:?}: expected 4 distinct digits")]
    InvalidFormat { input: String },

    /// No unguessed code agrees with every recorded feedback.
    ///
    /// An honestly scored history always leaves the secret itself, so this
    /// points at corrupted feedback upstream.
    #[error("no code is consistent with the {guesses} recorded guesses")]
    ExhaustedSearchSpace { guesses: usize },

    /// The external oracle could not produce a usable guess.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),
}

/// Failures of an [`Oracle`](crate::oracle::Oracle) call.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned HTTP {0}")]
    Status(u16),

    #[error("response contained no guess")]
    EmptyResponse,

    #[error("oracle is not configured: {0}")]
    NotConfigured(String),

    /// The final answer failed validation after the single allowed retry.
    #[error("unusable guess: {0}")]
    Unusable(Contradiction),
}

/// Rejected move submissions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("it is not the {0}'s turn")]
    NotYourTurn(Side),

    /// Another submission claimed this turn first.
    #[error("turn {expected} was already played (now at turn {actual})")]
    TurnConflict { expected: u64, actual: u64 },

    #[error("the game is already over")]
    GameOver,
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
