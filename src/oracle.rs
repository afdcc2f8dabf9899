//! Coordination with an external, untrusted guess producer.
//!
//! # Protocol
//! - Ask the oracle once with the guessing side's history.
//! - A trimmed answer that is a well-formed code consistent with the history
//!   is returned as [`OracleGuess::Verified`].
//! - Otherwise ask exactly once more, passing the rejected answer and the
//!   [`Contradiction`] explanation. That second answer is returned as
//!   [`OracleGuess::Unverified`] without checking it.
//!
//! Transport failures surface as [`EngineError::OracleUnavailable`]; there is
//! no automatic fallback here (see [`FallbackGuesser`](crate::solver::FallbackGuesser)).

use crate::code::Code;
use crate::error::{EngineError, EngineResult, OracleError};
use crate::history::{Contradiction, GuessRecord, History, check_consistency};
use crate::solver::Guesser;
use crate::{debug_log, info_log};
use serde::Serialize;

/// A request to the oracle: the guessing side's own scored guesses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OracleRequest {
    pub history: Vec<GuessRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryContext>,
}

/// The answer that was rejected and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RetryContext {
    pub rejected: String,
    pub explanation: String,
}

impl OracleRequest {
    #[must_use]
    pub fn first(history: &History) -> Self {
        Self {
            history: history.records().to_vec(),
            retry: None,
        }
    }

    #[must_use]
    pub fn retry(&self, rejected: &str, contradiction: &Contradiction) -> Self {
        Self {
            history: self.history.clone(),
            retry: Some(RetryContext {
                rejected: rejected.to_string(),
                explanation: contradiction.to_string(),
            }),
        }
    }
}

/// An external service that proposes a guess as free-form text.
///
/// Implementations may be slow, non-deterministic and wrong. They must bound
/// their own latency (e.g. a request timeout) and report failures as
/// [`OracleError`].
pub trait Oracle {
    fn ask(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn ask(&self, request: &OracleRequest) -> Result<String, OracleError> {
        (**self).ask(request)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn ask(&self, request: &OracleRequest) -> Result<String, OracleError> {
        (**self).ask(request)
    }
}

/// Result of [`OracleGuessCoordinator::next_guess`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleGuess {
    /// First answer, well-formed and consistent with the history.
    Verified(Code),
    /// Trimmed retry answer, accepted as-is.
    Unverified(String),
}

impl OracleGuess {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Enforce the full contract on the answer. Failure is terminal: the
    /// caller gets `OracleUnavailable` and must not ask again.
    pub fn into_checked(self, history: &History) -> EngineResult<Code> {
        let candidate = match self {
            Self::Verified(code) => return Ok(code),
            Self::Unverified(raw) => screen(&raw, history),
        };
        candidate.map_err(|c| EngineError::OracleUnavailable(OracleError::Unusable(c)))
    }
}

/// Parse (via the code validator) and check one raw oracle answer.
fn screen(raw: &str, history: &History) -> Result<Code, Contradiction> {
    let code: Code = raw.parse().map_err(|_| Contradiction::Malformed {
        response: raw.to_string(),
    })?;
    check_consistency(&code, history)?;
    Ok(code)
}

/// Drives the ask / validate / retry-once exchange.
pub struct OracleGuessCoordinator<O> {
    oracle: O,
}

impl<O: Oracle> OracleGuessCoordinator<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Ask for the next guess. Calls the oracle at most twice.
    pub fn next_guess(&self, history: &History) -> EngineResult<OracleGuess> {
        let request = OracleRequest::first(history);
        let first = self.oracle.ask(&request)?;
        let first = first.trim();
        debug_log!("OracleGuessCoordinator - first answer: {:?}", first);

        let contradiction = match screen(first, history) {
            Ok(code) => return Ok(OracleGuess::Verified(code)),
            Err(contradiction) => contradiction,
        };
        info_log!(
            "OracleGuessCoordinator - rejected {:?}, retrying: {}",
            first,
            contradiction
        );

        let retry = request.retry(first, &contradiction);
        let second = self.oracle.ask(&retry)?;
        debug_log!("OracleGuessCoordinator - retry answer: {:?}", second.trim());
        Ok(OracleGuess::Unverified(second.trim().to_string()))
    }
}

/// Oracle-backed [`Guesser`] that enforces the full contract on every answer.
pub struct OracleGuesser<O> {
    coordinator: OracleGuessCoordinator<O>,
}

impl<O: Oracle> OracleGuesser<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            coordinator: OracleGuessCoordinator::new(oracle),
        }
    }
}

impl<O: Oracle> Guesser for OracleGuesser<O> {
    fn name(&self) -> &str {
        "language model"
    }

    fn next_guess(&mut self, history: &History) -> EngineResult<Code> {
        self.coordinator.next_guess(history)?.into_checked(history)
    }
}
