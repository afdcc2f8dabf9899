//! Recorded guesses and the consistency check built on them.
//!
//! A candidate is *consistent* with a history when, treated as the secret,
//! it reproduces every feedback on record.

use crate::code::Code;
use crate::feedback::Feedback;
use serde::Serialize;
use thiserror::Error;

/// One scored guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GuessRecord {
    code: Code,
    feedback: Feedback,
}

impl GuessRecord {
    #[must_use]
    pub fn new(code: Code, feedback: Feedback) -> Self {
        Self { code, feedback }
    }

    /// Score `guess` against `secret` and record the result.
    #[must_use]
    pub fn scored(guess: Code, secret: &Code) -> Self {
        Self::new(guess, Feedback::evaluate(&guess, secret))
    }

    #[must_use]
    pub fn code(&self) -> Code {
        self.code
    }

    #[must_use]
    pub fn feedback(&self) -> Feedback {
        self.feedback
    }
}

/// Append-only guesses of one side in one match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<GuessRecord>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: GuessRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[GuessRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GuessRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&GuessRecord> {
        self.records.last()
    }

    /// Whether `code` was already guessed.
    #[must_use]
    pub fn contains(&self, code: &Code) -> bool {
        self.records.iter().any(|r| r.code == *code)
    }

    #[must_use]
    pub fn is_consistent(&self, candidate: &Code) -> bool {
        check_consistency(candidate, self).is_ok()
    }
}

impl FromIterator<GuessRecord> for History {
    fn from_iter<I: IntoIterator<Item = GuessRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a GuessRecord;
    type IntoIter = std::slice::Iter<'a, GuessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Why a candidate cannot be the secret.
///
/// `Display` renders a plain-language explanation that is fed back to the
/// oracle on retry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Contradiction {
    #[error(
        "Your guess {candidate} contradicts the feedback from previous guess {} which had {} exact and {} partial matches. Your guess would have {} exact and {} partial matches instead.",
        .record.code(),
        .record.feedback().exact(),
        .record.feedback().partial(),
        .actual.exact(),
        .actual.partial()
    )]
    Inconsistent {
        candidate: Code,
        record: GuessRecord,
        actual: Feedback,
    },

    #[error(
        "Your answer {response:?} is not a valid guess. A guess must be exactly 4 digits with no digit repeated."
    )]
    Malformed { response: String },
}

/// Check `candidate` against every record, stopping at the first mismatch.
pub fn check_consistency(candidate: &Code, history: &History) -> Result<(), Contradiction> {
    for record in history {
        let actual = Feedback::evaluate(&record.code, candidate);
        if actual != record.feedback {
            return Err(Contradiction::Inconsistent {
                candidate: *candidate,
                record: *record,
                actual,
            });
        }
    }
    Ok(())
}
