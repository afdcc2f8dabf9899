use crate::code::{CODE_LENGTH, Code};
use serde::Serialize;
use std::fmt;

/// Score of a guess: digits in the right place and digits elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Feedback {
    exact: u8,
    partial: u8,
}

impl Feedback {
    pub const SOLVED: Feedback = Feedback {
        exact: CODE_LENGTH as u8,
        partial: 0,
    };

    /// `None` when the counts cannot come from two 4-digit codes.
    #[must_use]
    pub fn new(exact: u8, partial: u8) -> Option<Self> {
        (usize::from(exact) + usize::from(partial) <= CODE_LENGTH).then_some(Self { exact, partial })
    }

    #[must_use]
    pub fn exact(&self) -> u8 {
        self.exact
    }

    #[must_use]
    pub fn partial(&self) -> u8 {
        self.partial
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        *self == Self::SOLVED
    }

    /// Score `guess` against `secret`.
    #[must_use]
    pub fn evaluate(guess: &Code, secret: &Code) -> Self {
        evaluate_digits(guess.digits(), secret.digits())
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} exact, {} partial", self.exact, self.partial)
    }
}

/// Score raw digit sequences, consuming each secret digit at most once.
///
/// Accepts repeated digits; the result is still well defined and satisfies
/// `exact + partial <= 4`.
#[must_use]
pub fn evaluate_digits(guess: &[u8; CODE_LENGTH], secret: &[u8; CODE_LENGTH]) -> Feedback {
    let mut guess_used = [false; CODE_LENGTH];
    let mut secret_used = [false; CODE_LENGTH];
    let mut exact = 0;
    let mut partial = 0;

    // First pass: exact
    for i in 0..CODE_LENGTH {
        if guess[i] == secret[i] {
            exact += 1;
            guess_used[i] = true;
            secret_used[i] = true;
        }
    }
    // Second pass: partial
    for i in 0..CODE_LENGTH {
        if guess_used[i] {
            continue;
        }
        if let Some(pos) = (0..CODE_LENGTH).find(|&j| !secret_used[j] && secret[j] == guess[i]) {
            partial += 1;
            secret_used[pos] = true;
        }
    }
    Feedback { exact, partial }
}
