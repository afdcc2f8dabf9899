use crate::error::EngineError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CODE_LENGTH: usize = 4;

/// Number of well-formed codes: 4-permutations of 10 digits.
pub const CODE_SPACE_SIZE: usize = 5040;

/// A secret or guessed code: four pairwise distinct decimal digits.
///
/// Every constructor checks the invariant, so holding a `Code` is proof of
/// well-formedness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code([u8; CODE_LENGTH]);

impl Code {
    /// Build a code from raw digits, or `None` if a digit is out of range or repeated.
    #[must_use]
    pub fn from_digits(digits: [u8; CODE_LENGTH]) -> Option<Self> {
        if digits.iter().any(|&d| d > 9) {
            return None;
        }
        for i in 0..CODE_LENGTH {
            if digits[i + 1..].contains(&digits[i]) {
                return None;
            }
        }
        Some(Self(digits))
    }

    #[must_use]
    pub fn digits(&self) -> &[u8; CODE_LENGTH] {
        &self.0
    }

    /// Draw a code by sampling digits without replacement.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut pool: Vec<u8> = (0..10).collect();
        let mut digits = [0; CODE_LENGTH];
        for slot in &mut digits {
            let idx = rng.random_range(0..pool.len());
            *slot = pool.remove(idx);
        }
        Self(digits)
    }

    /// Every well-formed code in ascending numeric order.
    pub fn all() -> impl Iterator<Item = Code> {
        (0..10_000u16).filter_map(|n| {
            let digits = [
                (n / 1000) as u8,
                (n / 100 % 10) as u8,
                (n / 10 % 10) as u8,
                (n % 10) as u8,
            ];
            Code::from_digits(digits)
        })
    }
}

/// True iff `s` is exactly four distinct ASCII digits.
#[must_use]
pub fn is_valid(s: &str) -> bool {
    s.len() == CODE_LENGTH
        && s.bytes().all(|b| b.is_ascii_digit())
        && s.bytes()
            .enumerate()
            .all(|(i, b)| !s.as_bytes()[i + 1..].contains(&b))
}

impl FromStr for Code {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid(s) {
            return Err(EngineError::InvalidFormat {
                input: s.to_string(),
            });
        }
        let mut digits = [0; CODE_LENGTH];
        for (slot, b) in digits.iter_mut().zip(s.bytes()) {
            *slot = b - b'0';
        }
        Ok(Self(digits))
    }
}

impl TryFrom<String> for Code {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.to_string()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}
