use crate::code::Code;
use crate::error::{EngineError, EngineResult};
use crate::history::{History, check_consistency};
use crate::debug_log;
use rand::Rng;
use rand::seq::IndexedRandom;

/// Every unguessed code that agrees with all feedback in `history`, in
/// ascending order.
#[must_use]
pub fn consistent_candidates(history: &History) -> Vec<Code> {
    Code::all()
        .filter(|c| !history.contains(c))
        .filter(|c| check_consistency(c, history).is_ok())
        .collect()
}

/// Pick a consistent, unguessed code uniformly at random.
///
/// This keeps the guess compatible with everything learned so far; it makes
/// no attempt to maximize information.
pub fn next_guess<R: Rng + ?Sized>(history: &History, rng: &mut R) -> EngineResult<Code> {
    let survivors = consistent_candidates(history);
    debug_log!(
        "next_guess() - {} candidates after {} guesses",
        survivors.len(),
        history.len()
    );
    survivors
        .choose(rng)
        .copied()
        .ok_or(EngineError::ExhaustedSearchSpace {
            guesses: history.len(),
        })
}

/// A strategy producing the computer's next code from its own history.
pub trait Guesser {
    /// Short label shown to the player.
    fn name(&self) -> &str;

    fn next_guess(&mut self, history: &History) -> EngineResult<Code>;

    /// Label of the strategy that produced the most recent guess.
    fn answered_by(&self) -> &str {
        self.name()
    }
}

/// Exhaustive search with its own random source.
pub struct ExhaustiveGuesser<R> {
    rng: R,
}

impl<R: Rng> ExhaustiveGuesser<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Guesser for ExhaustiveGuesser<R> {
    fn name(&self) -> &str {
        "exhaustive search"
    }

    fn next_guess(&mut self, history: &History) -> EngineResult<Code> {
        next_guess(history, &mut self.rng)
    }
}

/// Uses `primary` and switches to `fallback` only when the primary reports
/// [`EngineError::OracleUnavailable`]. The primary is tried again every turn.
pub struct FallbackGuesser<P, F> {
    primary: P,
    fallback: F,
    fell_back: bool,
}

impl<P: Guesser, F: Guesser> FallbackGuesser<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            fell_back: false,
        }
    }
}

impl<P: Guesser, F: Guesser> Guesser for FallbackGuesser<P, F> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn next_guess(&mut self, history: &History) -> EngineResult<Code> {
        self.fell_back = false;
        match self.primary.next_guess(history) {
            Err(EngineError::OracleUnavailable(err)) => {
                log::warn!(
                    "{} failed ({err}), falling back to {}",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fell_back = true;
                self.fallback.next_guess(history)
            }
            other => other,
        }
    }

    fn answered_by(&self) -> &str {
        if self.fell_back {
            self.fallback.answered_by()
        } else {
            self.primary.answered_by()
        }
    }
}

impl<G: Guesser + ?Sized> Guesser for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_guess(&mut self, history: &History) -> EngineResult<Code> {
        (**self).next_guess(history)
    }

    fn answered_by(&self) -> &str {
        (**self).answered_by()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CODE_SPACE_SIZE, is_valid};
    use crate::error::OracleError;
    use crate::feedback::Feedback;
    use crate::history::GuessRecord;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    fn history_for(secret: &str, guesses: &[&str]) -> History {
        let secret = code(secret);
        guesses
            .iter()
            .map(|g| GuessRecord::scored(code(g), &secret))
            .collect()
    }

    #[test]
    fn test_no_history_keeps_full_space() {
        assert_eq!(consistent_candidates(&History::new()).len(), CODE_SPACE_SIZE);
    }

    #[test]
    fn test_candidates_respect_feedback() {
        let history = history_for("1243", &["1234"]);
        let candidates = consistent_candidates(&history);
        assert!(candidates.contains(&code("1243")));
        assert!(!candidates.contains(&code("1234")));
        // Same digits, two swapped: 6 permutations keep exactly two in place
        assert_eq!(candidates.len(), 6);
        assert!(candidates.iter().all(|c| history.is_consistent(c)));
    }

    #[test]
    fn test_never_repeats_a_guess() {
        let history = history_for("9876", &["0123", "4567"]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let guess = next_guess(&history, &mut rng).unwrap();
            assert!(!history.contains(&guess));
            assert!(is_valid(&guess.to_string()));
        }
    }

    #[test]
    fn test_solved_record_is_skipped() {
        // The only consistent code is the one already guessed
        let history = history_for("1234", &["1234"]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            next_guess(&history, &mut rng),
            Err(EngineError::ExhaustedSearchSpace { guesses: 1 })
        ));
    }

    #[test]
    fn test_contradictory_history_is_exhausted() {
        let history: History = [
            GuessRecord::new(code("1234"), Feedback::new(0, 0).unwrap()),
            GuessRecord::new(code("5678"), Feedback::new(0, 0).unwrap()),
            GuessRecord::new(code("9012"), Feedback::new(4, 0).unwrap()),
        ]
        .into_iter()
        .collect();
        let mut rng = StdRng::seed_from_u64(0);
        match next_guess(&history, &mut rng) {
            Err(EngineError::ExhaustedSearchSpace { guesses }) => assert_eq!(guesses, 3),
            other => panic!("Expected ExhaustedSearchSpace, got {other:?}"),
        }
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let history = history_for("3719", &["0123"]);
        let a = next_guess(&history, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = next_guess(&history, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exhaustive_guesser_solves_every_sampled_secret() {
        let mut guesser = ExhaustiveGuesser::new(StdRng::seed_from_u64(5));
        for secret in Code::all().step_by(97) {
            let mut history = History::new();
            loop {
                let guess = guesser.next_guess(&history).unwrap();
                let record = GuessRecord::scored(guess, &secret);
                history.push(record);
                if record.feedback().is_solved() {
                    break;
                }
                assert!(history.len() < 15, "failed to converge on {secret}");
            }
        }
    }

    struct Failing;

    impl Guesser for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn next_guess(&mut self, _history: &History) -> EngineResult<Code> {
            Err(EngineError::OracleUnavailable(OracleError::Timeout))
        }
    }

    struct Exhausted;

    impl Guesser for Exhausted {
        fn name(&self) -> &str {
            "exhausted"
        }

        fn next_guess(&mut self, history: &History) -> EngineResult<Code> {
            Err(EngineError::ExhaustedSearchSpace {
                guesses: history.len(),
            })
        }
    }

    #[test]
    fn test_fallback_on_oracle_failure() {
        let mut guesser =
            FallbackGuesser::new(Failing, ExhaustiveGuesser::new(StdRng::seed_from_u64(1)));
        assert_eq!(guesser.name(), "failing");
        assert_eq!(guesser.answered_by(), "failing");
        assert!(guesser.next_guess(&History::new()).is_ok());
        assert_eq!(guesser.name(), "failing");
        assert_eq!(guesser.answered_by(), "exhaustive search");
    }

    /// Fails on odd calls only.
    struct Flaky {
        calls: usize,
        rng: StdRng,
    }

    impl Guesser for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn next_guess(&mut self, history: &History) -> EngineResult<Code> {
            self.calls += 1;
            if self.calls % 2 == 1 {
                Err(EngineError::OracleUnavailable(OracleError::EmptyResponse))
            } else {
                next_guess(history, &mut self.rng)
            }
        }
    }

    #[test]
    fn test_answered_by_tracks_each_turn() {
        let flaky = Flaky {
            calls: 0,
            rng: StdRng::seed_from_u64(4),
        };
        let mut guesser =
            FallbackGuesser::new(flaky, ExhaustiveGuesser::new(StdRng::seed_from_u64(1)));
        let history = History::new();
        guesser.next_guess(&history).unwrap();
        assert_eq!(guesser.answered_by(), "exhaustive search");
        guesser.next_guess(&history).unwrap();
        assert_eq!(guesser.answered_by(), "flaky");

        let boxed: Box<dyn Guesser> = Box::new(guesser);
        assert_eq!(boxed.answered_by(), "flaky");
    }

    #[test]
    fn test_no_fallback_on_exhausted_space() {
        let mut guesser =
            FallbackGuesser::new(Exhausted, ExhaustiveGuesser::new(StdRng::seed_from_u64(1)));
        assert!(matches!(
            guesser.next_guess(&History::new()),
            Err(EngineError::ExhaustedSearchSpace { .. })
        ));
    }
}
