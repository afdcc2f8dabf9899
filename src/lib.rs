// Library interface for codebreaker
// This allows integration tests to access internal modules

pub mod cli;
pub mod code;
pub mod config;
pub mod error;
pub mod feedback;
pub mod game_state;
pub mod history;
pub mod logging;
pub mod openrouter;
pub mod oracle;
pub mod solver;
pub mod tui;

// Re-export commonly used items for easier testing
pub use code::{CODE_LENGTH, CODE_SPACE_SIZE, Code, is_valid};
pub use error::{EngineError, EngineResult, GameError, OracleError};
pub use feedback::{Feedback, evaluate_digits};
pub use game_state::{
    GameInterface, GameSummary, Match, Outcome, Side, game_loop, practice_loop,
};
pub use history::{Contradiction, GuessRecord, History, check_consistency};
pub use oracle::{Oracle, OracleGuess, OracleGuessCoordinator, OracleGuesser, OracleRequest};
pub use solver::{ExhaustiveGuesser, FallbackGuesser, Guesser, consistent_candidates, next_guess};
