use crate::code::Code;
use crate::config::{Config, OpponentKind};
use crate::game_state::{GameInterface, GameSummary, Hint, Outcome, Prompt, Side, UserAction};
use crate::history::GuessRecord;
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;

/// Codebreaker: crack the computer's 4-digit code before it cracks yours
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run the full-screen terminal interface
    #[arg(long)]
    pub tui: bool,

    /// Path to a TOML config file
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<PathBuf>,

    /// Who to play against (`practice` plays alone against the computer's code)
    #[arg(long, value_enum)]
    pub opponent: Option<OpponentKind>,

    /// Model name for the language-model opponent
    #[arg(long)]
    pub model: Option<String>,

    /// Seed for reproducible secrets and guesses
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fail instead of falling back to exhaustive search when the model is unavailable
    #[arg(long)]
    pub no_fallback: bool,

    /// Write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(opponent) = self.opponent {
            config.opponent = opponent;
        }
        if let Some(model) = &self.model {
            config.oracle.model.clone_from(model);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if self.no_fallback {
            config.oracle.fallback = false;
        }
    }
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

// UI Input/Output functions

fn parse_input(input: &str, prompt: Prompt) -> Option<UserAction> {
    match input.to_lowercase().as_str() {
        "exit" | "quit" => Some(UserAction::Exit),
        "next" | "new" => Some(UserAction::NewGame),
        "hint" if prompt == Prompt::Guess => Some(UserAction::Hint),
        other => match other.parse::<Code>() {
            Ok(code) => Some(UserAction::Submit(code)),
            Err(err) => {
                println!("Invalid input: {err}.");
                None
            }
        },
    }
}

/// Read one trimmed line; `None` on end of input or a read error.
fn read_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut input = String::new();
    match reader.read_line(&mut input) {
        Ok(0) => None,
        Ok(_) => Some(input.trim().to_string()),
        Err(e) => {
            log::warn!("failed to read input: {e}");
            None
        }
    }
}

pub fn read_code<R: BufRead>(reader: &mut R, prompt: Prompt) -> Option<UserAction> {
    match prompt {
        Prompt::Secret => {
            println!("\nChoose your secret code (4 distinct digits), or 'exit' to quit:");
        }
        Prompt::Guess => {
            println!("\nYour guess (4 distinct digits, 'hint', 'next' for a new game, 'exit' to quit):");
        }
    }
    match read_line(reader) {
        Some(line) => parse_input(&line, prompt),
        None => Some(UserAction::Exit),
    }
}

pub fn read_after_game<R: BufRead>(reader: &mut R) -> UserAction {
    println!("\nPlay again? ('next' for a new game, anything else to quit)");
    match read_line(reader).as_deref().map(str::to_lowercase).as_deref() {
        Some("next" | "new" | "y" | "yes") => UserAction::NewGame,
        _ => UserAction::Exit,
    }
}

#[must_use]
pub fn format_guess(side: Side, record: &GuessRecord) -> String {
    let who = match side {
        Side::Player => "You",
        Side::Computer => "Computer",
    };
    format!("{who} guessed {}: {}", record.code(), record.feedback())
}

#[must_use]
pub fn format_outcome(summary: &GameSummary) -> String {
    match &summary.outcome {
        Outcome::Won(Side::Player) => format!(
            "Victory! You cracked the code in {} guesses.",
            summary.player_guesses
        ),
        Outcome::Won(Side::Computer) => format!(
            "Game over. The computer cracked your code in {} guesses.",
            summary.computer_guesses
        ),
        Outcome::Abandoned => "Game abandoned.".to_string(),
        Outcome::Aborted(reason) => format!("Game aborted: {reason}"),
    }
}

#[must_use]
pub fn format_hint(hint: &Hint) -> String {
    match hint.suggestion {
        Some(code) => format!(
            "{} codes still fit your feedback. Try {code}.",
            hint.remaining
        ),
        None => "No code fits your feedback.".to_string(),
    }
}

/// CLI implementation of the `GameInterface` trait
/// This struct wraps a `BufRead` reader and implements the game interface for CLI interaction
pub struct CliInterface<R: BufRead> {
    reader: R,
}

impl<R: BufRead> CliInterface<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> GameInterface for CliInterface<R> {
    fn read_code(&mut self, prompt: Prompt) -> Option<UserAction> {
        read_code(&mut self.reader, prompt)
    }

    fn read_after_game(&mut self) -> UserAction {
        read_after_game(&mut self.reader)
    }

    fn display_new_game(&mut self, opponent: Option<&str>) {
        match opponent {
            Some(name) => println!("New game against {name}."),
            None => println!("New practice game. Crack the computer's code."),
        }
    }

    fn display_thinking(&mut self, opponent: &str) {
        println!("Computer ({opponent}) is thinking...");
    }

    fn display_guess(&mut self, side: Side, record: &GuessRecord) {
        println!("{}", format_guess(side, record));
    }

    fn display_hint(&mut self, hint: &Hint) {
        println!("{}", format_hint(hint));
    }

    fn display_error(&mut self, message: &str) {
        println!("Error: {message}");
    }

    fn display_game_over(&mut self, summary: &GameSummary) {
        println!("{}", format_outcome(summary));
        match summary.player_secret {
            Some(secret) => println!(
                "Your code: {secret}  Computer's code: {}",
                summary.computer_secret
            ),
            None => println!("Computer's code: {}", summary.computer_secret),
        }
    }

    fn display_exit_message(&mut self) {
        println!("Exiting.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Feedback;
    use std::io::Cursor;

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_cli_flags() {
        let cli = Cli::parse_from([
            "codebreaker",
            "--opponent",
            "oracle",
            "--seed",
            "12",
            "--model",
            "x/y",
            "--no-fallback",
            "-c",
            "/tmp/cb.toml",
        ]);
        assert_eq!(cli.opponent, Some(OpponentKind::Oracle));
        assert_eq!(cli.seed, Some(12));
        assert_eq!(cli.model.as_deref(), Some("x/y"));
        assert!(cli.no_fallback);
        assert!(!cli.tui);
        assert_eq!(cli.config_path, Some(PathBuf::from("/tmp/cb.toml")));
    }

    #[test]
    fn test_parse_cli_practice() {
        let cli = Cli::parse_from(["codebreaker", "--opponent", "practice"]);
        assert_eq!(cli.opponent, Some(OpponentKind::Practice));
    }

    #[test]
    fn test_parse_cli_rejects_unknown_opponent() {
        assert!(Cli::try_parse_from(["codebreaker", "--opponent", "psychic"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let cli = Cli {
            opponent: Some(OpponentKind::Oracle),
            seed: Some(3),
            no_fallback: true,
            ..Cli::default()
        };
        cli.apply(&mut config);
        assert_eq!(config.opponent, OpponentKind::Oracle);
        assert_eq!(config.seed, Some(3));
        assert!(!config.oracle.fallback);
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let mut config = Config {
            seed: Some(8),
            ..Config::default()
        };
        Cli::default().apply(&mut config);
        assert_eq!(config.seed, Some(8));
        assert!(config.oracle.fallback);
    }

    #[test]
    fn test_read_code_valid() {
        let mut reader = Cursor::new("  0427 \n");
        assert_eq!(
            read_code(&mut reader, Prompt::Guess),
            Some(UserAction::Submit(code("0427")))
        );
    }

    #[test]
    fn test_read_code_rejects_invalid() {
        for bad in ["1123\n", "12a3\n", "123\n", "12345\n", "\n"] {
            let mut reader = Cursor::new(bad);
            assert_eq!(read_code(&mut reader, Prompt::Guess), None, "{bad:?}");
        }
    }

    #[test]
    fn test_read_code_commands() {
        let mut reader = Cursor::new("EXIT\nnext\nhint\n");
        assert_eq!(read_code(&mut reader, Prompt::Guess), Some(UserAction::Exit));
        assert_eq!(read_code(&mut reader, Prompt::Guess), Some(UserAction::NewGame));
        assert_eq!(read_code(&mut reader, Prompt::Guess), Some(UserAction::Hint));
    }

    #[test]
    fn test_hint_not_accepted_for_secret() {
        let mut reader = Cursor::new("hint\n");
        assert_eq!(read_code(&mut reader, Prompt::Secret), None);
    }

    #[test]
    fn test_end_of_input_exits() {
        let mut reader = Cursor::new("");
        assert_eq!(read_code(&mut reader, Prompt::Secret), Some(UserAction::Exit));
        assert_eq!(read_after_game(&mut reader), UserAction::Exit);
    }

    #[test]
    fn test_read_after_game() {
        let mut reader = Cursor::new("Yes\nno\n");
        assert_eq!(read_after_game(&mut reader), UserAction::NewGame);
        assert_eq!(read_after_game(&mut reader), UserAction::Exit);
    }

    #[test]
    fn test_format_guess() {
        let record = GuessRecord::new(code("1234"), Feedback::new(2, 1).unwrap());
        assert_eq!(
            format_guess(Side::Player, &record),
            "You guessed 1234: 2 exact, 1 partial"
        );
        assert_eq!(
            format_guess(Side::Computer, &record),
            "Computer guessed 1234: 2 exact, 1 partial"
        );
    }

    #[test]
    fn test_format_outcome() {
        let mut summary = GameSummary {
            outcome: Outcome::Won(Side::Player),
            player_secret: Some(code("1234")),
            computer_secret: code("5678"),
            player_guesses: 5,
            computer_guesses: 4,
        };
        assert_eq!(
            format_outcome(&summary),
            "Victory! You cracked the code in 5 guesses."
        );
        summary.outcome = Outcome::Won(Side::Computer);
        assert!(format_outcome(&summary).contains("in 4 guesses"));
        summary.outcome = Outcome::Aborted("boom".to_string());
        assert_eq!(format_outcome(&summary), "Game aborted: boom");
    }

    #[test]
    fn test_format_hint() {
        let hint = Hint {
            remaining: 6,
            suggestion: Some(code("1243")),
        };
        assert_eq!(format_hint(&hint), "6 codes still fit your feedback. Try 1243.");
        let none = Hint {
            remaining: 0,
            suggestion: None,
        };
        assert_eq!(format_hint(&none), "No code fits your feedback.");
    }
}
