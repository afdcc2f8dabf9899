use crate::code::Code;
use crate::error::GameError;
use crate::history::{GuessRecord, History};
use crate::solver::{Guesser, consistent_candidates};
use crate::{debug_log, info_log};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Computer,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Player => Self::Computer,
            Self::Computer => Self::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Computer => write!(f, "computer"),
        }
    }
}

/// Snapshot of whose move it is. Hand it back to [`Match::submit`] to claim
/// that move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnState {
    pub side: Side,
    pub version: u64,
}

/// Versioned turn counter.
///
/// Sides alternate (or, for a solo turn, never change), so the version alone
/// determines the side. Advancing is a compare-and-set on the version: of
/// several submissions holding the same snapshot, exactly one succeeds.
#[derive(Debug)]
pub struct Turn {
    first: Side,
    alternating: bool,
    version: AtomicU64,
}

impl Turn {
    #[must_use]
    pub fn new(first: Side) -> Self {
        Self {
            first,
            alternating: true,
            version: AtomicU64::new(0),
        }
    }

    /// A turn that always belongs to `side`.
    #[must_use]
    pub fn solo(side: Side) -> Self {
        Self {
            first: side,
            alternating: false,
            version: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn current(&self) -> TurnState {
        self.state_at(self.version.load(Ordering::Acquire))
    }

    fn state_at(&self, version: u64) -> TurnState {
        let side = if !self.alternating || version % 2 == 0 {
            self.first
        } else {
            self.first.opposite()
        };
        TurnState { side, version }
    }

    /// Move to the next turn if `expected` is still current.
    pub fn advance(&self, expected: TurnState) -> Result<TurnState, GameError> {
        if self.state_at(expected.version) != expected {
            return Err(GameError::NotYourTurn(expected.side));
        }
        let next = expected.version + 1;
        self.version
            .compare_exchange(expected.version, next, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| self.state_at(next))
            .map_err(|actual| GameError::TurnConflict {
                expected: expected.version,
                actual,
            })
    }
}

#[derive(Debug, Default)]
struct MatchState {
    player: History,
    computer: History,
    winner: Option<Side>,
}

impl MatchState {
    fn history_mut(&mut self, side: Side) -> &mut History {
        match side {
            Side::Player => &mut self.player,
            Side::Computer => &mut self.computer,
        }
    }
}

/// One game between the player and the computer.
///
/// A practice match has no player secret and only the player guesses.
/// Shareable across threads: moves are serialized by the [`Turn`], and the
/// state lock is only held for the in-memory append, never while a guess is
/// being computed.
#[derive(Debug)]
pub struct Match {
    player_secret: Option<Code>,
    computer_secret: Code,
    turn: Turn,
    state: Mutex<MatchState>,
}

impl Match {
    #[must_use]
    pub fn new(player_secret: Code, computer_secret: Code, first: Side) -> Self {
        Self {
            player_secret: Some(player_secret),
            computer_secret,
            turn: Turn::new(first),
            state: Mutex::new(MatchState::default()),
        }
    }

    #[must_use]
    pub fn practice(computer_secret: Code) -> Self {
        Self {
            player_secret: None,
            computer_secret,
            turn: Turn::solo(Side::Player),
            state: Mutex::new(MatchState::default()),
        }
    }

    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.turn.current()
    }

    /// The secret held by `side`; the player holds none in practice.
    #[must_use]
    pub fn secret(&self, side: Side) -> Option<Code> {
        match side {
            Side::Player => self.player_secret,
            Side::Computer => Some(self.computer_secret),
        }
    }

    /// Snapshot of the guesses made by `side`.
    #[must_use]
    pub fn history(&self, side: Side) -> History {
        let state = self.lock();
        match side {
            Side::Player => state.player.clone(),
            Side::Computer => state.computer.clone(),
        }
    }

    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        self.lock().winner
    }

    /// Score `guess` by `side` against the opposing secret and record it.
    pub fn submit(
        &self,
        side: Side,
        expected: TurnState,
        guess: Code,
    ) -> Result<GuessRecord, GameError> {
        if expected.side != side {
            return Err(GameError::NotYourTurn(side));
        }
        let secret = self
            .secret(side.opposite())
            .ok_or(GameError::NotYourTurn(side))?;
        let mut state = self.lock();
        if state.winner.is_some() {
            return Err(GameError::GameOver);
        }
        self.turn.advance(expected)?;

        let record = GuessRecord::scored(guess, &secret);
        state.history_mut(side).push(record);
        if record.feedback().is_solved() {
            info_log!("Match::submit() - {} cracked the code with {}", side, guess);
            state.winner = Some(side);
        }
        Ok(record)
    }

    fn lock(&self) -> MutexGuard<'_, MatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won(Side),
    /// The player left or restarted mid-game.
    Abandoned,
    /// The computer could not produce a guess.
    Aborted(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub outcome: Outcome,
    /// `None` in practice games.
    pub player_secret: Option<Code>,
    pub computer_secret: Code,
    pub player_guesses: usize,
    pub computer_guesses: usize,
}

/// What the player is being asked to type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prompt {
    Secret,
    Guess,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    Submit(Code),
    Hint,
    NewGame,
    Exit,
}

/// How much the player's own feedback has narrowed things down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hint {
    pub remaining: usize,
    pub suggestion: Option<Code>,
}

impl Hint {
    pub fn for_history<R: Rng + ?Sized>(history: &History, rng: &mut R) -> Self {
        let candidates = consistent_candidates(history);
        Self {
            remaining: candidates.len(),
            suggestion: candidates.choose(rng).copied(),
        }
    }
}

/// Trait for UI implementations (CLI, TUI, or test doubles).
pub trait GameInterface {
    /// Read one action. `None` means the input was rejected and the prompt
    /// should be repeated.
    fn read_code(&mut self, prompt: Prompt) -> Option<UserAction>;

    /// After a finished game: `NewGame` or `Exit`.
    fn read_after_game(&mut self) -> UserAction;

    /// `None` starts a practice game.
    fn display_new_game(&mut self, opponent: Option<&str>);

    fn display_thinking(&mut self, opponent: &str);

    fn display_guess(&mut self, side: Side, record: &GuessRecord);

    fn display_hint(&mut self, hint: &Hint);

    fn display_error(&mut self, message: &str);

    fn display_game_over(&mut self, summary: &GameSummary);

    fn display_exit_message(&mut self);
}

enum Flow {
    Finished,
    NewGame,
    Exit,
}

/// Play games against `guesser` until the player exits. Returns a summary
/// per game started.
pub fn game_loop<I, G, R>(interface: &mut I, guesser: &mut G, rng: &mut R) -> Vec<GameSummary>
where
    I: GameInterface + ?Sized,
    G: Guesser + ?Sized,
    R: Rng + ?Sized,
{
    run_games(interface, Some(guesser), rng)
}

/// Practice games: the player cracks the computer's code alone, with no
/// secret of their own and no computer turns.
pub fn practice_loop<I, R>(interface: &mut I, rng: &mut R) -> Vec<GameSummary>
where
    I: GameInterface + ?Sized,
    R: Rng + ?Sized,
{
    run_games::<I, dyn Guesser, R>(interface, None, rng)
}

fn run_games<I, G, R>(
    interface: &mut I,
    mut opponent: Option<&mut G>,
    rng: &mut R,
) -> Vec<GameSummary>
where
    I: GameInterface + ?Sized,
    G: Guesser + ?Sized,
    R: Rng + ?Sized,
{
    let mut summaries = Vec::new();

    loop {
        interface.display_new_game(opponent.as_deref().map(|g| g.name()));
        let player_secret = if opponent.is_some() {
            let Some(secret) = read_secret(interface) else {
                interface.display_exit_message();
                break;
            };
            Some(secret)
        } else {
            None
        };
        let computer_secret = Code::generate(rng);
        let game = match player_secret {
            Some(secret) => Match::new(secret, computer_secret, Side::Player),
            None => Match::practice(computer_secret),
        };
        info_log!(
            "run_games() - new match against {}",
            opponent.as_deref().map_or("nobody (practice)", |g| g.name())
        );

        let (outcome, flow) = play_match(&game, interface, opponent.as_deref_mut(), rng);
        let summary = GameSummary {
            outcome,
            player_secret,
            computer_secret,
            player_guesses: game.history(Side::Player).len(),
            computer_guesses: game.history(Side::Computer).len(),
        };
        debug_log!("run_games() - {:?}", summary);

        let finished = matches!(flow, Flow::Finished);
        if finished {
            interface.display_game_over(&summary);
        }
        summaries.push(summary);

        let next = match flow {
            Flow::Finished => interface.read_after_game(),
            Flow::NewGame => UserAction::NewGame,
            Flow::Exit => UserAction::Exit,
        };
        if next != UserAction::NewGame {
            interface.display_exit_message();
            break;
        }
    }
    summaries
}

fn read_secret<I: GameInterface + ?Sized>(interface: &mut I) -> Option<Code> {
    loop {
        match interface.read_code(Prompt::Secret) {
            Some(UserAction::Submit(code)) => return Some(code),
            Some(UserAction::Exit) => return None,
            Some(UserAction::Hint | UserAction::NewGame) | None => {}
        }
    }
}

fn play_match<I, G, R>(
    game: &Match,
    interface: &mut I,
    mut guesser: Option<&mut G>,
    rng: &mut R,
) -> (Outcome, Flow)
where
    I: GameInterface + ?Sized,
    G: Guesser + ?Sized,
    R: Rng + ?Sized,
{
    loop {
        let turn = game.turn();
        let guess = match turn.side {
            Side::Player => match interface.read_code(Prompt::Guess) {
                Some(UserAction::Submit(code)) => code,
                Some(UserAction::Hint) => {
                    let hint = Hint::for_history(&game.history(Side::Player), rng);
                    interface.display_hint(&hint);
                    continue;
                }
                Some(UserAction::NewGame) => return (Outcome::Abandoned, Flow::NewGame),
                Some(UserAction::Exit) => return (Outcome::Abandoned, Flow::Exit),
                None => continue,
            },
            Side::Computer => {
                // Solo turns never reach here
                let Some(guesser) = guesser.as_deref_mut() else {
                    return (
                        Outcome::Aborted("no computer opponent".to_string()),
                        Flow::Finished,
                    );
                };
                interface.display_thinking(guesser.name());
                // Computed from a snapshot; nothing is locked while waiting.
                match guesser.next_guess(&game.history(Side::Computer)) {
                    Ok(code) => {
                        if guesser.answered_by() != guesser.name() {
                            interface.display_error(&format!(
                                "{} was unavailable, {} made this guess",
                                guesser.name(),
                                guesser.answered_by()
                            ));
                        }
                        code
                    }
                    Err(err) => {
                        log::error!("{} could not guess: {err}", guesser.name());
                        interface.display_error(&format!("The computer gave up: {err}"));
                        return (Outcome::Aborted(err.to_string()), Flow::Finished);
                    }
                }
            }
        };

        match game.submit(turn.side, turn, guess) {
            Ok(record) => interface.display_guess(turn.side, &record),
            Err(err) => interface.display_error(&err.to_string()),
        }

        if let Some(winner) = game.winner() {
            return (Outcome::Won(winner), Flow::Finished);
        }
    }
}
