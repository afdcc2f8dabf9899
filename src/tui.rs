//! TUI (Terminal User Interface) module for Codebreaker
//!
//! This module provides an interactive terminal interface using Ratatui.
//!
//! # State Machine
//! - `EnteringSecret` → `EnteringGuess` ⇄ `Thinking` → `GameOver`
//! - From `GameOver`, `N` goes back to `EnteringSecret`.
//! - Practice games skip `EnteringSecret` and never enter `Thinking`.

use crate::cli::{format_guess, format_hint, format_outcome};
use crate::code::{CODE_LENGTH, Code};
use crate::game_state::{GameInterface, GameSummary, Hint, Prompt, Side, UserAction};
use crate::history::GuessRecord;
use crate::{debug_log, info_log};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;
use std::time::Duration;

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
const ASCII_CONTROL_CHAR_THRESHOLD: u32 = 32;

// Style constants for consistent UI
const HEADER_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const ERROR_STYLE: Style = Style::new().fg(Color::Red);
const SUCCESS_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
const INFO_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const MESSAGE_STYLE: Style = Style::new().fg(Color::Cyan);
const DIGIT_STYLE: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
const EXACT_STYLE: Style = Style::new().fg(Color::Green);
const PARTIAL_STYLE: Style = Style::new().fg(Color::Yellow);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TuiState {
    EnteringSecret,
    EnteringGuess,
    Thinking,
    GameOver,
}

/// Everything a frame needs, borrowed from the interface.
struct RenderContext<'a> {
    state: TuiState,
    player_rows: &'a [GuessRecord],
    computer_rows: &'a [GuessRecord],
    current_input: &'a str,
    secret: Option<Code>,
    opponent: &'a str,
    hint: Option<&'a Hint>,
    message: &'a str,
    error_message: &'a str,
    status: &'a str,
}

/// Full-screen game interface.
pub struct TuiInterface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    state: TuiState,
    player_rows: Vec<GuessRecord>,
    computer_rows: Vec<GuessRecord>,
    current_input: String,
    secret: Option<Code>,
    opponent: String,
    hint: Option<Hint>,
    message: String,
    error_message: String,
    status: String,
}

impl TuiInterface {
    pub fn new() -> Result<Self, io::Error> {
        info_log!("TuiInterface::new() - Initializing TUI");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        info_log!("TuiInterface::new() - Terminal ready");

        Ok(Self {
            terminal,
            state: TuiState::EnteringSecret,
            player_rows: Vec::new(),
            computer_rows: Vec::new(),
            current_input: String::new(),
            secret: None,
            opponent: String::new(),
            hint: None,
            message: String::new(),
            error_message: String::new(),
            status: "Ready to start".to_string(),
        })
    }

    pub fn cleanup(&mut self) -> Result<(), io::Error> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }

    fn draw(&mut self) -> Result<(), io::Error> {
        let ctx = RenderContext {
            state: self.state,
            player_rows: &self.player_rows,
            computer_rows: &self.computer_rows,
            current_input: &self.current_input,
            secret: self.secret,
            opponent: &self.opponent,
            hint: self.hint.as_ref(),
            message: &self.message,
            error_message: &self.error_message,
            status: &self.status,
        };
        self.terminal.draw(|f| render(f, &ctx))?;
        Ok(())
    }

    fn draw_or_log(&mut self) {
        if let Err(e) = self.draw() {
            debug_log!("Draw error: {}", e);
        }
    }

    /// Wait for one key press, skipping everything else.
    fn next_key(&mut self) -> Result<Option<KeyEvent>, io::Error> {
        if !event::poll(EVENT_POLL_TIMEOUT)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Terminal focus changes can leak replacement and control characters
                if let KeyCode::Char(c) = key.code
                    && (c == '\u{FFFD}' || (c as u32) < ASCII_CONTROL_CHAR_THRESHOLD)
                {
                    debug_log!("next_key() - Ignoring stray character {:?}", c);
                    return Ok(None);
                }
                if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::CONTROL) {
                    debug_log!("next_key() - Ignoring key with modifier {:?}", key.modifiers);
                    return Ok(None);
                }
                Ok(Some(key))
            }
            other => {
                debug_log!("next_key() - Ignoring event {:?}", other);
                Ok(None)
            }
        }
    }

    fn handle_code_input(&mut self, key: KeyEvent, prompt: Prompt) -> Option<UserAction> {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.current_input.len() < CODE_LENGTH {
                    self.current_input.push(c);
                    self.error_message.clear();
                }
                None
            }
            KeyCode::Backspace => {
                self.current_input.pop();
                self.error_message.clear();
                None
            }
            KeyCode::Enter => match self.current_input.parse::<Code>() {
                Ok(code) => {
                    self.current_input.clear();
                    self.error_message.clear();
                    Some(UserAction::Submit(code))
                }
                Err(_) => {
                    self.error_message = "A code is exactly 4 digits, none repeated.".to_string();
                    None
                }
            },
            KeyCode::Esc => Some(UserAction::Exit),
            KeyCode::Char('h' | 'H' | '?') if prompt == Prompt::Guess => Some(UserAction::Hint),
            KeyCode::Char('n' | 'N') if prompt == Prompt::Guess => Some(UserAction::NewGame),
            KeyCode::Char(c) => {
                self.error_message = format!("Only digits are allowed! ('{c}' is not a digit)");
                None
            }
            _ => None,
        }
    }

    fn reset_board(&mut self) {
        self.player_rows.clear();
        self.computer_rows.clear();
        self.current_input.clear();
        self.secret = None;
        self.hint = None;
        self.error_message.clear();
    }
}

fn render(f: &mut Frame, ctx: &RenderContext) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(8),    // Boards
            Constraint::Length(6), // Info panel
            Constraint::Length(3), // Status line
            Constraint::Length(3), // Instructions
        ])
        .split(f.area());

    render_title(f, chunks[0], ctx);
    let boards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    let show_input = ctx.state == TuiState::EnteringGuess;
    render_board(f, boards[0], "Your guesses", ctx.player_rows, show_input.then_some(ctx.current_input));
    render_board(f, boards[1], "Computer's guesses", ctx.computer_rows, None);
    render_info(f, chunks[2], ctx);
    render_status(f, chunks[3], ctx.status);
    render_instructions(f, chunks[4], ctx.state);
}

fn render_title(f: &mut Frame, area: Rect, ctx: &RenderContext) {
    let mut spans = vec![Span::styled("CODEBREAKER", HEADER_STYLE)];
    if !ctx.opponent.is_empty() {
        spans.push(Span::raw(format!("  vs {}", ctx.opponent)));
    }
    if let Some(secret) = ctx.secret {
        spans.push(Span::raw(format!("  | Your code: {secret}")));
    }
    let title = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn digit_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(" ")];
    for i in 0..CODE_LENGTH {
        let digit = text.chars().nth(i).unwrap_or(' ');
        spans.push(Span::styled(format!(" {digit} "), DIGIT_STYLE));
        spans.push(Span::raw(" "));
    }
    spans
}

fn guess_line(index: usize, record: &GuessRecord) -> Line<'static> {
    let feedback = record.feedback();
    let mut spans = vec![Span::raw(format!("{:>2}.", index + 1))];
    spans.extend(digit_spans(&record.code().to_string()));
    spans.push(Span::styled(
        "●".repeat(usize::from(feedback.exact())),
        EXACT_STYLE,
    ));
    spans.push(Span::styled(
        "○".repeat(usize::from(feedback.partial())),
        PARTIAL_STYLE,
    ));
    spans.push(Span::raw(format!("  {feedback}")));
    Line::from(spans)
}

fn render_board(f: &mut Frame, area: Rect, title: &str, rows: &[GuessRecord], input: Option<&str>) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let capacity = usize::from(block.inner(area).height);

    let mut lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .map(|(i, record)| guess_line(i, record))
        .collect();
    if let Some(current) = input {
        let mut spans = vec![Span::raw(" > ")];
        spans.extend(digit_spans(current));
        lines.push(Line::from(spans));
    }

    // Keep the most recent rows visible
    let skip = lines.len().saturating_sub(capacity);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    f.render_widget(Paragraph::new(visible).block(block), area);
}

fn render_info(f: &mut Frame, area: Rect, ctx: &RenderContext) {
    let mut lines = Vec::new();

    if ctx.state == TuiState::EnteringSecret {
        lines.push(Line::from(vec![Span::styled("Your secret: ", INFO_STYLE)]));
        let mut spans = vec![Span::raw("  ")];
        spans.extend(digit_spans(ctx.current_input));
        lines.push(Line::from(spans));
    }
    if let Some(hint) = ctx.hint {
        lines.push(Line::from(vec![Span::styled(format_hint(hint), SUCCESS_STYLE)]));
    }
    if !ctx.message.is_empty() {
        lines.push(Line::from(vec![Span::styled(ctx.message, MESSAGE_STYLE)]));
    }
    if !ctx.error_message.is_empty() {
        lines.push(Line::from(vec![Span::styled(ctx.error_message, ERROR_STYLE)]));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().title("Information").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_status(f: &mut Frame, area: Rect, status: &str) {
    let status_text = if status.is_empty() { "Ready" } else { status };
    let paragraph = Paragraph::new(status_text)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(paragraph, area);
}

fn render_instructions(f: &mut Frame, area: Rect, state: TuiState) {
    let text = match state {
        TuiState::EnteringSecret => "Type your secret code | ENTER: Confirm | ESC: Quit",
        TuiState::EnteringGuess => {
            "Type 4 digits | ENTER: Guess | H: Hint | N: New game | ESC: Quit"
        }
        TuiState::Thinking => "The computer is choosing a guess...",
        TuiState::GameOver => "N: New Game | ESC: Quit",
    };
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

impl GameInterface for TuiInterface {
    fn read_code(&mut self, prompt: Prompt) -> Option<UserAction> {
        self.state = match prompt {
            Prompt::Secret => TuiState::EnteringSecret,
            Prompt::Guess => TuiState::EnteringGuess,
        };
        self.status = match prompt {
            Prompt::Secret => "Choose a secret code for the computer to crack".to_string(),
            Prompt::Guess => "Your turn".to_string(),
        };

        loop {
            if self.draw().is_err() {
                info_log!("read_code() - Draw failed, returning Exit");
                return Some(UserAction::Exit);
            }
            match self.next_key() {
                Ok(Some(key)) => {
                    if let Some(action) = self.handle_code_input(key, prompt) {
                        info_log!("read_code() - Action: {:?}", action);
                        if let (Prompt::Secret, UserAction::Submit(code)) = (prompt, &action) {
                            self.secret = Some(*code);
                        }
                        return Some(action);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    info_log!("read_code() - Input error {}, returning Exit", e);
                    return Some(UserAction::Exit);
                }
            }
        }
    }

    fn read_after_game(&mut self) -> UserAction {
        self.state = TuiState::GameOver;
        loop {
            if self.draw().is_err() {
                return UserAction::Exit;
            }
            match self.next_key() {
                Ok(Some(key)) => match key.code {
                    KeyCode::Char('n' | 'N') => return UserAction::NewGame,
                    KeyCode::Esc | KeyCode::Char('q' | 'Q') => return UserAction::Exit,
                    _ => {}
                },
                Ok(None) => {}
                Err(_) => return UserAction::Exit,
            }
        }
    }

    fn display_new_game(&mut self, opponent: Option<&str>) {
        self.reset_board();
        match opponent {
            Some(name) => {
                self.opponent = name.to_string();
                self.message = format!("New game against {name}.");
            }
            None => {
                self.opponent.clear();
                self.message = "Practice game: crack the computer's code.".to_string();
            }
        }
        self.draw_or_log();
    }

    fn display_thinking(&mut self, opponent: &str) {
        self.state = TuiState::Thinking;
        self.status = format!("Computer ({opponent}) is thinking...");
        self.draw_or_log();
    }

    fn display_guess(&mut self, side: Side, record: &GuessRecord) {
        match side {
            Side::Player => {
                self.player_rows.push(*record);
                self.hint = None;
            }
            Side::Computer => self.computer_rows.push(*record),
        }
        self.message = format_guess(side, record);
        self.draw_or_log();
    }

    fn display_hint(&mut self, hint: &Hint) {
        self.hint = Some(hint.clone());
        self.draw_or_log();
    }

    fn display_error(&mut self, message: &str) {
        self.error_message = message.to_string();
        self.draw_or_log();
    }

    fn display_game_over(&mut self, summary: &GameSummary) {
        self.state = TuiState::GameOver;
        self.message = format!(
            "{} Computer's code was {}.",
            format_outcome(summary),
            summary.computer_secret
        );
        self.status = "Game over".to_string();
        self.draw_or_log();
    }

    fn display_exit_message(&mut self) {
        self.status = "Exiting...".to_string();
        self.draw_or_log();
    }
}

impl Drop for TuiInterface {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Feedback;
    use ratatui::backend::TestBackend;

    fn record(code: &str, exact: u8, partial: u8) -> GuessRecord {
        GuessRecord::new(code.parse().unwrap(), Feedback::new(exact, partial).unwrap())
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_guess_line_shows_pegs() {
        let text = line_text(&guess_line(0, &record("1234", 2, 1)));
        assert!(text.starts_with(" 1."));
        assert!(text.contains("●●○"));
        assert!(text.ends_with("2 exact, 1 partial"));
    }

    #[test]
    fn test_digit_spans_pad_partial_input() {
        let spans = digit_spans("12");
        let text: String = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, format!("  1   2{}", " ".repeat(10)));
    }

    #[test]
    fn test_render_full_frame() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let player_rows = [record("1234", 0, 2)];
        let computer_rows = [record("5678", 1, 0)];
        let hint = Hint {
            remaining: 42,
            suggestion: Some("9012".parse().unwrap()),
        };
        let ctx = RenderContext {
            state: TuiState::EnteringGuess,
            player_rows: &player_rows,
            computer_rows: &computer_rows,
            current_input: "98",
            secret: Some("4071".parse().unwrap()),
            opponent: "exhaustive search",
            hint: Some(&hint),
            message: "hello",
            error_message: "",
            status: "Your turn",
        };
        terminal.draw(|f| render(f, &ctx)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("CODEBREAKER"));
        assert!(text.contains("Your code: 4071"));
        assert!(text.contains("0 exact, 2 partial"));
        assert!(text.contains("1 exact, 0 partial"));
        assert!(text.contains("42 codes still fit your feedback"));
        assert!(text.contains("Your turn"));
    }
}
