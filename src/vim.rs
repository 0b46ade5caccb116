//! Vim-style modal keyboard layer.
//!
//! The controller never touches particles, effects or the screen. Every key
//! produces a [`VimAction`] and the orchestrator decides what it means.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

/// Keyboard interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    Visual,
    Command,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Normal, Mode::Insert, Mode::Visual, Mode::Command];

    /// Status-line text
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "-- NORMAL --",
            Mode::Insert => "-- INSERT --",
            Mode::Visual => "-- VISUAL --",
            Mode::Command => "-- COMMAND --",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Insert => "insert",
            Mode::Visual => "visual",
            Mode::Command => "command",
        }
    }
}

/// Normal-mode requests that do not change the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ScrollDown,
    ScrollUp,
    JumpToTop,
    JumpToBottom,
    NextTheme,
    PreviousTheme,
}

/// Argument of `:theme`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeTarget {
    Index(usize),
    Name(String),
}

/// A parsed `:` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Theme(ThemeTarget),
    NextTheme,
    PreviousTheme,
    Pause,
    Resume,
}

/// Result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VimAction {
    /// Nothing for the caller to do
    None,
    ModeChanged(Mode),
    Intent(Intent),
    /// A command line was submitted; the controller is back in normal mode
    Command(Command),
    UnknownCommand(String),
}

/// First key of a two-key sequence, valid until `deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    key: char,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct VimSystem {
    mode: Mode,
    pending: Option<Pending>,
    timeout: Duration,
    command_line: String,
}

impl Default for VimSystem {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl VimSystem {
    pub fn new(sequence_timeout: Duration) -> Self {
        Self {
            mode: Mode::Normal,
            pending: None,
            timeout: sequence_timeout,
            command_line: String::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Text typed after `:` so far.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> VimAction {
        self.handle_key_at(key, Instant::now())
    }

    /// Handle a key that arrived at `now`.
    pub fn handle_key_at(&mut self, key: KeyEvent, now: Instant) -> VimAction {
        if key.kind == KeyEventKind::Release {
            return VimAction::None;
        }

        if is_escape(&key) {
            self.pending = None;
            self.command_line.clear();
            return self.enter(Mode::Normal);
        }

        match self.mode {
            Mode::Normal => self.normal_key(key, now),
            Mode::Command => self.command_key(key),
            Mode::Insert | Mode::Visual => VimAction::None,
        }
    }

    fn enter(&mut self, mode: Mode) -> VimAction {
        if self.mode == mode {
            return VimAction::None;
        }
        debug!(from = self.mode.as_str(), to = mode.as_str(), "mode change");
        self.mode = mode;
        VimAction::ModeChanged(mode)
    }

    fn normal_key(&mut self, key: KeyEvent, now: Instant) -> VimAction {
        let Some(c) = plain_char(&key) else {
            self.pending = None;
            return match key.code {
                KeyCode::Down => VimAction::Intent(Intent::ScrollDown),
                KeyCode::Up => VimAction::Intent(Intent::ScrollUp),
                _ => VimAction::None,
            };
        };

        if let Some(pending) = self.pending.take() {
            if now <= pending.deadline && pending.key == 'g' && c == 'g' {
                return VimAction::Intent(Intent::JumpToTop);
            }
            // Expired or mismatched: drop it and read this key on its own.
        }

        match c {
            'i' => self.enter(Mode::Insert),
            'v' => self.enter(Mode::Visual),
            ':' => {
                self.command_line.clear();
                self.enter(Mode::Command)
            }
            'j' => VimAction::Intent(Intent::ScrollDown),
            'k' => VimAction::Intent(Intent::ScrollUp),
            'g' => {
                self.pending = Some(Pending {
                    key: 'g',
                    deadline: now + self.timeout,
                });
                VimAction::None
            }
            'G' => VimAction::Intent(Intent::JumpToBottom),
            't' => VimAction::Intent(Intent::NextTheme),
            'T' => VimAction::Intent(Intent::PreviousTheme),
            _ => VimAction::None,
        }
    }

    fn command_key(&mut self, key: KeyEvent) -> VimAction {
        match key.code {
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.command_line);
                self.mode = Mode::Normal;
                if line.trim().is_empty() {
                    return VimAction::ModeChanged(Mode::Normal);
                }
                match parse_command(&line) {
                    Some(command) => VimAction::Command(command),
                    None => VimAction::UnknownCommand(line.trim().to_string()),
                }
            }
            KeyCode::Backspace => {
                if self.command_line.pop().is_none() {
                    return self.enter(Mode::Normal);
                }
                VimAction::None
            }
            _ => {
                if let Some(c) = plain_char(&key) {
                    self.command_line.push(c);
                }
                VimAction::None
            }
        }
    }
}

fn is_escape(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('[') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// The character of a key press without Ctrl/Alt. Shift is part of the
/// character itself.
fn plain_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

/// Parse a command line (with or without the leading `:`).
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let line = line.strip_prefix(':').unwrap_or(line).trim();
    let mut parts = line.splitn(2, char::is_whitespace);
    let name = parts.next()?.to_lowercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match (name.as_str(), arg) {
        ("q" | "quit" | "qa", None) => Some(Command::Quit),
        ("theme" | "colorscheme" | "colo", Some(arg)) => {
            let target = match arg.parse::<usize>() {
                Ok(index) => ThemeTarget::Index(index),
                Err(_) => ThemeTarget::Name(arg.to_string()),
            };
            Some(Command::Theme(target))
        }
        ("next" | "tn", None) => Some(Command::NextTheme),
        ("prev" | "previous" | "tp", None) => Some(Command::PreviousTheme),
        ("pause", None) => Some(Command::Pause),
        ("resume", None) => Some(Command::Resume),
        _ => None,
    }
}
