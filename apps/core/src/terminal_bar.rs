//! Single-row prompt bar drawn at the top of the terminal.
//!
//! The bar takes over the terminal for the whole session: raw mode, the
//! alternate screen and a hidden hardware cursor. [`TerminalBar::teardown`]
//! restores all of it and also runs on drop.

use std::io::{IsTerminal, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use crate::config::{parse_hex_color, Colors};
use crate::runtime::{KeySource, Renderer, SessionEvent};
use crate::session::KeyInput;

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("standard input and output must be a terminal")]
    NotATerminal,
    #[error("terminal io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStyle {
    Normal,
    Highlight,
    Cursor,
}

/// A run of text placed at a column of the bar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub column: u16,
    pub text: String,
    pub style: SegmentStyle,
}

impl Segment {
    fn new(column: usize, text: impl Into<String>, style: SegmentStyle) -> Self {
        Self {
            column: column.min(u16::MAX as usize) as u16,
            text: text.into(),
            style,
        }
    }
}

/// Lays out prompt, input, cursor and as many matches as fit in `width`
/// columns. Widths are counted in characters.
pub fn layout_bar(
    prompt: &str,
    input: &str,
    matches: &[&str],
    highlighted: Option<usize>,
    width: u16,
    padding: u16,
) -> Vec<Segment> {
    let width = width as usize;
    let padding = padding as usize;
    let mut segments = Vec::new();
    let mut x = padding;

    if !prompt.is_empty() {
        segments.push(Segment::new(x, prompt, SegmentStyle::Normal));
        x += prompt.chars().count() + 1;
    }

    // Keep the tail of the input visible when it is wider than the bar.
    let room = width.saturating_sub(x + 1);
    let input_len = input.chars().count();
    let visible: String = input.chars().skip(input_len.saturating_sub(room)).collect();
    let visible_len = visible.chars().count();
    if !visible.is_empty() {
        segments.push(Segment::new(x, visible, SegmentStyle::Normal));
    }
    x += visible_len;

    if x < width {
        segments.push(Segment::new(x, " ", SegmentStyle::Cursor));
    }
    x += 1 + padding;

    for (index, name) in matches.iter().enumerate() {
        let name_len = name.chars().count();
        if x + name_len + padding > width {
            break;
        }
        let style = if highlighted == Some(index) {
            SegmentStyle::Highlight
        } else {
            SegmentStyle::Normal
        };
        segments.push(Segment::new(x, *name, style));
        x += name_len + padding;
    }

    segments
}

/// Maps a crossterm key event onto the session's key vocabulary.
pub fn classify_key(key: KeyEvent) -> KeyInput {
    if key.kind == KeyEventKind::Release {
        return KeyInput::Other;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Esc => KeyInput::Cancel,
        KeyCode::Char('c') if ctrl => KeyInput::Cancel,
        KeyCode::Enter => KeyInput::Accept,
        KeyCode::Backspace => KeyInput::Delete,
        KeyCode::Char(ch) if !ctrl && !alt && !ch.is_control() => KeyInput::Printable(ch),
        _ => KeyInput::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarColors {
    pub fg: Color,
    pub bg: Color,
    pub hl_fg: Color,
    pub hl_bg: Color,
}

impl BarColors {
    pub fn from_config(colors: &Colors) -> Self {
        Self {
            fg: to_color(&colors.fg),
            bg: to_color(&colors.bg),
            hl_fg: to_color(&colors.hl_fg),
            hl_bg: to_color(&colors.hl_bg),
        }
    }

    fn for_style(&self, style: SegmentStyle) -> (Color, Color) {
        match style {
            SegmentStyle::Normal => (self.fg, self.bg),
            SegmentStyle::Highlight => (self.hl_fg, self.hl_bg),
            SegmentStyle::Cursor => (self.bg, self.fg),
        }
    }
}

fn to_color(value: &str) -> Color {
    parse_hex_color(value)
        .map(|(r, g, b)| Color::Rgb { r, g, b })
        .unwrap_or(Color::Reset)
}

pub struct TerminalBar {
    out: Stdout,
    colors: BarColors,
    padding: u16,
    active: bool,
}

impl TerminalBar {
    /// Takes over the terminal. Fails when not attached to one.
    pub fn open(colors: BarColors, padding: u16) -> Result<Self, TerminalError> {
        if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
            return Err(TerminalError::NotATerminal);
        }

        terminal::enable_raw_mode()?;
        let mut out = std::io::stdout();
        if let Err(error) = execute!(out, EnterAlternateScreen, Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(error.into());
        }

        Ok(Self {
            out,
            colors,
            padding,
            active: true,
        })
    }
}

impl Renderer for TerminalBar {
    fn render(
        &mut self,
        prompt: &str,
        input: &str,
        matches: &[&str],
        highlighted: Option<usize>,
    ) -> Result<(), TerminalError> {
        let (width, _) = terminal::size()?;
        let segments = layout_bar(prompt, input, matches, highlighted, width, self.padding);

        queue!(
            self.out,
            MoveTo(0, 0),
            SetBackgroundColor(self.colors.bg),
            Clear(ClearType::CurrentLine)
        )?;
        for segment in &segments {
            let (fg, bg) = self.colors.for_style(segment.style);
            queue!(
                self.out,
                MoveTo(segment.column, 0),
                SetForegroundColor(fg),
                SetBackgroundColor(bg),
                Print(&segment.text)
            )?;
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()?;
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), TerminalError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(self.out, ResetColor, Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl KeySource for TerminalBar {
    fn next_event(&mut self) -> Result<SessionEvent, TerminalError> {
        loop {
            match event::read()? {
                Event::Key(key) => return Ok(SessionEvent::Key(classify_key(key))),
                Event::Resize(_, _) => return Ok(SessionEvent::Redraw),
                _ => continue,
            }
        }
    }
}

impl Drop for TerminalBar {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}
