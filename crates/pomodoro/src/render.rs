//! Two-line status display
//!
//! Line one shows the wall clock and the time remaining, line two a progress
//! bar with the completed percentage. After the first draw both lines are
//! rewritten in place.

use crossterm::{
    cursor::MoveUp,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::Write;
use std::time::Duration;

use crate::error::Result;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const RED: &str = "\x1b[91m";
const GREY: &str = "\x1b[90m";

const FILLED_CELL: &str = "\u{2588}";
const EMPTY_CELL: &str = "\u{2591}";

/// Terminal width used when the real one cannot be queried
pub const FALLBACK_WIDTH: u16 = 80;

/// Default cap on the progress bar length
pub const DEFAULT_BAR_WIDTH: usize = 40;

/// Current terminal width in columns, or [`FALLBACK_WIDTH`]
pub fn terminal_width() -> u16 {
    crossterm::terminal::size()
        .map(|(cols, _)| cols)
        .unwrap_or(FALLBACK_WIDTH)
}

/// Bar colour by completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTier {
    Green,
    Yellow,
    Red,
}

impl ColorTier {
    pub fn for_fraction(fraction: f64) -> Self {
        if fraction < 0.5 {
            ColorTier::Green
        } else if fraction < 0.8 {
            ColorTier::Yellow
        } else {
            ColorTier::Red
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ColorTier::Green => GREEN,
            ColorTier::Yellow => YELLOW,
            ColorTier::Red => RED,
        }
    }
}

/// Inputs for one draw
#[derive(Debug, Clone)]
pub struct Frame {
    pub total: Duration,
    pub elapsed: Duration,
    /// Preformatted wall-clock time
    pub clock: String,
    pub minutes_remaining: u64,
    pub seconds_remaining: u64,
}

/// Everything derived from a frame at a given terminal width
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub fraction: f64,
    pub percent: u32,
    pub bar_len: usize,
    pub filled: usize,
    pub tier: ColorTier,
}

impl RenderState {
    pub fn compute(total: Duration, elapsed: Duration, width: u16, bar_width_cap: usize) -> Self {
        let total = total.max(Duration::from_secs(1)).as_secs_f64();
        let fraction = (elapsed.as_secs_f64() / total).clamp(0.0, 1.0);
        let percent = (fraction * 100.0).floor() as u32;

        let suffix_len = percent_suffix(percent).chars().count();
        let room = (width as usize).saturating_sub(suffix_len + 1);
        let bar_len = bar_width_cap.min(room);
        let filled = (bar_len as f64 * fraction).floor() as usize;

        Self {
            fraction,
            percent,
            bar_len,
            filled,
            tier: ColorTier::for_fraction(fraction),
        }
    }
}

fn percent_suffix(percent: u32) -> String {
    format!(" {:3}%", percent)
}

/// Draws the status lines, tracking whether a previous draw is on screen
pub struct StatusRenderer {
    color: bool,
    bar_width_cap: usize,
    width: fn() -> u16,
    drawn: bool,
}

impl StatusRenderer {
    pub fn new(color: bool, bar_width_cap: usize) -> Self {
        Self {
            color,
            bar_width_cap,
            width: terminal_width,
            drawn: false,
        }
    }

    /// Replace the terminal width query
    pub fn with_width_source(mut self, width: fn() -> u16) -> Self {
        self.width = width;
        self
    }

    /// Forget the previous draw so the next one starts fresh
    pub fn reset(&mut self) {
        self.drawn = false;
    }

    #[cfg(test)]
    pub fn has_drawn(&self) -> bool {
        self.drawn
    }

    pub fn render<W: Write>(&mut self, out: &mut W, frame: &Frame) -> Result<RenderState> {
        let width = (self.width)();
        let state = RenderState::compute(frame.total, frame.elapsed, width, self.bar_width_cap);

        let info = format!(
            " Time: {}  |  Remaining: {}:{:02}",
            frame.clock, frame.minutes_remaining, frame.seconds_remaining
        );
        let info_line = self.paint(GREY, &info);
        let bar = self.bar(&state);

        if self.drawn {
            queue!(out, MoveUp(1))?;
        }
        write!(out, "\r")?;
        queue!(out, Clear(ClearType::CurrentLine))?;
        write!(out, "{}\n\r", info_line)?;
        queue!(out, Clear(ClearType::CurrentLine))?;
        write!(out, "{}{}", bar, percent_suffix(state.percent))?;
        out.flush()?;

        self.drawn = true;
        Ok(state)
    }

    fn bar(&self, state: &RenderState) -> String {
        let empty = state.bar_len - state.filled;
        if !self.color {
            return format!("{}{}", "#".repeat(state.filled), "-".repeat(empty));
        }

        let filled = FILLED_CELL.repeat(state.filled);
        let mut bar = format!("{}{}{}", state.tier.code(), filled, RESET);
        if empty > 0 {
            bar.push_str(&format!("{}{}{}", GREY, EMPTY_CELL.repeat(empty), RESET));
        }
        bar
    }

    /// Conditionally apply color
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }
}

/// Wrap `text` in grey when colour is on
pub fn dim(color: bool, text: &str) -> String {
    if color {
        format!("{}{}{}", GREY, text, RESET)
    } else {
        text.to_string()
    }
}
