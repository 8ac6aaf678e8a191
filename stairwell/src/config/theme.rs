use std::time::{Duration, Instant};

use ratatui::{
    style::{Color, Style},
    text::Span,
};
use serde::{Deserialize, Serialize};

/// General theme
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Theme {
    pub spinner: Spinner,
    pub text: TextTheme,
}

/// Text color theme
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TextTheme {
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight: Color,
}

impl Default for TextTheme {
    fn default() -> Self {
        Self {
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            highlight: Color::Blue,
        }
    }
}

/// The loading-screen spinner
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Spinner {
    pub color: Color,
    pub symbol: SpinnerSymbol,
    pub interval_ms: u64,
}

impl Default for Spinner {
    fn default() -> Self {
        Self {
            color: Color::Yellow,
            symbol: SpinnerSymbol::BrailleSix,
            interval_ms: 100,
        }
    }
}

impl Spinner {
    pub fn make_state(&self) -> SpinnerState {
        SpinnerState {
            frames: self.symbol.frames(),
            interval: Duration::from_millis(self.interval_ms),
            index: 0,
            last_tick: Instant::now(),
        }
    }

    /// The current frame, followed by a space
    pub fn render(&self, state: &SpinnerState) -> Span<'static> {
        let frame = state.frames[state.index % state.frames.len()];
        Span::styled(format!("{frame} "), Style::new().fg(self.color))
    }
}

/// The different kinds of symbols available for the loading-screen spinner
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum SpinnerSymbol {
    Ascii,
    BrailleSix,
    Clock,
    VerticalBlock,
}

impl SpinnerSymbol {
    /// Returns the frames that the symbol cycles through
    ///
    /// This doesn't use the `From` trait, as we can't make that a const fn
    pub const fn frames(self) -> &'static [&'static str] {
        match self {
            Self::Ascii => &["|", "/", "-", "\\"],
            Self::BrailleSix => &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
            Self::Clock => &[
                "🕐", "🕑", "🕒", "🕓", "🕔", "🕕", "🕖", "🕗", "🕘", "🕙", "🕚", "🕛",
            ],
            Self::VerticalBlock => &[
                "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█", "▇", "▆", "▅", "▄", "▃", "▂",
            ],
        }
    }
}

/// Animation state for one spinner instance
#[derive(Debug)]
pub struct SpinnerState {
    frames: &'static [&'static str],
    interval: Duration,
    index: usize,
    last_tick: Instant,
}

impl SpinnerState {
    /// Advance to the next frame once the interval has passed
    pub fn tick(&mut self) {
        if self.last_tick.elapsed() >= self.interval {
            self.index = (self.index + 1) % self.frames.len();
            self.last_tick = Instant::now();
        }
    }
}
