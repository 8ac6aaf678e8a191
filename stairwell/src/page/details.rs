use chrono::{Local, Utc};
use crossterm::event::{Event, KeyCode};
use gradus::{LapLedger, SessionStatistics, SessionStatus, TrainingSession, format_duration};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    api::ApiError,
    app::{Message, State},
    page::loadscreen::Loading,
    utils::ROUNDED_BLOCK,
};

/// Page: Details
///
/// The full record of a single session: derived statistics on top, every
/// lap split below.
#[derive(Debug)]
pub struct Details {
    session: TrainingSession,
    ledger: LapLedger,
}

impl Details {
    pub fn new(session: TrainingSession, ledger: LapLedger) -> Self {
        Self { session, ledger }
    }

    /// Create a loading page that fetches one session and its laps.
    pub fn load(state: &State, session_id: String) -> Loading {
        let api = state.api.clone();
        Loading::load(state, "Loading session...", move || -> Result<Message, ApiError> {
            let session = api.session(&session_id)?;
            let ledger = api.laps(&session_id)?;
            Ok(Message::Show(Details::new(session, ledger).into()))
        })
    }
}

// Rendering logic
impl Details {
    pub fn render(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        let stats = SessionStatistics::calculate(&self.session, &self.ledger);
        let [stats_area, laps_area] =
            Layout::vertical([Constraint::Length(10), Constraint::Fill(1)]).areas(area);

        let block = ROUNDED_BLOCK.title("Statistics");
        let inner = block.inner(stats_area);
        frame.render_widget(block, stats_area);

        let status_style = match self.session.status {
            SessionStatus::Active => Style::new().fg(state.config.theme.text.highlight),
            SessionStatus::Finished => Style::new().fg(state.config.theme.text.success),
            SessionStatus::Abandoned => Style::new().fg(state.config.theme.text.warning),
        };

        // Lap timings mean nothing before the first lap
        let lap_time = |seconds: u64| {
            if stats.total_laps == 0 {
                "-".to_string()
            } else {
                format_duration(seconds)
            }
        };

        let lines = vec![
            Line::from(vec![
                Span::from(format!("{:<10}", "Status")).bold(),
                Span::styled(self.session.status.to_string(), status_style),
            ]),
            row(
                "Started",
                self.session
                    .start_time
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            row(
                "Duration",
                format_duration(self.session.elapsed_seconds(Utc::now())),
            ),
            row("Laps", stats.total_laps.to_string()),
            row(
                "Floors",
                format!(
                    "{} / {} ({}%)",
                    stats.total_floors_climbed, self.session.target_floors, stats.completion_rate
                ),
            ),
            row("Avg lap", lap_time(stats.average_time_per_lap.round() as u64)),
            row("Fastest", lap_time(stats.fastest_lap_time)),
            row("Slowest", lap_time(stats.slowest_lap_time)),
        ];
        frame.render_widget(Paragraph::new(lines), inner);

        let block = ROUNDED_BLOCK.title("Laps");
        let inner = block.inner(laps_area);
        frame.render_widget(block, laps_area);

        let splits = self.ledger.splits(self.session.start_time);
        if splits.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from("No laps were recorded.".dim()).centered()),
                inner,
            );
            return;
        }

        let lines = splits
            .iter()
            .map(|split| {
                Line::from(format!(
                    "#{:<4} {:<10} {}",
                    split.lap_number,
                    format_duration(split.seconds),
                    split.finish_time.with_timezone(&Local).format("%H:%M:%S"),
                ))
            })
            .collect::<Vec<_>>();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    pub fn render_top(&self, _state: &State) -> Option<Line<'_>> {
        Some(Line::from("<r> refresh   <Esc> menu"))
    }

    pub fn handle_events(&mut self, event: &Event, state: &State) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
            && key.code == KeyCode::Char('r')
        {
            let loader = Details::load(state, self.session.id.clone());
            return Some(Message::Show(loader.into()));
        }

        None
    }
}

fn row(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::from(format!("{label:<10}")).bold(),
        Span::from(value),
    ])
}
