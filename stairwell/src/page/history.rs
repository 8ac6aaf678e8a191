use chrono::{DateTime, Local, Utc};
use crossterm::event::{Event, KeyCode};
use gradus::{TrainingSession, format_duration};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph},
};

use crate::{
    api::ApiError,
    app::{Message, State},
    page::{details::Details, loadscreen::Loading},
    utils::{ROUNDED_BLOCK, centered_padding},
};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Page: History
///
/// Every finished session, newest first, with a summary of the selected
/// one next to it.
#[derive(Debug)]
pub struct History {
    sessions: Vec<TrainingSession>,
    selected: usize,
}

impl History {
    pub fn new(sessions: Vec<TrainingSession>) -> Self {
        Self {
            sessions,
            selected: 0,
        }
    }

    /// Create a loading page that resolves into the history listing.
    pub fn load(state: &State) -> Loading {
        let api = state.api.clone();
        Loading::load(state, "Loading history...", move || -> Result<Message, ApiError> {
            let sessions = api.finished_sessions()?;
            Ok(Message::Show(History::new(sessions).into()))
        })
    }

    fn move_selection_up(&mut self) {
        if self.sessions.is_empty() {
            return;
        }

        self.selected = if self.selected == 0 {
            self.sessions.len() - 1
        } else {
            self.selected - 1
        };
    }

    fn move_selection_down(&mut self) {
        if self.sessions.is_empty() {
            return;
        }

        self.selected = (self.selected + 1) % self.sessions.len();
    }

    fn open_selected(&self, state: &State) -> Option<Message> {
        let session = self.sessions.get(self.selected)?;
        Some(Message::Show(
            Details::load(state, session.id.clone()).into(),
        ))
    }
}

// Rendering logic
impl History {
    pub fn render(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        if self.sessions.is_empty() {
            let lines = vec![
                Line::from("No finished sessions yet.".dim()).centered(),
                Line::from("Start a training session from the menu.".dim()).centered(),
            ];
            let padding = centered_padding(area, Some(lines.len() as u16), None);
            frame.render_widget(
                Paragraph::new(lines).block(Block::new().padding(padding)),
                area,
            );
            return;
        }

        let [list_area, summary_area] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .areas(area);

        let now = Utc::now();
        let items = self
            .sessions
            .iter()
            .map(|session| {
                ListItem::new(format!(
                    "{:<12} target {}",
                    relative(session.created_at, now),
                    session.target_floors
                ))
            })
            .collect::<Vec<_>>();

        let list = List::new(items)
            .block(ROUNDED_BLOCK.title("Finished sessions"))
            .highlight_style(
                Style::new()
                    .fg(state.config.theme.text.highlight)
                    .reversed(),
            )
            .highlight_symbol("> ");

        let mut liststate = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, list_area, &mut liststate);

        let block = ROUNDED_BLOCK.title("Summary");
        let inner = block.inner(summary_area);
        frame.render_widget(block, summary_area);

        if let Some(session) = self.sessions.get(self.selected) {
            let lines = vec![
                row(
                    "Started",
                    session
                        .start_time
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                ),
                row("Duration", format_duration(session.elapsed_seconds(now))),
                row("Lap size", format!("{} floors", session.floors_per_lap)),
                row("Target", format!("{} floors", session.target_floors)),
                Line::default(),
                Line::from("<Enter> for laps and statistics".dim()),
            ];
            frame.render_widget(Paragraph::new(lines), inner);
        }
    }

    pub fn render_top(&self, _state: &State) -> Option<Line<'_>> {
        Some(Line::from("<Enter> details   <r> refresh"))
    }

    pub fn handle_events(&mut self, event: &Event, state: &State) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            return match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                    None
                }
                KeyCode::Enter => self.open_selected(state),
                KeyCode::Char('r') => Some(Message::Show(History::load(state).into())),
                _ => None,
            };
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

/// "3m ago" style timestamps for the session list; anything older than a
/// week is just a date.
fn relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    if seconds < MINUTE {
        "just now".to_string()
    } else if seconds < HOUR {
        format!("{}m ago", seconds / MINUTE)
    } else if seconds < DAY {
        format!("{}h ago", seconds / HOUR)
    } else if seconds < WEEK {
        format!("{}d ago", seconds / DAY)
    } else {
        then.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_relative_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();

        let checks = [
            (now - chrono::Duration::seconds(5), "just now"),
            (now - chrono::Duration::minutes(3), "3m ago"),
            (now - chrono::Duration::hours(7), "7h ago"),
            (now - chrono::Duration::days(2), "2d ago"),
        ];

        for (then, expected) in checks {
            assert_eq!(relative(then, now), expected);
        }
    }

    #[test]
    fn test_relative_clamps_future_timestamps() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let future = now + chrono::Duration::minutes(5);

        // A skewed server clock should not produce "-5m ago"
        assert_eq!(relative(future, now), "just now");
    }
}
