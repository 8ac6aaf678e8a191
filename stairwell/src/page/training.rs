use std::{
    thread::JoinHandle,
    time::{Duration, Instant},
};

use chrono::{Local, Utc};
use crossterm::event::{Event, KeyCode};
use gradus::{LapLedger, SessionStatistics, TrainingSession, format_duration};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Gauge, Paragraph},
};

use crate::{
    api::ApiError,
    app::{Message, State},
    config::theme::SpinnerState,
    page::{details::Details, loadscreen::Loading},
    utils::{ROUNDED_BLOCK, center, centered_padding},
};

/// How long "Lap recorded" stays on screen after a lap lands
const RECORDED_FLASH: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum States {
    #[default]
    Running,
    ConfirmCancel,
}

/// Page: Training
///
/// The live view of an active session. Laps are recorded on a worker
/// thread so a slow server never blocks the timer.
pub struct Training {
    session: TrainingSession,
    ledger: LapLedger,
    menustate: States,
    record: Option<JoinHandle<Result<LapLedger, ApiError>>>,
    last_recorded: Option<Instant>,
    spinner_state: Option<SpinnerState>,
}

impl Training {
    pub fn new(session: TrainingSession, ledger: LapLedger) -> Self {
        Self {
            session,
            ledger,
            menustate: States::default(),
            record: None,
            last_recorded: None,
            spinner_state: None,
        }
    }

    /// The lap just recorded still counts as "in progress" for a while,
    /// so a double-tap doesn't produce two laps.
    fn cooling_down(&self, state: &State) -> bool {
        self.last_recorded.is_some_and(|instant| {
            instant.elapsed() < Duration::from_secs(state.config.cooldown_seconds)
        })
    }

    fn record_lap(&mut self, state: &State) {
        if self.record.is_some() || self.cooling_down(state) {
            return;
        }

        let api = state.api.clone();
        let session_id = self.session.id.clone();
        self.record = Some(std::thread::spawn(move || {
            api.record_lap(&session_id)?;
            api.laps(&session_id)
        }));
    }

    fn finish(&self, state: &State) -> Option<Message> {
        let api = state.api.clone();
        let session_id = self.session.id.clone();
        let loader = Loading::load(state, "Finishing session...", move || -> Result<Message, ApiError> {
            let session = api.finish_session(&session_id)?;
            let ledger = api.laps(&session_id)?;
            Ok(Message::Show(Details::new(session, ledger).into()))
        });

        Some(Message::Show(loader.into()))
    }

    fn cancel(&self, state: &State) -> Option<Message> {
        let api = state.api.clone();
        let session_id = self.session.id.clone();
        let loader = Loading::load(state, "Abandoning session...", move || -> Result<Message, ApiError> {
            api.cancel_session(&session_id)?;
            Ok(Message::Reset)
        });

        Some(Message::Show(loader.into()))
    }
}

// Rendering logic
impl Training {
    pub fn render(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        match self.menustate {
            States::Running => self.render_session(frame, area, state),
            States::ConfirmCancel => self.render_confirm(frame, area, state),
        }
    }

    fn render_session(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        let stats = SessionStatistics::calculate(&self.session, &self.ledger);
        let [summary_area, laps_area] =
            Layout::vertical([Constraint::Length(8), Constraint::Fill(1)]).areas(area);

        let block = ROUNDED_BLOCK.title("Session");
        let inner = block.inner(summary_area);
        frame.render_widget(block, summary_area);

        let [text_area, gauge_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

        let laps = if stats.total_laps == 0 {
            "0".to_string()
        } else {
            format!(
                "{} (avg {}, best {})",
                stats.total_laps,
                format_duration(stats.average_time_per_lap.round() as u64),
                format_duration(stats.fastest_lap_time),
            )
        };

        let status = if self.record.is_some() {
            let mut spans = Vec::new();
            if let Some(spinner) = &self.spinner_state {
                spans.push(state.config.theme.spinner.render(spinner));
            }
            spans.push(Span::from("Recording lap..."));
            Line::from(spans)
        } else if self.last_recorded.is_some_and(|instant| {
            instant.elapsed() < RECORDED_FLASH
        }) || self.cooling_down(state)
        {
            Line::styled(
                "Lap recorded",
                Style::new().fg(state.config.theme.text.success),
            )
        } else {
            Line::default()
        };

        let lines = vec![
            row("Elapsed", format_duration(self.session.elapsed_seconds(Utc::now()))),
            row(
                "Floors",
                format!(
                    "{} / {}",
                    stats.total_floors_climbed, self.session.target_floors
                ),
            ),
            row("Laps", laps),
            status,
        ];
        frame.render_widget(Paragraph::new(lines), text_area);

        // A ratio above 1.0 panics, so overshooting sessions pin the bar
        // while the label keeps counting.
        let ratio = if self.session.target_floors == 0 {
            0.0
        } else {
            (stats.total_floors_climbed as f64 / f64::from(self.session.target_floors)).min(1.0)
        };
        let gauge = Gauge::default()
            .ratio(ratio)
            .label(format!("{}%", stats.completion_rate))
            .gauge_style(Style::new().fg(state.config.theme.text.success));
        frame.render_widget(gauge, gauge_area);

        let block = ROUNDED_BLOCK.title("Laps");
        let inner = block.inner(laps_area);
        frame.render_widget(block, laps_area);

        let splits = self.ledger.splits(self.session.start_time);
        if splits.is_empty() {
            frame.render_widget(
                Paragraph::new(
                    Line::from("No laps yet. Press <Space> when you finish one.".dim()).centered(),
                ),
                inner,
            );
            return;
        }

        // Newest lap on top, older ones clip off the bottom
        let lines = splits
            .iter()
            .rev()
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

    fn render_confirm(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        let area = center(area, Constraint::Percentage(80), Constraint::Percentage(80));
        let stats = SessionStatistics::calculate(&self.session, &self.ledger);

        let lines = vec![
            Line::styled(
                "Abandon this session?",
                Style::new().fg(state.config.theme.text.warning),
            )
            .bold()
            .centered(),
            Line::default(),
            Line::from(
                format!(
                    "{} laps and {} floors so far.",
                    stats.total_laps, stats.total_floors_climbed
                )
                .dim(),
            )
            .centered(),
            Line::from("An abandoned session does not count towards your stats.".dim()).centered(),
        ];

        let height = lines.len() as u16;
        let padding = centered_padding(area, Some(height), None);
        let inner = Block::new().padding(padding).inner(area);
        frame.render_widget(Paragraph::new(lines), inner);
    }

    pub fn render_top(&self, _state: &State) -> Option<Line<'_>> {
        Some(match self.menustate {
            States::Running => Line::from("<Space> record lap   <f> finish   <c> abandon"),
            States::ConfirmCancel => Line::from("<y> abandon   <n> keep going"),
        })
    }

    pub fn handle_events(&mut self, event: &Event, state: &State) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            return match self.menustate {
                States::Running => match key.code {
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        self.record_lap(state);
                        None
                    }
                    KeyCode::Char('f') if self.record.is_none() => self.finish(state),
                    KeyCode::Char('c') if self.record.is_none() => {
                        self.menustate = States::ConfirmCancel;
                        None
                    }
                    _ => None,
                },
                States::ConfirmCancel => match key.code {
                    KeyCode::Char('y') => self.cancel(state),
                    KeyCode::Char('n') => {
                        self.menustate = States::Running;
                        None
                    }
                    _ => None,
                },
            };
        }

        None
    }

    pub fn poll(&mut self, state: &State) -> Option<Message> {
        let handle = self.record.as_ref()?;

        let spinner = self
            .spinner_state
            .get_or_insert_with(|| state.config.theme.spinner.make_state());
        spinner.tick();

        if !handle.is_finished() {
            return None;
        }

        match self.record.take()?.join() {
            Ok(Ok(ledger)) => {
                self.ledger = ledger;
                self.last_recorded = Some(Instant::now());
                None
            }
            Ok(Err(error)) => Some(Message::Error(Box::new(error))),
            Err(_) => Some(Message::Error(Box::new(ApiError::Network(
                "the lap recorder stopped responding".to_string(),
            )))),
        }
    }
}

fn row(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::from(format!("{label:<10}")).bold(),
        Span::from(value),
    ])
}
