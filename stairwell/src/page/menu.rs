use crossterm::event::{Event, KeyCode};
use gradus::{SessionPlan, format_duration};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

use crate::{
    api::{ApiError, User, UserStats},
    app::{Message, State},
    page::{history::History, loadscreen::Loading, login::Login, training::Training},
    session_manager::{SessionManager, plan_suggestions},
    utils::{center, centered_padding},
};

const MENU_WIDTH: u16 = 40;
const SETUP_WIDTH: u16 = 44;
const SETUP_LABEL_WIDTH: usize = 14;

const DEFAULT_FLOORS_PER_LAP: u32 = 10;
const DEFAULT_TARGET_FLOORS: u32 = 100;
const TARGET_STEP: u32 = 5;

/// Fetch everything the landing page needs and pick where to go.
///
/// An unfinished session always wins over the menu, so a closed or crashed
/// client resumes exactly where it left off.
pub fn bootstrap(api: &SessionManager) -> Result<Message, ApiError> {
    if let Some(active) = api.active_session()? {
        let ledger = api.laps(&active.id)?;
        return Ok(Message::Show(Training::new(active, ledger).into()));
    }

    let user = api.current_user()?;
    let stats = api.user_stats()?;
    let finished = api.finished_sessions()?;
    let suggestions = plan_suggestions(&finished);

    Ok(Message::Show(Menu::new(user, stats, suggestions).into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumCount, EnumIter)]
enum MainEntry {
    #[strum(to_string = "Start training")]
    StartTraining,
    #[strum(to_string = "History")]
    History,
    #[strum(to_string = "Log out")]
    LogOut,
    #[strum(to_string = "Quit")]
    Quit,
}

#[derive(Debug)]
enum States {
    Main,
    Setup(SetupForm),
}

/// Page: Menu
///
/// Landing page after login. Shows the lifetime stats of the user and
/// branches into session setup, history or logout.
#[derive(Debug)]
pub struct Menu {
    menustate: States,
    user: User,
    stats: UserStats,
    suggestions: Vec<u32>,
    selected: usize,
}

impl Menu {
    pub fn new(user: User, stats: UserStats, suggestions: Vec<u32>) -> Self {
        Self {
            menustate: States::Main,
            user,
            stats,
            suggestions,
            selected: 0,
        }
    }

    /// Create a loading page that resolves into the menu (or an unfinished
    /// session) once the profile data is in.
    pub fn load(state: &State) -> Loading {
        let api = state.api.clone();
        Loading::load(state, "Loading profile...", move || bootstrap(&api))
    }
}

// Rendering logic
impl Menu {
    pub fn render(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        match &self.menustate {
            States::Main => self.render_main(frame, area, state),
            States::Setup(form) => form.render(frame, area, state, &self.suggestions),
        }
    }

    fn render_main(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        let area = center(area, Constraint::Percentage(80), Constraint::Percentage(80));

        let stats = &self.stats;
        let mut lines = vec![
            Line::from(format!("Welcome back, {}!", self.user.username).bold()).centered(),
            Line::default(),
            stat_line(
                "Sessions",
                format!(
                    "{} ({} this week)",
                    stats.total_sessions, stats.sessions_this_week
                ),
            ),
            stat_line("Laps", stats.total_laps.to_string()),
            stat_line("Floors", stats.total_floors.to_string()),
            stat_line("Time", format_duration(stats.total_time_seconds)),
            Line::default(),
        ];

        for (index, entry) in MainEntry::iter().enumerate() {
            let mut selector = "  ";
            let style = if index == self.selected {
                selector = "> ";
                Style::new()
                    .fg(state.config.theme.text.highlight)
                    .reversed()
            } else {
                Style::new()
            };

            lines.push(Line::from(Span::styled(format!("{selector}{entry}"), style)));
        }

        let padding = centered_padding(area, Some(lines.len() as u16), Some(MENU_WIDTH));
        let inner = Block::new().padding(padding).inner(area);
        frame.render_widget(Paragraph::new(lines), inner);
    }

    pub fn render_top(&self, _state: &State) -> Option<Line<'_>> {
        Some(match &self.menustate {
            States::Main => Line::from("<Enter> select"),
            States::Setup(_) => Line::from("<h/l> adjust   <Enter> start   <Esc> back"),
        })
    }

    pub fn handle_events(&mut self, event: &Event, state: &State) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            return match &mut self.menustate {
                States::Main => match key.code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        increment_index(&mut self.selected, MainEntry::COUNT);
                        None
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        decrement_index(&mut self.selected, MainEntry::COUNT);
                        None
                    }
                    KeyCode::Enter => match MainEntry::iter().nth(self.selected) {
                        Some(MainEntry::StartTraining) => {
                            self.menustate = States::Setup(SetupForm::seeded(&self.suggestions));
                            None
                        }
                        Some(MainEntry::History) => {
                            Some(Message::Show(History::load(state).into()))
                        }
                        Some(MainEntry::LogOut) => {
                            state.api.logout();
                            Some(Message::Show(Login::new().into()))
                        }
                        Some(MainEntry::Quit) => Some(Message::Quit),
                        None => None,
                    },
                    _ => None,
                },
                States::Setup(form) => match key.code {
                    KeyCode::Esc | KeyCode::Backspace => Some(Message::Show(
                        Menu::new(self.user.clone(), self.stats, self.suggestions.clone()).into(),
                    )),
                    KeyCode::Up | KeyCode::Char('k') => {
                        increment_index(&mut form.focus, SetupForm::FIELDS);
                        None
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        decrement_index(&mut form.focus, SetupForm::FIELDS);
                        None
                    }
                    KeyCode::Right | KeyCode::Char('l') => {
                        form.increment();
                        None
                    }
                    KeyCode::Left | KeyCode::Char('h') => {
                        form.decrement();
                        None
                    }
                    KeyCode::Enter => form.submit(state),
                    _ => None,
                },
            };
        }

        None
    }
}

/// The "plan a session" form: how many floors one lap covers, and how many
/// floors the whole session should reach.
#[derive(Debug)]
struct SetupForm {
    floors_per_lap: u32,
    target_floors: u32,
    focus: usize,
    error: Option<String>,
}

impl SetupForm {
    const FIELDS: usize = 2;

    /// The lap size defaults to the smallest one seen in recent history, so
    /// regulars land on their usual stairwell without touching the form.
    fn seeded(suggestions: &[u32]) -> Self {
        Self {
            floors_per_lap: suggestions.first().copied().unwrap_or(DEFAULT_FLOORS_PER_LAP),
            target_floors: DEFAULT_TARGET_FLOORS,
            focus: 0,
            error: None,
        }
    }

    const fn increment(&mut self) {
        match self.focus {
            0 => self.floors_per_lap = self.floors_per_lap.saturating_add(1),
            _ => self.target_floors = self.target_floors.saturating_add(TARGET_STEP),
        }
    }

    /// Values step down to zero on purpose. Submitting a zero surfaces the
    /// plan validation message instead of being silently clamped away.
    const fn decrement(&mut self) {
        match self.focus {
            0 => self.floors_per_lap = self.floors_per_lap.saturating_sub(1),
            _ => self.target_floors = self.target_floors.saturating_sub(TARGET_STEP),
        }
    }

    fn submit(&mut self, state: &State) -> Option<Message> {
        self.error = None;

        let plan = match SessionPlan::new(self.floors_per_lap, self.target_floors) {
            Ok(plan) => plan,
            Err(error) => {
                self.error = Some(error.to_string());
                return None;
            }
        };

        let api = state.api.clone();
        let loader = Loading::load(state, "Starting session...", move || -> Result<Message, ApiError> {
            let session = api.create_session(plan)?;
            let ledger = api.laps(&session.id)?;
            Ok(Message::Show(Training::new(session, ledger).into()))
        });

        Some(Message::Show(loader.into()))
    }

    fn render(&self, frame: &mut ratatui::Frame, area: Rect, state: &State, suggestions: &[u32]) {
        let area = center(area, Constraint::Percentage(80), Constraint::Percentage(80));

        let mut lines = vec![
            Line::from("Plan your session".bold()).centered(),
            Line::default(),
        ];

        let rows = [
            ("Floors per lap", self.floors_per_lap),
            ("Target floors", self.target_floors),
        ];
        for (index, (label, value)) in rows.iter().enumerate() {
            let mut selector = "  ";
            let style = if index == self.focus {
                selector = "> ";
                Style::new()
                    .fg(state.config.theme.text.highlight)
                    .reversed()
            } else {
                Style::new()
            };

            lines.push(Line::from(Span::styled(
                format!("{selector}{label:<SETUP_LABEL_WIDTH$} {value}"),
                style,
            )));
        }

        lines.push(Line::default());
        if !suggestions.is_empty() {
            let sizes = suggestions
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(Line::from(format!("Recent lap sizes: {sizes}").dim()).centered());
        }

        if let Some(error) = &self.error {
            lines.push(
                Line::styled(
                    error.clone(),
                    Style::new().fg(state.config.theme.text.error),
                )
                .centered(),
            );
        }

        let height = lines.len() as u16;
        let padding = centered_padding(area, Some(height), Some(SETUP_WIDTH));
        let inner = Block::new().padding(padding).inner(area);

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::from(format!("  {label:<9} ")).bold(),
        Span::from(value),
    ])
}

const fn increment_index(index: &mut usize, len: usize) {
    *index = if *index == 0 { len - 1 } else { *index - 1 };
}

const fn decrement_index(index: &mut usize, len: usize) {
    *index = (*index + 1) % len;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_form_seeding() {
        let seeded = SetupForm::seeded(&[8, 12]);
        assert_eq!(seeded.floors_per_lap, 8);
        assert_eq!(seeded.target_floors, DEFAULT_TARGET_FLOORS);

        let fresh = SetupForm::seeded(&[]);
        assert_eq!(fresh.floors_per_lap, DEFAULT_FLOORS_PER_LAP);
    }

    #[test]
    fn test_setup_form_stepping() {
        let mut form = SetupForm::seeded(&[]);

        form.increment();
        assert_eq!(form.floors_per_lap, DEFAULT_FLOORS_PER_LAP + 1);

        form.focus = 1;
        form.decrement();
        assert_eq!(form.target_floors, DEFAULT_TARGET_FLOORS - TARGET_STEP);

        // Stepping below zero sticks at zero rather than wrapping.
        form.focus = 0;
        for _ in 0..=DEFAULT_FLOORS_PER_LAP + 1 {
            form.decrement();
        }
        assert_eq!(form.floors_per_lap, 0);
    }
}
