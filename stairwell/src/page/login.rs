use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Position, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::{
    app::{Message, State},
    page::{loadscreen::Loading, menu},
    utils::{center, centered_padding},
};

const FORM_WIDTH: u16 = 44;
const LABEL_WIDTH: usize = 9;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Mode {
    #[default]
    SignIn,
    Register,
}

/// Page: Login
///
/// Credentials form with a sign-in and a register mode; a successful
/// submit stores the token and moves on to the menu (or straight into an
/// unfinished session).
#[derive(Debug, Default)]
pub struct Login {
    mode: Mode,
    email: String,
    password: String,
    confirm: String,
    username: String,
    focus: usize,
    error: Option<String>,
}

impl Login {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Vec<(&'static str, &str, bool)> {
        match self.mode {
            Mode::SignIn => vec![
                ("Email", self.email.as_str(), false),
                ("Password", self.password.as_str(), true),
            ],
            Mode::Register => vec![
                ("Username", self.username.as_str(), false),
                ("Email", self.email.as_str(), false),
                ("Password", self.password.as_str(), true),
                ("Confirm", self.confirm.as_str(), true),
            ],
        }
    }

    fn focused_value_mut(&mut self) -> &mut String {
        match (self.mode, self.focus) {
            (Mode::SignIn, 0) | (Mode::Register, 1) => &mut self.email,
            (Mode::SignIn, _) | (Mode::Register, 2) => &mut self.password,
            (Mode::Register, 0) => &mut self.username,
            (Mode::Register, _) => &mut self.confirm,
        }
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            Mode::SignIn => Mode::Register,
            Mode::Register => Mode::SignIn,
        };
        self.focus = 0;
        self.error = None;
    }

    fn submit(&mut self, state: &State) -> Option<Message> {
        self.error = None;

        match self.mode {
            Mode::SignIn => {
                if self.email.trim().is_empty() || self.password.is_empty() {
                    self.error = Some("Email and password are required".to_string());
                    return None;
                }

                let api = state.api.clone();
                let email = self.email.trim().to_string();
                let password = self.password.clone();
                let loader = Loading::load(state, "Signing in...", move || {
                    api.login(email, password)?;
                    menu::bootstrap(&api)
                });

                Some(Message::Show(loader.into()))
            }
            Mode::Register => {
                if let Err(message) = validate_registration(
                    &self.username,
                    &self.email,
                    &self.password,
                    &self.confirm,
                ) {
                    self.error = Some(message);
                    return None;
                }

                let api = state.api.clone();
                let email = self.email.trim().to_string();
                let password = self.password.clone();
                let username = self.username.trim().to_string();
                let loader = Loading::load(state, "Creating account...", move || {
                    api.register(email, password, username)?;
                    menu::bootstrap(&api)
                });

                Some(Message::Show(loader.into()))
            }
        }
    }
}

// Rendering logic
impl Login {
    pub fn render(&self, frame: &mut ratatui::Frame, area: Rect, state: &State) {
        let area = center(area, Constraint::Percentage(80), Constraint::Percentage(80));

        let title = match self.mode {
            Mode::SignIn => "Sign in to Stairwell",
            Mode::Register => "Create your account",
        };

        let rows = self.rows();
        let mut lines = vec![Line::from(title.bold()).centered(), Line::default()];

        for (index, (label, value, masked)) in rows.iter().enumerate() {
            let mut selector = "  ";
            let style = if index == self.focus {
                selector = "> ";
                Style::new()
                    .fg(state.config.theme.text.highlight)
                    .reversed()
            } else {
                Style::new()
            };

            let shown = if *masked {
                "•".repeat(value.chars().count())
            } else {
                (*value).to_string()
            };

            lines.push(Line::from(Span::styled(
                format!("{selector}{label:<LABEL_WIDTH$} {shown}"),
                style,
            )));
        }

        lines.push(Line::default());
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
        let padding = centered_padding(area, Some(height), Some(FORM_WIDTH));
        let inner = Block::new().padding(padding).inner(area);

        frame.render_widget(Paragraph::new(lines), inner);

        // Place the terminal cursor at the end of the focused value
        let (_, value, _) = rows[self.focus];
        let cursor_x = inner.x + 2 + LABEL_WIDTH as u16 + 1 + value.chars().count() as u16;
        let cursor_y = inner.y + 2 + self.focus as u16;
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }

    pub fn render_top(&self, _state: &State) -> Option<Line<'_>> {
        Some(match self.mode {
            Mode::SignIn => Line::from("<CTRL-R> create account"),
            Mode::Register => Line::from("<CTRL-R> back to sign in"),
        })
    }

    pub fn handle_events(&mut self, event: &Event, state: &State) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            if is_ctrl(key, 'r') {
                self.toggle_mode();
                return None;
            }

            let fields = self.rows().len();
            return match key.code {
                KeyCode::Tab | KeyCode::Down => {
                    next_field(&mut self.focus, fields);
                    None
                }
                KeyCode::BackTab | KeyCode::Up => {
                    previous_field(&mut self.focus, fields);
                    None
                }
                KeyCode::Enter => self.submit(state),
                KeyCode::Backspace => {
                    self.focused_value_mut().pop();
                    None
                }
                KeyCode::Char(char) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.focused_value_mut().push(char);
                    None
                }
                _ => None,
            };
        }

        None
    }
}

fn is_ctrl(key: &KeyEvent, char: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(char)
}

/// Check a registration form before it goes anywhere near a server
fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    if !looks_like_email(email.trim()) {
        return Err("Enter a valid email address".to_string());
    }

    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    if password != confirm {
        return Err("Passwords do not match".to_string());
    }

    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    })
}

const fn next_field(focus: &mut usize, len: usize) {
    *focus = (*focus + 1) % len;
}

const fn previous_field(focus: &mut usize, len: usize) {
    *focus = if *focus == 0 { len - 1 } else { *focus - 1 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("climber@example.com"));
        assert!(looks_like_email("a@b.c"));

        assert!(!looks_like_email("climber"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("climber@example"));
        assert!(!looks_like_email("climber@.com"));
        assert!(!looks_like_email("climber@example."));
    }

    #[test]
    fn test_registration_validation() {
        let ok = validate_registration("climber", "climber@example.com", "hunter22", "hunter22");
        assert!(ok.is_ok());

        assert!(validate_registration("", "climber@example.com", "hunter22", "hunter22").is_err());
        assert!(validate_registration("climber", "not-an-email", "hunter22", "hunter22").is_err());
        assert!(validate_registration("climber", "climber@example.com", "short", "short").is_err());
        assert!(
            validate_registration("climber", "climber@example.com", "hunter22", "different")
                .is_err()
        );
    }
}
