use std::io::stdout;
use std::time::Duration;

use crossterm::cursor::SetCursorStyle;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use ratatui::{Frame, style::Stylize, text::ToLine, widgets::Padding};

use crate::config::Config;
use crate::page;
use crate::session_manager::SessionManager;
use crate::utils::ROUNDED_BLOCK;

/// Everything pages need to do their work
pub struct State {
    pub config: Config,
    pub api: SessionManager,
}

/// An app message
pub enum Message {
    /// An error occurred
    Error(Box<dyn std::error::Error + Send>),
    /// Show a specific page
    Show(page::Page),
    /// Reset to the menu, or to login when signed out
    Reset,
    /// Quit the application
    Quit,
}

/// The app itself
pub struct App {
    page: page::Page,
    state: State,
}

impl App {
    /// Creates a new `App`
    ///
    /// Tokens never survive a restart, so every launch starts at login.
    pub fn new(state: State) -> Self {
        Self {
            page: page::Login::new().into(),
            state,
        }
    }

    /// Runs the app
    pub fn run(&mut self) -> std::io::Result<()> {
        let mut terminal = ratatui::init();

        execute!(stdout(), SetCursorStyle::SteadyBar)?;

        loop {
            let event = event::poll(Duration::ZERO)?.then(event::read).transpose()?;
            if let Some(message) = self.handle_events(event) {
                match message {
                    Message::Error(error) => self.page = page::Error::from(error).into(),
                    Message::Show(page) => self.page = page,
                    Message::Reset => self.page = self.home(),
                    Message::Quit => break,
                }
            }
            terminal.draw(|frame| self.draw(frame))?;
        }

        ratatui::restore();

        Ok(())
    }

    /// Where a reset lands, depending on authentication
    fn home(&self) -> page::Page {
        if self.state.api.is_authenticated() {
            page::Menu::load(&self.state).into()
        } else {
            page::Login::new().into()
        }
    }

    /// Draws the next frame
    fn draw(&mut self, frame: &mut Frame) {
        let mut block = ROUNDED_BLOCK
            .padding(Padding::new(1, 1, 0, 0))
            .title_top("STAIRWELL".to_line().bold().centered())
            .title_top("<CTRL-Q> to exit".to_line().right_aligned());

        if let Some(top_msg) = self.page.render_top(&self.state) {
            block = block.title_top(top_msg);
        }

        let area = frame.area();
        let content = block.inner(area);

        frame.render_widget(block, area);

        self.page.render(frame, content, &self.state);
    }

    /// Global event handler
    fn handle_events(&mut self, event_opt: Option<Event>) -> Option<Message> {
        event_opt
            .and_then(|event| {
                self.page.handle_events(&event, &self.state).or_else(|| {
                    match event {
                        Event::Key(key) => Self::handle_key_event(key),
                        _ => None, // Reserved for future event handling
                    }
                })
            })
            .or_else(|| self.page.poll(&self.state))
    }

    /// Global key events
    const fn handle_key_event(key: KeyEvent) -> Option<Message> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Esc, KeyModifiers::NONE) => Some(Message::Reset),
            _ => None,
        }
    }
}
