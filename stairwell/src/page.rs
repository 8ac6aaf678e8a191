use crossterm::event::Event;
use ratatui::{Frame, layout::Rect, text::Line};

pub mod details;
pub mod error;
pub mod history;
pub mod loadscreen;
pub mod login;
pub mod menu;
pub mod training;

pub use details::Details;
pub use error::Error;
pub use history::History;
pub use loadscreen::Loading;
pub use login::Login;
pub use menu::Menu;
pub use training::Training;

use crate::app::{Message, State};

macro_rules! make_page_enum {
    ($($t:tt),*) => {
        pub enum Page {
            $(
                $t(Box<$t>),
            )*
        }

        $(
            impl From<$t> for Page {
                fn from(value: $t) -> Page {
                    Page::$t(Box::new(value))
                }
            }
        )*
    };
}

make_page_enum!(Login, Menu, Training, History, Details, Loading, Error);

impl Page {
    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &State) {
        match self {
            Self::Login(page) => page.render(frame, area, state),
            Self::Menu(page) => page.render(frame, area, state),
            Self::Training(page) => page.render(frame, area, state),
            Self::History(page) => page.render(frame, area, state),
            Self::Details(page) => page.render(frame, area, state),
            Self::Loading(page) => page.render(frame, area, state),
            Self::Error(page) => page.render(frame, area, state),
        }
    }

    pub fn render_top(&mut self, state: &State) -> Option<Line<'_>> {
        match self {
            Self::Login(page) => page.render_top(state),
            Self::Menu(page) => page.render_top(state),
            Self::Training(page) => page.render_top(state),
            Self::History(page) => page.render_top(state),
            Self::Details(page) => page.render_top(state),
            Self::Loading(_) => None,
            Self::Error(page) => page.render_top(state),
        }
    }

    pub fn handle_events(&mut self, event: &Event, state: &State) -> Option<Message> {
        match self {
            Self::Login(page) => page.handle_events(event, state),
            Self::Menu(page) => page.handle_events(event, state),
            Self::Training(page) => page.handle_events(event, state),
            Self::History(page) => page.handle_events(event, state),
            Self::Details(page) => page.handle_events(event, state),
            Self::Loading(_) => None,
            Self::Error(page) => page.handle_events(event, state),
        }
    }

    pub fn poll(&mut self, state: &State) -> Option<Message> {
        match self {
            Self::Login(_) => None,
            Self::Menu(_) => None,
            Self::Training(page) => page.poll(state),
            Self::History(_) => None,
            Self::Details(_) => None,
            Self::Loading(page) => page.poll(state),
            Self::Error(_) => None,
        }
    }
}
