use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block, BorderType, Padding},
};

/// A block with a rounded border
pub const ROUNDED_BLOCK: Block = Block::bordered().border_type(BorderType::Rounded);

pub fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
    let [area_horizontal] = Layout::horizontal([horizontal])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([vertical])
        .flex(Flex::Center)
        .areas(area_horizontal);
    area
}

/// Padding that centers content of a known height and/or width within `area`
pub fn centered_padding(area: Rect, height: Option<u16>, width: Option<u16>) -> Padding {
    let vertical = height.map_or(0, |height| area.height.saturating_sub(height) / 2);
    let horizontal = width.map_or(0, |width| area.width.saturating_sub(width) / 2);
    Padding::new(horizontal, horizontal, vertical, vertical)
}
