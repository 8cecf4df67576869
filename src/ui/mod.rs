//! Terminal rendering for the lesson player

pub mod block_list;
pub mod detail;
pub mod footer;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::app::state::PlayerState;
use crate::interaction::InteractionController;

/// Draw the player
pub fn draw(frame: &mut Frame, state: &mut PlayerState, controller: &InteractionController) {
    let theme = state.theme.theme();
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg_primary)), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", state.lesson.title),
            Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD),
        ),
        Span::styled(state.lesson.difficulty.label(), Style::default().fg(theme.fg_muted)),
    ]);
    frame.render_widget(Paragraph::new(title), rows[0]);

    let [list_area, detail_area] = split_main(rows[1], state.list_width_percent);
    block_list::draw(frame, list_area, state, theme);
    detail::draw(frame, detail_area, state, controller, theme);

    footer::draw_gauge(frame, rows[2], state, theme);
    footer::draw_status(frame, rows[3], state, theme);
}

/// Block list on the left, detail on the right
fn split_main(area: Rect, list_percent: u16) -> [Rect; 2] {
    let list_percent = list_percent.clamp(15, 60);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(list_percent), Constraint::Min(30)])
        .split(area);
    [chunks[0], chunks[1]]
}
