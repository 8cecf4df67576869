//! Block list with status markers

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::state::PlayerState;
use crate::assessment::BlockStatus;
use crate::theme::Theme;

/// Marker shown before each block
pub fn status_marker(status: BlockStatus) -> &'static str {
    match status {
        BlockStatus::NotStarted => "○",
        BlockStatus::InProgress => "●",
        BlockStatus::Completed => "✓",
        BlockStatus::Exhausted => "✗",
    }
}

fn marker_style(status: BlockStatus, theme: &Theme) -> Style {
    let color = match status {
        BlockStatus::NotStarted => theme.fg_muted,
        BlockStatus::InProgress => theme.warning,
        BlockStatus::Completed => theme.success,
        BlockStatus::Exhausted => theme.error,
    };
    Style::default().fg(color)
}

pub fn draw(frame: &mut Frame, area: Rect, state: &PlayerState, theme: &Theme) {
    let block = Block::default()
        .title(" Blocks ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.bg_primary));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let blocks = state.blocks();
    if blocks.is_empty() {
        let msg = Paragraph::new("This lesson has no blocks").style(Style::default().fg(theme.fg_muted));
        frame.render_widget(msg, inner);
        return;
    }

    // Keep the selection on screen
    let height = inner.height as usize;
    let offset = if height > 0 && state.selected >= height { state.selected + 1 - height } else { 0 };

    let lines: Vec<Line> = blocks
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, b)| {
            let status = state.progress.status(&b.id);
            let selected = i == state.selected;
            let title_style = if selected {
                Style::default().fg(theme.fg_secondary).bg(theme.selection).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.fg_primary)
            };
            Line::from(vec![
                Span::styled(format!(" {} ", status_marker(status)), marker_style(status, theme)),
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(theme.fg_muted)),
                Span::styled(b.display_title(), title_style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
