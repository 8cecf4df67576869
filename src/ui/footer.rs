//! Progress gauge, toasts and the command line

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph},
};

use crate::app::state::{CommandLineState, Mode, PlayerState};
use crate::notify::Level;
use crate::theme::Theme;

pub fn draw_gauge(frame: &mut Frame, area: Rect, state: &PlayerState, theme: &Theme) {
    let total = state.lesson.total_blocks();
    let done = state.progress.record.completed_blocks.len().min(total);
    let percent = crate::progress::percentage(done, total);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(theme.accent_primary).bg(theme.bg_tertiary))
        .percent(u16::from(percent))
        .label(format!("{} of {} blocks · {}%", done, total, percent));
    frame.render_widget(gauge, area);
}

/// Bottom line: command input, latest toast or status message
pub fn draw_status(frame: &mut Frame, area: Rect, state: &PlayerState, theme: &Theme) {
    let line = match state.mode {
        Mode::Command => command_input(&state.command_line, theme),
        _ => match state.notifications.latest() {
            Some(toast) => {
                let color = match toast.level {
                    Level::Success => theme.success,
                    Level::Info => theme.info,
                    Level::Warning => theme.warning,
                    Level::Error => theme.error,
                };
                Line::styled(toast.message.clone(), Style::default().fg(color))
            }
            None => match &state.command_line.message {
                Some(msg) if state.command_line.is_error => Line::styled(msg.clone(), Style::default().fg(theme.error)),
                Some(msg) => Line::styled(msg.clone(), Style::default().fg(theme.fg_muted)),
                None => Line::styled("Press : for commands, ? for help", Style::default().fg(theme.fg_muted)),
            },
        },
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// `:input` with a block cursor
fn command_input(state: &CommandLineState, theme: &Theme) -> Line<'static> {
    let base = Style::default().fg(theme.accent_primary);
    let chars: Vec<char> = state.input.chars().collect();
    let before: String = chars.iter().take(state.cursor).collect();
    let at = chars.get(state.cursor).copied().unwrap_or(' ');
    let after: String = chars.iter().skip(state.cursor + 1).collect();
    let cursor = Style::default().fg(theme.bg_primary).bg(theme.fg_primary).add_modifier(Modifier::BOLD);

    Line::from(vec![
        Span::styled(format!(":{}", before), base),
        Span::styled(at.to_string(), cursor),
        Span::styled(after, base),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_splits_input() {
        let state = CommandLineState { input: "score".into(), cursor: 2, ..Default::default() };
        let line = command_input(&state, &Theme::default());
        let text: Vec<String> = line.spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, vec![":sc", "o", "re"]);
    }

    #[test]
    fn cursor_at_end_shows_space() {
        let state = CommandLineState { input: "q".into(), cursor: 1, ..Default::default() };
        let line = command_input(&state, &Theme::default());
        assert_eq!(line.spans[1].content, " ");
    }
}
