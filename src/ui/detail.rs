//! Detail pane for the selected block

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::state::{Mode, PlayerState};
use crate::interaction::{InteractionController, PanelState};
use crate::lesson::{Block as LessonBlock, BlockKind};
use crate::syntax;
use crate::theme::Theme;

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    state: &mut PlayerState,
    controller: &InteractionController,
    theme: &Theme,
) {
    let title = state.selected_block().map_or_else(|| " Lesson ".to_string(), |b| format!(" {} ", b.display_title()));
    let border = if state.mode == Mode::Insert { theme.border_focused } else { theme.border };
    let frame_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.bg_primary));
    let inner = frame_block.inner(area);
    frame.render_widget(frame_block, area);

    let width = inner.width.saturating_sub(1).max(10) as usize;
    let lines = match state.selected_block() {
        Some(block) => block_lines(block, state, controller, theme, width),
        None => vec![Line::styled("Nothing to show", Style::default().fg(theme.fg_muted))],
    };

    state.detail_lines = lines.len();
    state.detail_height = inner.height as usize;
    state.detail_scroll = state.detail_scroll.min(state.detail_lines.saturating_sub(state.detail_height));
    state.note_scroll_position();

    let visible: Vec<Line> = lines.into_iter().skip(state.detail_scroll).take(state.detail_height).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

fn wrapped(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![Line::default()]
            } else {
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(|part| Line::styled(part.into_owned(), style))
                    .collect()
            }
        })
        .collect()
}

fn heading(text: &str, theme: &Theme) -> Line<'static> {
    Line::styled(text.to_string(), Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD))
}

fn key_hint(keys: &[(&str, &str)], theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, label) in keys {
        spans.push(Span::styled(format!("[{}]", key), Style::default().fg(theme.fg_muted)));
        spans.push(Span::styled(format!(" {}  ", label), Style::default().fg(theme.fg_secondary)));
    }
    Line::from(spans)
}

fn block_lines(
    block: &LessonBlock,
    state: &PlayerState,
    controller: &InteractionController,
    theme: &Theme,
    width: usize,
) -> Vec<Line<'static>> {
    let text = Style::default().fg(theme.fg_primary);
    let muted = Style::default().fg(theme.fg_muted);
    let mut lines = Vec::new();

    match &block.kind {
        BlockKind::Text(t) => {
            lines.extend(wrapped(&t.content, width, text));
            for (i, q) in t.questions.iter().enumerate() {
                lines.push(Line::default());
                lines.extend(wrapped(&format!("Q{}. {}", i + 1, q.question), width, text));
                for (j, option) in q.options.iter().enumerate() {
                    lines.push(Line::styled(format!("   {}) {}", (b'a' + j as u8) as char, option), muted));
                }
            }
            lines.push(Line::default());
            let keys = if t.questions.is_empty() {
                [("m", "mark as read")]
            } else {
                [(":answers a b", "check answers")]
            };
            lines.push(key_hint(&keys, theme));
        }
        BlockKind::CodeExample(c) => {
            lines.extend(syntax::highlight_code(&c.code, c.language.as_deref().unwrap_or("text"), theme));
            if let Some(explanation) = &c.explanation {
                lines.push(Line::default());
                lines.extend(wrapped(explanation, width, text));
            }
            lines.push(Line::default());
            lines.push(key_hint(&[("y", "copy"), ("m", "mark as understood")], theme));
        }
        BlockKind::Interactive(ex) => {
            if let Some(instructions) = &ex.instructions {
                lines.extend(wrapped(instructions, width, text));
                lines.push(Line::default());
            }

            let label = if state.mode == Mode::Insert { "Editor (INSERT, Esc to leave)" } else { "Editor" };
            lines.push(heading(label, theme));
            let buffer = controller.editor(&block.id).map_or(ex.starter_code.as_str(), |e| e.buffer.as_str());
            let language = ex.language.as_deref().unwrap_or("python");
            lines.extend(syntax::highlight_code(buffer, language, theme));
            if buffer.is_empty() || buffer.ends_with('\n') {
                lines.push(Line::default());
            }

            let hints = controller.visible_hints(&block.id);
            for (i, hint) in hints.iter().enumerate() {
                lines.extend(wrapped(&format!("Hint {}: {}", i + 1, hint), width, Style::default().fg(theme.info)));
            }

            if let Some(panel) = controller.panel(&block.id) {
                lines.push(Line::default());
                lines.push(heading("Output", theme));
                match &panel.state {
                    PanelState::Idle => {}
                    PanelState::Loading => lines.push(Line::styled("Running…", muted)),
                    PanelState::Success { output, tests } => {
                        lines.extend(wrapped(output, width, Style::default().fg(theme.success)));
                        if let Some((passed, total)) = tests {
                            lines.push(Line::styled(format!("{} of {} tests passed", passed, total), muted));
                        }
                    }
                    PanelState::Error { message, retryable } => {
                        lines.extend(wrapped(message, width, Style::default().fg(theme.error)));
                        if *retryable {
                            lines.push(Line::styled("Press Ctrl+Enter to retry", muted));
                        }
                    }
                }
                if let Some(feedback) = &panel.feedback {
                    lines.extend(wrapped(feedback, width, Style::default().fg(theme.warning)));
                }
            }

            if let Some(req) = controller_attempts(state, &block.id) {
                lines.push(Line::styled(req, muted));
            }
            lines.push(Line::default());
            lines.push(key_hint(
                &[("C-Enter", "run"), ("e", "edit"), ("r", "reset"), ("h", "hint"), ("s", "solution"), ("y", "copy")],
                theme,
            ));
        }
        BlockKind::Quiz(q) => {
            lines.push(Line::styled(format!("Quiz {}", q.quiz_id), text));
            lines.push(Line::styled("Take the quiz, then enter your score.", muted));
            if let Some(req) = controller_attempts(state, &block.id) {
                lines.push(Line::styled(req, muted));
            }
            lines.push(Line::default());
            lines.push(key_hint(&[(":score N", "submit score")], theme));
        }
        BlockKind::Video(v) => {
            lines.push(Line::styled(v.url.clone(), Style::default().fg(theme.info)));
            lines.push(Line::default());
            lines.push(key_hint(&[("m", "mark as watched"), (":watched N", "report percent")], theme));
        }
        BlockKind::Unknown { type_name, raw } => {
            lines.push(Line::styled(format!("Unsupported block type '{}'", type_name), Style::default().fg(theme.warning)));
            let dump = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
            lines.extend(wrapped(&dump, width, muted));
        }
    }
    lines
}

/// Attempts used on a block, once there are any
fn controller_attempts(state: &PlayerState, block_id: &str) -> Option<String> {
    let attempts = state.progress.record.assessment_attempts.get(block_id)?;
    Some(format!("Attempts: {}", attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_keeps_blank_lines() {
        let lines = wrapped("one two three\n\nfour", 8, Style::default());
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text, vec!["one two", "three", "", "four"]);
    }
}
