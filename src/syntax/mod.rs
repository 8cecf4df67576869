//! Syntax highlighting using syntect
//!
//! Two outputs: classed HTML spans for rendered lessons, and styled ratatui
//! lines for the terminal player.

use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::theme::Theme;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Map lesson language names to syntect syntax names
fn normalize_language(lang: &str) -> &str {
    match lang.trim().to_lowercase().as_str() {
        "py" | "python" | "python3" => "Python",
        "js" | "javascript" | "node" => "JavaScript",
        "ts" | "typescript" => "TypeScript",
        "rs" | "rust" => "Rust",
        "java" => "Java",
        "c" => "C",
        "cpp" | "c++" => "C++",
        "go" | "golang" => "Go",
        "rb" | "ruby" => "Ruby",
        "html" => "HTML",
        "css" => "CSS",
        "sql" => "SQL",
        "json" => "JSON",
        "sh" | "bash" | "shell" => "Bourne Again Shell (bash)",
        _ => lang,
    }
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let name = normalize_language(language);
    SYNTAX_SET
        .find_syntax_by_name(name)
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(&language.to_lowercase()))
}

/// Highlight code as HTML spans with `syn-` prefixed classes.
///
/// The result goes inside a `<code>` element; it is already escaped.
/// Unknown languages are highlighted as plain text.
pub fn highlight_html(code: &str, language: &str) -> String {
    let syntax = find_syntax(language).unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAX_SET,
        ClassStyle::SpacedPrefixed { prefix: "syn-" },
    );

    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::warn!("Highlighting {} code failed, using plain text: {}", language, e);
            return crate::render::html::escape(code);
        }
    }
    generator.finalize()
}

/// Highlight a whole snippet for the terminal, one `Line` per source line
pub fn highlight_code(code: &str, language: &str, theme: &Theme) -> Vec<Line<'static>> {
    let plain = |line: &str| {
        Line::from(Span::styled(
            line.trim_end_matches('\n').to_string(),
            Style::default().fg(theme.fg_primary).bg(theme.bg_secondary),
        ))
    };

    let (Some(syntax), Some(syntect_theme)) =
        (find_syntax(language), THEME_SET.themes.get(theme.syntect_theme))
    else {
        return code.lines().map(plain).collect();
    };

    let mut highlighter = HighlightLines::new(syntax, syntect_theme);
    LinesWithEndings::from(code)
        .map(|line| match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => Line::from(
                ranges
                    .into_iter()
                    .map(|(style, text)| {
                        Span::styled(text.trim_end_matches('\n').to_string(), span_style(style, theme))
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(_) => plain(line),
        })
        .collect()
}

fn span_style(style: syntect::highlighting::Style, theme: &Theme) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)).bg(theme.bg_secondary);
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    out
}

/// Check if a language is supported
pub fn is_language_supported(language: &str) -> bool {
    find_syntax(language).is_some()
}
