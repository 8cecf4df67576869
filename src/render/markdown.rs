//! Markdown to HTML for lesson prose

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::syntax;

/// Render markdown to HTML.
///
/// Embedded raw HTML is escaped rather than passed through. Fenced code
/// blocks are highlighted.
pub fn to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;

    let mut events = Vec::new();
    let mut code: Option<(String, String)> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.split(',').next().unwrap_or("").trim().to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some((lang, String::new()));
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, buf)) = code.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, buf)) = code.take() {
                    let lang = if lang.is_empty() { "text".to_string() } else { lang };
                    let highlighted = syntax::highlight_html(&buf, &lang);
                    events.push(Event::Html(CowStr::from(format!(
                        "<pre class=\"code\"><code data-language=\"{}\">{}</code></pre>",
                        super::html::escape(&lang),
                        highlighted
                    ))));
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_markdown() {
        let html = to_html("# Title\n\nSome *emphasis*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = to_html("hello <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn fenced_code_is_highlighted() {
        let html = to_html("```python\nprint(1)\n```\n");
        assert!(html.contains("data-language=\"python\""));
        assert!(html.contains("syn-"));
    }
}
