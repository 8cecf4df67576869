//! A small typed HTML tree
//!
//! Text and attribute values are escaped when rendered. `Node::Raw` carries
//! markup produced by a trusted generator (markdown, syntect) and is emitted
//! as is.

use std::fmt::Write;

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Elements that never have children or a closing tag
const VOID_TAGS: [&str; 4] = ["br", "hr", "img", "input"];

/// A child of an element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Pre-rendered markup
    Raw(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An HTML element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, ..Default::default() }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Add a class (appends to an existing `class` attribute)
    pub fn class(mut self, class: &str) -> Self {
        match self.attrs.iter_mut().find(|(name, _)| name == "class") {
            Some((_, value)) => {
                value.push(' ');
                value.push_str(class);
            }
            None => self.attrs.push(("class".into(), class.into())),
        }
        self
    }

    /// `data-*` attribute
    pub fn data(self, name: &str, value: impl Into<String>) -> Self {
        self.attr(format!("data-{}", name), value)
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn raw(mut self, markup: impl Into<String>) -> Self {
        self.children.push(Node::Raw(markup.into()));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class").is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// Direct element children
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Depth-first search for the first element matching a predicate
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.elements().find_map(|e| e.find(pred))
    }

    /// All descendant elements (and self) matching a predicate
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        if pred(self) {
            out.push(self);
        }
        for e in self.elements() {
            e.find_all(pred, out);
        }
    }

    /// Concatenated text content
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => out.push_str(&e.text_content()),
                Node::Raw(_) => {}
            }
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        out.push('>');

        if VOID_TAGS.contains(&self.tag) {
            return;
        }

        for node in &self.children {
            match node {
                Node::Element(e) => e.write_html(out),
                Node::Text(t) => out.push_str(&escape(t)),
                Node::Raw(markup) => out.push_str(markup),
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_nested_elements() {
        let el = Element::new("div")
            .id("x")
            .class("a")
            .class("b")
            .data("block-id", "L1-intro")
            .child(Element::new("p").text("hi"));

        assert_eq!(
            el.to_html(),
            r#"<div id="x" class="a b" data-block-id="L1-intro"><p>hi</p></div>"#
        );
        assert!(el.has_class("b"));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let el = Element::new("span").attr("title", "\"quoted\"").text("<script>&");
        assert_eq!(
            el.to_html(),
            r#"<span title="&quot;quoted&quot;">&lt;script&gt;&amp;</span>"#
        );
    }

    #[test]
    fn void_tags_have_no_closing_tag() {
        assert_eq!(Element::new("br").to_html(), "<br>");
    }

    #[test]
    fn find_searches_depth_first() {
        let tree = Element::new("div").child(Element::new("section").child(Element::new("button").data("action", "run")));
        let button = tree.find(&|e| e.get_attr("data-action") == Some("run")).unwrap();
        assert_eq!(button.tag, "button");
    }
}
