//! Tolerant HTML tree built from a quick-xml event stream.
//!
//! Real-world pages are not well-formed XML: unclosed `<br>`/`<img>`,
//! mismatched end tags, unquoted attributes. Void elements never open a
//! scope, stray end tags unwind to the nearest matching open tag or are
//! ignored, and a hard reader error ends the parse with whatever tree has
//! been built so far.

use std::sync::LazyLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

static CHAR_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#([0-9]+|[xX][0-9a-fA-F]+);").unwrap());

/// Elements that never carry content and never get a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
];

#[derive(Debug, Default)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub href: Option<String>,
    pub children: Vec<Child>,
}

#[derive(Debug)]
pub enum Child {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c == name)
    }

    /// Direct child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.children.iter().filter_map(|c| match c {
            Child::Element(el) => Some(el),
            Child::Text(_) => None,
        })
    }

    /// Pre-order walk over all descendant elements (not including self).
    pub fn walk<'a, F: FnMut(&'a Element)>(&'a self, f: &mut F) {
        for el in self.child_elements() {
            f(el);
            el.walk(f);
        }
    }

    /// Flattened text of self and all descendants, whitespace-collapsed.
    pub fn text(&self) -> String {
        let mut buf = String::new();
        self.collect_text(&mut buf);
        buf.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                Child::Text(t) => {
                    buf.push(' ');
                    buf.push_str(t);
                }
                Child::Element(el) => el.collect_text(buf),
            }
        }
    }
}

/// Parse markup into a synthetic root element. Never fails: malformed
/// input yields a smaller tree, empty input an empty root.
pub fn parse(html: &str) -> Element {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    // Stack of open elements; index 0 is the synthetic root.
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let el = element_from(&e);
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    attach(&mut stack, Child::Element(el));
                } else {
                    stack.push(el);
                }
            }
            Ok(Event::Empty(e)) => {
                attach(&mut stack, Child::Element(element_from(&e)));
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                close_until(&mut stack, &name);
            }
            Ok(Event::Text(t)) => {
                if !in_raw_text(&stack) {
                    let raw = String::from_utf8_lossy(&t);
                    attach(&mut stack, Child::Text(decode_entities(&raw)));
                }
            }
            Ok(Event::CData(t)) => {
                if !in_raw_text(&stack) {
                    attach(&mut stack, Child::Text(String::from_utf8_lossy(&t).into_owned()));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if !in_raw_text(&stack) {
                    let name = String::from_utf8_lossy(&r);
                    attach(&mut stack, Child::Text(decode_entities(&format!("&{};", name))));
                }
            }
            Ok(Event::Eof) => break,
            // Comments, doctype, processing instructions
            Ok(_) => {}
            // Salvage whatever was built before the malformed spot.
            Err(_) => break,
        }
    }

    // Unclosed elements at EOF fold into their parents.
    while stack.len() > 1 {
        let el = stack.pop().unwrap();
        attach(&mut stack, Child::Element(el));
    }
    stack.pop().unwrap()
}

fn element_from(e: &quick_xml::events::BytesStart) -> Element {
    let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
    let mut classes = Vec::new();
    let mut href = None;

    // html_attributes tolerates unquoted values and bare attribute names.
    for attr in e.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
        let value = decode_entities(&String::from_utf8_lossy(&attr.value));
        match key.as_str() {
            "class" => classes = value.split_whitespace().map(str::to_string).collect(),
            "href" => href = Some(value),
            _ => {}
        }
    }

    Element { tag, classes, href, children: Vec::new() }
}

fn attach(stack: &mut Vec<Element>, child: Child) {
    if let Some(top) = stack.last_mut() {
        top.children.push(child);
    }
}

/// Pop open elements until the one named `name` is closed. A stray end
/// tag with no matching open element is dropped.
fn close_until(stack: &mut Vec<Element>, name: &str) {
    let Some(pos) = stack.iter().rposition(|el| el.tag == name) else {
        return;
    };
    if pos == 0 {
        return;
    }
    while stack.len() > pos {
        let el = stack.pop().unwrap();
        attach(stack, Child::Element(el));
    }
}

/// Script and style content is not page text.
fn in_raw_text(stack: &[Element]) -> bool {
    stack
        .last()
        .is_some_and(|el| el.tag == "script" || el.tag == "style")
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let s = CHAR_REF_RE.replace_all(raw, |caps: &regex::Captures| {
        let body = &caps[1];
        let code = match body.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => body.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32).map(String::from).unwrap_or_default()
    });
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&amp;", "&")
}

// ── Tests ──
