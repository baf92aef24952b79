//! The extraction strategies, most site-specific first. Each is a pure
//! function over the parsed tree; the driver in `mod.rs` runs them in
//! order until one yields output.
//!
//! Carousel libraries duplicate their items into `cloned` copies for the
//! wrap-around animation; every strategy that touches carousel markup has
//! to skip those or each notice is counted twice.

use super::dom::Element;
use super::Candidate;

/// The announcements live in a ticker div carrying both of these classes.
const TICKER_CLASSES: (&str, &str) = ("tg-ticker", "owl-carousel");
const CLONED: &str = "cloned";

/// First `div.tg-ticker.owl-carousel` on the page, if any.
pub fn find_ticker(root: &Element) -> Option<&Element> {
    let mut found = None;
    root.walk(&mut |el| {
        if found.is_none()
            && el.tag == "div"
            && el.has_class(TICKER_CLASSES.0)
            && el.has_class(TICKER_CLASSES.1)
        {
            found = Some(el);
        }
    });
    found
}

/// Tier 1: the ticker's direct children are the notice blocks.
pub fn ticker_direct_children(ticker: &Element) -> Vec<Candidate> {
    let mut out = Vec::new();
    for item in ticker.child_elements() {
        if item.has_class(CLONED) {
            continue;
        }
        push_candidate(&mut out, item.text(), first_pdf_link(item));
    }
    out
}

/// Tier 2: `a.active` anywhere inside the ticker, skipping anchors under
/// a cloned ancestor.
pub fn ticker_active_anchors(ticker: &Element) -> Vec<Candidate> {
    let mut out = Vec::new();
    collect_active(ticker, false, &mut out);
    out
}

fn collect_active(el: &Element, in_cloned: bool, out: &mut Vec<Candidate>) {
    for child in el.child_elements() {
        if child.tag == "a" && child.has_class("active") && !in_cloned {
            push_candidate(out, child.text(), own_pdf_href(child));
        }
        collect_active(child, in_cloned || child.has_class(CLONED), out);
    }
}

/// Tier 3: common carousel item wrappers inside the ticker.
pub fn ticker_item_wrappers(ticker: &Element) -> Vec<Candidate> {
    let mut items = Vec::new();
    ticker.walk(&mut |el| {
        if el.has_class("owl-item") || el.has_class("item") {
            items.push(el);
        }
    });

    let mut out = Vec::new();
    for item in items {
        if item.has_class(CLONED) {
            continue;
        }
        push_candidate(&mut out, item.text(), first_pdf_link(item));
    }
    out
}

/// Tier 4: no usable ticker, so sweep every carousel container on the page.
pub fn carousel_sweep(root: &Element) -> Vec<Candidate> {
    let mut carousels = Vec::new();
    root.walk(&mut |el| {
        if el.tag == "div" && el.has_class(TICKER_CLASSES.1) {
            carousels.push(el);
        }
    });

    let mut out = Vec::new();
    for carousel in carousels {
        let mut items = Vec::new();
        carousel.walk(&mut |el| {
            if el.tag == "div" && (el.has_class("owl-item") || el.has_class("item")) {
                items.push(el);
            }
        });
        for item in items {
            if item.has_class(CLONED) {
                continue;
            }
            push_candidate(&mut out, item.text(), first_pdf_link(item));
        }
    }
    out
}

/// Tier 5: every list item on the page. Can pick up navigation noise, but
/// noise only has to survive the keyword match to matter.
pub fn page_list_items(root: &Element) -> Vec<Candidate> {
    let mut lis = Vec::new();
    root.walk(&mut |el| {
        if el.tag == "li" {
            lis.push(el);
        }
    });

    let mut out = Vec::new();
    for li in lis {
        let mut first_anchor = None;
        li.walk(&mut |el| {
            if first_anchor.is_none() && el.tag == "a" {
                first_anchor = Some(el);
            }
        });
        let pdf = first_anchor.and_then(own_pdf_href);
        push_candidate(&mut out, li.text(), pdf);
    }
    out
}

/// Tier 6: every anchor on the page.
pub fn page_anchors(root: &Element) -> Vec<Candidate> {
    let mut anchors = Vec::new();
    root.walk(&mut |el| {
        if el.tag == "a" {
            anchors.push(el);
        }
    });

    let mut out = Vec::new();
    for a in anchors {
        push_candidate(&mut out, a.text(), own_pdf_href(a));
    }
    out
}

fn push_candidate(out: &mut Vec<Candidate>, text: String, pdf_url: Option<String>) {
    if text.is_empty() {
        return;
    }
    out.push(Candidate { text, pdf_url });
}

fn is_pdf_link(href: &str) -> bool {
    href.to_lowercase().ends_with(".pdf")
}

/// The element's own href, when it points at a PDF.
fn own_pdf_href(el: &Element) -> Option<String> {
    let href = el.href.as_deref().unwrap_or("").trim();
    is_pdf_link(href).then(|| href.to_string())
}

/// First descendant anchor with a PDF href.
fn first_pdf_link(el: &Element) -> Option<String> {
    let mut found = None;
    el.walk(&mut |d| {
        if found.is_none() && d.tag == "a" {
            if let Some(href) = d.href.as_deref() {
                let href = href.trim();
                if is_pdf_link(href) {
                    found = Some(href.to_string());
                }
            }
        }
    });
    found
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::parse;

    const TICKER: &str = r#"
        <div class="wrap">
          <div class="tg-ticker owl-carousel">
            <section class="cloned"><a href="/old.pdf">Old notice</a></section>
            <section><a class="active" href="/notices/exam.pdf">Exam notice text</a></section>
            <section>Holiday announcement</section>
          </div>
        </div>"#;

    #[test]
    fn finds_ticker_by_both_classes() {
        let root = parse(TICKER);
        assert!(find_ticker(&root).is_some());
        let partial = parse("<div class=\"owl-carousel\">x</div>");
        assert!(find_ticker(&partial).is_none());
    }

    #[test]
    fn direct_children_skip_cloned_and_attach_pdf() {
        let root = parse(TICKER);
        let ticker = find_ticker(&root).unwrap();
        let got = ticker_direct_children(ticker);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].text, "Exam notice text");
        assert_eq!(got[0].pdf_url.as_deref(), Some("/notices/exam.pdf"));
        assert_eq!(got[1].text, "Holiday announcement");
        assert_eq!(got[1].pdf_url, None);
    }

    #[test]
    fn active_anchors_skip_cloned_ancestors() {
        let html = r#"
            <div class="tg-ticker owl-carousel">
              <div class="cloned"><a class="active" href="/a.pdf">dup</a></div>
              <div><a class="active" href="/b.pdf">real</a></div>
              <div><a href="/c.pdf">not active</a></div>
            </div>"#;
        let root = parse(html);
        let ticker = find_ticker(&root).unwrap();
        let got = ticker_active_anchors(ticker);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].text, "real");
        assert_eq!(got[0].pdf_url.as_deref(), Some("/b.pdf"));
    }

    #[test]
    fn active_anchor_link_must_be_its_own_href() {
        let html = r#"
            <div class="tg-ticker owl-carousel">
              <div><a class="active" href="/page.html">notice <span>inner</span></a></div>
            </div>"#;
        let root = parse(html);
        let got = ticker_active_anchors(find_ticker(&root).unwrap());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].pdf_url, None);
    }

    #[test]
    fn item_wrappers_inside_ticker() {
        let html = r#"
            <div class="tg-ticker owl-carousel">
              <div class="owl-stage">
                <div class="owl-item cloned">dup</div>
                <div class="owl-item"><a href="/x.pdf">notice one</a></div>
                <div class="item">notice two</div>
              </div>
            </div>"#;
        let root = parse(html);
        let got = ticker_item_wrappers(find_ticker(&root).unwrap());
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].pdf_url.as_deref(), Some("/x.pdf"));
    }

    #[test]
    fn carousel_sweep_covers_every_carousel() {
        let html = r#"
            <div class="owl-carousel"><div class="owl-item">first</div></div>
            <div class="owl-carousel"><div class="item">second</div>
              <div class="item cloned">second dup</div></div>"#;
        let root = parse(html);
        let got = carousel_sweep(&root);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].text, "first");
        assert_eq!(got[1].text, "second");
    }

    #[test]
    fn list_items_attach_pdf_from_first_anchor_only() {
        let html = r#"
            <ul>
              <li><a href="/files/results.pdf">Results</a> published</li>
              <li><a href="/about.html">About</a> <a href="/late.pdf">late</a></li>
              <li>No link here</li>
            </ul>"#;
        let root = parse(html);
        let got = page_list_items(&root);
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].pdf_url.as_deref(), Some("/files/results.pdf"));
        // First anchor is not a PDF, so nothing attaches.
        assert_eq!(got[1].pdf_url, None);
        assert_eq!(got[2].pdf_url, None);
    }

    #[test]
    fn page_anchors_take_own_href() {
        let html = r#"<a href="/a.pdf">circular</a><a href="/b.html">home</a><a href="/c.pdf"></a>"#;
        let root = parse(html);
        let got = page_anchors(&root);
        // The empty-text anchor is dropped.
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].pdf_url.as_deref(), Some("/a.pdf"));
        assert_eq!(got[1].pdf_url, None);
    }

    #[test]
    fn pdf_extension_check_is_case_insensitive() {
        let html = r#"<div class="tg-ticker owl-carousel"><div><a href="/NOTICE.PDF">caps</a></div></div>"#;
        let root = parse(html);
        let got = ticker_direct_children(find_ticker(&root).unwrap());
        assert_eq!(got[0].pdf_url.as_deref(), Some("/NOTICE.PDF"));
    }
}
