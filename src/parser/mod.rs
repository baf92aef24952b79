pub mod dom;
pub mod tiers;

use std::collections::HashSet;

use tracing::debug;

/// An extracted, not-yet-classified text block with an optional PDF link.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub pdf_url: Option<String>,
}

/// Extract candidate announcement blocks from raw markup.
///
/// Strategies run most-specific-first; each later one only when everything
/// before it came up empty. Malformed markup yields fewer or zero
/// candidates, never an error.
pub fn extract_candidates(html: &str) -> Vec<Candidate> {
    let root = dom::parse(html);

    let mut candidates = Vec::new();
    if let Some(ticker) = tiers::find_ticker(&root) {
        debug!("found ticker container");

        candidates = tiers::ticker_direct_children(ticker);
        debug!(count = candidates.len(), "ticker direct children");

        if candidates.is_empty() {
            candidates = tiers::ticker_active_anchors(ticker);
            debug!(count = candidates.len(), "ticker active anchors");
        }
        if candidates.is_empty() {
            candidates = tiers::ticker_item_wrappers(ticker);
            debug!(count = candidates.len(), "ticker item wrappers");
        }
    }

    if candidates.is_empty() {
        candidates = tiers::carousel_sweep(&root);
        debug!(count = candidates.len(), "carousel sweep");
    }
    if candidates.is_empty() {
        candidates = tiers::page_list_items(&root);
        debug!(count = candidates.len(), "page list items");
    }
    if candidates.is_empty() {
        candidates = tiers::page_anchors(&root);
        debug!(count = candidates.len(), "page anchors");
    }

    dedup_candidates(candidates)
}

/// Drop repeats by (lowercased text, link), keeping first occurrence order.
fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(candidates.len());
    for cand in candidates {
        let key = format!(
            "{}|{}",
            cand.text.to_lowercase(),
            cand.pdf_url.as_deref().unwrap_or("")
        );
        if seen.insert(key) {
            deduped.push(cand);
        }
    }
    deduped
}

// ── Tests ──
