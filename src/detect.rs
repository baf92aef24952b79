//! Turn the candidate list into at most one announcement.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::matching::keyword_match;
use crate::parser::Candidate;
use crate::state::Announcement;

/// First candidate whose text matches any configured keyword, in
/// extraction order. No match across all candidates is a normal outcome,
/// not an error.
pub fn detect_announcement(
    candidates: &[Candidate],
    keywords: &str,
    threshold: f64,
    now: DateTime<Utc>,
) -> Option<Announcement> {
    debug!(count = candidates.len(), keywords, "checking candidates");
    for cand in candidates {
        if cand.text.is_empty() {
            continue;
        }
        if keyword_match(&cand.text, keywords, threshold) {
            debug!(text = %cand.text, "candidate matched");
            return Some(Announcement::new(&cand.text, cand.pdf_url.clone(), now));
        }
    }
    None
}

// ── Tests ──
