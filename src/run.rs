//! One end-to-end monitoring pass.
//!
//! `LoadConfig -> LoadState -> {disabled exit | fetch -> extract ->
//! detect -> decide/notify -> persist}`. Faults during the fetch/detect
//! path are caught, classified into a coarse signature, routed through
//! the alert throttle, and persisted; the run itself never unwinds.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::decision;
use crate::detect::detect_announcement;
use crate::fetch::fetch_page;
use crate::notify::{self, TelegramClient};
use crate::parser::extract_candidates;
use crate::state::{self, Announcement, MonitorState};

/// Result of evaluating one fetched page against the previous state.
pub struct PageOutcome {
    pub state: MonitorState,
    pub announcement: Option<Announcement>,
    pub is_new: bool,
}

/// The pure heart of a run: markup in, updated state and notification
/// decision out. No network, no disk.
pub fn evaluate_page(
    html: &str,
    state: MonitorState,
    cfg: &Config,
    now: DateTime<Utc>,
) -> PageOutcome {
    let candidates = extract_candidates(html);
    info!(count = candidates.len(), "candidate announcements extracted");

    let announcement =
        detect_announcement(&candidates, &cfg.match_keywords, cfg.similarity_threshold, now);
    let is_new = announcement
        .as_ref()
        .map(|ann| decision::is_new_announcement(&state, ann))
        .unwrap_or(false);

    let state = decision::mark_success(state, announcement.clone(), cfg.monitoring_enabled, now);
    PageOutcome { state, announcement, is_new }
}

/// Execute one monitoring run; the return value is the process exit code.
pub async fn run_monitor() -> u8 {
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("{:#}", err);
            return 1;
        }
    };

    let loaded = state::load_state(&cfg.state_file);
    let telegram = TelegramClient::new(&cfg.telegram_bot_token);

    if !cfg.monitoring_enabled {
        let state = decision::mark_disabled(loaded, Utc::now());
        if let Err(err) = state::save_state(&cfg.state_file, &state) {
            error!("{:#}", err);
            return 1;
        }
        info!("monitoring disabled via configuration");
        return 0;
    }

    match monitor_pass(&cfg, loaded.clone(), &telegram).await {
        Ok(()) => {
            info!("run completed successfully");
            0
        }
        Err(err) => handle_failure(err, loaded, &cfg, &telegram).await,
    }
}

async fn monitor_pass(cfg: &Config, state: MonitorState, telegram: &TelegramClient) -> Result<()> {
    let html = fetch_page(&cfg.target_url).await?;
    let outcome = evaluate_page(&html, state, cfg, Utc::now());
    state::save_state(&cfg.state_file, &outcome.state)?;

    match (&outcome.announcement, outcome.is_new) {
        (Some(ann), true) => {
            info!(id = %ann.id, "new announcement, notifying channel");
            notify::send_public_announcement(telegram, cfg, ann).await;
        }
        (Some(_), false) => debug!("announcement unchanged, skipping notification"),
        (None, _) => debug!("no matching announcement"),
    }
    Ok(())
}

/// Record the failure, alert the owner if the throttle allows, persist.
async fn handle_failure(
    err: anyhow::Error,
    state: MonitorState,
    cfg: &Config,
    telegram: &TelegramClient,
) -> u8 {
    let signature = error_signature(&err);
    let message = format!("{}: {:#}", signature, err);
    error!(%signature, "{:#}", err);

    let now = Utc::now();
    let mut state = decision::mark_failure(state, &message, cfg.monitoring_enabled, now);

    if decision::should_send_error_alert(&state, &signature, cfg.error_throttle_minutes, now) {
        notify::send_private_error(telegram, cfg, &message).await;
        state = decision::record_error_alert(state, &signature, now);
    } else {
        debug!(%signature, "error alert throttled");
    }

    if let Err(save_err) = state::save_state(&cfg.state_file, &state) {
        error!("{:#}", save_err);
    }
    1
}

/// Coarse error category used as the alert-throttle key. Categories, not
/// messages: the same kind of failure must map to the same signature
/// across runs.
pub fn error_signature(err: &anyhow::Error) -> String {
    if let Some(req_err) = err.downcast_ref::<reqwest::Error>() {
        if req_err.is_timeout() {
            return "timeout".to_string();
        }
        if req_err.is_connect() {
            return "connect".to_string();
        }
        if let Some(status) = req_err.status() {
            return format!("http_status_{}", status.as_u16());
        }
        if req_err.is_decode() {
            return "decode".to_string();
        }
        return "http".to_string();
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return "state_io".to_string();
    }
    "runtime".to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            target_url: "https://example.edu/".into(),
            match_keywords: "time limit exceeded, reappearance".into(),
            similarity_threshold: 0.8,
            telegram_bot_token: "token".into(),
            telegram_channel_id: "channel".into(),
            telegram_owner_chat_id: "owner".into(),
            state_file: PathBuf::from("unused.json"),
            monitoring_enabled: true,
            error_throttle_minutes: 60,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 6, 0, 0).unwrap()
    }

    fn ticker_page() -> String {
        std::fs::read_to_string("tests/fixtures/ticker_page.html").unwrap()
    }

    #[test]
    fn first_sighting_is_new() {
        let outcome = evaluate_page(&ticker_page(), MonitorState::default(), &test_config(), now());
        assert!(outcome.is_new);
        let ann = outcome.announcement.expect("announcement detected");
        assert!(ann.text.to_lowercase().contains("time limit exceeded"));
        assert_eq!(ann.pdf_url.as_deref(), Some("/notices/tle-2026.pdf"));
        assert_eq!(
            outcome.state.last_announcement.as_ref().map(|a| a.id.clone()),
            Some(ann.id)
        );
    }

    #[test]
    fn unchanged_page_does_not_renotify() {
        let cfg = test_config();
        let first = evaluate_page(&ticker_page(), MonitorState::default(), &cfg, now());
        let first_detected =
            first.state.last_announcement.as_ref().unwrap().first_detected.clone();

        let later = now() + Duration::days(1);
        let second = evaluate_page(&ticker_page(), first.state, &cfg, later);
        assert!(second.announcement.is_some());
        assert!(!second.is_new);
        assert_eq!(
            second.state.last_announcement.unwrap().first_detected,
            first_detected
        );
    }

    #[test]
    fn changed_announcement_is_new_again() {
        let cfg = test_config();
        let first = evaluate_page(&ticker_page(), MonitorState::default(), &cfg, now());

        let changed = ticker_page().replace("tle-2026.pdf", "tle-2027.pdf");
        let second = evaluate_page(&changed, first.state, &cfg, now() + Duration::days(1));
        assert!(second.is_new);
    }

    #[test]
    fn no_match_leaves_previous_announcement() {
        let cfg = test_config();
        let first = evaluate_page(&ticker_page(), MonitorState::default(), &cfg, now());

        let unrelated = "<ul><li>Sports day schedule</li></ul>";
        let second = evaluate_page(unrelated, first.state, &cfg, now() + Duration::days(1));
        assert!(second.announcement.is_none());
        assert!(!second.is_new);
        assert!(second.state.last_announcement.is_some());
    }

    #[test]
    fn repeated_failures_throttle_then_realert() {
        let cfg = test_config();

        // First failure: no history, alert goes out.
        let state = MonitorState::default();
        assert!(decision::should_send_error_alert(&state, "timeout", cfg.error_throttle_minutes, now()));
        let state = decision::mark_failure(state, "timeout: fetch", true, now());
        let state = decision::record_error_alert(state, "timeout", now());

        // Same category inside the window: suppressed.
        let second = now() + Duration::minutes(30);
        assert!(!decision::should_send_error_alert(&state, "timeout", cfg.error_throttle_minutes, second));

        // After the window elapses: alerts again.
        let third = now() + Duration::minutes(60);
        assert!(decision::should_send_error_alert(&state, "timeout", cfg.error_throttle_minutes, third));
    }

    #[test]
    fn signature_classification() {
        let io_err = anyhow::Error::from(std::io::Error::other("disk gone"));
        assert_eq!(error_signature(&io_err), "state_io");
        assert_eq!(error_signature(&anyhow::anyhow!("anything else")), "runtime");
    }
}
