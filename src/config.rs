//! Per-run configuration. Non-secret tunables have compiled defaults and
//! accept environment overrides; the Telegram credentials are required
//! and fail the run before any state is touched.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// College website URL to monitor for announcements.
pub const DEFAULT_TARGET_URL: &str = "https://www.psgtech.edu/";

/// Comma-separated keywords matched against announcement text.
pub const DEFAULT_MATCH_KEYWORDS: &str = "time limit exceeded, reappearance";

/// Similarity threshold in [0, 1]. Higher = stricter match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Minimum minutes between repeated error alerts with the same signature.
pub const DEFAULT_ERROR_THROTTLE_MINUTES: i64 = 60;

pub const DEFAULT_STATE_FILE: &str = "state/state.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub target_url: String,
    pub match_keywords: String,
    pub similarity_threshold: f64,
    pub telegram_bot_token: String,
    pub telegram_channel_id: String,
    pub telegram_owner_chat_id: String,
    pub state_file: PathBuf,
    pub monitoring_enabled: bool,
    pub error_throttle_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            target_url: env_or("TARGET_URL", DEFAULT_TARGET_URL),
            match_keywords: env_or("MATCH_KEYWORDS", DEFAULT_MATCH_KEYWORDS),
            similarity_threshold: env_f64("SIMILARITY_THRESHOLD", DEFAULT_SIMILARITY_THRESHOLD),
            telegram_bot_token: require("TELEGRAM_BOT_TOKEN")?,
            telegram_channel_id: require("TELEGRAM_CHANNEL_ID")?,
            telegram_owner_chat_id: require("TELEGRAM_OWNER_CHAT_ID")?,
            state_file: PathBuf::from(env_or("STATE_FILE", DEFAULT_STATE_FILE)),
            monitoring_enabled: std::env::var("MONITORING_ENABLED")
                .map(|raw| enabled_flag(&raw))
                .unwrap_or(true),
            error_throttle_minutes: env_i64(
                "ERROR_THROTTLE_MINUTES",
                DEFAULT_ERROR_THROTTLE_MINUTES,
            ),
        })
    }
}

/// `0/false/no/off` (any case) disables; anything else, or unset, enables.
pub fn enabled_flag(raw: &str) -> bool {
    !matches!(raw.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off")
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing required environment variable {}", name))
}

pub fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabling_values() {
        for raw in ["0", "false", "no", "off", "FALSE", "No", " off "] {
            assert!(!enabled_flag(raw), "{:?} should disable", raw);
        }
    }

    #[test]
    fn everything_else_enables() {
        for raw in ["1", "true", "yes", "on", "enabled", ""] {
            assert!(enabled_flag(raw), "{:?} should enable", raw);
        }
    }
}
