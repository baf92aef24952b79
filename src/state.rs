//! Persisted monitor state. The JSON file is the only contract between
//! this tool and the static status page, so field names and
//! present-as-null semantics must not drift.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Timestamp form used everywhere in the state file, e.g.
/// `2026-08-06T09:30:00+0000`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

pub fn format_time(t: DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Tolerant parse: anything that does not round-trip is treated as absent.
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, TIME_FORMAT)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
        }
    }

    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(RunStatus::Success),
            "failure" => Some(RunStatus::Failure),
            _ => None,
        }
    }
}

/// A detected announcement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub id: String,
    pub text: String,
    pub pdf_url: Option<String>,
    pub first_detected: String,
}

impl Announcement {
    /// The id doubles as the dedup key: the text alone, or text and link
    /// joined with `|` when a link is present. Identical content always
    /// derives the identical id.
    pub fn new(text: &str, pdf_url: Option<String>, now: DateTime<Utc>) -> Self {
        let id = match pdf_url.as_deref() {
            Some(url) => format!("{}|{}", text, url),
            None => text.to_string(),
        };
        Announcement {
            id,
            text: text.to_string(),
            pdf_url,
            first_detected: format_time(now),
        }
    }

    fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        Some(Announcement {
            id: obj.get("id").and_then(Value::as_str).unwrap_or("").to_string(),
            text: obj.get("text").and_then(Value::as_str).unwrap_or("").to_string(),
            pdf_url: obj.get("pdf_url").and_then(Value::as_str).map(str::to_string),
            first_detected: obj
                .get("first_detected")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        })
    }
}

/// Everything the status page and the next run need to know about the
/// last run. Serialized with every field present, null when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorState {
    pub monitoring_enabled: bool,
    pub last_run_time: Option<String>,
    pub last_run_status: Option<RunStatus>,
    pub last_error_message: Option<String>,
    pub last_announcement: Option<Announcement>,
    pub error_signature: Option<String>,
    pub error_last_alert_time: Option<String>,
}

impl Default for MonitorState {
    fn default() -> Self {
        MonitorState {
            monitoring_enabled: true,
            last_run_time: None,
            last_run_status: None,
            last_error_message: None,
            last_announcement: None,
            error_signature: None,
            error_last_alert_time: None,
        }
    }
}

impl MonitorState {
    /// Field-by-field extraction with defaults; a single bad field never
    /// rejects the rest of the record.
    fn from_value(raw: &Value) -> Self {
        let get_str = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
        MonitorState {
            monitoring_enabled: raw
                .get("monitoring_enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            last_run_time: get_str("last_run_time"),
            last_run_status: raw
                .get("last_run_status")
                .and_then(Value::as_str)
                .and_then(RunStatus::from_raw),
            last_error_message: get_str("last_error_message"),
            last_announcement: raw.get("last_announcement").and_then(Announcement::from_value),
            error_signature: get_str("error_signature"),
            error_last_alert_time: get_str("error_last_alert_time"),
        }
    }
}

/// Load state from disk. Missing, unreadable, or corrupt files fall back
/// to the default state so a run can always proceed.
pub fn load_state(path: &Path) -> MonitorState {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return MonitorState::default(),
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) if value.is_object() => MonitorState::from_value(&value),
        Ok(_) | Err(_) => {
            warn!(path = %path.display(), "state file unreadable, starting clean");
            MonitorState::default()
        }
    }
}

/// Persist state atomically: write a sibling temp file, then rename over
/// the target so a crash mid-write never leaves a torn file.
pub fn save_state(path: &Path, state: &MonitorState) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating state directory {}", dir.display()))?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.json".to_string());
    let tmp = path.with_file_name(format!("{}.tmp", file_name));

    let json = serde_json::to_string_pretty(state)?;
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming over {}", path.display()))?;
    Ok(())
}

// ── Tests ──
