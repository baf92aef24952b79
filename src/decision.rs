//! Notification decisions and the state transitions they hang off.
//! Transitions take the state by value and return the updated record;
//! nothing here touches disk or network.

use chrono::{DateTime, Duration, Utc};

use crate::state::{format_time, parse_time, Announcement, MonitorState, RunStatus};

/// An announcement is new when nothing is stored yet or the stored id
/// differs. Repeats of the same id across runs must not re-notify.
pub fn is_new_announcement(state: &MonitorState, announcement: &Announcement) -> bool {
    match &state.last_announcement {
        Some(prev) => prev.id != announcement.id,
        None => true,
    }
}

/// Throttle repeated error alerts: a fresh alert goes out when the error
/// category changed, when no alert has been recorded, or when the last
/// alert is at least `throttle_minutes` old (inclusive boundary). A new
/// kind of failure always surfaces immediately.
pub fn should_send_error_alert(
    state: &MonitorState,
    signature: &str,
    throttle_minutes: i64,
    now: DateTime<Utc>,
) -> bool {
    if state.error_signature.as_deref() != Some(signature) {
        return true;
    }
    let Some(raw) = state.error_last_alert_time.as_deref() else {
        return true;
    };
    let Some(last_alert) = parse_time(raw) else {
        return true;
    };
    now - last_alert >= Duration::minutes(throttle_minutes)
}

/// Successful run: stamp time and status, clear all error bookkeeping,
/// and store the detected announcement if any. A re-detection with the
/// same id keeps the original `first_detected`.
pub fn mark_success(
    mut state: MonitorState,
    announcement: Option<Announcement>,
    enabled: bool,
    now: DateTime<Utc>,
) -> MonitorState {
    state.last_run_time = Some(format_time(now));
    state.last_run_status = Some(RunStatus::Success);
    state.last_error_message = None;
    state.error_signature = None;
    state.error_last_alert_time = None;
    state.monitoring_enabled = enabled;

    if let Some(mut ann) = announcement {
        if let Some(prev) = &state.last_announcement {
            if prev.id == ann.id {
                ann.first_detected = prev.first_detected.clone();
            }
        }
        state.last_announcement = Some(ann);
    }
    state
}

/// Failed run: record what happened. The stored announcement and the
/// alert bookkeeping are left alone; `record_error_alert` updates the
/// latter only when an alert actually goes out.
pub fn mark_failure(
    mut state: MonitorState,
    error_message: &str,
    enabled: bool,
    now: DateTime<Utc>,
) -> MonitorState {
    state.last_run_time = Some(format_time(now));
    state.last_run_status = Some(RunStatus::Failure);
    state.last_error_message = Some(error_message.to_string());
    state.monitoring_enabled = enabled;
    state
}

/// Monitoring switched off: stamp the run so the status page reflects it.
pub fn mark_disabled(mut state: MonitorState, now: DateTime<Utc>) -> MonitorState {
    state.monitoring_enabled = false;
    state.last_run_time = Some(format_time(now));
    state
}

/// Remember that an alert for this error category went out just now.
pub fn record_error_alert(
    mut state: MonitorState,
    signature: &str,
    now: DateTime<Utc>,
) -> MonitorState {
    state.error_signature = Some(signature.to_string());
    state.error_last_alert_time = Some(format_time(now));
    state
}

// ── Tests ──
