//! Telegram delivery. Sends are best-effort: a failed call is logged and
//! never aborts the run or blocks state persistence.

use std::time::Duration;

use tracing::warn;

use crate::config::Config;
use crate::state::Announcement;

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Thin client over the HTTPS Bot API.
pub struct TelegramClient {
    base_url: String,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        TelegramClient {
            base_url: format!("https://api.telegram.org/bot{}", bot_token),
            http: reqwest::Client::new(),
        }
    }

    pub async fn send_message(&self, chat_id: &str, text: &str, disable_preview: bool) {
        let url = format!("{}/sendMessage", self.base_url);
        let params = [
            ("chat_id", chat_id),
            ("text", text),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", if disable_preview { "true" } else { "false" }),
        ];

        match self.http.post(&url).timeout(SEND_TIMEOUT).form(&params).send().await {
            Ok(resp) if !resp.status().is_success() => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(%status, body = %body, "telegram send failed");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "telegram send failed"),
        }
    }
}

/// Announcement message for the public channel.
pub async fn send_public_announcement(telegram: &TelegramClient, cfg: &Config, ann: &Announcement) {
    let mut lines = vec![
        "\u{1f4e2} <b>New College Announcement Detected</b>".to_string(),
        String::new(),
        escape_html(&ann.text),
        String::new(),
        format!("\u{1f517} <a href=\"{}\">Source page</a>", cfg.target_url),
    ];
    if let Some(url) = &ann.pdf_url {
        lines.push(format!("\u{1f4c4} <a href=\"{}\">PDF link</a>", url));
    }
    telegram.send_message(&cfg.telegram_channel_id, &lines.join("\n"), false).await;
}

/// Error alert for the owner only.
pub async fn send_private_error(telegram: &TelegramClient, cfg: &Config, message: &str) {
    let text = format!(
        "\u{26a0}\u{fe0f} <b>Monitoring error</b>\n\n<code>{}</code>",
        escape_html(message)
    );
    telegram.send_message(&cfg.telegram_owner_chat_id, &text, true).await;
}

/// Minimal escape for text interpolated into HTML parse mode.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("plain"), "plain");
    }
}
