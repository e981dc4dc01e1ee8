//! Discord webhook delivery with exponential-backoff retry.
//!
//! [`DiscordWebhook`] posts a JSON message to a Discord channel webhook.
//! Failed attempts are retried three times with exponential backoff
//! (1 s, 2 s, 4 s) before the error is returned.

use std::time::Duration;

use serde_json::{json, Value};
use songtailor_core::ticket::Ticket;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Embed accent colour (Discord expects a decimal RGB integer).
const EMBED_COLOR: u32 = 0x8E44AD;

/// Discord rejects embed field values longer than this.
const MAX_FIELD_LEN: usize = 1024;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Discord returned a non-2xx status code.
    #[error("Discord webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// DiscordWebhook
// ---------------------------------------------------------------------------

/// A single Discord channel webhook.
#[derive(Clone)]
pub struct DiscordWebhook {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>) -> Result<Self, DiscordError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delays: RETRY_DELAYS_SECS
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
        })
    }

    /// Replace the backoff schedule. One retry per entry.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post `message`, retrying on failure. Returns the last error once the
    /// schedule is exhausted.
    pub async fn deliver(&self, message: &Value) -> Result<(), DiscordError> {
        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(message).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "Discord delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        self.try_send(message).await.inspect_err(|e| {
            tracing::error!(error = %e, "Discord delivery failed after all retries");
        })
    }

    async fn try_send(&self, message: &Value) -> Result<(), DiscordError> {
        let response = self.client.post(&self.url).json(message).send().await?;
        if !response.status().is_success() {
            return Err(DiscordError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Message formatting
// ---------------------------------------------------------------------------

/// Build the "new ticket" announcement for a freshly created ticket.
pub fn creation_message(ticket: &Ticket) -> Value {
    let submitter = ticket
        .profiles
        .as_ref()
        .and_then(|p| p.display_name.clone())
        .unwrap_or_else(|| format!("user #{}", ticket.user_id));

    let mut fields = Vec::new();
    let mut push = |name: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            fields.push(json!({
                "name": name,
                "value": truncate(&value, MAX_FIELD_LEN),
                "inline": true,
            }));
        }
    };
    push("Submitted by", Some(submitter));
    push("Service", ticket.service_name.clone());
    push("Genre", ticket.genre.clone());
    push("Category", ticket.music_category.clone());
    push(
        "Deadline",
        ticket.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
    );
    if !ticket.tracks.is_empty() {
        let lines: Vec<String> = ticket
            .tracks
            .iter()
            .map(|t| match (t.base_bpm, t.target_bpm) {
                (Some(base), Some(target)) => format!("{} ({base} -> {target} BPM)", t.url),
                _ => t.url.clone(),
            })
            .collect();
        push("Tracks", Some(lines.join("\n")));
    }

    let mut embed = json!({
        "title": format!("New ticket #{}: {}", ticket.id, ticket.title),
        "color": EMBED_COLOR,
        "fields": fields,
        "timestamp": ticket.created_at.to_rfc3339(),
    });
    if let Some(thumbnail) = ticket.thumbnail_url() {
        embed["thumbnail"] = json!({ "url": thumbnail });
    }

    json!({
        "username": "Song Tailor",
        "embeds": [embed],
    })
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
