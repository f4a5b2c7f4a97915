use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use wikirelay_common::types::NotificationPayload;

use super::Notifier;

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord REST delivery backend. Posts one embed per notification to the
/// destination channel.
pub struct DiscordApi {
    token: String,
    http: reqwest::Client,
}

impl DiscordApi {
    pub fn new(token: String) -> Self {
        Self {
            token,
            http: reqwest::Client::new(),
        }
    }

    fn embed(payload: &NotificationPayload) -> serde_json::Value {
        let mut embed = json!({
            "author": {
                "name": payload.title,
                "url": payload.title_url,
                "icon_url": payload.icon_url,
            },
            "color": payload.color,
            "description": payload.body,
            "timestamp": payload.timestamp.to_rfc3339(),
        });
        if !payload.footer.is_empty() {
            embed["footer"] = json!({ "text": payload.footer });
        }
        embed
    }
}

#[async_trait]
impl Notifier for DiscordApi {
    async fn send(&self, destination: &str, payload: &NotificationPayload) -> anyhow::Result<()> {
        let url = format!("{API_BASE}/channels/{destination}/messages");
        let body = json!({ "embeds": [Self::embed(payload)] });

        let resp = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bot {}", self.token),
            )
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(channel = destination, status = %status, body = %body, "Discord API returned non-success");
            anyhow::bail!("Discord API returned {status}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn payload(footer: &str) -> NotificationPayload {
        NotificationPayload {
            title: "Earth".to_string(),
            title_url: "https://en.wikipedia.org/wiki/Earth".to_string(),
            icon_url: "https://upload.wikimedia.org/icon.png".to_string(),
            color: 0x00af89,
            footer: footer.to_string(),
            body: "([diff](url)) . . (+120) . . user".to_string(),
            timestamp: DateTime::from_timestamp(1712345678, 0).unwrap(),
        }
    }

    #[test]
    fn embed_carries_author_color_and_description() {
        let embed = DiscordApi::embed(&payload("New page"));
        assert_eq!(embed["author"]["name"], "Earth");
        assert_eq!(embed["color"], 0x00af89);
        assert_eq!(embed["description"], "([diff](url)) . . (+120) . . user");
        assert_eq!(embed["footer"]["text"], "New page");
    }

    #[test]
    fn empty_footer_is_omitted() {
        let embed = DiscordApi::embed(&payload(""));
        assert!(embed.get("footer").is_none());
    }
}
