//! Discord Notification Sink
//!
//! Posts confirmed / rejected transaction notices to a Discord webhook.
//!
//! Author: AI-Generated
//! Created: 2026-10-17
//!
//! Usage:
//!   Set DISCORD_WEBHOOK environment variable to your webhook URL

use super::{Notification, Severity};
use crate::error::{TrackerError, TrackerResult};
use crate::services::NotificationSink;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::env;
use tracing::{info, warn};

const COLOR_SUCCESS: u32 = 0x00FF00;
const COLOR_ERROR: u32 = 0xFF0000;

/// Discord webhook message structure
#[derive(Serialize)]
struct DiscordMessage {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

/// Discord embed structure for rich formatting
#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    color: u32,
    url: Option<String>,
    fields: Vec<DiscordField>,
    timestamp: Option<String>,
}

#[derive(Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

pub struct DiscordSink {
    webhook_url: String,
    client: reqwest::Client,
}

impl DiscordSink {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    /// Sink from DISCORD_WEBHOOK, `None` when unset
    pub fn from_env() -> Option<Self> {
        match env::var("DISCORD_WEBHOOK") {
            Ok(url) if !url.is_empty() => {
                info!("Discord notifications enabled");
                Some(Self::new(url))
            }
            _ => {
                warn!("DISCORD_WEBHOOK not set - Discord notifications disabled");
                None
            }
        }
    }

    fn build_message(notification: &Notification) -> DiscordMessage {
        let (title, color) = match notification.severity {
            Severity::Success => ("Transaction confirmed", COLOR_SUCCESS),
            Severity::Error => ("Transaction failed", COLOR_ERROR),
        };
        DiscordMessage {
            content: None,
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: notification.message.clone(),
                color,
                url: notification.link.clone(),
                fields: vec![
                    DiscordField {
                        name: "Type".to_string(),
                        value: notification.kind.clone(),
                        inline: true,
                    },
                    DiscordField {
                        name: "Chain".to_string(),
                        value: notification.chain_id.to_string(),
                        inline: true,
                    },
                    DiscordField {
                        name: "Tx".to_string(),
                        value: format!("{:?}", notification.hash),
                        inline: false,
                    },
                ],
                timestamp: Some(Utc::now().to_rfc3339()),
            }],
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn notify(&self, notification: Notification) -> TrackerResult<()> {
        let message = Self::build_message(&notification);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| TrackerError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TrackerError::Notification(format!(
                "Discord webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
