use crate::bot::keyboards::watch_keyboard;
use crate::bot::utils::no_preview;
use crate::services::notification_service::{Deliver, RenderedMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

/// Sends alerts as Telegram messages with the open/keep/stop keyboard.
#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Deliver for TelegramDelivery {
    async fn deliver(&self, watcher_id: i64, message: &RenderedMessage) -> Result<()> {
        self.bot
            .send_message(ChatId(watcher_id), &message.text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_preview())
            .reply_markup(watch_keyboard(&message.target_id, &message.url))
            .await
            .with_context(|| format!("Telegram rejected alert for chat {}", watcher_id))?;
        Ok(())
    }
}
