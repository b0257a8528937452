//! Outbound replies

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use rafflecore::error::AppResult;

/// Sends replies back to the chat an update came from.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends text rendered with HTML parse mode.
    async fn send_html(&self, chat_id: i64, text: &str) -> AppResult<()>;

    /// Sends text as-is, without any parse mode.
    async fn send_plain(&self, chat_id: i64, text: &str) -> AppResult<()>;
}

/// [`Messenger`] backed by the Bot API `sendMessage` method.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_html(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_plain(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}
