//! Bot initialization and command definitions

use std::time::Duration;

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use rafflecore::config::{timeouts, Config};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    // `/start` with an optional deep-link payload
    #[command(description = "участвовать в розыгрыше")]
    Start(String),
    // `/list`; trailing arguments are accepted and ignored
    #[command(hide)]
    List(String),
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Invalid `BOT_API_URL` or HTTP client setup failure
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(timeouts::bot_api()).build()?;
    let bot = Bot::with_client(config.bot_token.expose_secret(), client);

    let bot = if let Some(bot_api_url) = &config.bot_api_url {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        bot.set_api_url(url)
    } else {
        bot
    };

    Ok(bot)
}

/// Fetches the bot's own username, retrying while the Bot API is not reachable yet
///
/// Command parsing needs the username to tell `/start@this_bot` from
/// `/start@other_bot`.
pub async fn fetch_bot_username(bot: &Bot) -> anyhow::Result<String> {
    const MAX_ATTEMPTS: u32 = 12;
    const RETRY_DELAY: Duration = Duration::from_secs(5);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match bot.get_me().await {
            Ok(me) => {
                let username = me.user.username.clone().unwrap_or_default();
                log::info!("Authorized as @{}", username);
                return Ok(username);
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in {:?}...",
                    attempt,
                    MAX_ATTEMPTS,
                    e,
                    RETRY_DELAY
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to connect to Bot API after {} attempts: {}",
                    attempt,
                    e
                ))
            }
        }
    }
}

/// Publishes the visible command list in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
