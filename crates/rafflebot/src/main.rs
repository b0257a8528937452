use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use rafflebot::cli::{Cli, Commands};
use rafflebot::telegram::{
    create_bot, fetch_bot_username, setup_bot_commands, HandlerDeps, TelegramMembership, TelegramMessenger,
};
use rafflebot::webhook::{router, serve, webhook_url};
use rafflecore::{
    create_pool, init_logger, shutdown_pool, AdminListing, Config, MembershipGate, RegistrationWorkflow,
    SqliteParticipantStore,
};

/// How long shutdown waits for in-flight storage calls
const POOL_DRAIN_GRACE: Duration = Duration::from_secs(10);

/// Main entry point for the giveaway bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (configuration, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logger(None)?;
            log::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    init_logger(config.log_file_path.as_deref())?;

    // Panics inside handlers are caught per update; this only reports them
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    match cli.command {
        Some(Commands::Run) | None => run_bot(config).await,
        Some(Commands::SetWebhook { url }) => run_set_webhook(config, url).await,
        Some(Commands::DeleteWebhook) => run_delete_webhook(config).await,
    }
}

/// Wires the workflows together and serves the webhook until shutdown.
async fn run_bot(config: Config) -> Result<()> {
    log::info!("Starting giveaway bot for channel {}", config.channel);

    let bot = create_bot(&config)?;
    let bot_username = fetch_bot_username(&bot).await?;

    let pool = Arc::new(create_pool(&config.database_path, config.db_timeout)?);
    let store = Arc::new(SqliteParticipantStore::new(Arc::clone(&pool), config.db_timeout));

    let authority = Arc::new(TelegramMembership::new(bot.clone(), config.channel.clone()));
    let gate = MembershipGate::new(authority, config.gate_timeout);

    if config.admins.is_empty() {
        log::warn!("ADMIN_USERNAMES is empty: the participant list is unavailable");
    } else {
        log::info!("Participant list enabled for {} admin(s)", config.admins.len());
    }

    let deps = HandlerDeps {
        registration: Arc::new(RegistrationWorkflow::new(store.clone(), gate)),
        listing: Arc::new(AdminListing::new(store, config.admins.clone())),
        messenger: Arc::new(TelegramMessenger::new(bot)),
        bot_username,
        channel: config.channel.clone(),
        trigger_phrase: config.trigger_phrase.clone(),
    };

    let app = router(deps, &config.webhook_path);
    log::info!("Webhook route: POST {}", redacted_path(&config));

    let served = serve(app, config.port).await;

    shutdown_pool(pool, POOL_DRAIN_GRACE).await;
    served
}

async fn run_set_webhook(config: Config, url: Option<String>) -> Result<()> {
    let base_url = url
        .or_else(|| config.webhook_url.clone())
        .ok_or_else(|| anyhow::anyhow!("No webhook URL: pass --url or set WEBHOOK_URL"))?;
    let full_url = webhook_url(&base_url, &config.webhook_path);
    let parsed = url::Url::parse(&full_url).map_err(|e| anyhow::anyhow!("Invalid webhook URL {}: {}", full_url, e))?;

    let bot = create_bot(&config)?;
    bot.set_webhook(parsed).await?;
    log::info!("Webhook set to {}{}", base_url.trim_end_matches('/'), redacted_path(&config));

    setup_bot_commands(&bot).await?;
    log::info!("Bot commands published");
    Ok(())
}

async fn run_delete_webhook(config: Config) -> Result<()> {
    let bot = create_bot(&config)?;
    bot.delete_webhook().await?;
    log::info!("Webhook deleted");
    Ok(())
}

/// Webhook path safe to log: a token-derived path is masked.
fn redacted_path(config: &Config) -> &str {
    if config.webhook_path.starts_with("/webhook/") {
        "/webhook/<token>"
    } else {
        &config.webhook_path
    }
}
