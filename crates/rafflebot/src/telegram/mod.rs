//! Telegram bot integration
//!
//! - `bot`: client construction and the command set
//! - `membership`: `getChatMember`-backed membership authority
//! - `messenger`: outbound message seam
//! - `replies`: user-facing texts for registration outcomes
//! - `handlers`: update classification, routing and the error boundary

pub mod bot;
pub mod handlers;
pub mod membership;
pub mod messenger;
pub mod replies;

pub use bot::{create_bot, fetch_bot_username, setup_bot_commands, Command};
pub use handlers::{classify, dispatch, handle_update, HandlerDeps, Intent};
pub use membership::{channel_recipient, TelegramMembership};
pub use messenger::{Messenger, TelegramMessenger};
pub use replies::registration_reply;

// Re-export Bot type for convenience
pub use teloxide::Bot;
