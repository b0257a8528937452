//! Telegram front end of the giveaway bot
//!
//! Receives updates over a webhook, classifies them and hands them to the
//! workflows in [`rafflecore`].

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cli;
pub mod telegram;
pub mod webhook;

pub use telegram::HandlerDeps;
pub use webhook::{router, serve, webhook_url};
