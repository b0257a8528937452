//! Core library for the giveaway bot
//!
//! Everything here is independent of Telegram: the bot crate plugs in the
//! Bot API through the [`gate::MembershipAuthority`] trait and renders the
//! outcomes produced here.
//!
//! # Module Structure
//!
//! - `config`: environment configuration, channel and admin allow-list
//! - `storage`: SQLite pool, migrations and the participant store
//! - `gate`: fail-closed channel membership check
//! - `registration`: the registration workflow
//! - `listing`: admin participant listing

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
pub mod gate;
pub mod listing;
pub mod logging;
pub mod registration;
pub mod storage;
pub mod types;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use gate::{MemberStatus, MembershipAuthority, MembershipGate};
pub use listing::AdminListing;
pub use logging::init_logger;
pub use registration::{RegistrationOutcome, RegistrationWorkflow};
pub use storage::{create_pool, shutdown_pool, DbPool, ParticipantStore, SqliteParticipantStore};
pub use types::{Participant, UserProfile};
