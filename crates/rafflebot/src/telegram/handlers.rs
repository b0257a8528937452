//! Update classification and routing
//!
//! Every update is classified into exactly one [`Intent`] and routed to at most
//! one workflow. [`handle_update`] is the error boundary: it runs the dispatch
//! on its own task and logs failures and panics instead of surfacing them, so a
//! bad update never reaches the transport as an error.

use std::sync::Arc;

use teloxide::types::{Message, Update, UpdateKind, User};
use teloxide::utils::command::BotCommands;

use rafflecore::config::ChannelRef;
use rafflecore::error::{AppError, AppResult};
use rafflecore::listing::AdminListing;
use rafflecore::registration::RegistrationWorkflow;
use rafflecore::types::UserProfile;

use super::bot::Command;
use super::messenger::Messenger;
use super::replies::registration_reply;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub registration: Arc<RegistrationWorkflow>,
    pub listing: Arc<AdminListing>,
    pub messenger: Arc<dyn Messenger>,
    pub bot_username: String,
    pub channel: ChannelRef,
    pub trigger_phrase: String,
}

/// What an inbound message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// `/start`, with or without a deep-link payload
    Start,
    /// Free text containing the trigger phrase
    TriggerPhrase,
    /// `/list`
    ListParticipants,
    Unhandled,
}

impl Intent {
    fn registers(self) -> bool {
        matches!(self, Intent::Start | Intent::TriggerPhrase)
    }
}

/// Classifies message text. Commands win over the trigger phrase.
pub fn classify(text: Option<&str>, bot_username: &str, trigger_phrase: &str) -> Intent {
    let Some(text) = text else {
        return Intent::Unhandled;
    };

    if text.starts_with('/') {
        match Command::parse(text, bot_username) {
            Ok(Command::Start(_)) => return Intent::Start,
            Ok(Command::List(_)) => return Intent::ListParticipants,
            Err(_) => {}
        }
    }

    let trigger = trigger_phrase.trim().to_lowercase();
    if !trigger.is_empty() && text.to_lowercase().contains(&trigger) {
        return Intent::TriggerPhrase;
    }

    Intent::Unhandled
}

/// Builds a profile from the Telegram sender.
pub fn profile_from_user(user: &User) -> AppResult<UserProfile> {
    let user_id = i64::try_from(user.id.0)
        .map_err(|_| AppError::Messaging(format!("user id {} does not fit into i64", user.id.0)))?;

    Ok(UserProfile {
        user_id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|name| !name.is_empty()),
        last_name: user.last_name.clone(),
    })
}

/// Runs one update inside an error boundary.
///
/// Handler errors and panics are logged with the update id and chat; they are
/// never returned, so the webhook still acknowledges the update.
pub async fn handle_update(deps: HandlerDeps, update: Update) {
    let update_id = update.id.0;
    let chat_id = update.chat().map(|chat| chat.id.0);

    let task = tokio::spawn(async move { dispatch(&deps, update).await });

    match task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Failed to handle update {} (chat {:?}): {}", update_id, chat_id, e),
        Err(e) if e.is_panic() => {
            log::error!("Handler panicked on update {} (chat {:?}): {}", update_id, chat_id, e)
        }
        Err(e) => log::error!("Handler task for update {} was cancelled: {}", update_id, e),
    }
}

/// Classifies the update and runs the matching workflow.
pub async fn dispatch(deps: &HandlerDeps, update: Update) -> AppResult<()> {
    let UpdateKind::Message(msg) = update.kind else {
        log::debug!("Ignoring non-message update {}", update.id.0);
        return Ok(());
    };

    handle_message(deps, &msg).await
}

async fn handle_message(deps: &HandlerDeps, msg: &Message) -> AppResult<()> {
    let intent = classify(msg.text(), &deps.bot_username, &deps.trigger_phrase);
    if intent == Intent::Unhandled {
        return Ok(());
    }

    let Some(user) = msg.from.as_ref() else {
        log::debug!("Ignoring {:?} without a sender in chat {}", intent, msg.chat.id.0);
        return Ok(());
    };
    let profile = profile_from_user(user)?;
    let chat_id = msg.chat.id.0;

    log::info!("User {} in chat {}: {:?}", profile.user_id, chat_id, intent);

    if intent.registers() {
        let outcome = deps.registration.register(&profile).await;
        let reply = registration_reply(&outcome, &profile, &deps.channel, &deps.trigger_phrase);
        deps.messenger.send_html(chat_id, &reply).await?;
        return Ok(());
    }

    for chunk in deps.listing.handle_list_request(&profile).await? {
        deps.messenger.send_plain(chat_id, &chunk).await?;
    }
    Ok(())
}
