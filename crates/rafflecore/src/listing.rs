//! Admin participant listing
//!
//! Only allow-listed administrators get an answer. Everyone else gets
//! nothing at all, so the command does not reveal that it exists.

use std::sync::Arc;

use crate::config::AdminAllowList;
use crate::error::AppResult;
use crate::storage::ParticipantStore;
use crate::types::{Participant, UserProfile};

/// Maximum message length for Telegram (with margin)
pub const MAX_MESSAGE_LENGTH: usize = 4000;

pub const LIST_HEADER: &str = "Список участников:";
pub const LIST_CONTINUATION_HEADER: &str = "Список участников (продолжение):";
pub const EMPTY_LIST_MESSAGE: &str = "Пока никто не зарегистрировался.";

#[derive(Clone)]
pub struct AdminListing {
    store: Arc<dyn ParticipantStore>,
    admins: AdminAllowList,
}

impl AdminListing {
    pub fn new(store: Arc<dyn ParticipantStore>, admins: AdminAllowList) -> Self {
        Self { store, admins }
    }

    pub fn is_enabled(&self) -> bool {
        !self.admins.is_empty()
    }

    /// Messages to send back for a list request by `requester`.
    ///
    /// Returns an empty vector for non-admins.
    ///
    /// # Errors
    /// Propagates storage failures; nothing is rendered in that case.
    pub async fn handle_list_request(&self, requester: &UserProfile) -> AppResult<Vec<String>> {
        if !self.admins.allows(requester.user_id, requester.username.as_deref()) {
            log::debug!("User {} requested the participant list without permission", requester.user_id);
            return Ok(Vec::new());
        }

        let participants = self.store.list_all().await?;
        log::info!(
            "Admin {} requested the participant list ({} participants)",
            requester.user_id,
            participants.len()
        );
        Ok(render_listing(&participants, MAX_MESSAGE_LENGTH))
    }
}

/// One listing line: `<number>. <display> (id <user_id>)`.
pub fn format_line(participant: &Participant) -> String {
    format!(
        "{}. {} (id {})",
        participant.number,
        participant.display_name(),
        participant.user_id
    )
}

/// Renders participants into messages of at most `limit` characters each.
///
/// Messages are split only between lines. The first message starts with
/// [`LIST_HEADER`], later ones with [`LIST_CONTINUATION_HEADER`]. A single
/// line longer than the limit still gets a message of its own.
pub fn render_listing(participants: &[Participant], limit: usize) -> Vec<String> {
    if participants.is_empty() {
        return vec![EMPTY_LIST_MESSAGE.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::from(LIST_HEADER);
    let mut current_len = LIST_HEADER.chars().count();
    let mut has_lines = false;

    for line in participants.iter().map(format_line) {
        let line_len = line.chars().count();
        if has_lines && current_len + 1 + line_len > limit {
            chunks.push(std::mem::take(&mut current));
            current.push_str(LIST_CONTINUATION_HEADER);
            current_len = LIST_CONTINUATION_HEADER.chars().count();
            has_lines = false;
        }
        current.push('\n');
        current.push_str(&line);
        current_len += 1 + line_len;
        has_lines = true;
    }
    chunks.push(current);

    chunks
}
