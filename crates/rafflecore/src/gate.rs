//! Membership gate: is this user currently in the giveaway channel?
//!
//! The gate is fail-closed. Transport errors, timeouts and unexpected answers
//! all count as "not a member", so registration can never succeed because the
//! membership check broke.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

/// Status of a user in the channel, as reported by the membership authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    /// Restricted user; `is_member` tells whether they are still in the chat
    Restricted { is_member: bool },
    Left,
    Banned,
}

impl MemberStatus {
    /// Owner, administrator, member and restricted-but-present count as members.
    pub fn is_present(self) -> bool {
        match self {
            MemberStatus::Owner | MemberStatus::Administrator | MemberStatus::Member => true,
            MemberStatus::Restricted { is_member } => is_member,
            MemberStatus::Left | MemberStatus::Banned => false,
        }
    }
}

/// Live source of channel membership (the Telegram Bot API in production).
#[async_trait]
pub trait MembershipAuthority: Send + Sync {
    /// Current status of `user_id` in the configured channel.
    async fn member_status(&self, user_id: i64) -> AppResult<MemberStatus>;
}

/// Fail-closed wrapper around a [`MembershipAuthority`].
#[derive(Clone)]
pub struct MembershipGate {
    authority: Arc<dyn MembershipAuthority>,
    timeout: Duration,
}

impl MembershipGate {
    pub fn new(authority: Arc<dyn MembershipAuthority>, timeout: Duration) -> Self {
        Self { authority, timeout }
    }

    /// Queries the authority live (no caching) and maps the answer to a yes/no.
    pub async fn is_member(&self, user_id: i64) -> bool {
        match tokio::time::timeout(self.timeout, self.authority.member_status(user_id)).await {
            Ok(Ok(status)) => {
                log::debug!("Membership status for user {}: {:?}", user_id, status);
                status.is_present()
            }
            Ok(Err(e)) => {
                log::warn!("Membership check failed for user {}, treating as not subscribed: {}", user_id, e);
                false
            }
            Err(_) => {
                log::warn!(
                    "Membership check for user {} timed out after {:?}, treating as not subscribed",
                    user_id,
                    self.timeout
                );
                false
            }
        }
    }
}
