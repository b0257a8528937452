//! Channel membership lookups through the Bot API (`getChatMember`)

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, ChatMemberStatus, Recipient};

use rafflecore::config::ChannelRef;
use rafflecore::error::{AppError, AppResult};
use rafflecore::gate::{MemberStatus, MembershipAuthority};

/// [`MembershipAuthority`] that asks Telegram about one fixed channel.
///
/// The bot must be an administrator of a private channel for this to work;
/// for public channels Telegram answers for any bot.
#[derive(Clone)]
pub struct TelegramMembership {
    bot: Bot,
    channel: ChannelRef,
}

impl TelegramMembership {
    pub fn new(bot: Bot, channel: ChannelRef) -> Self {
        Self { bot, channel }
    }
}

#[async_trait]
impl MembershipAuthority for TelegramMembership {
    async fn member_status(&self, user_id: i64) -> AppResult<MemberStatus> {
        let user_id = u64::try_from(user_id)
            .map_err(|_| AppError::Membership(format!("invalid Telegram user id {}", user_id)))?;

        let member = self
            .bot
            .get_chat_member(channel_recipient(&self.channel), UserId(user_id))
            .await?;

        Ok(member_status(&member.kind))
    }
}

/// Chat identifier for the Bot API.
pub fn channel_recipient(channel: &ChannelRef) -> Recipient {
    match channel {
        ChannelRef::Username(name) => Recipient::ChannelUsername(format!("@{}", name)),
        ChannelRef::Id(id) => Recipient::Id(ChatId(*id)),
    }
}

fn member_status(kind: &ChatMemberKind) -> MemberStatus {
    match kind.status() {
        ChatMemberStatus::Owner => MemberStatus::Owner,
        ChatMemberStatus::Administrator => MemberStatus::Administrator,
        ChatMemberStatus::Member => MemberStatus::Member,
        ChatMemberStatus::Restricted => MemberStatus::Restricted {
            is_member: kind.is_present(),
        },
        ChatMemberStatus::Left => MemberStatus::Left,
        ChatMemberStatus::Banned => MemberStatus::Banned,
        // Statuses added by future Bot API versions are not trusted
        #[allow(unreachable_patterns)]
        _ => MemberStatus::Left,
    }
}
