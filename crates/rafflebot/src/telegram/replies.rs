//! User-facing reply texts (HTML parse mode)

use teloxide::utils::html;

use rafflecore::config::ChannelRef;
use rafflecore::registration::RegistrationOutcome;
use rafflecore::types::UserProfile;

/// Reply for one registration attempt.
///
/// User-supplied names are HTML-escaped; the participant number is bold.
pub fn registration_reply(
    outcome: &RegistrationOutcome,
    profile: &UserProfile,
    channel: &ChannelRef,
    trigger_phrase: &str,
) -> String {
    let mention = html::escape(&profile.mention());

    match outcome {
        RegistrationOutcome::Registered(participant) => format!(
            "{}, ты участвуешь в розыгрыше! 🎉\nТвой номер: <b>{}</b>",
            mention, participant.number
        ),
        RegistrationOutcome::AlreadyRegistered(participant) => format!(
            "{}, ты уже участвуешь в розыгрыше ✅\nТвой номер: <b>{}</b>",
            mention, participant.number
        ),
        RegistrationOutcome::NeedsSubscription => {
            let channel_link = channel.public_link().unwrap_or_else(|| channel.to_string());
            format!(
                "Похоже, ты ещё не подписан(а) на канал 🥲\n\n\
                 Подпишись, пожалуйста, на канал:\n\
                 👉 {}\n\n\
                 После этого снова нажми /start или напиши «{}».",
                html::escape(&channel_link),
                html::escape(trigger_phrase)
            )
        }
        RegistrationOutcome::StorageFailed => {
            "Не получилось записать тебя в розыгрыш 😔\nПопробуй ещё раз чуть позже.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rafflecore::types::Participant;

    fn participant(number: i64) -> Participant {
        Participant {
            number,
            user_id: 5,
            username: None,
            first_name: None,
            last_name: None,
            registered_at: Utc::now(),
        }
    }

    fn channel() -> ChannelRef {
        ChannelRef::Username("MM_studio_spb".into())
    }

    #[test]
    fn test_registered_reply_bolds_number() {
        let reply = registration_reply(
            &RegistrationOutcome::Registered(participant(7)),
            &UserProfile::new(5).with_username("anna"),
            &channel(),
            "участвую",
        );
        assert_eq!(reply, "@anna, ты участвуешь в розыгрыше! 🎉\nТвой номер: <b>7</b>");
    }

    #[test]
    fn test_already_registered_reply() {
        let reply = registration_reply(
            &RegistrationOutcome::AlreadyRegistered(participant(3)),
            &UserProfile::new(5).with_names(Some("Anna"), None),
            &channel(),
            "участвую",
        );
        assert!(reply.starts_with("Anna, ты уже участвуешь"));
        assert!(reply.contains("<b>3</b>"));
    }

    #[test]
    fn test_names_are_escaped() {
        let reply = registration_reply(
            &RegistrationOutcome::Registered(participant(1)),
            &UserProfile::new(5).with_names(Some("<b>Bob</b> & co"), None),
            &channel(),
            "участвую",
        );
        assert!(reply.starts_with("&lt;b&gt;Bob&lt;/b&gt; &amp; co,"));
    }

    #[test]
    fn test_subscription_reply_links_channel() {
        let reply = registration_reply(
            &RegistrationOutcome::NeedsSubscription,
            &UserProfile::new(5),
            &channel(),
            "участвую",
        );
        assert!(reply.contains("https://t.me/MM_studio_spb"));
        assert!(reply.contains("«участвую»"));
        assert!(!reply.contains("<b>"));
    }

    #[test]
    fn test_storage_failure_reply_has_no_number() {
        let reply = registration_reply(
            &RegistrationOutcome::StorageFailed,
            &UserProfile::new(5),
            &channel(),
            "участвую",
        );
        assert!(!reply.chars().any(|c| c.is_ascii_digit()));
    }
}
