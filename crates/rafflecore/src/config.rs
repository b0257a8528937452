//! Runtime configuration read from the environment
//!
//! All settings come from environment variables (a `.env` file is loaded by the
//! binary before [`Config::from_env`] runs). [`Config::from_lookup`] accepts any
//! key lookup so tests never touch the process environment.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::{AppError, AppResult};

/// Default channel checked by the membership gate
pub const DEFAULT_CHANNEL: &str = "MM_studio_spb";

/// Default listen port
pub const DEFAULT_PORT: u16 = 10000;

/// Default webhook route
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Default free-text phrase that triggers registration
pub const DEFAULT_TRIGGER_PHRASE: &str = "участвую";

/// Timeout configuration
pub mod timeouts {
    use super::Duration;

    /// Membership query timeout (in seconds)
    pub const GATE_TIMEOUT_SECS: u64 = 5;

    /// Pool checkout and SQLite busy timeout (in seconds)
    pub const DB_TIMEOUT_SECS: u64 = 5;

    /// Request timeout for the Bot API HTTP client (in seconds)
    pub const BOT_API_TIMEOUT_SECS: u64 = 30;

    /// Bot API client timeout duration
    pub fn bot_api() -> Duration {
        Duration::from_secs(BOT_API_TIMEOUT_SECS)
    }
}

/// The channel whose members may register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Public channel username without the leading `@`
    Username(String),
    /// Numeric chat id (private channels, `-100…`)
    Id(i64),
}

impl ChannelRef {
    /// Parses `@name`, `name` or a numeric id.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim().trim_start_matches('@');
        if trimmed.is_empty() {
            return Err(AppError::Config("CHANNEL_USERNAME is empty".to_string()));
        }
        if let Ok(id) = trimmed.parse::<i64>() {
            return Ok(ChannelRef::Id(id));
        }
        Ok(ChannelRef::Username(trimmed.to_string()))
    }

    /// Public `t.me` link, only available for username channels.
    pub fn public_link(&self) -> Option<String> {
        match self {
            ChannelRef::Username(name) => Some(format!("https://t.me/{}", name)),
            ChannelRef::Id(_) => None,
        }
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRef::Username(name) => write!(f, "@{}", name),
            ChannelRef::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Users allowed to request the participant list.
///
/// Entries are matched either by numeric Telegram id or by username
/// (case-insensitive, without `@`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    ids: Vec<i64>,
    usernames: Vec<String>,
}

impl AdminAllowList {
    /// Parses a comma/whitespace separated list of handles and ids.
    pub fn parse(raw: &str) -> Self {
        let mut list = AdminAllowList::default();
        for part in raw.split([',', ' ', '\n', '\t']) {
            let part = part.trim().trim_start_matches('@');
            if part.is_empty() {
                continue;
            }
            match part.parse::<i64>() {
                Ok(id) => list.ids.push(id),
                Err(_) => list.usernames.push(part.to_lowercase()),
            }
        }
        list
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.usernames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len() + self.usernames.len()
    }

    /// Checks whether the given identity is an administrator.
    pub fn allows(&self, user_id: i64, username: Option<&str>) -> bool {
        if self.ids.contains(&user_id) {
            return true;
        }
        match username {
            Some(name) => {
                let name = name.trim_start_matches('@').to_lowercase();
                !name.is_empty() && self.usernames.iter().any(|u| *u == name)
            }
            None => false,
        }
    }
}

/// Complete bot configuration.
#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    pub channel: ChannelRef,
    pub admins: AdminAllowList,
    pub database_path: String,
    pub port: u16,
    pub webhook_path: String,
    pub webhook_url: Option<String>,
    pub trigger_phrase: String,
    pub gate_timeout: Duration,
    pub db_timeout: Duration,
    pub bot_api_url: Option<String>,
    pub log_file_path: Option<String>,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when `BOT_TOKEN`/`TELOXIDE_TOKEN` or
    /// `DATABASE_PATH` is missing, or a numeric setting does not parse.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = non_empty("BOT_TOKEN")
            .or_else(|| non_empty("TELOXIDE_TOKEN"))
            .ok_or_else(|| AppError::Config("BOT_TOKEN is not set".to_string()))?;

        let database_path =
            non_empty("DATABASE_PATH").ok_or_else(|| AppError::Config("DATABASE_PATH is not set".to_string()))?;

        let channel = ChannelRef::parse(&non_empty("CHANNEL_USERNAME").unwrap_or_else(|| DEFAULT_CHANNEL.to_string()))?;

        let admins = AdminAllowList::parse(&lookup("ADMIN_USERNAMES").unwrap_or_default());

        let port = parse_number(non_empty("PORT"), "PORT", DEFAULT_PORT)?;
        let gate_timeout = Duration::from_secs(parse_number(
            non_empty("GATE_TIMEOUT_SECS"),
            "GATE_TIMEOUT_SECS",
            timeouts::GATE_TIMEOUT_SECS,
        )?);
        let db_timeout = Duration::from_secs(parse_number(
            non_empty("DB_TIMEOUT_SECS"),
            "DB_TIMEOUT_SECS",
            timeouts::DB_TIMEOUT_SECS,
        )?);

        let path_from_token = non_empty("WEBHOOK_PATH_FROM_TOKEN")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let webhook_path = if path_from_token {
            format!("{}/{}", DEFAULT_WEBHOOK_PATH, token)
        } else {
            normalize_path(&non_empty("WEBHOOK_PATH").unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string()))
        };

        let trigger_phrase = non_empty("TRIGGER_PHRASE").unwrap_or_else(|| DEFAULT_TRIGGER_PHRASE.to_string());

        Ok(Config {
            bot_token: SecretString::from(token),
            channel,
            admins,
            database_path,
            port,
            webhook_path,
            webhook_url: non_empty("WEBHOOK_URL"),
            trigger_phrase,
            gate_timeout,
            db_timeout,
            bot_api_url: non_empty("BOT_API_URL"),
            log_file_path: non_empty("LOG_FILE_PATH"),
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> AppResult<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got {:?}", key, value))),
        None => Ok(default),
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "123:abc"), ("DATABASE_PATH", "p.db")])).unwrap();

        assert_eq!(config.bot_token.expose_secret(), "123:abc");
        assert_eq!(config.channel, ChannelRef::Username("MM_studio_spb".to_string()));
        assert_eq!(config.port, 10000);
        assert_eq!(config.webhook_path, "/webhook");
        assert_eq!(config.trigger_phrase, "участвую");
        assert_eq!(config.gate_timeout, Duration::from_secs(5));
        assert!(config.admins.is_empty());
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_PATH", "p.db")])).unwrap_err();
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    fn test_missing_database_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "t")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_PATH"));
    }

    #[test]
    fn test_teloxide_token_fallback() {
        let config = Config::from_lookup(lookup_from(&[("TELOXIDE_TOKEN", "t2"), ("DATABASE_PATH", "p.db")])).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "t2");
    }

    #[test]
    fn test_bad_port() {
        let err =
            Config::from_lookup(lookup_from(&[("BOT_TOKEN", "t"), ("DATABASE_PATH", "p"), ("PORT", "abc")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_token_derived_webhook_path() {
        let config = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "42:secret"),
            ("DATABASE_PATH", "p"),
            ("WEBHOOK_PATH_FROM_TOKEN", "true"),
        ]))
        .unwrap();
        assert_eq!(config.webhook_path, "/webhook/42:secret");
    }

    #[test]
    fn test_custom_webhook_path_gets_leading_slash() {
        let config =
            Config::from_lookup(lookup_from(&[("BOT_TOKEN", "t"), ("DATABASE_PATH", "p"), ("WEBHOOK_PATH", "hook")]))
                .unwrap();
        assert_eq!(config.webhook_path, "/hook");
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(
            ChannelRef::parse("@my_channel").unwrap(),
            ChannelRef::Username("my_channel".to_string())
        );
        assert_eq!(ChannelRef::parse("-1001234").unwrap(), ChannelRef::Id(-1001234));
        assert!(ChannelRef::parse("  @ ").is_err());
        assert_eq!(
            ChannelRef::Username("x".into()).public_link().as_deref(),
            Some("https://t.me/x")
        );
        assert_eq!(ChannelRef::Id(-1).public_link(), None);
    }

    #[test]
    fn test_admin_allow_list() {
        let admins = AdminAllowList::parse("M_M_nails, @N_a_i_t,12345\n");

        assert_eq!(admins.len(), 3);
        assert!(admins.allows(1, Some("m_m_nails")));
        assert!(admins.allows(1, Some("@N_A_I_T")));
        assert!(admins.allows(12345, None));
        assert!(!admins.allows(2, Some("someone")));
        assert!(!admins.allows(2, None));
        assert!(!admins.allows(2, Some("")));
    }

    #[test]
    fn test_empty_admin_list() {
        let admins = AdminAllowList::parse(" , ,");
        assert!(admins.is_empty());
        assert!(!admins.allows(0, Some("")));
    }
}
