//! Domain types shared by the store, the workflow and the listing

use chrono::{DateTime, Utc};

/// Identity and display metadata of an inbound Telegram user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Telegram user id
    pub user_id: i64,
    /// Public username without `@`
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserProfile {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            username: None,
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_names(mut self, first_name: Option<&str>, last_name: Option<&str>) -> Self {
        self.first_name = first_name.map(str::to_string);
        self.last_name = last_name.map(str::to_string);
        self
    }

    /// How to address the user in a reply: `@username`, first name, or a generic word.
    pub fn mention(&self) -> String {
        if let Some(username) = non_blank(self.username.as_deref()) {
            return format!("@{}", username);
        }
        non_blank(self.first_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| "участник".to_string())
    }
}

/// One registered giveaway participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Participant number, assigned once at first registration
    pub number: i64,
    /// Telegram user id
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    /// Display string: `@username`, else `first last`, else the raw user id.
    pub fn display_name(&self) -> String {
        if let Some(username) = non_blank(self.username.as_deref()) {
            return format!("@{}", username);
        }

        let full_name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.user_id.to_string()
        } else {
            full_name.to_string()
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
