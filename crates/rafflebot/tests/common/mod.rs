//! Common test utilities
//!
//! Shared by the integration tests of the bot crate.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tempfile::TempDir;

use rafflebot::telegram::{HandlerDeps, Messenger};
use rafflebot::webhook::router;
use rafflecore::config::{AdminAllowList, ChannelRef};
use rafflecore::error::{AppError, AppResult};
use rafflecore::gate::{MemberStatus, MembershipAuthority, MembershipGate};
use rafflecore::storage::{create_pool, DbPool, SqliteParticipantStore};
use rafflecore::{AdminListing, RegistrationWorkflow};

pub const BOT_USERNAME: &str = "raffle_bot";
pub const WEBHOOK_PATH: &str = "/webhook";
pub const TRIGGER: &str = "участвую";

/// One message captured by [`RecordingMessenger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub html: bool,
}

/// Messenger that records instead of sending; can be told to fail.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<SentMessage>>,
    pub failing: AtomicBool,
}

impl RecordingMessenger {
    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, chat_id: i64, text: &str, html: bool) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Messaging("chat not found".to_string()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            html,
        });
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_html(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.record(chat_id, text, true)
    }

    async fn send_plain(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.record(chat_id, text, false)
    }
}

/// Membership authority with a switch for "subscribed".
pub struct FakeChannel {
    pub subscribed: AtomicBool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl MembershipAuthority for FakeChannel {
    async fn member_status(&self, _user_id: i64) -> AppResult<MemberStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.subscribed.load(Ordering::SeqCst) {
            Ok(MemberStatus::Member)
        } else {
            Ok(MemberStatus::Left)
        }
    }
}

/// Router wired to a temporary SQLite database and fakes for Telegram.
pub struct TestApp {
    pub router: Router,
    pub messenger: Arc<RecordingMessenger>,
    pub channel: Arc<FakeChannel>,
    pub pool: Arc<DbPool>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(admins: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("participants.db");
        let pool = Arc::new(create_pool(path.to_str().unwrap(), Duration::from_secs(2)).unwrap());
        let store = Arc::new(SqliteParticipantStore::new(Arc::clone(&pool), Duration::from_secs(2)));

        let channel = Arc::new(FakeChannel {
            subscribed: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        });
        let gate = MembershipGate::new(channel.clone(), Duration::from_secs(1));
        let messenger = Arc::new(RecordingMessenger::default());

        let deps = HandlerDeps {
            registration: Arc::new(RegistrationWorkflow::new(store.clone(), gate)),
            listing: Arc::new(AdminListing::new(store, AdminAllowList::parse(admins))),
            messenger: messenger.clone(),
            bot_username: BOT_USERNAME.to_string(),
            channel: ChannelRef::Username("MM_studio_spb".to_string()),
            trigger_phrase: TRIGGER.to_string(),
        };

        Self {
            router: router(deps, WEBHOOK_PATH),
            messenger,
            channel,
            pool,
            _dir: dir,
        }
    }

    pub fn participant_count(&self) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))
            .unwrap()
    }
}

/// Telegram update JSON for a private text message.
pub fn message_update(update_id: i32, user_id: i64, username: Option<&str>, text: &str) -> serde_json::Value {
    let mut from = serde_json::json!({
        "id": user_id,
        "is_bot": false,
        "first_name": "Ann",
    });
    if let Some(username) = username {
        from["username"] = serde_json::Value::String(username.to_string());
    }

    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1_700_000_000,
            "chat": { "id": user_id, "type": "private", "first_name": "Ann" },
            "from": from,
            "text": text,
        }
    })
}
