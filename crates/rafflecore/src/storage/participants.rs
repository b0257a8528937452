//! Participant store: the record of who is registered and under which number.
//!
//! The SQLite implementation relies on a single
//! `INSERT … ON CONFLICT(user_id) DO UPDATE … RETURNING` statement for
//! registration, so concurrent upserts for the same user can never produce two
//! rows or two numbers. Blocking SQLite work runs on tokio's blocking pool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::storage::db::{get_connection, DbConnection, DbPool};
use crate::types::{Participant, UserProfile};

/// Format of the `created_at` column (same as SQLite's `CURRENT_TIMESTAMP`)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PARTICIPANT_COLUMNS: &str = "id, user_id, username, first_name, last_name, created_at";

/// Storage of record for giveaway participants.
///
/// Every method reports persistence failures as
/// [`AppError::StorageUnavailable`]; none of them fall back to empty results.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Looks up a participant by Telegram user id. No side effects.
    async fn find_by_user_id(&self, user_id: i64) -> AppResult<Option<Participant>>;

    /// Inserts a participant with the next number, or refreshes the display
    /// fields of the existing row. The number and registration time of an
    /// existing row never change.
    async fn upsert(&self, profile: &UserProfile) -> AppResult<Participant>;

    /// All participants ordered by number ascending.
    async fn list_all(&self) -> AppResult<Vec<Participant>>;
}

/// [`ParticipantStore`] backed by the SQLite connection pool.
#[derive(Clone)]
pub struct SqliteParticipantStore {
    pool: Arc<DbPool>,
    timeout: Duration,
}

impl SqliteParticipantStore {
    /// `timeout` bounds how long a caller waits for any single storage call.
    ///
    /// It does not cancel the call. A blocked write keeps waiting on the SQLite
    /// busy timeout after the caller got [`AppError::StorageTimeout`] and may
    /// still commit. The caller then reports a failure for a row that exists;
    /// the next attempt finds it with its original number.
    pub fn new(pool: Arc<DbPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn with_connection<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&DbConnection) -> AppResult<T> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        let task = tokio::task::spawn_blocking(move || {
            let conn = get_connection(&pool)?;
            op(&conn)
        });

        // Dropping the JoinHandle detaches the blocking task, it is not aborted
        match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(AppError::StorageTimeout(self.timeout)),
        }
    }
}

#[async_trait]
impl ParticipantStore for SqliteParticipantStore {
    async fn find_by_user_id(&self, user_id: i64) -> AppResult<Option<Participant>> {
        self.with_connection(move |conn| find_participant(conn, user_id)).await
    }

    async fn upsert(&self, profile: &UserProfile) -> AppResult<Participant> {
        let profile = profile.clone();
        self.with_connection(move |conn| upsert_participant(conn, &profile))
            .await
    }

    async fn list_all(&self) -> AppResult<Vec<Participant>> {
        self.with_connection(|conn| list_participants(conn)).await
    }
}

/// Returns the participant registered under `user_id`, if any.
pub fn find_participant(conn: &rusqlite::Connection, user_id: i64) -> AppResult<Option<Participant>> {
    let sql = format!("SELECT {} FROM participants WHERE user_id = ?1", PARTICIPANT_COLUMNS);
    let participant = conn
        .query_row(&sql, params![user_id], participant_from_row)
        .optional()?;
    Ok(participant)
}

/// Atomic insert-or-refresh. Returns the stored row.
pub fn upsert_participant(conn: &rusqlite::Connection, profile: &UserProfile) -> AppResult<Participant> {
    let sql = format!(
        "INSERT INTO participants (user_id, username, first_name, last_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id) DO UPDATE SET
             username = excluded.username,
             first_name = excluded.first_name,
             last_name = excluded.last_name
         RETURNING {}",
        PARTICIPANT_COLUMNS
    );
    let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();

    let participant = conn.query_row(
        &sql,
        params![
            profile.user_id,
            profile.username,
            profile.first_name,
            profile.last_name,
            now
        ],
        participant_from_row,
    )?;
    Ok(participant)
}

/// Every participant, ordered by number.
pub fn list_participants(conn: &rusqlite::Connection) -> AppResult<Vec<Participant>> {
    let sql = format!("SELECT {} FROM participants ORDER BY id ASC", PARTICIPANT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], participant_from_row)?;

    let mut participants = Vec::new();
    for row in rows {
        participants.push(row?);
    }
    Ok(participants)
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    let created_at: String = row.get(5)?;
    Ok(Participant {
        number: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        registered_at: parse_timestamp(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}
