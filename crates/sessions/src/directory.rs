//! The session directory: who is talking on which broker session.
//!
//! Keyed by the platform's stable user id. The broker may rotate a user's
//! session code at any time; `record` replaces the current mapping so a
//! lookup only ever sees the most recent code. No history is kept.

use std::time::{SystemTime, UNIX_EPOCH};

use {async_trait::async_trait, tracing::debug};

use crate::error::Result;

/// The current correlation between one platform user and one broker session.
#[derive(Debug, Clone)]
pub struct SessionMapping {
    pub platform_user_id: String,
    pub session_code: String,
    /// Unix millis at which this mapping was (re)created.
    pub created_at: i64,
}

#[derive(sqlx::FromRow)]
struct MappingRow {
    platform_user_id: String,
    session_code: String,
    created_at: i64,
}

impl From<MappingRow> for SessionMapping {
    fn from(r: MappingRow) -> Self {
        Self {
            platform_user_id: r.platform_user_id,
            session_code: r.session_code,
            created_at: r.created_at,
        }
    }
}

/// Persistent lookup/record surface the bridge talks to.
///
/// An unknown user is a normal case, not an error: `lookup` answers
/// `Ok(None)` for first-time users. `record` failures are surfaced so the
/// caller can log and carry on; the conversation survives without
/// persistence (the next turn simply re-creates the session broker-side).
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    async fn lookup(&self, platform_user_id: &str) -> Result<Option<String>>;
    async fn record(&self, session_code: &str, platform_user_id: &str) -> Result<()>;
}

/// SQLite-backed session directory.
///
/// Every operation checks a connection out of the pool for its own scope;
/// nothing holds a connection across calls.
pub struct SqliteSessionDirectory {
    pool: sqlx::SqlitePool,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl SqliteSessionDirectory {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the schema if it does not exist yet.
    pub async fn init(pool: &sqlx::SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS session_map (
                platform_user_id TEXT PRIMARY KEY,
                session_code     TEXT NOT NULL,
                created_at       INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fetch the full current mapping for a user.
    pub async fn get(&self, platform_user_id: &str) -> Result<Option<SessionMapping>> {
        let row = sqlx::query_as::<_, MappingRow>(
            "SELECT platform_user_id, session_code, created_at FROM session_map \
             WHERE platform_user_id = ?",
        )
        .bind(platform_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl SessionDirectory for SqliteSessionDirectory {
    async fn lookup(&self, platform_user_id: &str) -> Result<Option<String>> {
        let code = sqlx::query_scalar::<_, String>(
            "SELECT session_code FROM session_map WHERE platform_user_id = ?",
        )
        .bind(platform_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(code)
    }

    async fn record(&self, session_code: &str, platform_user_id: &str) -> Result<()> {
        let now = now_ms();
        sqlx::query(
            r#"INSERT INTO session_map (platform_user_id, session_code, created_at)
               VALUES (?, ?, ?)
               ON CONFLICT(platform_user_id) DO UPDATE SET
                 session_code = excluded.session_code,
                 created_at = excluded.created_at"#,
        )
        .bind(platform_user_id)
        .bind(session_code)
        .bind(now)
        .execute(&self.pool)
        .await?;
        debug!(platform_user_id, session_code, "session mapping recorded");
        Ok(())
    }
}
