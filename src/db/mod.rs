pub mod models;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use models::{
    ConversationMessage, ConversationSummary, Settings, Stats, User, DEFAULT_FALLBACK_MESSAGE,
    DEFAULT_TONE_INSTRUCTIONS, DEFAULT_WELCOME_MESSAGE, FALLBACK_MESSAGE, TONE_INSTRUCTIONS,
    WELCOME_MESSAGE,
};
use rand::rngs::OsRng;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, user_text, model_response, needs_human, admin_reply, timestamp";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self::from_connection(Connection::open(path)?)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                user_text TEXT NOT NULL,
                model_response TEXT NOT NULL,
                needs_human INTEGER NOT NULL DEFAULT 0,
                admin_reply TEXT,
                timestamp TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation_id
                ON messages(conversation_id);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL
            );
            ",
        )?;

        for (key, value) in [
            (WELCOME_MESSAGE, DEFAULT_WELCOME_MESSAGE),
            (FALLBACK_MESSAGE, DEFAULT_FALLBACK_MESSAGE),
            (TONE_INSTRUCTIONS, DEFAULT_TONE_INSTRUCTIONS),
        ] {
            conn.execute(
                "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        Ok(())
    }

    // ── Messages ──

    pub fn append_message(
        &self,
        conversation_id: &str,
        user_text: &str,
        model_response: &str,
        needs_human: bool,
        admin_reply: Option<&str>,
    ) -> Result<ConversationMessage> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO messages (conversation_id, user_text, model_response, needs_human, admin_reply)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, user_text, model_response, needs_human, admin_reply],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
            params![id],
            message_from_row,
        )
    }

    /// Messages of one conversation, oldest first.
    pub fn get_messages(&self, conversation_id: &str) -> Result<Vec<ConversationMessage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1 ORDER BY timestamp ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![conversation_id], message_from_row)?;
        rows.collect()
    }

    pub fn get_message(&self, id: i64) -> Result<Option<ConversationMessage>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
            params![id],
            message_from_row,
        )
        .optional()
    }

    /// Attach an admin reply to a message of `conversation_id`.
    ///
    /// Returns `false` when no such message exists in that conversation.
    pub fn set_admin_reply(
        &self,
        conversation_id: &str,
        message_id: i64,
        reply: &str,
    ) -> Result<bool> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE messages SET admin_reply = ?1 WHERE id = ?2 AND conversation_id = ?3",
            params![reply, message_id, conversation_id],
        )?;
        Ok(changed > 0)
    }

    pub fn conversation_needs_human(&self, conversation_id: &str) -> Result<bool> {
        let conn = self.conn();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE conversation_id = ?1 AND needs_human = 1)",
            params![conversation_id],
            |row| row.get(0),
        )
    }

    /// One summary per conversation, most recently active first.
    pub fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT conversation_id,
                    COUNT(*) AS message_count,
                    MAX(timestamp) AS last_message_time,
                    MAX(needs_human) AS has_escalation
             FROM messages
             GROUP BY conversation_id
             ORDER BY last_message_time DESC, MAX(id) DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ConversationSummary {
                conversation_id: row.get(0)?,
                message_count: row.get(1)?,
                last_message_time: row.get(2)?,
                has_escalation: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    pub fn stats(&self) -> Result<Stats> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(DISTINCT conversation_id),
                    COUNT(*),
                    COALESCE(SUM(needs_human), 0)
             FROM messages",
            [],
            |row| {
                Ok(Stats {
                    total_conversations: row.get(0)?,
                    total_messages: row.get(1)?,
                    human_escalations: row.get(2)?,
                })
            },
        )
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_settings(&self) -> Result<HashMap<String, String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect()
    }

    /// Typed settings; missing or empty values fall back to the defaults.
    pub fn settings(&self) -> Result<Settings> {
        let mut map = self.get_settings()?;
        let mut take = |key: &str, default: &str| {
            map.remove(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Ok(Settings {
            welcome_message: take(WELCOME_MESSAGE, DEFAULT_WELCOME_MESSAGE),
            fallback_message: take(FALLBACK_MESSAGE, DEFAULT_FALLBACK_MESSAGE),
            tone_instructions: take(TONE_INSTRUCTIONS, DEFAULT_TONE_INSTRUCTIONS),
        })
    }

    // ── Users ──

    pub fn create_user(&self, username: &str, password: &str) -> crate::error::Result<User> {
        let hash = hash_password(password)?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, hash],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: hash,
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()
    }

    /// Check a username/password pair. Unknown users simply fail to verify.
    pub fn verify_user(
        &self,
        username: &str,
        password: &str,
    ) -> crate::error::Result<Option<User>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| crate::error::Error::Password(e.to_string()))?;
        let ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        Ok(ok.then_some(user))
    }

    /// Create the admin account unless it already exists. Returns whether it was created.
    pub fn ensure_admin_user(&self, username: &str, password: &str) -> crate::error::Result<bool> {
        if self.get_user_by_username(username)?.is_some() {
            return Ok(false);
        }
        self.create_user(username, password)?;
        Ok(true)
    }
}

fn hash_password(password: &str) -> crate::error::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| crate::error::Error::Password(e.to_string()))
}

fn message_from_row(row: &Row<'_>) -> Result<ConversationMessage> {
    Ok(ConversationMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        user_text: row.get(2)?,
        model_response: row.get(3)?,
        needs_human: row.get(4)?,
        admin_reply: row.get(5)?,
        timestamp: row.get(6)?,
    })
}
