use crate::db::models::{ConversationMessage, ConversationSummary, Stats};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::escalation;
use serde::Serialize;
use tracing::{info, warn};

/// Identity of a verified admin; never carries the password hash.
#[derive(Debug, Serialize, PartialEq)]
pub struct AdminIdentity {
    pub id: i64,
    pub username: String,
}

pub fn login(db: &Database, username: &str, password: &str) -> Result<AdminIdentity> {
    match db.verify_user(username, password)? {
        Some(user) => Ok(AdminIdentity {
            id: user.id,
            username: user.username,
        }),
        None => {
            warn!(username, "admin login rejected");
            Err(Error::InvalidInput("invalid username or password".into()))
        }
    }
}

pub fn list_conversations(db: &Database) -> Result<Vec<ConversationSummary>> {
    Ok(db.list_conversations()?)
}

pub fn get_stats(db: &Database) -> Result<Stats> {
    Ok(db.stats()?)
}

/// Answer a specific escalated message in place.
pub fn reply_to_message(
    db: &Database,
    conversation_id: &str,
    message_id: i64,
    reply: &str,
) -> Result<ConversationMessage> {
    escalation::save_admin_reply(db, conversation_id, message_id, reply)
}

/// Post a standalone admin message at the end of an escalated conversation.
pub fn post_admin_message(
    db: &Database,
    conversation_id: &str,
    text: &str,
) -> Result<ConversationMessage> {
    escalation::add_admin_message(db, conversation_id, text)
}

/// Seed the admin account on first start.
pub fn ensure_admin(db: &Database, username: &str, password: &str) -> Result<bool> {
    let created = db.ensure_admin_user(username, password)?;
    if created {
        info!(username, "default admin user created");
    }
    Ok(created)
}
