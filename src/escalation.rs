//! Per-conversation escalation to a human.
//!
//! A conversation is escalated once any of its messages carries
//! `needs_human`. The state is derived from the log on every read and never
//! reverts; admin replies append to the log without changing it.

use crate::db::models::ConversationMessage;
use crate::db::Database;
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::info;

/// Phrases that route a conversation straight to a human.
const REFUND_KEYWORDS: &[&str] = &["refund", "money back"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Normal,
    Escalated,
}

/// Outcome of gating one incoming user message.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    /// Not escalated; the message should be answered by the model.
    Proceed,
    /// Persisted for a human. `newly_escalated` is false when the
    /// conversation was already waiting.
    AwaitingHuman {
        message: ConversationMessage,
        newly_escalated: bool,
    },
}

pub fn contains_refund_intent(text: &str) -> bool {
    let lower = text.to_lowercase();
    REFUND_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn conversation_state(db: &Database, conversation_id: &str) -> Result<ConversationState> {
    Ok(if db.conversation_needs_human(conversation_id)? {
        ConversationState::Escalated
    } else {
        ConversationState::Normal
    })
}

/// Decide whether `text` may reach the model.
///
/// Escalated conversations and refund requests are persisted here with an
/// empty response and `needs_human` set; `Proceed` persists nothing.
pub fn gate(db: &Database, conversation_id: &str, text: &str) -> Result<Gate> {
    if conversation_state(db, conversation_id)? == ConversationState::Escalated {
        let message = db.append_message(conversation_id, text, "", true, None)?;
        return Ok(Gate::AwaitingHuman {
            message,
            newly_escalated: false,
        });
    }

    if contains_refund_intent(text) {
        let message = db.append_message(conversation_id, text, "", true, None)?;
        info!(conversation_id, "conversation escalated to a human");
        return Ok(Gate::AwaitingHuman {
            message,
            newly_escalated: true,
        });
    }

    Ok(Gate::Proceed)
}

fn require_escalated(db: &Database, conversation_id: &str) -> Result<()> {
    match conversation_state(db, conversation_id)? {
        ConversationState::Escalated => Ok(()),
        ConversationState::Normal => Err(Error::InvalidState(format!(
            "conversation {} does not require human intervention",
            conversation_id
        ))),
    }
}

fn admin_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput("admin reply must not be empty".into()));
    }
    Ok(text)
}

/// Attach an admin reply to an existing message of an escalated conversation.
pub fn save_admin_reply(
    db: &Database,
    conversation_id: &str,
    message_id: i64,
    reply: &str,
) -> Result<ConversationMessage> {
    let reply = admin_text(reply)?;
    require_escalated(db, conversation_id)?;

    if !db.set_admin_reply(conversation_id, message_id, reply)? {
        return Err(Error::MessageNotFound {
            conversation_id: conversation_id.to_string(),
            message_id,
        });
    }
    info!(conversation_id, message_id, "admin reply saved");
    db.get_message(message_id)?.ok_or_else(|| Error::MessageNotFound {
        conversation_id: conversation_id.to_string(),
        message_id,
    })
}

/// Append an admin-only message to an escalated conversation.
pub fn add_admin_message(
    db: &Database,
    conversation_id: &str,
    text: &str,
) -> Result<ConversationMessage> {
    let text = admin_text(text)?;
    require_escalated(db, conversation_id)?;

    let message = db.append_message(conversation_id, "", "", true, Some(text))?;
    info!(conversation_id, message_id = message.id, "admin message added");
    Ok(message)
}
