use crate::chat::ChatReply;
use crate::db::models::{ConversationMessage, DEFAULT_WELCOME_MESSAGE, WELCOME_MESSAGE};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::AppState;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub conversation_id: String,
    pub needs_human: bool,
    pub messages: Vec<ConversationMessage>,
}

pub async fn send_message(
    state: &AppState,
    conversation_id: &str,
    content: &str,
) -> Result<ChatReply> {
    state.chat.respond(conversation_id, content).await
}

/// Full message log of a conversation, including admin replies.
pub fn get_conversation(db: &Database, conversation_id: &str) -> Result<ConversationView> {
    if conversation_id.trim().is_empty() {
        return Err(Error::InvalidInput("conversation id is required".into()));
    }
    Ok(ConversationView {
        conversation_id: conversation_id.to_string(),
        needs_human: db.conversation_needs_human(conversation_id)?,
        messages: db.get_messages(conversation_id)?,
    })
}

pub fn get_welcome_message(db: &Database) -> Result<String> {
    Ok(db
        .get_setting(WELCOME_MESSAGE)?
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation;

    #[test]
    fn conversation_view_reports_escalation() {
        let db = Database::open_in_memory().unwrap();
        db.append_message("c1", "hi", "hello", false, None).unwrap();
        assert!(!get_conversation(&db, "c1").unwrap().needs_human);

        escalation::gate(&db, "c1", "refund").unwrap();
        escalation::add_admin_message(&db, "c1", "Sure thing").unwrap();

        let view = get_conversation(&db, "c1").unwrap();
        assert!(view.needs_human);
        assert_eq!(view.messages.len(), 3);
        assert!(view.messages[2].is_admin_only());
    }

    #[test]
    fn welcome_message_defaults() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(get_welcome_message(&db).unwrap(), DEFAULT_WELCOME_MESSAGE);
        db.set_setting(WELCOME_MESSAGE, "Hi there!").unwrap();
        assert_eq!(get_welcome_message(&db).unwrap(), "Hi there!");
    }
}
