use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "welcome_message";
pub const FALLBACK_MESSAGE: &str = "fallback_message";
pub const TONE_INSTRUCTIONS: &str = "tone_instructions";

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! How can I help you today?";
pub const DEFAULT_FALLBACK_MESSAGE: &str = "I apologize, but I don't have enough information to answer this question. Please contact support for further assistance.";
pub const DEFAULT_TONE_INSTRUCTIONS: &str =
    "Respond in a friendly and helpful tone in English. Be clear and concise in your responses.";

/// One row of the conversation log.
///
/// A user turn has non-empty `user_text`; an admin-only turn has empty
/// `user_text` and an `admin_reply`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConversationMessage {
    pub id: i64,
    pub conversation_id: String,
    pub user_text: String,
    pub model_response: String,
    pub needs_human: bool,
    pub admin_reply: Option<String>,
    pub timestamp: String,
}

impl ConversationMessage {
    pub fn is_admin_only(&self) -> bool {
        self.user_text.is_empty() && self.admin_reply.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub message_count: i64,
    pub last_message_time: String,
    pub has_escalation: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Stats {
    pub total_conversations: i64,
    pub total_messages: i64,
    pub human_escalations: i64,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Admin-editable copy read before every generation call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub welcome_message: String,
    pub fallback_message: String,
    pub tone_instructions: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            tone_instructions: DEFAULT_TONE_INSTRUCTIONS.to_string(),
        }
    }
}
