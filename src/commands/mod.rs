pub mod admin;
pub mod chat;
pub mod knowledge;
pub mod settings;
