use crate::db::models::{FALLBACK_MESSAGE, TONE_INSTRUCTIONS, WELCOME_MESSAGE};
use crate::db::Database;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;

const SETTING_KEYS: &[&str] = &[WELCOME_MESSAGE, FALLBACK_MESSAGE, TONE_INSTRUCTIONS];

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub welcome_message: Option<String>,
    pub fallback_message: Option<String>,
    pub tone_instructions: Option<String>,
}

pub fn get_settings(db: &Database) -> Result<HashMap<String, String>> {
    let mut map = db.get_settings()?;
    map.retain(|key, _| SETTING_KEYS.contains(&key.as_str()));
    Ok(map)
}

pub fn set_setting(db: &Database, key: &str, value: &str) -> Result<()> {
    if !SETTING_KEYS.contains(&key) {
        return Err(Error::InvalidInput(format!("Unknown setting key: {}", key)));
    }
    Ok(db.set_setting(key, value)?)
}

pub fn update_settings(db: &Database, update: SettingsUpdate) -> Result<HashMap<String, String>> {
    for (key, value) in [
        (WELCOME_MESSAGE, update.welcome_message),
        (FALLBACK_MESSAGE, update.fallback_message),
        (TONE_INSTRUCTIONS, update.tone_instructions),
    ] {
        if let Some(value) = value {
            db.set_setting(key, &value)?;
        }
    }
    get_settings(db)
}
