use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStorage;

/// Local storage key holding the session.
pub const AUTH_STORAGE_KEY: &str = "sb-auth-token";

/// Access tokens expire after 60 minutes.
const TOKEN_EXPIRY_MINUTES: i64 = 60;

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub access_token: String,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: user_id.into(),
            email: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at()
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        let refresh_at = self.created_at
            + Duration::minutes(TOKEN_EXPIRY_MINUTES - TOKEN_REFRESH_BUFFER_MINUTES);
        Utc::now() > refresh_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at() - Utc::now()).num_minutes().max(0)
    }
}

pub struct Session {
    storage: Arc<dyn KeyValueStorage>,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            data: None,
        }
    }

    /// Load the session from storage. Returns true when a valid session was found.
    pub fn load(&mut self) -> Result<bool> {
        let Some(contents) = self.storage.get(AUTH_STORAGE_KEY)? else {
            return Ok(false);
        };
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse stored session")?;

        if data.is_expired() {
            return Ok(false);
        }
        self.data = Some(data);
        Ok(true)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let contents = serde_json::to_string(data)?;
            self.storage
                .set(AUTH_STORAGE_KEY, &contents)
                .context("Failed to store session")?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        self.storage.remove(AUTH_STORAGE_KEY)?;
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if the session is valid
    pub fn token(&self) -> Option<&str> {
        self.data
            .as_ref()
            .filter(|d| !d.is_expired())
            .map(|d| d.access_token.as_str())
    }

    pub fn is_valid(&self) -> bool {
        self.token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn storage() -> Arc<dyn KeyValueStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn test_save_and_load() {
        let storage = storage();
        let mut session = Session::new(storage.clone());
        session.update(SessionData::new("jwt-abc", "user-1"));
        session.save().unwrap();

        let mut reloaded = Session::new(storage);
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.token(), Some("jwt-abc"));
    }

    #[test]
    fn test_expired_session_is_not_loaded() {
        let storage = storage();
        let mut data = SessionData::new("jwt-old", "user-1");
        data.created_at = Utc::now() - Duration::minutes(TOKEN_EXPIRY_MINUTES + 1);
        storage
            .set(AUTH_STORAGE_KEY, &serde_json::to_string(&data).unwrap())
            .unwrap();

        let mut session = Session::new(storage);
        assert!(!session.load().unwrap());
        assert!(!session.is_valid());
    }

    #[test]
    fn test_needs_refresh_near_expiry() {
        let mut data = SessionData::new("jwt", "user-1");
        assert!(!data.needs_refresh());
        data.created_at = Utc::now() - Duration::minutes(TOKEN_EXPIRY_MINUTES - 2);
        assert!(data.needs_refresh());
        assert!(!data.is_expired());
        assert!(data.minutes_until_expiry() <= 2);
    }

    #[test]
    fn test_clear_removes_stored_session() {
        let storage = storage();
        let mut session = Session::new(storage.clone());
        session.update(SessionData::new("jwt", "user-1"));
        session.save().unwrap();
        session.clear().unwrap();

        assert!(storage.get(AUTH_STORAGE_KEY).unwrap().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_missing_session() {
        let mut session = Session::new(storage());
        assert!(!session.load().unwrap());
    }
}
