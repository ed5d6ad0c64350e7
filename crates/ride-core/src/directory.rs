//! Passenger and driver profiles.
//!
//! Accounts are managed elsewhere; the lifecycle only needs to know that an
//! id exists and how to describe the person in a notification.

use crate::ride::UserId;
use crate::store::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Public profile of a passenger or driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn new(id: UserId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
        }
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Display name shown to the other party.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Lookup of passenger and driver accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_passenger(&self, id: UserId) -> Result<Option<Profile>, StoreError>;

    async fn find_driver(&self, id: UserId) -> Result<Option<Profile>, StoreError>;
}

/// In-process directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    passengers: DashMap<UserId, Profile>,
    drivers: DashMap<UserId, Profile>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_passenger(&self, profile: Profile) {
        self.passengers.insert(profile.id, profile);
    }

    pub fn add_driver(&self, profile: Profile) {
        self.drivers.insert(profile.id, profile);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_passenger(&self, id: UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.passengers.get(&id).map(|p| p.clone()))
    }

    async fn find_driver(&self, id: UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.drivers.get(&id).map(|p| p.clone()))
    }
}
