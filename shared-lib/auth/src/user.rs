//! User records and the store contract the token logic relies on.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::global_id::GlobalId;

/// Type tag used when encoding user ids as global ids.
pub const USER_TYPE_NAME: &str = "User";

/// A storefront account as seen by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    /// Create an active customer account with no elevated flags.
    pub fn new(id: i64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            permissions: Vec::new(),
        }
    }

    pub fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// External-facing identity reference (`base64("User:<id>")`).
    pub fn global_id(&self) -> String {
        GlobalId::new(USER_TYPE_NAME, self.id.to_string()).encode()
    }
}

/// Lookup contract for the external user store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find an active user by email. Inactive users must not be returned.
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// In-memory user store for testing and development
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user, keyed by id.
    pub fn upsert(&self, user: User) -> Result<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow!("user store lock poisoned"))?;
        users.retain(|u| u.id != user.id);
        users.push(user);
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("user store lock poisoned"))?;
        Ok(users
            .iter()
            .find(|u| u.is_active && u.email == email)
            .cloned())
    }
}
