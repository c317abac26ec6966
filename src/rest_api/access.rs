//! # Access Control
//!
//! Reads are open to everyone. Writes need an `x-api-key` header holding
//! either the admin key or a key registered with the admin role.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

/// Role attached to a registered API key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Access denied - API Key required")]
    KeyRequired,

    #[error("Access denied - API Key invalid")]
    KeyInvalid,

    #[error("Access denied - Account does not have write access")]
    WriteDenied,
}

/// Decides whether a caller may perform an operation.
pub trait AccessPolicy: Send + Sync {
    fn authorize_read(&self, _api_key: Option<&str>) -> Result<(), AccessError> {
        Ok(())
    }

    fn authorize_write(&self, api_key: Option<&str>) -> Result<(), AccessError>;

    fn authorize(&self, api_key: Option<&str>, capability: Capability) -> Result<(), AccessError> {
        match capability {
            Capability::Read => self.authorize_read(api_key),
            Capability::Write => self.authorize_write(api_key),
        }
    }
}

/// API key policy backed by an admin key and a key → role table.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyPolicy {
    admin_key: Option<String>,
    keys: HashMap<String, Role>,
}

impl ApiKeyPolicy {
    pub fn new(admin_key: Option<String>) -> Self {
        Self {
            admin_key: admin_key.filter(|key| !key.is_empty()),
            keys: HashMap::new(),
        }
    }

    pub fn with_keys(mut self, keys: HashMap<String, Role>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>, role: Role) -> Self {
        self.keys.insert(key.into(), role);
        self
    }

    fn role_of(&self, key: &str) -> Option<Role> {
        if self
            .admin_key
            .as_deref()
            .is_some_and(|admin| constant_time_eq(admin, key))
        {
            return Some(Role::Admin);
        }
        self.keys
            .iter()
            .find(|(candidate, _)| constant_time_eq(candidate, key))
            .map(|(_, role)| *role)
    }
}

impl AccessPolicy for ApiKeyPolicy {
    fn authorize_write(&self, api_key: Option<&str>) -> Result<(), AccessError> {
        let key = api_key
            .filter(|key| !key.is_empty())
            .ok_or(AccessError::KeyRequired)?;

        match self.role_of(key) {
            Some(Role::Admin) => Ok(()),
            Some(Role::User) => Err(AccessError::WriteDenied),
            None => Err(AccessError::KeyInvalid),
        }
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
