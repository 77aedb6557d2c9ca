//! # Users
//!
//! User accounts keyed by email. The role flag decides access to admin
//! routes; everything else on a user is a free-form profile.

use crate::error::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields a client may never set through a profile or registration body
const PROTECTED_FIELDS: [&str; 3] = ["_id", "email", "role"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Unique key (checked before insert, not enforced by the store)
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub role: Role,

    /// Profile fields (location, phone, education, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: None,
            role: Role::User,
            extra: Map::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Registration body
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewUser {
    /// Build a default-role user; a client-supplied role is ignored
    pub fn into_user(mut self) -> MarketResult<User> {
        let email = normalize_email(&self.email)?;
        strip_protected(&mut self.extra);
        Ok(User {
            id: None,
            email,
            name: self.name,
            role: Role::User,
            extra: self.extra,
        })
    }
}

/// Profile fields applied with `$set` semantics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn sanitized(mut self) -> MarketResult<Self> {
        strip_protected(&mut self.extra);
        if self.name.is_none() && self.extra.is_empty() {
            return Err(MarketError::InvalidRequest("no profile fields to update".to_string()));
        }
        Ok(self)
    }
}

/// Trim and lowercase an email, rejecting obviously malformed ones
pub fn normalize_email(email: &str) -> MarketResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(MarketError::InvalidRequest(format!("invalid email: {}", email))),
    }
}

fn strip_protected(fields: &mut Map<String, Value>) {
    for key in PROTECTED_FIELDS {
        fields.remove(key);
    }
}
