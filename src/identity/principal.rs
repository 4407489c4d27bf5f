use serde::{Deserialize, Serialize};

use crate::security::Role;

/// The signed-in user as seen by the rest of the application. Never carries a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Role display name as stored; may be a name outside the known role set.
    pub role: String,
    /// ISO-8601 UTC, millisecond precision.
    pub created_at: String,
}

impl Identity {
    pub fn known_role(&self) -> Option<Role> { Role::parse(&self.role) }
}

/// Stored account, the identity plus its password (plain text or an Argon2 PHC string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

impl CredentialRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Seeded demo login, shown on the login screen for autofill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestCredential {
    pub username: &'static str,
    pub password: &'static str,
    pub role: Role,
}
