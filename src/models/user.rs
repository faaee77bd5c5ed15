// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'users' table: the application profile of an identity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl User {
    /// Builds the profile row for an identity, deriving the username from the email.
    pub fn for_identity(id: Uuid, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            username: username_from_email(email),
        }
    }
}

/// Local part of an email address. An address without '@' is used as-is.
pub fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

/// Represents the 'auth_identities' table owned by the auth provider.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,

    /// Argon2 password hash.
    pub password_hash: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'auth_sessions' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub revoked_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// The user resolved from a valid session token.
/// Injected into request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub session_id: Uuid,
}

/// Optional viewer of a public route.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

/// DTO for password sign-up and sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
}

impl Credentials {
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Response body of a successful sign-up or sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub user: AuthUser,
}

/// Response body of `GET /api/auth/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: Option<Session>,
    pub user: Option<AuthUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_local_part() {
        assert_eq!(username_from_email("ana.lopez@example.com"), "ana.lopez");
        assert_eq!(username_from_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn email_is_normalized() {
        let creds = Credentials {
            email: "  Ana@Example.COM ".into(),
            password: "password123".into(),
        };
        assert_eq!(creds.normalized_email(), "ana@example.com");
    }
}
