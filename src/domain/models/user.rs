//! Users and their types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An application user. The password hash never leaves the process.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub id_type_user: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id_type_user: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Registration payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub id_type_user: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login payload. `email` is accepted as an alias of the login name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    pub fn login(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// JWT claims issued on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub exp: i64,
}

/// Successful login result.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: 1,
            id_type_user: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ana");
    }

    #[test]
    fn test_login_prefers_username() {
        let creds: Credentials =
            serde_json::from_str(r#"{"email": "ana@example.com", "password": "x"}"#).unwrap();
        assert_eq!(creds.login(), Some("ana@example.com"));

        let creds: Credentials =
            serde_json::from_str(r#"{"username": "ana", "email": "other", "password": "x"}"#).unwrap();
        assert_eq!(creds.login(), Some("ana"));

        let creds: Credentials = serde_json::from_str(r#"{"username": "  "}"#).unwrap();
        assert_eq!(creds.login(), None);
    }
}
