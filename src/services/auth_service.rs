//! User registration, login and bearer token verification.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AuthConfig, AuthSession, Claims, Credentials, NamedRef, NewUser, Registration, User};
use crate::domain::ports::UserRepository;

const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LEN: usize = 6;
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    config: AuthConfig,
}

fn required(value: Option<String>, field: &str) -> DomainResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(format!("{field} is required")))
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Whether business routes demand a bearer token.
    pub fn requires_auth(&self) -> bool {
        self.config.require_auth
    }

    pub async fn list_users(&self) -> DomainResult<Vec<NamedRef>> {
        self.users.list_summaries().await
    }

    #[instrument(skip(self, registration), err)]
    pub async fn register(&self, registration: Registration, now: DateTime<Utc>) -> DomainResult<User> {
        let id_type_user = registration
            .id_type_user
            .ok_or_else(|| DomainError::validation("id_type_user is required"))?;
        let name = required(registration.name, "name")?;
        let email = required(registration.email, "email")?;
        let username = required(registration.username, "username")?;
        let password = registration
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DomainError::validation("password is required"))?;

        if !email.contains('@') {
            return Err(DomainError::validation("email is not valid"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if !self.users.user_type_exists(id_type_user).await? {
            return Err(DomainError::validation(
                DomainError::not_found("User type", id_type_user).to_string(),
            ));
        }

        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
            .await
            .map_err(|e| DomainError::SerializationError(format!("password hashing aborted: {e}")))?
            .map_err(|e| DomainError::SerializationError(format!("password hashing failed: {e}")))?;

        let user = NewUser {
            id_type_user,
            name,
            email,
            username,
            password_hash,
        };
        let created = self.users.create(&user, now).await?;
        tracing::info!(user_id = created.id, "user registered");
        Ok(created)
    }

    #[instrument(skip(self, credentials), err)]
    pub async fn login(&self, credentials: Credentials, now: DateTime<Utc>) -> DomainResult<AuthSession> {
        let (Some(login), Some(password)) = (credentials.login(), credentials.password.as_deref()) else {
            return Err(DomainError::validation("username and password are required"));
        };

        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or_else(|| DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| DomainError::SerializationError(format!("password check aborted: {e}")))?
            .unwrap_or(false);
        if !matches {
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(&user, now)?;
        Ok(AuthSession { token, user })
    }

    /// Sign an HS256 token for `user` expiring `token_ttl_hours` after `now`.
    pub fn issue_token(&self, user: &User, now: DateTime<Utc>) -> DomainResult<String> {
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            exp: Duration::try_hours(self.config.token_ttl_hours)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| {
                    DomainError::validation(format!("token_ttl_hours out of range: {}", self.config.token_ttl_hours))
                })?
                .timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| DomainError::SerializationError(format!("token signing failed: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> DomainResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| DomainError::Unauthorized(format!("invalid token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteUserRepository};

    async fn setup_test_service() -> AuthService {
        let pool = create_migrated_test_pool().await.unwrap();
        AuthService::new(Arc::new(SqliteUserRepository::new(pool)), AuthConfig::default())
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            id_type_user: Some(2),
            name: Some("Ana Rojas".to_string()),
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn credentials(login: &str, password: &str) -> Credentials {
        Credentials {
            username: Some(login.to_string()),
            email: None,
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = setup_test_service().await;
        let user = service
            .register(registration("ana", "ana@example.com", "secreto"), Utc::now())
            .await
            .unwrap();
        assert_ne!(user.password_hash, "secreto");

        let session = service.login(credentials("ana", "secreto"), Utc::now()).await.unwrap();
        assert_eq!(session.user.id, user.id);

        let claims = service.verify_token(&session.token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.username, "ana");

        let by_email = service
            .login(credentials("ana@example.com", "secreto"), Utc::now())
            .await
            .unwrap();
        assert_eq!(by_email.user.id, user.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = setup_test_service().await;
        let cases = [
            registration("ana", "not-an-email", "secreto"),
            registration("ana", "ana@example.com", "12345"),
            registration("  ", "ana@example.com", "secreto"),
            Registration {
                id_type_user: Some(99),
                ..registration("ana", "ana@example.com", "secreto")
            },
        ];
        for case in cases {
            let err = service.register(case, Utc::now()).await.unwrap_err();
            assert!(matches!(err, DomainError::ValidationFailed(_)), "{err}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let service = setup_test_service().await;
        service
            .register(registration("ana", "ana@example.com", "secreto"), Utc::now())
            .await
            .unwrap();
        let err = service
            .register(registration("ana", "other@example.com", "secreto"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let service = setup_test_service().await;
        service
            .register(registration("ana", "ana@example.com", "secreto"), Utc::now())
            .await
            .unwrap();

        for creds in [credentials("ana", "wrong"), credentials("nobody", "secreto")] {
            let err = service.login(creds, Utc::now()).await.unwrap_err();
            assert!(matches!(&err, DomainError::Unauthorized(msg) if msg == INVALID_CREDENTIALS));
        }
    }

    #[tokio::test]
    async fn test_expired_and_foreign_tokens_are_rejected() {
        let service = setup_test_service().await;
        let user = service
            .register(registration("ana", "ana@example.com", "secreto"), Utc::now())
            .await
            .unwrap();

        let stale = service.issue_token(&user, Utc::now() - Duration::hours(48)).unwrap();
        assert!(service.verify_token(&stale).is_err());

        let other = AuthService::new(
            service.users.clone(),
            AuthConfig {
                jwt_secret: "another-secret".to_string(),
                ..AuthConfig::default()
            },
        );
        let foreign = other.issue_token(&user, Utc::now()).unwrap();
        assert!(service.verify_token(&foreign).is_err());
        assert!(service.verify_token("garbage").is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_token_lifetime_is_an_error() {
        let service = setup_test_service().await;
        let user = service
            .register(registration("ana", "ana@example.com", "secreto"), Utc::now())
            .await
            .unwrap();

        let unbounded = AuthService::new(
            service.users.clone(),
            AuthConfig {
                token_ttl_hours: i64::MAX,
                ..AuthConfig::default()
            },
        );
        assert!(matches!(
            unbounded.issue_token(&user, Utc::now()),
            Err(DomainError::ValidationFailed(_))
        ));
    }
}
