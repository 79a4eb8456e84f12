//! User repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{NamedRef, NewUser, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Duplicate email or username is a conflict.
    async fn create(&self, user: &NewUser, now: DateTime<Utc>) -> DomainResult<User>;

    async fn get(&self, id: i64) -> DomainResult<Option<User>>;

    /// Find a user whose username or email equals `login`.
    async fn find_by_login(&self, login: &str) -> DomainResult<Option<User>>;

    /// `{id, name}` of every user, ordered by name.
    async fn list_summaries(&self) -> DomainResult<Vec<NamedRef>>;

    async fn user_type_exists(&self, id: i64) -> DomainResult<bool>;
}
