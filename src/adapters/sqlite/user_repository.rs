//! SQLite implementation of the UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NamedRef, NewUser, User};
use crate::domain::ports::UserRepository;

const USER_COLUMNS: &str =
    "id, id_type_user, name, email, username, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser, now: DateTime<Utc>) -> DomainResult<User> {
        let stamp = format_datetime(now);
        let id = sqlx::query(
            r#"INSERT INTO users (id_type_user, name, email, username, password_hash, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id_type_user)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    async fn get(&self, id: i64) -> DomainResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_login(&self, login: &str) -> DomainResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE (username = ? OR email = ?) AND deleted_at IS NULL
             ORDER BY id LIMIT 1"
        ))
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_summaries(&self) -> DomainResult<Vec<NamedRef>> {
        let rows: Vec<NamedRef> =
            sqlx::query_as("SELECT id, name FROM users WHERE deleted_at IS NULL ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn user_type_exists(&self, id: i64) -> DomainResult<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM type_user WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    id_type_user: i64,
    name: String,
    email: String,
    username: String,
    password_hash: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            id_type_user: row.id_type_user,
            name: row.name,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteUserRepository {
        SqliteUserRepository::new(create_migrated_test_pool().await.unwrap())
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            id_type_user: 1,
            name: format!("User {username}"),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_login() {
        let repo = setup_test_repo().await;
        let created = repo.create(&new_user("ana", "ana@example.com"), Utc::now()).await.unwrap();

        let by_name = repo.find_by_login("ana").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        let by_email = repo.find_by_login("ana@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(repo.find_by_login("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let repo = setup_test_repo().await;
        repo.create(&new_user("ana", "ana@example.com"), Utc::now()).await.unwrap();

        let err = repo
            .create(&new_user("ana", "other@example.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_summaries_and_types() {
        let repo = setup_test_repo().await;
        repo.create(&new_user("zoe", "zoe@example.com"), Utc::now()).await.unwrap();
        repo.create(&new_user("bea", "bea@example.com"), Utc::now()).await.unwrap();

        let names: Vec<_> = repo
            .list_summaries()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["User bea", "User zoe"]);
        assert!(repo.user_type_exists(1).await.unwrap());
        assert!(!repo.user_type_exists(99).await.unwrap());
    }
}
