//! SQLite implementation of the BankRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AccountType, Bank, BankInput, NamedRef, Page, PageRequest, SearchFilter};
use crate::domain::ports::BankRepository;

const BANK_COLUMNS: &str =
    "id, name, code, account_type, account_number, account_holder, state, created_at, updated_at";
const SEARCH_COLUMNS: [&str; 4] = ["name", "code", "account_number", "account_holder"];

#[derive(Clone)]
pub struct SqliteBankRepository {
    pool: SqlitePool,
}

impl SqliteBankRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BankRepository for SqliteBankRepository {
    async fn list(&self, page: PageRequest, filter: &SearchFilter) -> DomainResult<Page<Bank>> {
        let mut where_sql = String::from("deleted_at IS NULL");
        if let Some(clause) = filter.clause(&SEARCH_COLUMNS) {
            where_sql.push_str(" AND ");
            where_sql.push_str(&clause);
        }
        let pattern = filter.like_pattern();
        let bind_count = if pattern.is_some() { SEARCH_COLUMNS.len() } else { 0 };

        let count_sql = format!("SELECT COUNT(*) FROM bank WHERE {where_sql}");
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql);
        for _ in 0..bind_count {
            count_q = count_q.bind(pattern.as_deref());
        }
        let (total,) = count_q.fetch_one(&self.pool).await?;

        let list_sql =
            format!("SELECT {BANK_COLUMNS} FROM bank WHERE {where_sql} ORDER BY name LIMIT ? OFFSET ?");
        let mut list_q = sqlx::query_as::<_, BankRow>(&list_sql);
        for _ in 0..bind_count {
            list_q = list_q.bind(pattern.as_deref());
        }
        let rows = list_q
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(TryInto::try_into).collect::<DomainResult<_>>()?;
        Ok(Page::new(items, page, total))
    }

    async fn simple(&self) -> DomainResult<Vec<NamedRef>> {
        let rows: Vec<NamedRef> =
            sqlx::query_as("SELECT id, name FROM bank WHERE deleted_at IS NULL ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Bank>> {
        let row: Option<BankRow> = sqlx::query_as(&format!(
            "SELECT {BANK_COLUMNS} FROM bank WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, input: &BankInput, now: DateTime<Utc>) -> DomainResult<Bank> {
        let stamp = format_datetime(now);
        let id = sqlx::query(
            r#"INSERT INTO bank (name, code, account_type, account_number, account_holder, state, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(input.name.as_deref().unwrap_or_default())
        .bind(&input.code)
        .bind(input.account_type.map(|t| t.as_str()))
        .bind(&input.account_number)
        .bind(&input.account_holder)
        .bind(input.state.unwrap_or(true))
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get(id).await?.ok_or_else(|| DomainError::not_found("Bank", id))
    }

    async fn update(&self, id: i64, input: &BankInput, now: DateTime<Utc>) -> DomainResult<Bank> {
        let result = sqlx::query(
            r#"UPDATE bank SET name = COALESCE(?, name), code = COALESCE(?, code),
               account_type = COALESCE(?, account_type), account_number = COALESCE(?, account_number),
               account_holder = COALESCE(?, account_holder), state = COALESCE(?, state), updated_at = ?
               WHERE id = ? AND deleted_at IS NULL"#,
        )
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.account_type.map(|t| t.as_str()))
        .bind(&input.account_number)
        .bind(&input.account_holder)
        .bind(input.state)
        .bind(format_datetime(now))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Bank", id));
        }
        self.get(id).await?.ok_or_else(|| DomainError::not_found("Bank", id))
    }

    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let stamp = format_datetime(now);
        let result = sqlx::query("UPDATE bank SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(&stamp)
            .bind(&stamp)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Bank", id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct BankRow {
    id: i64,
    name: String,
    code: Option<String>,
    account_type: Option<String>,
    account_number: Option<String>,
    account_holder: Option<String>,
    state: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<BankRow> for Bank {
    type Error = DomainError;

    fn try_from(row: BankRow) -> Result<Self, Self::Error> {
        let account_type = row
            .account_type
            .map(|t| {
                AccountType::from_str(&t)
                    .ok_or_else(|| DomainError::SerializationError(format!("Invalid account type: {t}")))
            })
            .transpose()?;
        Ok(Bank {
            id: row.id,
            name: row.name,
            code: row.code,
            account_type,
            account_number: row.account_number,
            account_holder: row.account_holder,
            state: row.state,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
