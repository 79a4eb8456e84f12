//! SQLite implementation of the CompanyRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime, placeholders};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Company, CompanyInput, CompanyWithClients, NamedRef, Page, PageRequest, PartyRef, SearchFilter,
};
use crate::domain::ports::CompanyRepository;

const COMPANY_COLUMNS: &str = "c.id, c.id_user, c.dni, c.name, c.phone, c.created_at, c.updated_at";
const SEARCH_COLUMNS: [&str; 4] = ["c.name", "c.dni", "c.phone", "c.id"];

#[derive(Clone)]
pub struct SqliteCompanyRepository {
    pool: SqlitePool,
}

impl SqliteCompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Linked clients keyed by company id.
    async fn clients_of(&self, company_ids: &[i64]) -> DomainResult<HashMap<i64, Vec<PartyRef>>> {
        let mut linked: HashMap<i64, Vec<PartyRef>> = HashMap::new();
        if company_ids.is_empty() {
            return Ok(linked);
        }
        let sql = format!(
            "SELECT cc.id_company AS owner_id, cl.id, cl.name, cl.dni
             FROM company_client cc
             JOIN client cl ON cl.id = cc.id_client AND cl.deleted_at IS NULL
             WHERE cc.id_company IN ({})
             ORDER BY cl.name",
            placeholders(company_ids.len())
        );
        let mut q = sqlx::query_as::<_, LinkRow>(&sql);
        for id in company_ids {
            q = q.bind(*id);
        }
        for row in q.fetch_all(&self.pool).await? {
            linked.entry(row.owner_id).or_default().push(PartyRef {
                id: row.id,
                name: row.name,
                dni: row.dni,
            });
        }
        Ok(linked)
    }
}

#[async_trait]
impl CompanyRepository for SqliteCompanyRepository {
    async fn directory(&self) -> DomainResult<Vec<NamedRef>> {
        let rows: Vec<NamedRef> =
            sqlx::query_as("SELECT id, name FROM company WHERE deleted_at IS NULL ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn list(
        &self,
        page: PageRequest,
        filter: &SearchFilter,
    ) -> DomainResult<Page<CompanyWithClients>> {
        let mut where_sql = String::from("c.deleted_at IS NULL");
        if let Some(clause) = filter.clause(&SEARCH_COLUMNS) {
            where_sql.push_str(" AND ");
            where_sql.push_str(&clause);
        }
        let pattern = filter.like_pattern();
        let bind_count = if pattern.is_some() { SEARCH_COLUMNS.len() } else { 0 };

        let count_sql = format!("SELECT COUNT(*) FROM company c WHERE {where_sql}");
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql);
        for _ in 0..bind_count {
            count_q = count_q.bind(pattern.as_deref());
        }
        let (total,) = count_q.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT {COMPANY_COLUMNS} FROM company c WHERE {where_sql} ORDER BY c.id DESC LIMIT ? OFFSET ?"
        );
        let mut list_q = sqlx::query_as::<_, CompanyRow>(&list_sql);
        for _ in 0..bind_count {
            list_q = list_q.bind(pattern.as_deref());
        }
        let rows = list_q
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let companies: Vec<Company> = rows.into_iter().map(TryInto::try_into).collect::<DomainResult<_>>()?;
        let ids: Vec<i64> = companies.iter().map(|c| c.id).collect();
        let mut clients = self.clients_of(&ids).await?;

        let items = companies
            .into_iter()
            .map(|company| CompanyWithClients {
                clients: clients.remove(&company.id).unwrap_or_default(),
                company,
            })
            .collect();
        Ok(Page::new(items, page, total))
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Company>> {
        let row: Option<CompanyRow> = sqlx::query_as(&format!(
            "SELECT {COMPANY_COLUMNS} FROM company c WHERE c.id = ? AND c.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
        let stamp = format_datetime(now);
        let id = sqlx::query(
            "INSERT INTO company (id_user, dni, name, phone, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(input.id_user)
        .bind(&input.dni)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Company", id))
    }

    async fn update(&self, id: i64, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
        let result = sqlx::query(
            r#"UPDATE company SET id_user = COALESCE(?, id_user), dni = COALESCE(?, dni),
               name = COALESCE(?, name), phone = COALESCE(?, phone), updated_at = ?
               WHERE id = ? AND deleted_at IS NULL"#,
        )
        .bind(input.id_user)
        .bind(&input.dni)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(format_datetime(now))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Company", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Company", id))
    }

    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE company SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(format_datetime(now))
            .bind(format_datetime(now))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Company", id));
        }

        sqlx::query("DELETE FROM company_client WHERE id_company = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: i64,
    id_user: Option<i64>,
    dni: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CompanyRow> for Company {
    type Error = DomainError;

    fn try_from(row: CompanyRow) -> Result<Self, Self::Error> {
        Ok(Company {
            id: row.id,
            id_user: row.id_user,
            dni: row.dni,
            name: row.name,
            phone: row.phone,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

/// A party linked through `company_client`, tagged with the owner on the other side.
#[derive(sqlx::FromRow)]
pub(crate) struct LinkRow {
    pub owner_id: i64,
    pub id: i64,
    pub name: Option<String>,
    pub dni: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteCompanyRepository {
        SqliteCompanyRepository::new(create_migrated_test_pool().await.unwrap())
    }

    fn input(name: &str, dni: &str) -> CompanyInput {
        CompanyInput {
            name: Some(name.to_string()),
            dni: Some(dni.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let repo = setup_test_repo().await;
        let created = repo.create(&input("Acme", "76.111.111-1"), Utc::now()).await.unwrap();
        assert_eq!(created.name.as_deref(), Some("Acme"));

        let patch = CompanyInput {
            phone: Some("+56 9 1234".to_string()),
            ..Default::default()
        };
        let updated = repo.update(created.id, &patch, Utc::now()).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Acme"));
        assert_eq!(updated.phone.as_deref(), Some("+56 9 1234"));
    }

    #[tokio::test]
    async fn test_update_missing_company() {
        let repo = setup_test_repo().await;
        let err = repo.update(404, &CompanyInput::default(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_directory_is_ordered_and_excludes_deleted() {
        let repo = setup_test_repo().await;
        let zeta = repo.create(&input("Zeta", "1"), Utc::now()).await.unwrap();
        repo.create(&input("Alfa", "2"), Utc::now()).await.unwrap();
        repo.create(&input("Beta", "3"), Utc::now()).await.unwrap();
        repo.delete(zeta.id, Utc::now()).await.unwrap();

        let names: Vec<_> = repo.directory().await.unwrap().into_iter().filter_map(|c| c.name).collect();
        assert_eq!(names, vec!["Alfa", "Beta"]);
        assert!(repo.get(zeta.id).await.unwrap().is_none());
        assert!(repo.delete(zeta.id, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let repo = setup_test_repo().await;
        for i in 0..5 {
            repo.create(&input(&format!("Transportes {i}"), &format!("dni-{i}")), Utc::now())
                .await
                .unwrap();
        }
        repo.create(&input("Panaderia", "x"), Utc::now()).await.unwrap();

        let page = PageRequest::new(Some(1), Some(2)).unwrap();
        let result = repo.list(page, &SearchFilter::new(Some("TRANSPORTES"))).await.unwrap();
        assert_eq!(result.pagination.total, 5);
        assert_eq!(result.pagination.total_page, 3);
        assert_eq!(result.items.len(), 2);
        assert!(result.items.iter().all(|c| c.clients.is_empty()));

        let all = repo.list(PageRequest::default(), &SearchFilter::default()).await.unwrap();
        assert_eq!(all.pagination.total, 6);
    }
}
