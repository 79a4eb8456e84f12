//! SQLite implementation of the ClientRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::company_repository::LinkRow;
use super::{format_datetime, parse_datetime, placeholders};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Client, ClientDetail, ClientInput, ClientWithCompanies, Page, PageRequest, PartyRef,
    SearchFilter,
};
use crate::domain::ports::ClientRepository;

const CLIENT_COLUMNS: &str = "c.id, c.id_user, c.dni, c.name, c.phone, c.created_at, c.updated_at";

/// Client name or dni, or the name or dni of a linked company.
const SEARCH_CLAUSE: &str = "(LOWER(c.name) LIKE ? OR LOWER(c.dni) LIKE ? OR EXISTS (
        SELECT 1 FROM company_client cc
        JOIN company co ON co.id = cc.id_company AND co.deleted_at IS NULL
        WHERE cc.id_client = c.id AND (LOWER(co.name) LIKE ? OR LOWER(co.dni) LIKE ?)))";
const SEARCH_BINDS: usize = 4;

#[derive(Clone)]
pub struct SqliteClientRepository {
    pool: SqlitePool,
}

impl SqliteClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Linked companies keyed by client id.
    async fn companies_of(&self, client_ids: &[i64]) -> DomainResult<HashMap<i64, Vec<PartyRef>>> {
        let mut linked: HashMap<i64, Vec<PartyRef>> = HashMap::new();
        if client_ids.is_empty() {
            return Ok(linked);
        }
        let sql = format!(
            "SELECT cc.id_client AS owner_id, co.id, co.name, co.dni
             FROM company_client cc
             JOIN company co ON co.id = cc.id_company AND co.deleted_at IS NULL
             WHERE cc.id_client IN ({})
             ORDER BY co.name",
            placeholders(client_ids.len())
        );
        let mut q = sqlx::query_as::<_, LinkRow>(&sql);
        for id in client_ids {
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

    async fn fetch_client(&self, id: i64) -> DomainResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(&format!(
            "SELECT {CLIENT_COLUMNS} FROM client c WHERE c.id = ? AND c.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

/// Replace a client's company links, rejecting unknown or deleted companies.
async fn replace_links(
    tx: &mut Transaction<'_, Sqlite>,
    client_id: i64,
    company_ids: &[i64],
    stamp: &str,
) -> DomainResult<()> {
    let mut wanted: Vec<i64> = company_ids.to_vec();
    wanted.sort_unstable();
    wanted.dedup();

    if !wanted.is_empty() {
        let sql = format!(
            "SELECT id FROM company WHERE deleted_at IS NULL AND id IN ({})",
            placeholders(wanted.len())
        );
        let mut q = sqlx::query_as::<_, (i64,)>(&sql);
        for id in &wanted {
            q = q.bind(*id);
        }
        let found: Vec<i64> = q.fetch_all(&mut **tx).await?.into_iter().map(|(id,)| id).collect();
        let missing: Vec<String> = wanted
            .iter()
            .filter(|id| !found.contains(id))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::validation(format!(
                "unknown company ids: {}",
                missing.join(", ")
            )));
        }
    }

    sqlx::query("DELETE FROM company_client WHERE id_client = ?")
        .bind(client_id)
        .execute(&mut **tx)
        .await?;

    for company_id in wanted {
        sqlx::query("INSERT INTO company_client (id_company, id_client, created_at) VALUES (?, ?, ?)")
            .bind(company_id)
            .bind(client_id)
            .bind(stamp)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl ClientRepository for SqliteClientRepository {
    async fn list(
        &self,
        page: PageRequest,
        filter: &SearchFilter,
    ) -> DomainResult<Page<ClientWithCompanies>> {
        let pattern = filter.like_pattern();
        let where_sql = if pattern.is_some() {
            format!("c.deleted_at IS NULL AND {SEARCH_CLAUSE}")
        } else {
            "c.deleted_at IS NULL".to_string()
        };
        let bind_count = if pattern.is_some() { SEARCH_BINDS } else { 0 };

        let count_sql = format!("SELECT COUNT(*) FROM client c WHERE {where_sql}");
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql);
        for _ in 0..bind_count {
            count_q = count_q.bind(pattern.as_deref());
        }
        let (total,) = count_q.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM client c WHERE {where_sql} ORDER BY c.id DESC LIMIT ? OFFSET ?"
        );
        let mut list_q = sqlx::query_as::<_, ClientRow>(&list_sql);
        for _ in 0..bind_count {
            list_q = list_q.bind(pattern.as_deref());
        }
        let rows = list_q
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let clients: Vec<Client> = rows.into_iter().map(TryInto::try_into).collect::<DomainResult<_>>()?;
        let ids: Vec<i64> = clients.iter().map(|c| c.id).collect();
        let mut companies = self.companies_of(&ids).await?;

        let items = clients
            .into_iter()
            .map(|client| ClientWithCompanies {
                companies: companies.remove(&client.id).unwrap_or_default(),
                client,
            })
            .collect();
        Ok(Page::new(items, page, total))
    }

    async fn get(&self, id: i64) -> DomainResult<Option<ClientDetail>> {
        let Some(client) = self.fetch_client(id).await? else {
            return Ok(None);
        };
        let company_ids = self
            .companies_of(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.id)
            .collect();
        Ok(Some(ClientDetail { client, company_ids }))
    }

    async fn create(&self, input: &ClientInput, now: DateTime<Utc>) -> DomainResult<Client> {
        let stamp = format_datetime(now);
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO client (id_user, dni, name, phone, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(input.id_user)
        .bind(&input.dni)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if let Some(company_ids) = &input.company_ids {
            replace_links(&mut tx, id, company_ids, &stamp).await?;
        }
        tx.commit().await?;

        self.fetch_client(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Client", id))
    }

    async fn update(&self, id: i64, input: &ClientInput, now: DateTime<Utc>) -> DomainResult<()> {
        let stamp = format_datetime(now);
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE client SET id_user = COALESCE(?, id_user), dni = COALESCE(?, dni),
               name = COALESCE(?, name), phone = COALESCE(?, phone), updated_at = ?
               WHERE id = ? AND deleted_at IS NULL"#,
        )
        .bind(input.id_user)
        .bind(&input.dni)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&stamp)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Client", id));
        }

        if let Some(company_ids) = &input.company_ids {
            replace_links(&mut tx, id, company_ids, &stamp).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let stamp = format_datetime(now);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM company_client WHERE id_client = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE client SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(&stamp)
            .bind(&stamp)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Client", id));
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: i64,
    id_user: Option<i64>,
    dni: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ClientRow> for Client {
    type Error = DomainError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        Ok(Client {
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
