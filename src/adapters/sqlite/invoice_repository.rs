//! SQLite implementation of the InvoiceRepository.
//!
//! A sale is written in a single transaction; any failed check or insert
//! drops the transaction and with it every row written so far.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::product_repository::{insert_movement, MovementRecord};
use super::{format_datetime, parse_datetime, placeholders};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    InvoiceLineRecord, InvoiceRecord, MovementType, NewSale, Page, PageRequest, PartyRef,
    PaymentFact, PaymentRecord, SaleFact, PAID_STATE_ID,
};
use crate::domain::ports::InvoiceRepository;

const HEADER_SELECT: &str = r#"SELECT i.id, i.date, i.total, s.name AS state_name,
       i.id_client, cl.name AS client_name, cl.dni AS client_dni,
       i.id_company, co.name AS company_name, co.dni AS company_dni,
       u.name AS seller_name
FROM invoice i
LEFT JOIN invoice_state s ON s.id = i.id_invoice_state
LEFT JOIN client cl ON cl.id = i.id_client
LEFT JOIN company co ON co.id = i.id_company
LEFT JOIN users u ON u.id = i.id_user"#;

#[derive(Clone)]
pub struct SqliteInvoiceRepository {
    pool: SqlitePool,
}

impl SqliteInvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Attach detail lines and payments to invoice headers.
    async fn hydrate(&self, headers: Vec<HeaderRow>) -> DomainResult<Vec<InvoiceRecord>> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();

        let lines_sql = format!(
            "SELECT d.id_invoice, d.id_product, p.name AS product_name, d.quantity, d.price_sale
             FROM invoice_detail d
             LEFT JOIN product p ON p.id = d.id_product
             WHERE d.id_invoice IN ({}) AND d.deleted_at IS NULL
             ORDER BY d.id",
            placeholders(ids.len())
        );
        let mut lines_q = sqlx::query_as::<_, LineRow>(&lines_sql);
        for id in &ids {
            lines_q = lines_q.bind(*id);
        }
        let mut lines: HashMap<i64, Vec<InvoiceLineRecord>> = HashMap::new();
        for row in lines_q.fetch_all(&self.pool).await? {
            lines.entry(row.id_invoice).or_default().push(InvoiceLineRecord {
                product_id: row.id_product,
                product_name: row.product_name,
                quantity: row.quantity,
                price_sale: row.price_sale,
            });
        }

        let payments_sql = format!(
            "SELECT pi.id_invoice, pi.amount, pi.id_bank, b.name AS bank_name
             FROM payment_invoice pi
             LEFT JOIN bank b ON CAST(b.id AS TEXT) = pi.id_bank
             WHERE pi.id_invoice IN ({}) AND pi.deleted_at IS NULL
             ORDER BY pi.id",
            placeholders(ids.len())
        );
        let mut payments_q = sqlx::query_as::<_, PaymentRow>(&payments_sql);
        for id in &ids {
            payments_q = payments_q.bind(*id);
        }
        let mut payments: HashMap<i64, Vec<PaymentRecord>> = HashMap::new();
        for row in payments_q.fetch_all(&self.pool).await? {
            payments.entry(row.id_invoice).or_default().push(PaymentRecord {
                amount: row.amount,
                id_bank: row.id_bank,
                bank_name: row.bank_name,
            });
        }

        headers
            .into_iter()
            .map(|header| {
                let id = header.id;
                header.into_record(
                    lines.remove(&id).unwrap_or_default(),
                    payments.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }
}

/// Fail with a validation error unless `id` names a live row of `table`.
async fn require_row(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    entity: &'static str,
    id: i64,
) -> DomainResult<()> {
    let found: Option<(i64,)> = sqlx::query_as(&format!(
        "SELECT id FROM {table} WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(DomainError::validation(DomainError::not_found(entity, id).to_string())),
    }
}

/// Check every product can cover its summed requested quantity.
async fn check_stock(tx: &mut Transaction<'_, Sqlite>, sale: &NewSale) -> DomainResult<()> {
    for (product_id, requested) in sale.requested_quantities()? {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM product WHERE id = ? AND deleted_at IS NULL")
                .bind(product_id)
                .fetch_optional(&mut **tx)
                .await?;

        let (name, available) = row.ok_or_else(|| {
            DomainError::validation(DomainError::not_found("Product", product_id).to_string())
        })?;
        if available < requested {
            return Err(DomainError::InsufficientStock {
                product: name,
                available,
                requested,
            });
        }
    }
    Ok(())
}

#[async_trait]
impl InvoiceRepository for SqliteInvoiceRepository {
    async fn create_sale(&self, sale: &NewSale, now: DateTime<Utc>) -> DomainResult<i64> {
        let stamp = format_datetime(now);
        let mut tx = self.pool.begin().await?;

        require_row(&mut tx, "client", "Client", sale.id_client).await?;
        if let Some(company_id) = sale.id_company {
            require_row(&mut tx, "company", "Company", company_id).await?;
        }
        require_row(&mut tx, "users", "User", sale.id_user).await?;
        check_stock(&mut tx, sale).await?;
        require_row(&mut tx, "invoice_state", "Invoice state", PAID_STATE_ID).await?;

        let invoice_id = sqlx::query(
            r#"INSERT INTO invoice (date, total, id_invoice_state, is_return, id_client, id_company, id_user, created_at, updated_at)
               VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?)"#,
        )
        .bind(format_datetime(sale.date))
        .bind(sale.total)
        .bind(PAID_STATE_ID)
        .bind(sale.id_client)
        .bind(sale.id_company)
        .bind(sale.id_user)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let reason = sale.reason();
        for line in &sale.lines {
            sqlx::query(
                r#"INSERT INTO invoice_detail (id_invoice, id_product, is_fp, quantity, reason, price_cost, price_sale, created_at, updated_at)
                   VALUES (?, ?, 0, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(invoice_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(&reason)
            .bind(line.price_cost)
            .bind(line.price_sale)
            .bind(&stamp)
            .bind(&stamp)
            .execute(&mut *tx)
            .await?;

            let remaining: Option<(i64,)> = sqlx::query_as(
                "UPDATE product SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ? RETURNING stock",
            )
            .bind(line.quantity)
            .bind(&stamp)
            .bind(line.product_id)
            .bind(line.quantity)
            .fetch_optional(&mut *tx)
            .await?;

            let Some((current_stock,)) = remaining else {
                let (name, available): (String, i64) =
                    sqlx::query_as("SELECT name, stock FROM product WHERE id = ?")
                        .bind(line.product_id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(DomainError::InsufficientStock {
                    product: name,
                    available,
                    requested: line.quantity,
                });
            };

            let record = MovementRecord {
                product_id: line.product_id,
                quantity_in: 0,
                quantity_out: line.quantity,
                current_stock,
                movement_type: MovementType::Out,
                reference_id: Some(invoice_id),
                description: Some(&reason),
            };
            insert_movement(&mut *tx, &record, &stamp).await?;
        }

        for payment in &sale.payments {
            sqlx::query(
                r#"INSERT INTO payment_invoice (id_invoice, amount, id_bank, created_at, updated_at)
                   VALUES (?, ?, ?, ?, ?)"#,
            )
            .bind(invoice_id)
            .bind(payment.amount)
            .bind(payment.method.stored())
            .bind(&stamp)
            .bind(&stamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(invoice_id, lines = sale.lines.len(), payments = sale.payments.len(), "sale recorded");
        Ok(invoice_id)
    }

    async fn get(&self, id: i64) -> DomainResult<Option<InvoiceRecord>> {
        let header: Option<HeaderRow> =
            sqlx::query_as(&format!("{HEADER_SELECT} WHERE i.id = ? AND i.deleted_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match header {
            Some(header) => Ok(self.hydrate(vec![header]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, page: PageRequest) -> DomainResult<Page<InvoiceRecord>> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invoice WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        let headers: Vec<HeaderRow> = sqlx::query_as(&format!(
            "{HEADER_SELECT} WHERE i.deleted_at IS NULL ORDER BY i.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = self.hydrate(headers).await?;
        Ok(Page::new(items, page, total))
    }

    async fn sales_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Vec<SaleFact>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT date, total FROM invoice
               WHERE deleted_at IS NULL AND is_return = 0 AND date >= ? AND date < ?
               ORDER BY date"#,
        )
        .bind(format_datetime(from))
        .bind(format_datetime(to))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(date, total)| {
                Ok(SaleFact {
                    date: parse_datetime(&date)?,
                    total,
                })
            })
            .collect()
    }

    async fn payments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<PaymentFact>> {
        let rows: Vec<(String, i64, Option<String>, Option<String>)> = sqlx::query_as(
            r#"SELECT i.date, pi.amount, pi.id_bank, b.name
               FROM payment_invoice pi
               JOIN invoice i ON i.id = pi.id_invoice
               LEFT JOIN bank b ON CAST(b.id AS TEXT) = pi.id_bank
               WHERE i.deleted_at IS NULL AND pi.deleted_at IS NULL AND i.is_return = 0
                 AND i.date >= ? AND i.date < ?
               ORDER BY i.date, pi.id"#,
        )
        .bind(format_datetime(from))
        .bind(format_datetime(to))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(date, amount, id_bank, bank_name)| {
                Ok(PaymentFact {
                    date: parse_datetime(&date)?,
                    amount,
                    id_bank,
                    bank_name,
                })
            })
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct HeaderRow {
    id: i64,
    date: String,
    total: i64,
    state_name: Option<String>,
    id_client: Option<i64>,
    client_name: Option<String>,
    client_dni: Option<String>,
    id_company: Option<i64>,
    company_name: Option<String>,
    company_dni: Option<String>,
    seller_name: Option<String>,
}

impl HeaderRow {
    fn into_record(
        self,
        lines: Vec<InvoiceLineRecord>,
        payments: Vec<PaymentRecord>,
    ) -> DomainResult<InvoiceRecord> {
        Ok(InvoiceRecord {
            id: self.id,
            date: parse_datetime(&self.date)?,
            total: self.total,
            state_name: self.state_name,
            client: self.id_client.map(|id| PartyRef {
                id,
                name: self.client_name,
                dni: self.client_dni,
            }),
            company: self.id_company.map(|id| PartyRef {
                id,
                name: self.company_name,
                dni: self.company_dni,
            }),
            seller_name: self.seller_name,
            lines,
            payments,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    id_invoice: i64,
    id_product: Option<i64>,
    product_name: Option<String>,
    quantity: i64,
    price_sale: i64,
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id_invoice: i64,
    amount: i64,
    id_bank: Option<String>,
    bank_name: Option<String>,
}
