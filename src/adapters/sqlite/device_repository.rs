//! SQLite implementation of the DeviceRepository: devices, their location
//! history and client assignments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::{format_datetime, format_optional_datetime, parse_datetime, parse_optional_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AssignRequest, Assignment, AssignmentStatus, Device, DeviceInput, DeviceStatus, Location,
    LocationInput, Page, PageRequest, SearchFilter,
};
use crate::domain::ports::DeviceRepository;

const DEVICE_COLUMNS: &str = "id, serial_number, imei, model, brand, firmware_version, status, purchase_date, warranty_expiry, state, created_at, updated_at";
const LOCATION_COLUMNS: &str =
    "id, id_device, latitude, longitude, altitude, speed, heading, accuracy, timestamp, address";
const ASSIGNMENT_COLUMNS: &str =
    "id, id_device, id_client, id_sale, assignment_date, unassignment_date, status, notes";
const SEARCH_COLUMNS: [&str; 4] = ["serial_number", "imei", "model", "brand"];

#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn device_exists(conn: &mut SqliteConnection, id: i64) -> DomainResult<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM device WHERE id = ? AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

async fn fetch_assignment(conn: &mut SqliteConnection, id: i64) -> DomainResult<Assignment> {
    let row: AssignmentRow = sqlx::query_as(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM device_assigned WHERE id = ?"
    ))
    .bind(id)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

async fn set_device_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: DeviceStatus,
    stamp: &str,
) -> DomainResult<()> {
    sqlx::query("UPDATE device SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(stamp)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl DeviceRepository for SqliteDeviceRepository {
    async fn list(&self, page: PageRequest, filter: &SearchFilter) -> DomainResult<Page<Device>> {
        let mut where_sql = String::from("deleted_at IS NULL");
        if let Some(clause) = filter.clause(&SEARCH_COLUMNS) {
            where_sql.push_str(" AND ");
            where_sql.push_str(&clause);
        }
        let pattern = filter.like_pattern();
        let bind_count = if pattern.is_some() { SEARCH_COLUMNS.len() } else { 0 };

        let count_sql = format!("SELECT COUNT(*) FROM device WHERE {where_sql}");
        let mut count_q = sqlx::query_as::<_, (i64,)>(&count_sql);
        for _ in 0..bind_count {
            count_q = count_q.bind(pattern.as_deref());
        }
        let (total,) = count_q.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT {DEVICE_COLUMNS} FROM device WHERE {where_sql} ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        let mut list_q = sqlx::query_as::<_, DeviceRow>(&list_sql);
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

    async fn get(&self, id: i64) -> DomainResult<Option<Device>> {
        let row: Option<DeviceRow> = sqlx::query_as(&format!(
            "SELECT {DEVICE_COLUMNS} FROM device WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, input: &DeviceInput, now: DateTime<Utc>) -> DomainResult<Device> {
        let stamp = format_datetime(now);
        let id = sqlx::query(
            r#"INSERT INTO device (serial_number, imei, model, brand, firmware_version, status,
                   purchase_date, warranty_expiry, state, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(input.serial_number.as_deref().unwrap_or_default())
        .bind(&input.imei)
        .bind(&input.model)
        .bind(&input.brand)
        .bind(&input.firmware_version)
        .bind(input.status.unwrap_or_default().as_str())
        .bind(format_optional_datetime(input.purchase_date))
        .bind(format_optional_datetime(input.warranty_expiry))
        .bind(input.state.unwrap_or(true))
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get(id).await?.ok_or_else(|| DomainError::not_found("Device", id))
    }

    async fn update(&self, id: i64, input: &DeviceInput, now: DateTime<Utc>) -> DomainResult<Device> {
        let result = sqlx::query(
            r#"UPDATE device SET serial_number = COALESCE(?, serial_number), imei = COALESCE(?, imei),
               model = COALESCE(?, model), brand = COALESCE(?, brand),
               firmware_version = COALESCE(?, firmware_version), status = COALESCE(?, status),
               purchase_date = COALESCE(?, purchase_date), warranty_expiry = COALESCE(?, warranty_expiry),
               state = COALESCE(?, state), updated_at = ?
               WHERE id = ? AND deleted_at IS NULL"#,
        )
        .bind(&input.serial_number)
        .bind(&input.imei)
        .bind(&input.model)
        .bind(&input.brand)
        .bind(&input.firmware_version)
        .bind(input.status.map(|s| s.as_str()))
        .bind(format_optional_datetime(input.purchase_date))
        .bind(format_optional_datetime(input.warranty_expiry))
        .bind(input.state)
        .bind(format_datetime(now))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Device", id));
        }
        self.get(id).await?.ok_or_else(|| DomainError::not_found("Device", id))
    }

    async fn add_location(
        &self,
        device_id: i64,
        input: &LocationInput,
        now: DateTime<Utc>,
    ) -> DomainResult<Location> {
        let mut conn = self.pool.acquire().await?;
        if !device_exists(&mut *conn, device_id).await? {
            return Err(DomainError::not_found("Device", device_id));
        }

        let row: LocationRow = sqlx::query_as(&format!(
            r#"INSERT INTO location (id_device, latitude, longitude, altitude, speed, heading, accuracy,
                   timestamp, address, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING {LOCATION_COLUMNS}"#
        ))
        .bind(device_id)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.altitude)
        .bind(input.speed)
        .bind(input.heading)
        .bind(input.accuracy)
        .bind(format_datetime(input.timestamp.unwrap_or(now)))
        .bind(&input.address)
        .bind(format_datetime(now))
        .fetch_one(&mut *conn)
        .await?;

        row.try_into()
    }

    async fn locations(&self, device_id: i64, limit: i64) -> DomainResult<Vec<Location>> {
        let rows: Vec<LocationRow> = sqlx::query_as(&format!(
            "SELECT {LOCATION_COLUMNS} FROM location WHERE id_device = ? ORDER BY timestamp DESC, id DESC LIMIT ?"
        ))
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn assign(
        &self,
        device_id: i64,
        request: &AssignRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<Assignment> {
        let stamp = format_datetime(now);
        let mut tx = self.pool.begin().await?;

        if !device_exists(&mut *tx, device_id).await? {
            return Err(DomainError::not_found("Device", device_id));
        }
        let client: Option<(i64,)> = sqlx::query_as("SELECT id FROM client WHERE id = ? AND deleted_at IS NULL")
            .bind(request.id_client)
            .fetch_optional(&mut *tx)
            .await?;
        if client.is_none() {
            return Err(DomainError::validation(
                DomainError::not_found("Client", request.id_client).to_string(),
            ));
        }

        sqlx::query(
            r#"UPDATE device_assigned SET status = ?, unassignment_date = ?, updated_at = ?
               WHERE id_device = ? AND status = ?"#,
        )
        .bind(AssignmentStatus::Unassigned.as_str())
        .bind(&stamp)
        .bind(&stamp)
        .bind(device_id)
        .bind(AssignmentStatus::Assigned.as_str())
        .execute(&mut *tx)
        .await?;

        let id = sqlx::query(
            r#"INSERT INTO device_assigned (id_device, id_client, id_sale, assignment_date, status, notes, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(device_id)
        .bind(request.id_client)
        .bind(request.id_sale)
        .bind(&stamp)
        .bind(AssignmentStatus::Assigned.as_str())
        .bind(&request.notes)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        set_device_status(&mut *tx, device_id, DeviceStatus::Active, &stamp).await?;
        let assignment = fetch_assignment(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(device_id, client_id = request.id_client, "device assigned");
        Ok(assignment)
    }

    async fn unassign(&self, device_id: i64, returned: bool, now: DateTime<Utc>) -> DomainResult<Assignment> {
        let stamp = format_datetime(now);
        let mut tx = self.pool.begin().await?;

        if !device_exists(&mut *tx, device_id).await? {
            return Err(DomainError::not_found("Device", device_id));
        }
        let active: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM device_assigned WHERE id_device = ? AND status = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(device_id)
        .bind(AssignmentStatus::Assigned.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some((assignment_id,)) = active else {
            return Err(DomainError::validation(format!(
                "device {device_id} has no active assignment"
            )));
        };

        let status = if returned {
            AssignmentStatus::Returned
        } else {
            AssignmentStatus::Unassigned
        };
        sqlx::query("UPDATE device_assigned SET status = ?, unassignment_date = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&stamp)
            .bind(&stamp)
            .bind(assignment_id)
            .execute(&mut *tx)
            .await?;

        set_device_status(&mut *tx, device_id, DeviceStatus::Inactive, &stamp).await?;
        let assignment = fetch_assignment(&mut *tx, assignment_id).await?;
        tx.commit().await?;

        tracing::info!(device_id, status = status.as_str(), "device unassigned");
        Ok(assignment)
    }

    async fn assignments(&self, device_id: i64) -> DomainResult<Vec<Assignment>> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM device_assigned WHERE id_device = ? ORDER BY assignment_date DESC, id DESC"
        ))
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct DeviceRow {
    id: i64,
    serial_number: String,
    imei: Option<String>,
    model: Option<String>,
    brand: Option<String>,
    firmware_version: Option<String>,
    status: String,
    purchase_date: Option<String>,
    warranty_expiry: Option<String>,
    state: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DeviceRow> for Device {
    type Error = DomainError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let status = DeviceStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid device status: {}", row.status)))?;
        Ok(Device {
            id: row.id,
            serial_number: row.serial_number,
            imei: row.imei,
            model: row.model,
            brand: row.brand,
            firmware_version: row.firmware_version,
            status,
            purchase_date: parse_optional_datetime(row.purchase_date)?,
            warranty_expiry: parse_optional_datetime(row.warranty_expiry)?,
            state: row.state,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: i64,
    id_device: i64,
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    speed: Option<f64>,
    heading: Option<f64>,
    accuracy: Option<f64>,
    timestamp: String,
    address: Option<String>,
}

impl TryFrom<LocationRow> for Location {
    type Error = DomainError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        Ok(Location {
            id: row.id,
            id_device: row.id_device,
            latitude: row.latitude,
            longitude: row.longitude,
            altitude: row.altitude,
            speed: row.speed,
            heading: row.heading,
            accuracy: row.accuracy,
            timestamp: parse_datetime(&row.timestamp)?,
            address: row.address,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: i64,
    id_device: i64,
    id_client: i64,
    id_sale: Option<i64>,
    assignment_date: String,
    unassignment_date: Option<String>,
    status: String,
    notes: Option<String>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = DomainError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let status = AssignmentStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid assignment status: {}", row.status))
        })?;
        Ok(Assignment {
            id: row.id,
            id_device: row.id_device,
            id_client: row.id_client,
            id_sale: row.id_sale,
            assignment_date: parse_datetime(&row.assignment_date)?,
            unassignment_date: parse_optional_datetime(row.unassignment_date)?,
            status,
            notes: row.notes,
        })
    }
}
