//! GPS tracking devices, their reported locations and client assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

pub const DEFAULT_LOCATION_LIMIT: i64 = 50;
pub const MAX_LOCATION_LIMIT: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Active,
    #[default]
    Inactive,
    Maintenance,
    Damaged,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Maintenance => "MAINTENANCE",
            Self::Damaged => "DAMAGED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(Self::Active),
            "INACTIVE" => Some(Self::Inactive),
            "MAINTENANCE" => Some(Self::Maintenance),
            "DAMAGED" => Some(Self::Damaged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssignmentStatus {
    Assigned,
    Unassigned,
    Returned,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "ASSIGNED",
            Self::Unassigned => "UNASSIGNED",
            Self::Returned => "RETURNED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ASSIGNED" => Some(Self::Assigned),
            "UNASSIGNED" => Some(Self::Unassigned),
            "RETURNED" => Some(Self::Returned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub serial_number: String,
    pub imei: Option<String>,
    pub model: Option<String>,
    pub brand: Option<String>,
    pub firmware_version: Option<String>,
    pub status: DeviceStatus,
    pub purchase_date: Option<DateTime<Utc>>,
    pub warranty_expiry: Option<DateTime<Utc>>,
    pub state: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceInput {
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub imei: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub warranty_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: Option<bool>,
}

impl DeviceInput {
    /// Trim the serial number and reject blank ones. `required` demands one be present.
    pub fn normalize(mut self, required: bool) -> DomainResult<Self> {
        match self.serial_number.as_deref().map(str::trim) {
            Some("") => return Err(DomainError::validation("serial_number is required")),
            Some(serial) => self.serial_number = Some(serial.to_string()),
            None if required => return Err(DomainError::validation("serial_number is required")),
            None => {}
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub id_device: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub address: Option<String>,
}

/// A position report from a device.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<String>,
}

impl LocationInput {
    pub fn validate(&self) -> DomainResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DomainError::validation("latitude must be between -90 and 90"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DomainError::validation("longitude must be between -180 and 180"));
        }
        if matches!(self.speed, Some(s) if s < 0.0) {
            return Err(DomainError::validation("speed cannot be negative"));
        }
        if matches!(self.heading, Some(h) if !(0.0..360.0).contains(&h)) {
            return Err(DomainError::validation("heading must be in [0, 360)"));
        }
        if matches!(self.accuracy, Some(a) if a < 0.0) {
            return Err(DomainError::validation("accuracy cannot be negative"));
        }
        Ok(())
    }
}

/// Clamp a requested location history size.
pub fn location_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_LOCATION_LIMIT)
        .clamp(1, MAX_LOCATION_LIMIT)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub id_device: i64,
    pub id_client: i64,
    pub id_sale: Option<i64>,
    pub assignment_date: DateTime<Utc>,
    pub unassignment_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignRequest {
    pub id_client: i64,
    #[serde(default)]
    pub id_sale: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnassignRequest {
    #[serde(default)]
    pub returned: bool,
}
