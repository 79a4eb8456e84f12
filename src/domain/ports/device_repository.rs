//! Device tracking repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AssignRequest, Assignment, Device, DeviceInput, Location, LocationInput, Page, PageRequest,
    SearchFilter,
};

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn list(&self, page: PageRequest, filter: &SearchFilter) -> DomainResult<Page<Device>>;

    async fn get(&self, id: i64) -> DomainResult<Option<Device>>;

    async fn create(&self, input: &DeviceInput, now: DateTime<Utc>) -> DomainResult<Device>;

    async fn update(&self, id: i64, input: &DeviceInput, now: DateTime<Utc>) -> DomainResult<Device>;

    async fn add_location(
        &self,
        device_id: i64,
        input: &LocationInput,
        now: DateTime<Utc>,
    ) -> DomainResult<Location>;

    /// Most recent locations first.
    async fn locations(&self, device_id: i64, limit: i64) -> DomainResult<Vec<Location>>;

    /// Close the active assignment, open a new one and mark the device active.
    async fn assign(
        &self,
        device_id: i64,
        request: &AssignRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<Assignment>;

    /// Close the active assignment and mark the device inactive.
    async fn unassign(&self, device_id: i64, returned: bool, now: DateTime<Utc>) -> DomainResult<Assignment>;

    /// Assignment history, newest first.
    async fn assignments(&self, device_id: i64) -> DomainResult<Vec<Assignment>>;
}
