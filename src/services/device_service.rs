//! GPS device tracking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    location_limit, AssignRequest, Assignment, Device, DeviceInput, Location, LocationInput, Page,
    PageRequest, SearchFilter,
};
use crate::domain::ports::DeviceRepository;

pub struct DeviceService {
    repository: Arc<dyn DeviceRepository>,
}

impl DeviceService {
    pub fn new(repository: Arc<dyn DeviceRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, page: PageRequest, filter: &SearchFilter) -> DomainResult<Page<Device>> {
        self.repository.list(page, filter).await
    }

    pub async fn get(&self, id: i64) -> DomainResult<Device> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Device", id))
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: DeviceInput, now: DateTime<Utc>) -> DomainResult<Device> {
        let input = input.normalize(true)?;
        self.repository.create(&input, now).await
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: i64, input: DeviceInput, now: DateTime<Utc>) -> DomainResult<Device> {
        let input = input.normalize(false)?;
        self.repository.update(id, &input, now).await
    }

    pub async fn record_location(
        &self,
        id: i64,
        input: LocationInput,
        now: DateTime<Utc>,
    ) -> DomainResult<Location> {
        input.validate()?;
        self.repository.add_location(id, &input, now).await
    }

    /// Recent locations, newest first. `limit` defaults to 50 and is capped at 500.
    pub async fn locations(&self, id: i64, limit: Option<i64>) -> DomainResult<Vec<Location>> {
        self.get(id).await?;
        self.repository.locations(id, location_limit(limit)).await
    }

    #[instrument(skip(self, request), fields(client_id = request.id_client), err)]
    pub async fn assign(&self, id: i64, request: AssignRequest, now: DateTime<Utc>) -> DomainResult<Assignment> {
        self.repository.assign(id, &request, now).await
    }

    #[instrument(skip(self), err)]
    pub async fn unassign(&self, id: i64, returned: bool, now: DateTime<Utc>) -> DomainResult<Assignment> {
        self.repository.unassign(id, returned, now).await
    }

    pub async fn assignments(&self, id: i64) -> DomainResult<Vec<Assignment>> {
        self.get(id).await?;
        self.repository.assignments(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteDeviceRepository};

    async fn setup_test_service() -> DeviceService {
        let pool = create_migrated_test_pool().await.unwrap();
        DeviceService::new(Arc::new(SqliteDeviceRepository::new(pool)))
    }

    #[tokio::test]
    async fn test_serial_required_and_trimmed() {
        let service = setup_test_service().await;
        assert!(matches!(
            service.create(DeviceInput::default(), Utc::now()).await,
            Err(DomainError::ValidationFailed(_))
        ));

        let device = service
            .create(
                DeviceInput {
                    serial_number: Some(" SN-9 ".to_string()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(device.serial_number, "SN-9");
    }

    #[tokio::test]
    async fn test_invalid_location_is_rejected_before_storage() {
        let service = setup_test_service().await;
        let device = service
            .create(
                DeviceInput {
                    serial_number: Some("SN-1".to_string()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let bad = LocationInput {
            latitude: 91.0,
            ..Default::default()
        };
        assert!(matches!(
            service.record_location(device.id, bad, Utc::now()).await,
            Err(DomainError::ValidationFailed(_))
        ));
        assert!(service.locations(device.id, None).await.unwrap().is_empty());
        assert!(matches!(
            service.locations(404, None).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
