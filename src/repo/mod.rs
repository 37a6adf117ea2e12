pub mod sqlite;
pub mod sqlite_queries;

use crate::models;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage used by the engine. Implementations are already scoped to one
/// organization, the engine never sees tenant ids.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppRepo: Send + Sync {
    async fn get_pet(&self, pet_id: i64) -> anyhow::Result<Option<models::pet::Pet>>;

    async fn update_pet_preferences(
        &self,
        pet_id: i64,
        preferences: models::pet::GroomingPreferences,
    ) -> anyhow::Result<()>;

    async fn get_service(&self, service_id: i64)
    -> anyhow::Result<Option<models::service::Service>>;

    async fn get_appointment(
        &self,
        appointment_id: i64,
    ) -> anyhow::Result<Option<models::appointment::Appointment>>;

    async fn insert_appointment(
        &self,
        appointment: &models::appointment::Appointment,
    ) -> anyhow::Result<i64>;

    async fn update_appointment(
        &self,
        appointment: &models::appointment::Appointment,
    ) -> anyhow::Result<()>;

    /// Removes an appointment that was never checked in. Returns `false` when
    /// no row matched.
    async fn delete_appointment(&self, appointment_id: i64) -> anyhow::Result<bool>;

    async fn get_schedule_blocks_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<models::schedule_block::ScheduleBlock>>;

    async fn insert_schedule_block(
        &self,
        block: &models::schedule_block::ScheduleBlock,
    ) -> anyhow::Result<i64>;

    async fn delete_schedule_block(&self, block_id: i64) -> anyhow::Result<()>;

    async fn get_service_package(
        &self,
        package_id: i64,
    ) -> anyhow::Result<Option<models::package::ServicePackage>>;

    /// Every appointment charged to the package, cancelled ones included.
    async fn get_package_appointments(
        &self,
        package_id: i64,
    ) -> anyhow::Result<Vec<models::appointment::Appointment>>;
}

pub type ImplAppRepo = Box<dyn AppRepo>;
