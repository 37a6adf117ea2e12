use crate::models;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sqlx::{FromRow, Row, SqlitePool, sqlite::SqliteRow};
use std::str::FromStr;

use super::{AppRepo, sqlite_queries};

/// SQLite storage for one organization. Every query binds `org_id`.
#[derive(Clone)]
pub struct SqlxSqliteRepo {
    pub db_pool: SqlitePool,
    pub org_id: i64,
}

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Decimals are stored as TEXT to keep their scale.
fn try_get_decimal(row: &SqliteRow, column: &str) -> sqlx::Result<Option<Decimal>> {
    row.try_get::<Option<String>, _>(column)?
        .map(|value| Decimal::from_str(&value).map_err(decode_err))
        .transpose()
}

fn try_get_json<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> sqlx::Result<T> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(decode_err)
}

fn try_get_enum<T>(row: &SqliteRow, column: &str) -> sqlx::Result<Option<T>>
where
    T: FromStr<Err = models::ParseEnumError>,
{
    row.try_get::<Option<String>, _>(column)?
        .map(|value| T::from_str(&value).map_err(decode_err))
        .transpose()
}

fn decimal_to_text(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.to_string())
}

impl FromRow<'_, SqliteRow> for models::pet::Pet {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            pet_name: row.try_get("pet_name")?,
            species: try_get_enum(row, "species")?.unwrap_or_default(),
            size: try_get_enum(row, "size")?,
            weight: try_get_decimal(row, "weight")?,
            preferences: models::pet::GroomingPreferences {
                allow_perfume: row.try_get("allow_perfume")?,
                allow_accessories: row.try_get("allow_accessories")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, SqliteRow> for models::service::Service {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            base_price: try_get_decimal(row, "base_price")?.unwrap_or_default(),
            duration_minutes: row.try_get("duration_minutes")?,
            target_species: try_get_enum(row, "target_species")?.unwrap_or_default(),
            scheduling_rules: try_get_json(row, "scheduling_rules")?,
            pricing_matrix: try_get_json(row, "pricing_matrix")?,
            checklist_template: try_get_json(row, "checklist_template")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, SqliteRow> for models::appointment::Appointment {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            pet_id: row.try_get("pet_id")?,
            service_id: row.try_get("service_id")?,
            package_id: row.try_get("package_id")?,
            scheduled_at: row.try_get("scheduled_at")?,
            check_in_date: row.try_get("check_in_date")?,
            check_out_date: row.try_get("check_out_date")?,
            status: try_get_enum(row, "status")?.unwrap_or_default(),
            checklist: try_get_json(row, "checklist")?,
            notes: row.try_get("notes")?,
            calculated_price: try_get_decimal(row, "calculated_price")?,
            final_price: try_get_decimal(row, "final_price")?,
            discount_percent: try_get_decimal(row, "discount_percent")?,
            payment_status: try_get_enum(row, "payment_status")?.unwrap_or_default(),
            payment_method: try_get_enum(row, "payment_method")?,
            paid_at: row.try_get("paid_at")?,
            actual_check_in: row.try_get("actual_check_in")?,
            actual_check_out: row.try_get("actual_check_out")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, SqliteRow> for models::schedule_block::ScheduleBlock {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            start_at: row.try_get("start_at")?,
            end_at: row.try_get("end_at")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl FromRow<'_, SqliteRow> for models::package::ServicePackage {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            pet_id: row.try_get("pet_id")?,
            service_id: row.try_get("service_id")?,
            total_qty: row.try_get("total_qty")?,
            purchased_at: row.try_get("purchased_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

#[async_trait]
impl AppRepo for SqlxSqliteRepo {
    async fn get_pet(&self, pet_id: i64) -> anyhow::Result<Option<models::pet::Pet>> {
        Ok(
            sqlx::query_as::<_, models::pet::Pet>(sqlite_queries::QUERY_GET_PET)
                .bind(pet_id)
                .bind(self.org_id)
                .fetch_optional(&self.db_pool)
                .await?,
        )
    }

    async fn update_pet_preferences(
        &self,
        pet_id: i64,
        preferences: models::pet::GroomingPreferences,
    ) -> anyhow::Result<()> {
        sqlx::query(sqlite_queries::QUERY_UPDATE_PET_PREFERENCES)
            .bind(preferences.allow_perfume)
            .bind(preferences.allow_accessories)
            .bind(Utc::now())
            .bind(pet_id)
            .bind(self.org_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    async fn get_service(
        &self,
        service_id: i64,
    ) -> anyhow::Result<Option<models::service::Service>> {
        Ok(
            sqlx::query_as::<_, models::service::Service>(sqlite_queries::QUERY_GET_SERVICE)
                .bind(service_id)
                .bind(self.org_id)
                .fetch_optional(&self.db_pool)
                .await?,
        )
    }

    async fn get_appointment(
        &self,
        appointment_id: i64,
    ) -> anyhow::Result<Option<models::appointment::Appointment>> {
        Ok(sqlx::query_as::<_, models::appointment::Appointment>(
            sqlite_queries::QUERY_GET_APPOINTMENT,
        )
        .bind(appointment_id)
        .bind(self.org_id)
        .fetch_optional(&self.db_pool)
        .await?)
    }

    async fn insert_appointment(
        &self,
        appointment: &models::appointment::Appointment,
    ) -> anyhow::Result<i64> {
        Ok(sqlx::query(sqlite_queries::QUERY_INSERT_APPOINTMENT)
            .bind(self.org_id)
            .bind(appointment.pet_id)
            .bind(appointment.service_id)
            .bind(appointment.package_id)
            .bind(appointment.scheduled_at)
            .bind(appointment.check_in_date)
            .bind(appointment.check_out_date)
            .bind(appointment.status.to_string())
            .bind(serde_json::to_string(&appointment.checklist)?)
            .bind(&appointment.notes)
            .bind(decimal_to_text(appointment.calculated_price))
            .bind(decimal_to_text(appointment.final_price))
            .bind(decimal_to_text(appointment.discount_percent))
            .bind(appointment.payment_status.to_string())
            .bind(appointment.payment_method.map(|m| m.to_string()))
            .bind(appointment.paid_at)
            .bind(appointment.actual_check_in)
            .bind(appointment.actual_check_out)
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .execute(&self.db_pool)
            .await?
            .last_insert_rowid())
    }

    async fn update_appointment(
        &self,
        appointment: &models::appointment::Appointment,
    ) -> anyhow::Result<()> {
        sqlx::query(sqlite_queries::QUERY_UPDATE_APPOINTMENT)
            .bind(appointment.status.to_string())
            .bind(serde_json::to_string(&appointment.checklist)?)
            .bind(&appointment.notes)
            .bind(decimal_to_text(appointment.calculated_price))
            .bind(decimal_to_text(appointment.final_price))
            .bind(decimal_to_text(appointment.discount_percent))
            .bind(appointment.payment_status.to_string())
            .bind(appointment.payment_method.map(|m| m.to_string()))
            .bind(appointment.paid_at)
            .bind(appointment.actual_check_in)
            .bind(appointment.actual_check_out)
            .bind(appointment.updated_at)
            .bind(appointment.id)
            .bind(self.org_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    async fn delete_appointment(&self, appointment_id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(sqlite_queries::QUERY_DELETE_APPOINTMENT)
            .bind(appointment_id)
            .bind(self.org_id)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_schedule_blocks_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<models::schedule_block::ScheduleBlock>> {
        Ok(sqlx::query_as::<_, models::schedule_block::ScheduleBlock>(
            sqlite_queries::QUERY_GET_SCHEDULE_BLOCKS_BETWEEN,
        )
        .bind(self.org_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn insert_schedule_block(
        &self,
        block: &models::schedule_block::ScheduleBlock,
    ) -> anyhow::Result<i64> {
        Ok(sqlx::query(sqlite_queries::QUERY_INSERT_SCHEDULE_BLOCK)
            .bind(self.org_id)
            .bind(block.start_at)
            .bind(block.end_at)
            .bind(&block.reason)
            .bind(block.created_at)
            .execute(&self.db_pool)
            .await?
            .last_insert_rowid())
    }

    async fn delete_schedule_block(&self, block_id: i64) -> anyhow::Result<()> {
        sqlx::query(sqlite_queries::QUERY_DELETE_SCHEDULE_BLOCK)
            .bind(block_id)
            .bind(self.org_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    async fn get_service_package(
        &self,
        package_id: i64,
    ) -> anyhow::Result<Option<models::package::ServicePackage>> {
        Ok(sqlx::query_as::<_, models::package::ServicePackage>(
            sqlite_queries::QUERY_GET_SERVICE_PACKAGE,
        )
        .bind(package_id)
        .bind(self.org_id)
        .fetch_optional(&self.db_pool)
        .await?)
    }

    async fn get_package_appointments(
        &self,
        package_id: i64,
    ) -> anyhow::Result<Vec<models::appointment::Appointment>> {
        Ok(sqlx::query_as::<_, models::appointment::Appointment>(
            sqlite_queries::QUERY_GET_PACKAGE_APPOINTMENTS,
        )
        .bind(package_id)
        .bind(self.org_id)
        .fetch_all(&self.db_pool)
        .await?)
    }
}
