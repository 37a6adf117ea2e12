//! # Scheduling API Module
//!
//! Decides whether a service may be booked for a pet on a given day, based on
//! the service's day × species restrictions, and whether a slot collides with
//! a schedule block set by the staff.

use crate::{consts, errors::EngineError, metric, models, repo, utils};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Answer of the validator, also used for live form feedback.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchedulingDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SchedulingDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    pub fn into_result(self) -> Result<(), EngineError> {
        match self.reason {
            Some(reason) if !self.allowed => Err(EngineError::Validation(reason)),
            _ => Ok(()),
        }
    }
}

fn join_species_labels(species: &[models::pet::Species]) -> String {
    let labels: Vec<&str> = species.iter().map(|s| s.plural_label()).collect();
    match labels.as_slice() {
        [] => "no species".to_string(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Checks the service's day × species restrictions for `target_date`, which
/// must already be a date on the shop's calendar.
///
/// Days without a rule are always open. Pets that are neither dogs nor cats
/// are not affected by species restrictions.
pub fn validate(
    service: &models::service::Service,
    pet: &models::pet::Pet,
    target_date: NaiveDate,
) -> SchedulingDecision {
    let day = utils::weekday_index(target_date);

    let Some(rule) = service.scheduling_rules.rule_for_day(day) else {
        return SchedulingDecision::allowed();
    };

    if pet.species == models::pet::Species::Other || rule.allows(pet.species) {
        return SchedulingDecision::allowed();
    }

    SchedulingDecision::rejected(format!(
        "this service is only permitted for {} on {}",
        join_species_labels(&rule.species),
        consts::WEEKDAY_NAMES_PLURAL[usize::from(day)]
    ))
}

/// First block overlapping `[start, end)`, if any.
pub fn find_conflicting_block(
    blocks: &[models::schedule_block::ScheduleBlock],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<&models::schedule_block::ScheduleBlock> {
    blocks.iter().find(|block| block.overlaps(start, end))
}

/// Rejects a slot overlapping any schedule block stored for that interval.
pub async fn ensure_slot_is_free(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    repo: &repo::ImplAppRepo,
) -> Result<(), EngineError> {
    let blocks = repo.get_schedule_blocks_between(start, end).await?;

    match find_conflicting_block(&blocks, start, end) {
        Some(block) if block.reason.trim().is_empty() => Err(EngineError::validation(
            "the selected time is blocked in the shop schedule",
        )),
        Some(block) => Err(EngineError::validation(format!(
            "the selected time is blocked in the shop schedule: {}",
            block.reason
        ))),
        None => Ok(()),
    }
}

/// Read-only check used by the booking form before submission.
///
/// Missing pet or service yields a rejected decision instead of an error so
/// the form can render the message as is.
///
/// # Arguments
/// * `service_id` - Service being booked
/// * `pet_id` - Pet being booked
/// * `date` - Day on the shop calendar
/// * `repo` - Repository instance for database operations
///
/// # Returns
/// * `SchedulingDecision` - `allowed`, or the reason shown to the user
#[tracing::instrument(skip(repo))]
pub async fn validate_scheduling(
    service_id: i64,
    pet_id: i64,
    date: NaiveDate,
    repo: &repo::ImplAppRepo,
) -> SchedulingDecision {
    let (service, pet) = match (repo.get_service(service_id).await, repo.get_pet(pet_id).await) {
        (Ok(Some(service)), Ok(Some(pet))) => (service, pet),
        (Ok(None), _) | (_, Ok(None)) => {
            return SchedulingDecision::rejected(
                EngineError::not_found("pet or service").user_message(),
            );
        }
        (Err(err), _) | (_, Err(err)) => {
            return SchedulingDecision::rejected(EngineError::from(err).user_message());
        }
    };

    let decision = validate(&service, &pet, date);
    if !decision.allowed {
        metric::incr_rejection_statds("scheduling_rule");
    }
    decision
}

/// Staff marks an interval as unavailable.
///
/// # Arguments
/// * `start_at` - First blocked instant
/// * `end_at` - End of the block, exclusive
/// * `reason` - Shown to whoever tries to book inside it
/// * `repo` - Repository instance for database operations
///
/// # Errors
/// Returns an error if:
/// - `end_at` is not after `start_at`
/// - Database operations fail
pub async fn add_schedule_block(
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    reason: &str,
    repo: &repo::ImplAppRepo,
) -> Result<models::schedule_block::ScheduleBlock, EngineError> {
    if end_at <= start_at {
        return Err(EngineError::validation(
            "block end must be after block start",
        ));
    }

    let mut block = models::schedule_block::ScheduleBlock {
        id: 0,
        start_at,
        end_at,
        reason: reason.trim().to_string(),
        created_at: Utc::now(),
    };
    block.id = repo.insert_schedule_block(&block).await?;

    log::info!("schedule block {} created", block.id);
    Ok(block)
}

/// Deletes a schedule block. Removing an unknown id is not an error.
pub async fn remove_schedule_block(
    block_id: i64,
    repo: &repo::ImplAppRepo,
) -> Result<(), EngineError> {
    Ok(repo.delete_schedule_block(block_id).await?)
}
