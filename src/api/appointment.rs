//! # Appointment API Module
//!
//! Lifecycle of an appointment: booking, confirmation, check-in/check-out,
//! checklist edits, cancellation and payment settlement.
//!
//! Every entry point returns an [`ActionResult`]. A rejected operation leaves
//! the stored appointment untouched, each accepted one is a single write.

use crate::{
    api::{package, pricing, scheduling},
    consts,
    errors::{ActionResult, EngineError},
    metric,
    models::{
        self,
        appointment::{Appointment, AppointmentStatus, ChecklistItem, ChecklistItemInput, Schedule},
    },
    repo, utils,
};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Booking submitted by a tutor or by the staff.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub pet_id: i64,
    pub service_id: i64,
    pub schedule: Schedule,
    pub notes: Option<String>,
    /// Consume a credit of this package instead of charging the booking.
    pub package_id: Option<i64>,
    /// Staff bookings skip the `pending` step.
    pub created_by_staff: bool,
}

/// Converts the outcome of an operation into what the handlers return,
/// logging and counting it on the way.
fn finish(action: &str, result: Result<ActionResult, EngineError>) -> ActionResult {
    match &result {
        Ok(_) => metric::incr_appointment_action_statds(action),
        Err(EngineError::Persistence(_)) => {}
        Err(err) => {
            logfire::warn!(
                "appointment {action} rejected: {error}",
                action = action.to_string(),
                error = err.to_string()
            );
            metric::incr_rejection_statds(action);
        }
    }
    result.into()
}

async fn load_appointment(
    appointment_id: i64,
    repo: &repo::ImplAppRepo,
) -> Result<Appointment, EngineError> {
    repo.get_appointment(appointment_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("appointment {appointment_id}")))
}

/// Loads the appointment, applies `transition` and stores the result. Nothing
/// is written when the transition is rejected.
async fn apply_transition<F>(
    appointment_id: i64,
    repo: &repo::ImplAppRepo,
    transition: F,
) -> Result<Appointment, EngineError>
where
    F: FnOnce(&mut Appointment, DateTime<Utc>) -> Result<(), EngineError>,
{
    let mut appointment = load_appointment(appointment_id, repo).await?;
    transition(&mut appointment, Utc::now())?;
    repo.update_appointment(&appointment).await?;
    Ok(appointment)
}

/// Interval the booking occupies in the shop calendar.
fn occupied_interval(
    schedule: &Schedule,
    service: &models::service::Service,
    tz: Tz,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match schedule {
        Schedule::At(start) => {
            let minutes = if service.duration_minutes > 0 {
                service.duration_minutes
            } else {
                consts::DEFAULT_SERVICE_DURATION_MINUTES
            };
            (*start, *start + Duration::minutes(minutes))
        }
        Schedule::Stay {
            check_in_date,
            check_out_date,
        } => (
            utils::start_of_local_day(*check_in_date, tz),
            utils::start_of_local_day(*check_out_date, tz),
        ),
    }
}

async fn try_create_appointment(
    request: BookingRequest,
    tz: Tz,
    repo: &repo::ImplAppRepo,
) -> Result<ActionResult, EngineError> {
    match request.schedule {
        Schedule::Stay {
            check_in_date,
            check_out_date,
        } if check_out_date <= check_in_date => {
            return Err(EngineError::validation(
                "check-out date must be after check-in date",
            ));
        }
        _ => {}
    }

    let pet = repo
        .get_pet(request.pet_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("pet {}", request.pet_id)))?;
    let service = repo
        .get_service(request.service_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("service {}", request.service_id)))?;

    if !service.target_species.accepts(pet.species) {
        return Err(EngineError::validation(format!(
            "{} is not offered for {}",
            service.name,
            pet.species.plural_label()
        )));
    }

    let target_date = match request.schedule {
        Schedule::At(at) => utils::local_date(at, tz),
        Schedule::Stay { check_in_date, .. } => check_in_date,
    };
    scheduling::validate(&service, &pet, target_date).into_result()?;

    let (slot_start, slot_end) = occupied_interval(&request.schedule, &service, tz);
    scheduling::ensure_slot_is_free(slot_start, slot_end, repo).await?;

    let calculated_price = match (request.package_id, request.schedule) {
        (Some(package_id), _) => {
            package::reserve_credit(package_id, pet.id, service.id, repo).await?;
            Decimal::ZERO
        }
        (
            None,
            Schedule::Stay {
                check_in_date,
                check_out_date,
            },
        ) => pricing::resolve_stay_price(&service, &pet, check_in_date, check_out_date),
        (None, Schedule::At(_)) => pricing::resolve_price(&service, &pet, target_date),
    };

    let (check_in_date, check_out_date) = match request.schedule {
        Schedule::At(_) => (None, None),
        Schedule::Stay {
            check_in_date,
            check_out_date,
        } => (Some(check_in_date), Some(check_out_date)),
    };

    let now = Utc::now();
    let mut appointment = Appointment {
        pet_id: pet.id,
        service_id: service.id,
        package_id: request.package_id,
        scheduled_at: slot_start,
        check_in_date,
        check_out_date,
        status: if request.created_by_staff {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Pending
        },
        checklist: service
            .checklist_template
            .iter()
            .map(|text| ChecklistItem::from_template(text))
            .collect(),
        notes: request.notes.filter(|notes| !notes.trim().is_empty()),
        calculated_price: Some(calculated_price),
        created_at: now,
        updated_at: now,
        ..Default::default()
    };
    appointment.id = repo.insert_appointment(&appointment).await?;

    log::info!(
        "appointment {} created for pet {} service {} at {}",
        appointment.id,
        appointment.pet_id,
        appointment.service_id,
        appointment.scheduled_at
    );
    Ok(ActionResult::created(appointment.id))
}

/// Books a service for a pet.
///
/// # Arguments
/// * `request` - Pet, service, slot or stay, optional package and notes
/// * `tz` - Shop timezone, weekdays are taken from this calendar
/// * `repo` - Repository instance for database operations
///
/// # Returns
/// * `ActionResult` - Carries the new appointment id on success
///
/// # Process
/// 1. Validate the stay range, when booking a multi-day stay
/// 2. Load pet and service
/// 3. Check the service day × species restrictions on the local date
/// 4. Reject slots overlapping a schedule block
/// 5. Price it, or consume a package credit
/// 6. Store it with the service checklist copied in
///
/// # Errors
/// The result is unsuccessful if:
/// - The stay range is empty or inverted
/// - Pet or service doesn't exist
/// - The service doesn't take the pet's species, on that day or at all
/// - The slot overlaps a schedule block
/// - The package belongs to another service, expired or has no credit left
/// - Database operations fail
#[tracing::instrument(skip(repo))]
pub async fn create_appointment(
    request: BookingRequest,
    tz: Tz,
    repo: &repo::ImplAppRepo,
) -> ActionResult {
    finish("create", try_create_appointment(request, tz, repo).await)
}

/// Moves a `pending` appointment to `confirmed`.
///
/// # Arguments
/// * `appointment_id` - Appointment to confirm
/// * `repo` - Repository instance for database operations
///
/// # Errors
/// The result is unsuccessful if the appointment is missing or not pending.
#[tracing::instrument(skip(repo))]
pub async fn confirm_appointment(appointment_id: i64, repo: &repo::ImplAppRepo) -> ActionResult {
    let result = apply_transition(appointment_id, repo, |appointment, now| {
        appointment.confirm(now)
    })
    .await
    .map(|_| ActionResult::ok("appointment confirmed"));

    finish("confirm", result)
}

/// Records the real arrival of the pet and moves the appointment to
/// `in_progress`.
///
/// # Arguments
/// * `appointment_id` - Appointment being started
/// * `repo` - Repository instance for database operations
///
/// # Errors
/// The result is unsuccessful if:
/// - The appointment was already checked in, the first timestamp is kept
/// - The appointment is done, cancelled or a no-show
#[tracing::instrument(skip(repo))]
pub async fn check_in(appointment_id: i64, repo: &repo::ImplAppRepo) -> ActionResult {
    let result = apply_transition(appointment_id, repo, |appointment, now| {
        appointment.check_in(now)
    })
    .await
    .map(|_| ActionResult::ok("check-in recorded"));

    finish("check_in", result)
}

/// Records the pet leaving and closes the appointment as `done`.
///
/// # Errors
/// The result is unsuccessful if the pet was never checked in or was already
/// checked out.
#[tracing::instrument(skip(repo))]
pub async fn check_out(appointment_id: i64, repo: &repo::ImplAppRepo) -> ActionResult {
    let result = apply_transition(appointment_id, repo, |appointment, now| {
        appointment.check_out(now)
    })
    .await
    .map(|_| ActionResult::ok("check-out recorded"));

    finish("check_out", result)
}

/// Replaces the appointment checklist with the items sent by the staff.
/// Completion times are stamped here, status is left as is.
#[tracing::instrument(skip(repo, items))]
pub async fn update_checklist(
    appointment_id: i64,
    items: Vec<ChecklistItemInput>,
    repo: &repo::ImplAppRepo,
) -> ActionResult {
    let result = apply_transition(appointment_id, repo, |appointment, now| {
        appointment.replace_checklist(items, now)
    })
    .await
    .map(|_| ActionResult::ok("checklist updated"));

    finish("update_checklist", result)
}

/// Cancels an appointment that is not finished yet. Its package credit, if
/// any, becomes available again.
#[tracing::instrument(skip(repo))]
pub async fn cancel_appointment(appointment_id: i64, repo: &repo::ImplAppRepo) -> ActionResult {
    let result = apply_transition(appointment_id, repo, |appointment, now| {
        appointment.cancel(now)
    })
    .await
    .map(|_| ActionResult::ok("appointment cancelled"));

    finish("cancel", result)
}

async fn try_delete_appointment(
    appointment_id: i64,
    repo: &repo::ImplAppRepo,
) -> Result<ActionResult, EngineError> {
    let mut appointment = load_appointment(appointment_id, repo).await?;

    if appointment.actual_check_in.is_none() {
        if !repo.delete_appointment(appointment_id).await? {
            // Checked in between the read and the delete.
            return Err(EngineError::state(format!(
                "appointment {appointment_id} was checked in before it could be deleted"
            )));
        }
        return Ok(ActionResult::ok("appointment deleted"));
    }

    // Started appointments stay as history.
    appointment.cancel(Utc::now())?;
    repo.update_appointment(&appointment).await?;
    Ok(ActionResult::ok("appointment cancelled"))
}

/// Removes an appointment that never started; once checked in it is only
/// cancelled.
///
/// # Arguments
/// * `appointment_id` - Appointment to remove
/// * `repo` - Repository instance for database operations
///
/// # Returns
/// * `ActionResult` - "appointment deleted" or "appointment cancelled"
///
/// # Errors
/// The result is unsuccessful if:
/// - The appointment is missing
/// - It got checked in while being deleted
/// - It was started and is already terminal, so it can't be cancelled
#[tracing::instrument(skip(repo))]
pub async fn delete_appointment(appointment_id: i64, repo: &repo::ImplAppRepo) -> ActionResult {
    finish("delete", try_delete_appointment(appointment_id, repo).await)
}

/// Flags that the pet never showed up. Only for appointments that were
/// never checked in and are not terminal.
#[tracing::instrument(skip(repo))]
pub async fn mark_no_show(appointment_id: i64, repo: &repo::ImplAppRepo) -> ActionResult {
    let result = apply_transition(appointment_id, repo, |appointment, now| {
        appointment.mark_no_show(now)
    })
    .await
    .map(|_| ActionResult::ok("appointment marked as no-show"));

    finish("no_show", result)
}

/// Registers the payment of an appointment.
///
/// # Arguments
/// * `appointment_id` - Appointment being paid
/// * `method` - Payment method as typed by the staff (`pix`, `dinheiro`, ...)
/// * `repo` - Repository instance for database operations
///
/// # Errors
/// The result is unsuccessful if:
/// - The payment method is unknown
/// - The appointment is missing or cancelled
#[tracing::instrument(skip(repo))]
pub async fn mark_paid(appointment_id: i64, method: &str, repo: &repo::ImplAppRepo) -> ActionResult {
    let result = match models::appointment::PaymentMethod::from_str(method) {
        Ok(method) => apply_transition(appointment_id, repo, |appointment, now| {
            appointment.mark_paid(method, now)
        })
        .await
        .map(|_| ActionResult::ok("payment recorded")),
        Err(err) => Err(err.into()),
    };

    if result.is_ok() {
        metric::incr_payment_status_statds("paid");
    }
    finish("mark_paid", result)
}

/// Undoes a payment registered by mistake.
#[tracing::instrument(skip(repo))]
pub async fn mark_unpaid(appointment_id: i64, repo: &repo::ImplAppRepo) -> ActionResult {
    let result = apply_transition(appointment_id, repo, |appointment, now| {
        appointment.mark_unpaid(now);
        Ok(())
    })
    .await
    .map(|_| ActionResult::ok("payment removed"));

    if result.is_ok() {
        metric::incr_payment_status_statds("pending");
    }
    finish("mark_unpaid", result)
}

fn parse_percent(percent: &str) -> Result<Decimal, EngineError> {
    Decimal::from_str(percent.trim())
        .map_err(|_| EngineError::validation("discount must be a number"))
}

async fn try_apply_discount(
    appointment_id: i64,
    percent: &str,
    repo: &repo::ImplAppRepo,
) -> Result<ActionResult, EngineError> {
    let percent = parse_percent(percent)?;
    let mut appointment = load_appointment(appointment_id, repo).await?;

    let service_base_price = match appointment.calculated_price {
        Some(_) => Decimal::ZERO,
        None => {
            repo.get_service(appointment.service_id)
                .await?
                .ok_or_else(|| {
                    EngineError::not_found(format!("service {}", appointment.service_id))
                })?
                .base_price
        }
    };

    appointment.apply_discount(percent, service_base_price, Utc::now())?;
    repo.update_appointment(&appointment).await?;

    Ok(ActionResult::ok(format!(
        "discount applied, final price {}",
        appointment.effective_price(service_base_price)
    )))
}

/// Applies a percent discount typed by the staff (`"0"`..`"100"`).
///
/// The discount is taken over `calculated_price`, or the service base price
/// for appointments stored without one. `"0"` restores the full price.
///
/// # Arguments
/// * `appointment_id` - Appointment to discount
/// * `percent` - Raw percent text from the form
/// * `repo` - Repository instance for database operations
///
/// # Returns
/// * `ActionResult` - Message with the resulting final price
///
/// # Errors
/// The result is unsuccessful if:
/// - `percent` is not a number or is outside `[0, 100]`
/// - The appointment or its service is missing
#[tracing::instrument(skip(repo))]
pub async fn apply_discount(
    appointment_id: i64,
    percent: &str,
    repo: &repo::ImplAppRepo,
) -> ActionResult {
    finish(
        "apply_discount",
        try_apply_discount(appointment_id, percent, repo).await,
    )
}

async fn try_update_pet_preferences(
    appointment_id: i64,
    preferences: models::pet::GroomingPreferences,
    repo: &repo::ImplAppRepo,
) -> Result<ActionResult, EngineError> {
    let appointment = load_appointment(appointment_id, repo).await?;

    if appointment.status == AppointmentStatus::Cancelled {
        return Err(EngineError::state(
            "preferences can't be changed from a cancelled appointment",
        ));
    }

    repo.update_pet_preferences(appointment.pet_id, preferences)
        .await?;
    Ok(ActionResult::ok("pet preferences updated"))
}

/// Toggles perfume/accessories preferences of the pet while it is being
/// groomed.
#[tracing::instrument(skip(repo))]
pub async fn update_pet_preferences(
    appointment_id: i64,
    preferences: models::pet::GroomingPreferences,
    repo: &repo::ImplAppRepo,
) -> ActionResult {
    finish(
        "update_pet_preferences",
        try_update_pet_preferences(appointment_id, preferences, repo).await,
    )
}
