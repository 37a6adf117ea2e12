//! # Package API Module
//!
//! Service packages are never decremented. Their usage is rebuilt on every
//! read by pairing the package's appointments, in chronological order, with
//! its purchased credits.

use crate::{errors::EngineError, repo};
use chrono::{DateTime, Utc};

use crate::models::{
    appointment::{Appointment, AppointmentStatus},
    package::{PackageSlot, PackageUsage, ServicePackage, SlotStatus},
};

/// Derives the usage of `package` from the appointments charged to it.
///
/// Cancelled appointments are ignored. The first `total_qty` remaining
/// appointments, ordered by `scheduled_at`, each hold one slot: `used` once
/// the appointment is done, `scheduled` otherwise. Slots left over are
/// `available`. Extra appointments are only counted in `overbooked_qty`.
pub fn compute_usage(
    package: &ServicePackage,
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> PackageUsage {
    let mut active: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.status != AppointmentStatus::Cancelled)
        .collect();
    active.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));

    let slots: Vec<PackageSlot> = (0..package.total_qty)
        .map(|idx| match active.get(idx as usize) {
            Some(appointment) => PackageSlot {
                position: idx + 1,
                status: if appointment.status == AppointmentStatus::Done {
                    SlotStatus::Used
                } else {
                    SlotStatus::Scheduled
                },
                appointment_id: Some(appointment.id),
                scheduled_at: Some(appointment.scheduled_at),
            },
            None => PackageSlot {
                position: idx + 1,
                status: SlotStatus::Available,
                appointment_id: None,
                scheduled_at: None,
            },
        })
        .collect();

    let count = |status: SlotStatus| slots.iter().filter(|s| s.status == status).count() as u32;
    let used_qty = count(SlotStatus::Used);
    let scheduled_qty = count(SlotStatus::Scheduled);
    let available_qty = count(SlotStatus::Available);

    PackageUsage {
        package_id: package.id,
        total_qty: package.total_qty,
        used_qty,
        scheduled_qty,
        available_qty,
        remaining_qty: package.total_qty - (used_qty + scheduled_qty),
        overbooked_qty: (active.len() as u32).saturating_sub(package.total_qty),
        is_expired: package.is_expired(now),
        slots,
    }
}

/// Loads a pet's package and derives its usage.
///
/// # Arguments
/// * `pet_id` - Owner of the package
/// * `package_id` - Package to inspect
/// * `repo` - Repository instance for database operations
///
/// # Returns
/// * `Result<PackageUsage, EngineError>` - Counters and the slot list
///
/// # Errors
/// Returns an error if:
/// - The package doesn't exist or belongs to another pet
/// - Database operations fail
#[tracing::instrument(skip(repo))]
pub async fn get_package_usage(
    pet_id: i64,
    package_id: i64,
    repo: &repo::ImplAppRepo,
) -> Result<PackageUsage, EngineError> {
    let package = repo
        .get_service_package(package_id)
        .await?
        .filter(|package| package.pet_id == pet_id)
        .ok_or_else(|| EngineError::not_found(format!("package {package_id}")))?;

    let appointments = repo.get_package_appointments(package_id).await?;

    Ok(compute_usage(&package, &appointments, Utc::now()))
}

/// Checks that a new appointment for `pet_id`/`service_id` can consume one
/// credit of the package. Returns the usage seen at decision time.
///
/// Two requests may both see the last credit as available; nothing here
/// prevents that and the overbooking shows up in `overbooked_qty`.
pub async fn reserve_credit(
    package_id: i64,
    pet_id: i64,
    service_id: i64,
    repo: &repo::ImplAppRepo,
) -> Result<PackageUsage, EngineError> {
    let package = repo
        .get_service_package(package_id)
        .await?
        .filter(|package| package.pet_id == pet_id)
        .ok_or_else(|| EngineError::not_found(format!("package {package_id}")))?;

    if package.service_id != service_id {
        return Err(EngineError::validation(
            "this package doesn't cover the selected service",
        ));
    }

    let appointments = repo.get_package_appointments(package_id).await?;
    let usage = compute_usage(&package, &appointments, Utc::now());

    if usage.is_expired {
        return Err(EngineError::validation("this package has expired"));
    }
    if !usage.can_book() {
        return Err(EngineError::validation(
            "this package has no credits available",
        ));
    }

    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::MockAppRepo;
    use chrono::{Duration, TimeZone};
    use mockall::predicate::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap()
    }

    fn create_test_package(total_qty: u32) -> ServicePackage {
        ServicePackage {
            id: 3,
            pet_id: 7,
            service_id: 1,
            total_qty,
            purchased_at: now() - Duration::days(30),
            expires_at: None,
        }
    }

    fn create_test_appointment(id: i64, days: i64, status: AppointmentStatus) -> Appointment {
        Appointment {
            id,
            pet_id: 7,
            service_id: 1,
            package_id: Some(3),
            scheduled_at: now() + Duration::days(days),
            status,
            ..Default::default()
        }
    }

    fn assert_sum_invariant(usage: &PackageUsage) {
        assert_eq!(
            usage.used_qty + usage.scheduled_qty + usage.available_qty,
            usage.total_qty
        );
        assert_eq!(usage.slots.len() as u32, usage.total_qty);
        assert_eq!(usage.remaining_qty, usage.available_qty);
    }

    #[test]
    fn test_one_done_one_pending_of_five() {
        let appointments = vec![
            create_test_appointment(1, -7, AppointmentStatus::Done),
            create_test_appointment(2, 7, AppointmentStatus::Pending),
        ];

        let usage = compute_usage(&create_test_package(5), &appointments, now());

        assert_eq!(usage.used_qty, 1);
        assert_eq!(usage.scheduled_qty, 1);
        assert_eq!(usage.available_qty, 3);
        assert_eq!(usage.remaining_qty, 3);
        assert_eq!(usage.slots[0].appointment_id, Some(1));
        assert_eq!(usage.slots[1].appointment_id, Some(2));
        assert_eq!(usage.slots[2].status, SlotStatus::Available);
        assert_sum_invariant(&usage);
    }

    #[test]
    fn test_slots_follow_chronological_order() {
        let appointments = vec![
            create_test_appointment(10, 14, AppointmentStatus::Confirmed),
            create_test_appointment(11, -14, AppointmentStatus::Done),
            create_test_appointment(12, 1, AppointmentStatus::InProgress),
        ];

        let usage = compute_usage(&create_test_package(2), &appointments, now());

        let bound: Vec<Option<i64>> = usage.slots.iter().map(|s| s.appointment_id).collect();
        assert_eq!(bound, vec![Some(11), Some(12)]);
        assert_eq!(usage.overbooked_qty, 1);
        assert_sum_invariant(&usage);
    }

    #[test]
    fn test_cancelled_appointments_free_their_slot() {
        let appointments = vec![
            create_test_appointment(1, -3, AppointmentStatus::Cancelled),
            create_test_appointment(2, 3, AppointmentStatus::Confirmed),
        ];

        let usage = compute_usage(&create_test_package(2), &appointments, now());

        assert_eq!(usage.scheduled_qty, 1);
        assert_eq!(usage.available_qty, 1);
        assert_eq!(usage.slots[0].appointment_id, Some(2));
    }

    #[test]
    fn test_sum_invariant_for_any_ordering() {
        let statuses = [
            AppointmentStatus::Done,
            AppointmentStatus::Pending,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::NoShow,
            AppointmentStatus::InProgress,
        ];

        for total_qty in 0..6 {
            for len in 0..=statuses.len() {
                for rotation in 0..statuses.len() {
                    let appointments: Vec<Appointment> = (0..len)
                        .map(|i| {
                            let status = statuses[(i + rotation) % statuses.len()];
                            create_test_appointment(i as i64, (len - i) as i64, status)
                        })
                        .collect();

                    let usage =
                        compute_usage(&create_test_package(total_qty), &appointments, now());
                    assert_sum_invariant(&usage);
                }
            }
        }
    }

    #[test]
    fn test_concurrent_bookings_overbook_without_breaking_invariant() {
        // Both requests saw one credit left and both were stored.
        let appointments = vec![
            create_test_appointment(1, 1, AppointmentStatus::Pending),
            create_test_appointment(2, 2, AppointmentStatus::Pending),
        ];

        let usage = compute_usage(&create_test_package(1), &appointments, now());

        assert_eq!(usage.scheduled_qty, 1);
        assert_eq!(usage.available_qty, 0);
        assert_eq!(usage.overbooked_qty, 1);
        assert!(!usage.can_book());
        assert_sum_invariant(&usage);
    }

    #[test]
    fn test_expired_package_still_reports_usage() {
        let mut package = create_test_package(3);
        package.expires_at = Some(now() - Duration::days(1));
        let appointments = vec![create_test_appointment(1, -10, AppointmentStatus::Done)];

        let usage = compute_usage(&package, &appointments, now());

        assert!(usage.is_expired);
        assert_eq!(usage.used_qty, 1);
        assert_eq!(usage.available_qty, 2);
        assert!(!usage.can_book());
    }

    #[tokio::test]
    async fn test_get_package_usage_of_another_pet_is_not_found() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_service_package()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(Some(create_test_package(5))));
        let mock_repo: Box<dyn repo::AppRepo> = Box::new(mock_repo);

        let result = get_package_usage(99, 3, &mock_repo).await;

        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_package_usage() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_service_package()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(Some(create_test_package(5))));
        mock_repo
            .expect_get_package_appointments()
            .with(eq(3))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    create_test_appointment(1, -7, AppointmentStatus::Done),
                    create_test_appointment(2, 7, AppointmentStatus::Pending),
                ])
            });
        let mock_repo: Box<dyn repo::AppRepo> = Box::new(mock_repo);

        let result = get_package_usage(7, 3, &mock_repo).await;

        assert!(result.is_ok_and(|usage| {
            usage.used_qty == 1 && usage.scheduled_qty == 1 && usage.available_qty == 3
        }));
    }

    #[tokio::test]
    async fn test_reserve_credit_rejects_other_service() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_service_package()
            .returning(|_| Ok(Some(create_test_package(5))));
        let mock_repo: Box<dyn repo::AppRepo> = Box::new(mock_repo);

        let result = reserve_credit(3, 7, 2, &mock_repo).await;

        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reserve_credit_rejects_full_package() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_service_package()
            .returning(|_| Ok(Some(create_test_package(1))));
        mock_repo
            .expect_get_package_appointments()
            .returning(|_| Ok(vec![create_test_appointment(1, 2, AppointmentStatus::Pending)]));
        let mock_repo: Box<dyn repo::AppRepo> = Box::new(mock_repo);

        let result = reserve_credit(3, 7, 1, &mock_repo).await;

        assert!(
            matches!(result, Err(EngineError::Validation(msg)) if msg.contains("no credits"))
        );
    }

    #[tokio::test]
    async fn test_reserve_credit_rejects_expired_package() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo.expect_get_service_package().with(eq(3)).returning(|_| {
            let mut package = create_test_package(5);
            package.expires_at = Some(Utc::now() - Duration::days(1));
            Ok(Some(package))
        });
        mock_repo
            .expect_get_package_appointments()
            .with(eq(3))
            .returning(|_| Ok(vec![]));
        let mock_repo: Box<dyn repo::AppRepo> = Box::new(mock_repo);

        let result = reserve_credit(3, 7, 1, &mock_repo).await;

        assert!(
            matches!(result, Err(EngineError::Validation(msg)) if msg.contains("expired"))
        );
    }

    #[tokio::test]
    async fn test_reserve_credit_returns_usage() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_service_package()
            .returning(|_| Ok(Some(create_test_package(2))));
        mock_repo
            .expect_get_package_appointments()
            .returning(|_| Ok(vec![create_test_appointment(1, -2, AppointmentStatus::Done)]));
        let mock_repo: Box<dyn repo::AppRepo> = Box::new(mock_repo);

        let result = reserve_credit(3, 7, 1, &mock_repo).await;

        assert!(result.is_ok_and(|usage| usage.used_qty == 1 && usage.available_qty == 1));
    }
}
