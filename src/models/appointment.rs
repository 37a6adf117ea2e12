use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ParseEnumError;
use crate::errors::EngineError;

/// Canonical appointment status.
///
/// Older rows were written with `completed` and `canceled`; both are accepted
/// when reading and always written back as `done` and `cancelled`.
#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[display("confirmed")]
    Confirmed,
    #[display("in_progress")]
    InProgress,
    #[display("done")]
    #[serde(alias = "completed", alias = "finished")]
    Done,
    #[display("cancelled")]
    #[serde(alias = "canceled")]
    Cancelled,
    #[display("no_show")]
    #[serde(alias = "no-show")]
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Done | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl FromStr for AppointmentStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "in_progress" | "in-progress" => Ok(AppointmentStatus::InProgress),
            "done" | "completed" | "finished" => Ok(AppointmentStatus::Done),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "no_show" | "no-show" => Ok(AppointmentStatus::NoShow),
            _ => Err(ParseEnumError::new("appointment status", value)),
        }
    }
}

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[display("paid")]
    Paid,
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" | "unpaid" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(ParseEnumError::new("payment status", value)),
        }
    }
}

#[derive(Debug, Display, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[display("cash")]
    Cash,
    #[display("pix")]
    Pix,
    #[display("credit_card")]
    CreditCard,
    #[display("debit_card")]
    DebitCard,
    #[display("bank_transfer")]
    BankTransfer,
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "cash" | "dinheiro" => Ok(PaymentMethod::Cash),
            "pix" => Ok(PaymentMethod::Pix),
            "credit_card" | "credit" | "credito" => Ok(PaymentMethod::CreditCard),
            "debit_card" | "debit" | "debito" => Ok(PaymentMethod::DebitCard),
            "bank_transfer" | "transfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(ParseEnumError::new("payment method", value)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ChecklistItem {
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChecklistItem {
    pub fn from_template(text: &str) -> Self {
        Self {
            text: text.to_string(),
            completed: false,
            completed_at: None,
        }
    }
}

/// Checklist item as submitted by the staff form.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChecklistItemInput {
    pub text: String,
    pub completed: bool,
}

/// When the appointment happens: a single slot or a multi-day stay.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    At(DateTime<Utc>),
    Stay {
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
    },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub pet_id: i64,
    pub service_id: i64,
    pub package_id: Option<i64>,
    pub scheduled_at: DateTime<Utc>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    pub status: AppointmentStatus,
    pub checklist: Vec<ChecklistItem>,
    pub notes: Option<String>,
    pub calculated_price: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub paid_at: Option<DateTime<Utc>>,
    pub actual_check_in: Option<DateTime<Utc>>,
    pub actual_check_out: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_stay(&self) -> bool {
        self.check_in_date.is_some() && self.check_out_date.is_some()
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.eq(&PaymentStatus::Paid)
    }

    pub fn counts_toward_revenue(&self) -> bool {
        self.is_paid() && self.status != AppointmentStatus::Cancelled
    }

    /// `final_price`, else `calculated_price`, else the service base price.
    pub fn effective_price(&self, service_base_price: Decimal) -> Decimal {
        self.final_price
            .or(self.calculated_price)
            .unwrap_or(service_base_price)
    }

    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status != AppointmentStatus::Pending {
            return Err(EngineError::state(format!(
                "cannot confirm a {} appointment",
                self.status
            )));
        }

        self.status = AppointmentStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    pub fn check_in(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.actual_check_in.is_some() {
            return Err(EngineError::state("appointment already checked in"));
        }
        if self.status.is_terminal() {
            return Err(EngineError::state(format!(
                "cannot check in a {} appointment",
                self.status
            )));
        }

        self.actual_check_in = Some(now);
        if matches!(
            self.status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        ) {
            self.status = AppointmentStatus::InProgress;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn check_out(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.actual_check_in.is_none() {
            return Err(EngineError::state("appointment was never checked in"));
        }
        if self.actual_check_out.is_some() {
            return Err(EngineError::state("appointment already checked out"));
        }
        if self.status.is_terminal() {
            return Err(EngineError::state(format!(
                "cannot check out a {} appointment",
                self.status
            )));
        }

        self.actual_check_out = Some(now);
        self.status = AppointmentStatus::Done;
        self.updated_at = now;
        Ok(())
    }

    /// Replaces the checklist. An item keeps its previous `completed_at` when it
    /// was already completed, gets `now` when it just flipped and loses it when
    /// it is not completed.
    pub fn replace_checklist(
        &mut self,
        items: Vec<ChecklistItemInput>,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if self.status == AppointmentStatus::Cancelled {
            return Err(EngineError::state(
                "checklist of a cancelled appointment can't be edited",
            ));
        }
        if items.iter().any(|item| item.text.trim().is_empty()) {
            return Err(EngineError::validation("checklist items must have a text"));
        }

        let mut previous = std::mem::take(&mut self.checklist);
        self.checklist = items
            .into_iter()
            .map(|item| {
                let prev_completed_at = previous
                    .iter()
                    .position(|p| p.text == item.text)
                    .map(|idx| previous.remove(idx))
                    .filter(|p| p.completed)
                    .and_then(|p| p.completed_at);

                ChecklistItem {
                    completed_at: if item.completed {
                        prev_completed_at.or(Some(now))
                    } else {
                        None
                    },
                    text: item.text,
                    completed: item.completed,
                }
            })
            .collect();
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::state(format!(
                "cannot cancel a {} appointment",
                self.status
            )));
        }

        self.status = AppointmentStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Only for pets that never showed up, so a recorded check-in rules it out.
    pub fn mark_no_show(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status.is_terminal() || self.actual_check_in.is_some() {
            return Err(EngineError::state(format!(
                "cannot mark a {} appointment as no-show",
                self.status
            )));
        }

        self.status = AppointmentStatus::NoShow;
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_paid(&mut self, method: PaymentMethod, now: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status == AppointmentStatus::Cancelled {
            return Err(EngineError::state("cannot charge a cancelled appointment"));
        }

        self.payment_status = PaymentStatus::Paid;
        self.payment_method = Some(method);
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_unpaid(&mut self, now: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Pending;
        self.payment_method = None;
        self.paid_at = None;
        self.updated_at = now;
    }

    /// `final_price = base * (1 - percent / 100)` where base is the calculated
    /// price, falling back to the service base price for legacy rows.
    pub fn apply_discount(
        &mut self,
        percent: Decimal,
        service_base_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if percent < Decimal::ZERO || percent > dec!(100) {
            return Err(EngineError::validation(
                "discount must be a percentage between 0 and 100",
            ));
        }

        let base = self.calculated_price.unwrap_or(service_base_price);
        let final_price = base * (Decimal::ONE - percent / dec!(100));

        self.final_price = Some(final_price.round_dp(2));
        self.discount_percent = Some(percent.normalize());
        self.updated_at = now;
        Ok(())
    }
}

/// Money actually collected: paid, non cancelled appointments at their
/// effective price.
pub fn paid_revenue<F>(appointments: &[Appointment], base_price_of: F) -> Decimal
where
    F: Fn(i64) -> Decimal,
{
    appointments
        .iter()
        .filter(|a| a.counts_toward_revenue())
        .map(|a| a.effective_price(base_price_of(a.service_id)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 8, 13, 0, 0).unwrap()
    }

    fn create_test_appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: 1,
            pet_id: 10,
            service_id: 20,
            scheduled_at: now(),
            status,
            calculated_price: Some(dec!(100.00)),
            created_at: now(),
            updated_at: now(),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_aliases() {
        assert_eq!(
            "completed".parse::<AppointmentStatus>(),
            Ok(AppointmentStatus::Done)
        );
        assert_eq!(
            "canceled".parse::<AppointmentStatus>(),
            Ok(AppointmentStatus::Cancelled)
        );
        assert!("archived".parse::<AppointmentStatus>().is_err());

        let status: AppointmentStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status.to_string(), "cancelled");
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"cancelled\"");
    }

    #[test]
    fn test_confirm_only_from_pending() {
        let mut appointment = create_test_appointment(AppointmentStatus::Pending);
        assert!(appointment.confirm(now()).is_ok());
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);

        let mut cancelled = create_test_appointment(AppointmentStatus::Cancelled);
        assert!(matches!(cancelled.confirm(now()), Err(EngineError::State(_))));
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn test_check_in_twice_keeps_first_timestamp() {
        let mut appointment = create_test_appointment(AppointmentStatus::Confirmed);
        let first = now();
        let later = first + chrono::Duration::minutes(5);

        assert!(appointment.check_in(first).is_ok());
        assert_eq!(appointment.status, AppointmentStatus::InProgress);

        assert!(matches!(appointment.check_in(later), Err(EngineError::State(_))));
        assert_eq!(appointment.actual_check_in, Some(first));
    }

    #[test]
    fn test_check_out_requires_check_in() {
        let mut appointment = create_test_appointment(AppointmentStatus::Confirmed);
        assert!(matches!(appointment.check_out(now()), Err(EngineError::State(_))));
        assert!(appointment.actual_check_out.is_none());

        appointment.check_in(now()).unwrap();
        let out = now() + chrono::Duration::hours(2);
        assert!(appointment.check_out(out).is_ok());
        assert_eq!(appointment.status, AppointmentStatus::Done);
        assert_eq!(appointment.actual_check_out, Some(out));

        assert!(matches!(appointment.check_out(out), Err(EngineError::State(_))));
    }

    #[test]
    fn test_cancel_terminal_is_rejected() {
        let mut done = create_test_appointment(AppointmentStatus::Done);
        assert!(done.cancel(now()).is_err());

        let mut in_progress = create_test_appointment(AppointmentStatus::InProgress);
        assert!(in_progress.cancel(now()).is_ok());
        assert_eq!(in_progress.status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn test_no_show_rejected_after_check_in() {
        let mut appointment = create_test_appointment(AppointmentStatus::Confirmed);
        appointment.check_in(now()).unwrap();
        assert!(appointment.mark_no_show(now()).is_err());

        let mut absent = create_test_appointment(AppointmentStatus::Confirmed);
        assert!(absent.mark_no_show(now()).is_ok());
        assert_eq!(absent.status, AppointmentStatus::NoShow);
    }

    #[test]
    fn test_checklist_completed_at_stamping() {
        let mut appointment = create_test_appointment(AppointmentStatus::InProgress);
        appointment.checklist = vec![
            ChecklistItem::from_template("Bath"),
            ChecklistItem::from_template("Nail trim"),
        ];
        let first = now();
        let second = first + chrono::Duration::minutes(30);

        appointment
            .replace_checklist(
                vec![
                    ChecklistItemInput {
                        text: "Bath".into(),
                        completed: true,
                    },
                    ChecklistItemInput {
                        text: "Nail trim".into(),
                        completed: false,
                    },
                ],
                first,
            )
            .unwrap();
        assert_eq!(appointment.checklist[0].completed_at, Some(first));
        assert_eq!(appointment.checklist[1].completed_at, None);

        appointment
            .replace_checklist(
                vec![
                    ChecklistItemInput {
                        text: "Bath".into(),
                        completed: true,
                    },
                    ChecklistItemInput {
                        text: "Nail trim".into(),
                        completed: true,
                    },
                    ChecklistItemInput {
                        text: "Bow".into(),
                        completed: false,
                    },
                ],
                second,
            )
            .unwrap();
        assert_eq!(appointment.checklist[0].completed_at, Some(first));
        assert_eq!(appointment.checklist[1].completed_at, Some(second));
        assert_eq!(appointment.checklist.len(), 3);
        assert_eq!(appointment.status, AppointmentStatus::InProgress);

        appointment
            .replace_checklist(
                vec![ChecklistItemInput {
                    text: "Bath".into(),
                    completed: false,
                }],
                second,
            )
            .unwrap();
        assert_eq!(appointment.checklist[0].completed_at, None);
    }

    #[test]
    fn test_checklist_rejected_when_cancelled() {
        let mut appointment = create_test_appointment(AppointmentStatus::Cancelled);
        appointment.checklist = vec![ChecklistItem::from_template("Bath")];

        let result = appointment.replace_checklist(vec![], now());

        assert!(result.is_err());
        assert_eq!(appointment.checklist.len(), 1);
    }

    #[test]
    fn test_mark_paid_and_unpaid() {
        let mut appointment = create_test_appointment(AppointmentStatus::Done);
        appointment.mark_paid(PaymentMethod::Pix, now()).unwrap();
        assert!(appointment.is_paid());
        assert_eq!(appointment.payment_method, Some(PaymentMethod::Pix));
        assert_eq!(appointment.paid_at, Some(now()));

        appointment.mark_unpaid(now());
        assert_eq!(appointment.payment_status, PaymentStatus::Pending);
        assert!(appointment.payment_method.is_none() && appointment.paid_at.is_none());
    }

    #[test]
    fn test_mark_paid_cancelled_is_rejected() {
        let mut appointment = create_test_appointment(AppointmentStatus::Cancelled);

        let result = appointment.mark_paid(PaymentMethod::Cash, now());

        assert!(matches!(result, Err(EngineError::State(_))));
        assert!(!appointment.is_paid());
        assert!(appointment.payment_method.is_none() && appointment.paid_at.is_none());
    }

    #[test]
    fn test_apply_discount_round_trip() {
        let mut appointment = create_test_appointment(AppointmentStatus::Confirmed);
        assert_eq!(appointment.final_price, None);

        appointment.apply_discount(dec!(20), dec!(90), now()).unwrap();
        assert_eq!(appointment.final_price, Some(dec!(80.00)));
        assert_eq!(appointment.discount_percent, Some(dec!(20)));

        appointment.apply_discount(dec!(0), dec!(90), now()).unwrap();
        assert_eq!(appointment.final_price, Some(dec!(100.00)));
    }

    #[test]
    fn test_apply_discount_out_of_range_leaves_state() {
        let mut appointment = create_test_appointment(AppointmentStatus::Confirmed);
        appointment.apply_discount(dec!(10), dec!(90), now()).unwrap();

        assert!(appointment.apply_discount(dec!(101), dec!(90), now()).is_err());
        assert!(appointment.apply_discount(dec!(-1), dec!(90), now()).is_err());
        assert_eq!(appointment.final_price, Some(dec!(90.00)));
        assert_eq!(appointment.discount_percent, Some(dec!(10)));
    }

    #[test]
    fn test_effective_price_fallbacks() {
        let mut appointment = create_test_appointment(AppointmentStatus::Done);
        appointment.calculated_price = None;
        assert_eq!(appointment.effective_price(dec!(60)), dec!(60));

        appointment.calculated_price = Some(dec!(70));
        assert_eq!(appointment.effective_price(dec!(60)), dec!(70));

        appointment.final_price = Some(dec!(65));
        assert_eq!(appointment.effective_price(dec!(60)), dec!(65));
    }

    #[test]
    fn test_paid_revenue_skips_cancelled_and_unpaid() {
        let mut paid = create_test_appointment(AppointmentStatus::Done);
        paid.mark_paid(PaymentMethod::Cash, now()).unwrap();

        let unpaid = create_test_appointment(AppointmentStatus::Done);

        let mut cancelled = create_test_appointment(AppointmentStatus::Confirmed);
        cancelled.mark_paid(PaymentMethod::Cash, now()).unwrap();
        cancelled.cancel(now()).unwrap();

        assert_eq!(
            paid_revenue(&[paid, unpaid, cancelled], |_| dec!(50)),
            dec!(100.00)
        );
    }
}
