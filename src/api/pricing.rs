//! # Pricing API Module
//!
//! Resolves the `calculated_price` of a booking from the service pricing
//! matrix. Discounts are not applied here, see
//! [`crate::models::appointment::Appointment::apply_discount`].

use crate::{models, utils};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A rule matches when every constraint it declares holds. A pet with unknown
/// weight (or size) never satisfies a weight (or size) constraint.
pub fn rule_matches(
    rule: &models::service::PricingRule,
    pet: &models::pet::Pet,
    target_date: NaiveDate,
) -> bool {
    let weight_min_ok = rule
        .weight_min
        .is_none_or(|min| pet.weight.is_some_and(|weight| min <= weight));
    let weight_max_ok = rule
        .weight_max
        .is_none_or(|max| pet.weight.is_some_and(|weight| weight <= max));
    let size_ok = rule.size.is_none_or(|size| pet.size == Some(size));
    let day_ok = rule
        .day_of_week
        .is_none_or(|day| utils::weekday_index(target_date) == day);

    weight_min_ok && weight_max_ok && size_ok && day_ok
}

/// First matching rule in stored order wins, otherwise the base price.
pub fn resolve_price(
    service: &models::service::Service,
    pet: &models::pet::Pet,
    target_date: NaiveDate,
) -> Decimal {
    service
        .pricing_matrix
        .iter()
        .find(|rule| rule_matches(rule, pet, target_date))
        .map(|rule| rule.fixed_price)
        .unwrap_or(service.base_price)
}

/// Stays are priced per night, every night of `[check_in_date, check_out_date)`
/// resolved on its own weekday.
pub fn resolve_stay_price(
    service: &models::service::Service,
    pet: &models::pet::Pet,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
) -> Decimal {
    check_in_date
        .iter_days()
        .take_while(|night| *night < check_out_date)
        .map(|night| resolve_price(service, pet, night))
        .sum()
}
