//! # API Module
//!
//! Business rules of the appointment engine. Each submodule handles a
//! specific part of the booking flow.
//!
//! ## Modules
//!
//! - [`appointment`] - Booking, status transitions, checklist and payment
//! - [`package`] - Package credit usage derived from appointments
//! - [`pricing`] - Price resolution from the service pricing matrix
//! - [`scheduling`] - Day × species restrictions and schedule blocks

pub mod appointment;
pub mod package;
pub mod pricing;
pub mod scheduling;
