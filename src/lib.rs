//! # Pet-shop Scheduling Engine
//!
//! Appointment scheduling and pricing for a pet-shop: day × species booking
//! rules, matrix pricing, package credits and the appointment lifecycle.

pub mod api;
pub mod config;
pub mod consts;
pub mod errors;
pub mod logger;
pub mod metric;
pub mod models;
pub mod repo;
pub mod utils;
