pub mod appointment;
pub mod package;
pub mod pet;
pub mod schedule_block;
pub mod service;

use derive_more::{Display, Error};

/// Stored text value that doesn't map to any variant of a domain enum.
#[derive(Debug, Display, Error, PartialEq)]
#[display("invalid {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
