use derive_more::{Display, Error};
use serde::Serialize;

use crate::models::ParseEnumError;

/// Every way an engine operation can be rejected.
///
/// Nothing here is fatal: callers turn it into an [`ActionResult`] and show
/// [`EngineError::user_message`] to whoever triggered the operation.
#[derive(Debug, Display, Error, PartialEq)]
pub enum EngineError {
    /// Day/species restriction, date range, discount percent, blocked slot...
    #[display("{_0}")]
    Validation(#[error(not(source))] String),
    /// Transition not allowed from the current status.
    #[display("{_0}")]
    State(#[error(not(source))] String),
    #[display("{_0} not found")]
    NotFound(#[error(not(source))] String),
    #[display("{_0}")]
    Persistence(#[error(not(source))] String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        EngineError::State(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        EngineError::NotFound(what.into())
    }

    /// Text shown to the end user. Only validation messages are passed through
    /// verbatim; the rest are logged and replaced by a generic message.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Validation(msg) => msg.to_string(),
            EngineError::State(_) => "operation not allowed in current state".to_string(),
            EngineError::NotFound(_) => "record not found, please refresh the page".to_string(),
            EngineError::Persistence(_) => {
                "something went wrong, the operation was not applied".to_string()
            }
        }
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        log::error!("[PersistenceError] {:#?}", err);
        EngineError::Persistence(err.to_string())
    }
}

impl From<ParseEnumError> for EngineError {
    fn from(err: ParseEnumError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// Outcome of a lifecycle operation, shaped for the request handlers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<i64>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            appointment_id: None,
        }
    }

    pub fn created(appointment_id: i64) -> Self {
        Self {
            success: true,
            message: "appointment created".to_string(),
            appointment_id: Some(appointment_id),
        }
    }

    pub fn failed(err: &EngineError) -> Self {
        Self {
            success: false,
            message: err.user_message(),
            appointment_id: None,
        }
    }
}

impl From<Result<ActionResult, EngineError>> for ActionResult {
    fn from(result: Result<ActionResult, EngineError>) -> Self {
        result.unwrap_or_else(|err| ActionResult::failed(&err))
    }
}
