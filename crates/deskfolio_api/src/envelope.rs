//! Uniform action envelope.
//!
//! Serialises to `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"code": ..., "message": ...}}`.

use deskfolio_core::service::INTERNAL_ERROR_MESSAGE;
use deskfolio_core::{ErrorCode, ServiceError};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-facing failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub code: ErrorCode,
    pub message: String,
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for ActionError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl<T> ActionResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ActionError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Wraps a service outcome. Internal failures are logged in full and
    /// replied to with the generic message only.
    pub fn from_result(action: &'static str, result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => {
                let code = err.code();
                if code == ErrorCode::ServerError {
                    error!(
                        "event=action_failed module=api status=error action={} code={} detail={}",
                        action, code, err
                    );
                    Self::failure(code, INTERNAL_ERROR_MESSAGE)
                } else {
                    debug!(
                        "event=action_rejected module=api status=error action={} code={}",
                        action, code
                    );
                    Self::failure(code, err.public_message())
                }
            }
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|err| err.code)
    }

    pub fn into_result(self) -> Result<T, ActionError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(err)) => Err(err),
            (None, None) => Err(ActionError {
                code: ErrorCode::ServerError,
                message: INTERNAL_ERROR_MESSAGE.to_string(),
            }),
        }
    }
}
