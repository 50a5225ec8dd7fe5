use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::account::AccountError;

pub mod message;

const GENERIC_FAILURE: &str = "Something went wrong, please try again later";

/// Error types
/// Every way a signup can fail, converted into a response at a single boundary
#[derive(Debug)]
pub enum SignupError {
    MethodNotAllowed,
    PasswordsDoNotMatch,
    MissingCredentials,
    InvalidForm(String),
    /// User error reported by the account service
    Rejected(String),
    CustomerNotCreated,
    MissingAccessToken,
    ServiceUnavailable,
    /// Raw GraphQL errors, passed through untouched
    Upstream(Value),
}

impl SignupError {
    pub fn status(&self) -> StatusCode {
        match self {
            SignupError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Value of the `error` field in JSON responses
    pub fn to_value(&self) -> Value {
        match self {
            SignupError::Upstream(value) => value.clone(),
            _ => Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for SignupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = match self {
            SignupError::MethodNotAllowed => "Method not allowed",
            SignupError::PasswordsDoNotMatch => "Passwords do not match",
            SignupError::MissingCredentials => "Please provide both an email and a password.",
            SignupError::InvalidForm(message) => message.as_str(),
            SignupError::Rejected(message) => message.as_str(),
            SignupError::CustomerNotCreated => "Could not create customer",
            SignupError::MissingAccessToken => "Missing access token",
            SignupError::ServiceUnavailable => GENERIC_FAILURE,
            SignupError::Upstream(Value::String(message)) => message.as_str(),
            SignupError::Upstream(_) => GENERIC_FAILURE,
        };

        write!(f, "{}", message)
    }
}

impl From<AccountError> for SignupError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::GraphQl(errors) => SignupError::Upstream(Value::Array(errors)),
            other => {
                error!("Account service call failed -> {}", other);
                SignupError::ServiceUnavailable
            }
        }
    }
}

/// JSON rendering: `{"error": ...}`
impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_value() }))).into_response()
    }
}
