use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Error value the authenticator uses when extra verification is pending.
pub const APPROVAL_SIGNAL: &str = "login-approval";
/// Error value the authenticator uses for a rejected email/password pair.
pub const WRONG_CREDENTIALS_SIGNAL: &str = "Wrong username/password.";

pub const APPROVAL_MESSAGE: &str =
    "Login approval required. Please check your device or email for confirmation code.";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Email and password are required")]
    Validation,

    /// Body sent as JSON that could not be decoded.
    #[error("{0}")]
    MalformedBody(String),

    #[error("{}", APPROVAL_MESSAGE)]
    ApprovalRequired,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Any other structured error from the authenticator.
    #[error("{0}")]
    Unclassified(String),

    /// Non-object error value, stringified.
    #[error("{0}")]
    Opaque(String),

    #[error("authentication callback dropped")]
    CallbackDropped,

    #[error("login task interrupted")]
    Interrupted,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl LoginError {
    /// Map an authenticator error value onto the error taxonomy.
    pub fn classify(err: Value) -> Self {
        match err {
            Value::Object(map) => {
                if map.get("code").and_then(Value::as_str) == Some(APPROVAL_SIGNAL) {
                    return LoginError::ApprovalRequired;
                }
                match map.get("error").and_then(Value::as_str) {
                    Some(APPROVAL_SIGNAL) => return LoginError::ApprovalRequired,
                    Some(WRONG_CREDENTIALS_SIGNAL) => return LoginError::InvalidCredentials,
                    _ => {}
                }
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string);
                LoginError::Unclassified(
                    message.unwrap_or_else(|| Value::Object(map).to_string()),
                )
            }
            array @ Value::Array(_) => LoginError::Unclassified(array.to_string()),
            Value::String(s) => LoginError::Opaque(s),
            other => LoginError::Opaque(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            LoginError::Validation | LoginError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            LoginError::ApprovalRequired => StatusCode::FORBIDDEN,
            LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            LoginError::Unclassified(_)
            | LoginError::Opaque(_)
            | LoginError::CallbackDropped
            | LoginError::Interrupted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for audit events.
    pub fn reason(&self) -> &'static str {
        match self {
            LoginError::Validation => "validation",
            LoginError::MalformedBody(_) => "malformed_body",
            LoginError::ApprovalRequired => "approval_required",
            LoginError::InvalidCredentials => "invalid_credentials",
            LoginError::Unclassified(_) => "unclassified",
            LoginError::Opaque(_) => "opaque",
            LoginError::CallbackDropped => "callback_dropped",
            LoginError::Interrupted => "interrupted",
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
