//! API error responses
//!
//! One error shape for every endpoint: a stable machine-readable code, its
//! numeric form, and a human-readable message at the top level of the body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::infra::StoreError;

// ============================================================================
// Error Codes
// ============================================================================

/// Closed set of API error codes.
///
/// Clients branch on the serialized names, so renaming one is a wire break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    /// No credentials on a request that needs them
    AuthRequired,
    /// Email or password did not match an account
    InvalidCredentials,
    /// Token is malformed or its signature does not verify
    InvalidToken,
    /// Token has expired
    TokenExpired,
    /// Verified token references an account that no longer exists
    PrincipalNotFound,
    /// Caller's role does not allow this operation
    InsufficientPermissions,

    // Validation errors (3xxx)
    /// Required field is missing or empty
    MissingRequiredField,
    /// Field value failed validation
    InvalidFieldValue,

    // Resource errors (4xxx)
    /// Patient record not found
    PatientNotFound,

    // Conflict errors (5xxx)
    /// Email already registered
    DuplicateEmail,

    // Infrastructure errors (8xxx)
    /// Storage operation failed
    DatabaseError,
    /// Service not ready to accept traffic
    ServiceUnavailable,
    /// Unclassified server-side failure
    InternalError,
}

impl ErrorCode {
    /// Numeric form of this code.
    pub fn numeric_code(&self) -> u32 {
        match self {
            // Auth (1xxx)
            ErrorCode::AuthRequired => 1001,
            ErrorCode::InvalidCredentials => 1002,
            ErrorCode::InvalidToken => 1003,
            ErrorCode::TokenExpired => 1004,
            ErrorCode::PrincipalNotFound => 1005,
            ErrorCode::InsufficientPermissions => 1006,

            // Validation (3xxx)
            ErrorCode::MissingRequiredField => 3001,
            ErrorCode::InvalidFieldValue => 3002,

            // Resource (4xxx)
            ErrorCode::PatientNotFound => 4001,

            // Conflict (5xxx)
            ErrorCode::DuplicateEmail => 5001,

            // Infrastructure (8xxx)
            ErrorCode::DatabaseError => 8001,
            ErrorCode::ServiceUnavailable => 8002,
            ErrorCode::InternalError => 8999,
        }
    }

    /// HTTP status this code maps to.
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Auth errors -> 401/403
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ErrorCode::PrincipalNotFound => StatusCode::UNAUTHORIZED,
            ErrorCode::InsufficientPermissions => StatusCode::FORBIDDEN,

            // Validation -> 400
            ErrorCode::MissingRequiredField => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,

            // Resource -> 404
            ErrorCode::PatientNotFound => StatusCode::NOT_FOUND,

            // Conflict -> 409
            ErrorCode::DuplicateEmail => StatusCode::CONFLICT,

            // Infrastructure -> 500/503
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::PrincipalNotFound => "PRINCIPAL_NOT_FOUND",
            ErrorCode::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::PatientNotFound => "PATIENT_NOT_FOUND",
            ErrorCode::DuplicateEmail => "DUPLICATE_EMAIL",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Error body returned by every endpoint.
///
/// Serialized flat, with `message` at the top level, so clients can always
/// read a human-readable reason without knowing the code taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason
    pub message: String,

    /// Stable machine-readable code
    pub code: ErrorCode,

    /// Numeric form of `code`
    pub numeric_code: u32,

    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            numeric_code: code.numeric_code(),
            details: None,
        }
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

// ============================================================================
// Conversions from internal errors
// ============================================================================

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => {
                ApiError::new(ErrorCode::AuthRequired, "authentication required")
            }
            AuthError::InvalidCredentials => {
                ApiError::new(ErrorCode::InvalidCredentials, "invalid email or password")
            }
            AuthError::DuplicateLogin(_) => {
                ApiError::new(ErrorCode::DuplicateEmail, "email already registered")
            }
            // The parse failure detail stays in the logs; clients get one
            // uniform invalid-token response for tampered and unparseable
            // tokens alike.
            AuthError::MalformedToken(_) | AuthError::InvalidSignature => {
                ApiError::new(ErrorCode::InvalidToken, "invalid authentication token")
            }
            AuthError::TokenExpired => {
                ApiError::new(ErrorCode::TokenExpired, "authentication token expired")
            }
            AuthError::PrincipalNotFound(_) => ApiError::new(
                ErrorCode::PrincipalNotFound,
                "account for this token no longer exists",
            ),
            AuthError::InsufficientPermissions => {
                ApiError::new(ErrorCode::InsufficientPermissions, "insufficient permissions")
            }
            AuthError::KeyTooShort(_) | AuthError::Issue(_) | AuthError::Hash(_) => {
                ApiError::new(ErrorCode::InternalError, "internal server error")
            }
            AuthError::Store(e) => ApiError::from(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => {
                ApiError::new(ErrorCode::DuplicateEmail, "email already registered")
            }
            StoreError::PatientNotFound(_) => {
                ApiError::new(ErrorCode::PatientNotFound, "patient not found")
            }
            // Driver messages can carry connection strings and table names;
            // they are logged at the failure site and never serialized out.
            StoreError::Database(_) => ApiError::new(ErrorCode::DatabaseError, "database error"),
            StoreError::Internal(_) => {
                ApiError::new(ErrorCode::InternalError, "internal server error")
            }
        }
    }
}
