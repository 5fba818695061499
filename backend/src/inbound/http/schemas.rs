//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic and do not derive `ToSchema`. The
//! wrappers here mirror the error envelope so handlers can reference it in
//! `#[utoipa::path]` responses.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No administrator session, or wrong credentials.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested record does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A unique email or username is already taken.
    #[schema(rename = "conflict")]
    Conflict,
    /// The hosted backend could not be reached.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "email must not be empty")]
    message: String,
    /// Correlation identifier for this request.
    #[schema(example = "01HZY8B2W6X5Y7Z9ABCD1234")]
    trace_id: Option<String>,
    /// Field and reason for validation failures.
    details: Option<serde_json::Value>,
}
