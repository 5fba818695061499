//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every `/api/v1` handler plus the health probes
//! - **Schemas**: request/response DTOs and the error envelope wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`]) that describe domain types
//!   without coupling them to utoipa
//! - **Security**: session cookie authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::auth::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SessionResponse, SignUpBody,
};
use crate::inbound::http::directory::{CredentialsResponse, DoctorBody, PatientBody};
use crate::inbound::http::hooks::{ChangeAck, ChangePayload};
use crate::inbound::http::reports::{ReportBody, ReportStatusBody};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::settings::{AvatarResponse, ProfileBody};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Clinic console API",
        description = "Administrator console: credentials, live feeds, directory, archive, reports and settings."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_session,
        crate::inbound::http::auth::sign_up,
        crate::inbound::http::auth::forgot_password,
        crate::inbound::http::auth::reset_password,
        crate::inbound::http::feeds::list_notifications,
        crate::inbound::http::feeds::mark_notification_read,
        crate::inbound::http::feeds::delete_notification,
        crate::inbound::http::feeds::list_emails,
        crate::inbound::http::feeds::mark_email_read,
        crate::inbound::http::feeds::delete_email,
        crate::inbound::http::directory::list_doctors,
        crate::inbound::http::directory::create_doctor,
        crate::inbound::http::directory::update_doctor,
        crate::inbound::http::directory::list_patients,
        crate::inbound::http::directory::create_patient,
        crate::inbound::http::directory::update_patient,
        crate::inbound::http::directory::patient_logs,
        crate::inbound::http::archive::list_archived,
        crate::inbound::http::archive::archive_record,
        crate::inbound::http::archive::restore_record,
        crate::inbound::http::reports::dashboard,
        crate::inbound::http::reports::list_reports,
        crate::inbound::http::reports::create_report,
        crate::inbound::http::reports::update_report_status,
        crate::inbound::http::settings::get_profile,
        crate::inbound::http::settings::update_profile,
        crate::inbound::http::settings::upload_avatar,
        crate::inbound::http::hooks::receive_change,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        SignUpBody,
        ForgotPasswordRequest,
        ResetPasswordRequest,
        SessionResponse,
        DoctorBody,
        PatientBody,
        CredentialsResponse,
        ReportBody,
        ReportStatusBody,
        ProfileBody,
        AvatarResponse,
        ChangePayload,
        ChangeAck,
    )),
    tags(
        (name = "auth", description = "Login, sign-up and password reset"),
        (name = "feeds", description = "Notifications and the administrator inbox"),
        (name = "directory", description = "Doctor and patient records"),
        (name = "archive", description = "Archiving and restoring records"),
        (name = "reports", description = "Reports and dashboard statistics"),
        (name = "settings", description = "Administrator profile and avatar"),
        (name = "hooks", description = "Database change webhook"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
