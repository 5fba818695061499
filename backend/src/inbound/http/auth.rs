//! Authentication handlers: login, logout, sign-up and password reset.
//!
//! ```text
//! POST /api/v1/login {"email":"ada@clinic.test","password":"hunter2"}
//! POST /api/v1/logout
//! GET  /api/v1/session
//! POST /api/v1/signup {"fullName":..,"username":..,"email":..,"password":..,"confirmPassword":..}
//! POST /api/v1/password/forgot {"email":"ada@clinic.test"}
//! POST /api/v1/password/reset {"password":..,"confirmPassword":..}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{
    AdminSession, DEFAULT_DISPLAY_NAME, Email, Error, LoginCredentials, SignUpParts,
    SignUpRequest, SignUpValidationError, confirmed_password,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::field_error;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@clinic.test")]
    pub email: String,
    pub password: String,
}

/// Sign-up request body for `POST /api/v1/signup`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Body for `POST /api/v1/password/forgot`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Body for `POST /api/v1/password/reset`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

/// The signed-in administrator as shown in the console header.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[schema(example = "17")]
    pub user_id: String,
    #[schema(example = "admin")]
    pub role: String,
    pub email: String,
    #[schema(example = "ada")]
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Authenticate an administrator and establish a session.
///
/// Legacy plaintext credentials are accepted once and rehashed on the spot.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 204, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 403, description = "Account is not an administrator", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&payload.email, &payload.password).map_err(field_error)?;
    let admin = state.login.authenticate(&credentials).await?;
    session.persist(&admin)?;
    Ok(HttpResponse::NoContent().finish())
}

/// End the session and expire the cookie.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Describe the signed-in administrator.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionResponse>> {
    let admin = session.require_admin()?;
    Ok(web::Json(describe(&state, admin).await))
}

async fn describe(state: &HttpState, admin: AdminSession) -> SessionResponse {
    // The header must render even when the profile lookup fails.
    let (display_name, avatar_url) = match state.profile.profile(&admin).await {
        Ok(profile) => (profile.display_name, profile.avatar_url),
        Err(error) => {
            warn!(user_id = %admin.user_id(), error = %error, "profile lookup failed");
            (DEFAULT_DISPLAY_NAME.to_owned(), None)
        }
    };
    SessionResponse {
        user_id: admin.user_id().to_string(),
        role: admin.role().as_str().to_owned(),
        email: admin.email().to_string(),
        display_name,
        avatar_url,
    }
}

/// Create a new administrator account.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignUpBody,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email or username already exists", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/signup")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    payload: web::Json<SignUpBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let request = SignUpRequest::try_from_parts(SignUpParts {
        full_name: &body.full_name,
        username: &body.username,
        email: &body.email,
        password: &body.password,
        confirm_password: &body.confirm_password,
    })
    .map_err(field_error)?;
    let account = state.accounts.sign_up(&request).await?;
    Ok(HttpResponse::Created().json(account))
}

/// Start a password reset for the account owning `email`.
#[utoipa::path(
    post,
    path = "/api/v1/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 204, description = "Reset target remembered in the session"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "No account uses this email", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "forgotPassword",
    security([])
)]
#[post("/password/forgot")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let email = Email::new(payload.into_inner().email)
        .map_err(|err| field_error(SignUpValidationError::Email(err)))?;
    let user_id = state.accounts.find_reset_target(&email).await?;
    session.stash_reset_target(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Set a new password for the account chosen by `forgot_password`.
#[utoipa::path(
    post,
    path = "/api/v1/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Invalid request or no reset in progress", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "resetPassword",
    security([])
)]
#[post("/password/reset")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let Some(user_id) = session.reset_target()? else {
        return Err(Error::invalid_request("no password reset in progress")
            .with_details(json!({ "code": "no_reset_in_progress" })));
    };
    let body = payload.into_inner();
    let password = confirmed_password(&body.password, &body.confirm_password)
        .map_err(|err| field_error(SignUpValidationError::Password(err)))?;
    state.accounts.reset_password(&user_id, &password).await?;
    session.clear_reset_target();
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
