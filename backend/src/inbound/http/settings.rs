//! Administrator profile settings handlers.
//!
//! ```text
//! GET /api/v1/settings/profile
//! PUT /api/v1/settings/profile {"firstName":..,"lastName":..,"username":..,"email":..}
//! PUT /api/v1/settings/avatar?ext=png   (raw image bytes)
//! ```

use actix_web::{HttpResponse, get, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AdminProfile, AvatarFormat, ProfileForm, ProfileUpdate};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::field_error;

/// Largest avatar accepted, in bytes.
pub const AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Profile form for `PUT /api/v1/settings/profile`.
///
/// Leave `password` blank to keep the current one.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl From<ProfileBody> for ProfileForm {
    fn from(body: ProfileBody) -> Self {
        Self {
            first_name: body.first_name,
            middle_name: body.middle_name,
            last_name: body.last_name,
            username: body.username,
            email: body.email,
            password: body.password,
            confirm_password: body.confirm_password,
        }
    }
}

/// Query string for the avatar upload.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AvatarQuery {
    /// File extension: `jpg`, `jpeg` or `png`.
    pub ext: String,
}

/// Public URL of a freshly uploaded avatar.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub avatar_url: String,
}

/// Profile of the signed-in administrator.
#[utoipa::path(
    get,
    path = "/api/v1/settings/profile",
    responses(
        (status = 200, description = "Administrator profile"),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "getProfile"
)]
#[get("/settings/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AdminProfile>> {
    let admin = session.require_admin()?;
    Ok(web::Json(state.profile.profile(&admin).await?))
}

/// Update name, username, email and optionally the password.
///
/// The session follows an email change so the inbox stays scoped correctly.
/// Feed sockets opened under the old address are closed; the console
/// reconnects with the refreshed session.
#[utoipa::path(
    put,
    path = "/api/v1/settings/profile",
    request_body = ProfileBody,
    responses(
        (status = 200, description = "Updated profile"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 409, description = "Email or username already exists", body = ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "updateProfile"
)]
#[put("/settings/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileBody>,
) -> ApiResult<web::Json<AdminProfile>> {
    let admin = session.require_admin()?;
    let update = ProfileUpdate::try_from_form(payload.into_inner().into()).map_err(field_error)?;
    let profile = state.profile_commands.update_profile(&admin, update).await?;
    session.persist(&admin.clone().with_email(profile.email.clone()))?;
    if !admin.email().matches(profile.email.as_str()) {
        let closed = state.changes.publish_account_email_change(admin.user_id());
        info!(user_id = %admin.user_id(), closed, "account email changed; feed sockets reset");
    }
    Ok(web::Json(profile))
}

/// Replace the administrator's profile picture.
#[utoipa::path(
    put,
    path = "/api/v1/settings/avatar",
    params(AvatarQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Avatar stored", body = AvatarResponse),
        (status = 400, description = "Unsupported or empty image", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "uploadAvatar"
)]
#[put("/settings/avatar")]
pub async fn upload_avatar(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<AvatarQuery>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let format = AvatarFormat::from_extension(&query.ext).map_err(field_error)?;
    let avatar_url = state
        .profile_commands
        .upload_avatar(&admin, format, body.to_vec())
        .await?;
    Ok(HttpResponse::Ok().json(AvatarResponse { avatar_url }))
}
