//! Report and dashboard handlers.
//!
//! ```text
//! GET   /api/v1/dashboard?year=2024
//! GET   /api/v1/reports?from=2024-01-01&to=2024-03-31&status=pending
//! POST  /api/v1/reports {"title":..,"reportData":..}
//! PATCH /api/v1/reports/{id} {"status":"solved"}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{DashboardStats, Report, ReportDraft, ReportFilter};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{field_error, parse_report_status};

/// Query string for `GET /api/v1/dashboard`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Calendar year of the patient histogram; defaults to the current year.
    pub year: Option<i32>,
}

/// Query string for `GET /api/v1/reports`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ReportListQuery {
    /// First day included, `YYYY-MM-DD`.
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Last day included, `YYYY-MM-DD`.
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
    /// `pending` or `solved`.
    pub status: Option<String>,
}

/// Body for `POST /api/v1/reports`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    pub title: String,
    pub report_data: String,
}

/// Body for `PATCH /api/v1/reports/{id}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatusBody {
    #[schema(example = "solved")]
    pub status: String,
}

/// Counts, pending reports and the monthly patient histogram.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard statistics"),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "dashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<DashboardQuery>,
) -> ApiResult<web::Json<DashboardStats>> {
    session.require_admin()?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    Ok(web::Json(state.reports.dashboard(year).await?))
}

/// Active reports, newest first, optionally filtered.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(ReportListQuery),
    responses(
        (status = 200, description = "Reports"),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "listReports"
)]
#[get("/reports")]
pub async fn list_reports(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ReportListQuery>,
) -> ApiResult<web::Json<Vec<Report>>> {
    session.require_admin()?;
    let query = query.into_inner();
    let status = query
        .status
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_report_status)
        .transpose()?;
    let filter = ReportFilter {
        from: query.from,
        to: query.to,
        status,
    };
    Ok(web::Json(state.reports.reports(filter).await?))
}

/// File a report authored by the signed-in administrator.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = ReportBody,
    responses(
        (status = 201, description = "Report filed as pending"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "createReport"
)]
#[post("/reports")]
pub async fn create_report(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ReportBody>,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let body = payload.into_inner();
    let draft = ReportDraft::try_from_parts(&body.title, &body.report_data).map_err(field_error)?;
    let report = state.reports_commands.create(&admin, draft).await?;
    Ok(HttpResponse::Created().json(report))
}

/// Move a report between `pending` and `solved`.
#[utoipa::path(
    patch,
    path = "/api/v1/reports/{id}",
    params(("id" = i64, Path, description = "Report id")),
    request_body = ReportStatusBody,
    responses(
        (status = 200, description = "Updated report"),
        (status = 400, description = "Unknown status", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown report", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "updateReportStatus"
)]
#[patch("/reports/{id}")]
pub async fn update_report_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<ReportStatusBody>,
) -> ApiResult<web::Json<Report>> {
    session.require_admin()?;
    let status = parse_report_status(&payload.status)?;
    let report = state
        .reports_commands
        .update_status(path.into_inner(), status)
        .await?;
    Ok(web::Json(report))
}
