//! Archive handlers.
//!
//! ```text
//! GET    /api/v1/archive
//! POST   /api/v1/archive/{kind}/{id}   archive a doctor, patient or report
//! DELETE /api/v1/archive/{kind}/{id}   restore it
//! ```

use actix_web::{HttpResponse, delete, get, post, web};

use crate::domain::RecordKind;
use crate::domain::ports::ArchivedRecords;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_record_kind;

fn record(path: (String, i64)) -> ApiResult<(RecordKind, i64)> {
    let (kind, id) = path;
    Ok((parse_record_kind(&kind)?, id))
}

/// Every archived doctor, patient and report.
#[utoipa::path(
    get,
    path = "/api/v1/archive",
    responses(
        (status = 200, description = "Archived records grouped by kind"),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["archive"],
    operation_id = "listArchived"
)]
#[get("/archive")]
pub async fn list_archived(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ArchivedRecords>> {
    session.require_admin()?;
    Ok(web::Json(state.archive.archived().await?))
}

/// Hide a record from the active lists.
#[utoipa::path(
    post,
    path = "/api/v1/archive/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "`doctors`, `patients` or `reports`"),
        ("id" = i64, Path, description = "Record id")
    ),
    responses(
        (status = 204, description = "Archived"),
        (status = 400, description = "Unknown kind", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown record", body = ErrorSchema)
    ),
    tags = ["archive"],
    operation_id = "archiveRecord"
)]
#[post("/archive/{kind}/{id}")]
pub async fn archive_record(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, i64)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (kind, id) = record(path.into_inner())?;
    state.archive_commands.archive(kind, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Return an archived record to the active lists.
#[utoipa::path(
    delete,
    path = "/api/v1/archive/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "`doctors`, `patients` or `reports`"),
        ("id" = i64, Path, description = "Record id")
    ),
    responses(
        (status = 204, description = "Restored"),
        (status = 400, description = "Unknown kind", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown record", body = ErrorSchema)
    ),
    tags = ["archive"],
    operation_id = "restoreRecord"
)]
#[delete("/archive/{kind}/{id}")]
pub async fn restore_record(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, i64)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let (kind, id) = record(path.into_inner())?;
    state.archive_commands.restore(kind, id).await?;
    Ok(HttpResponse::NoContent().finish())
}
