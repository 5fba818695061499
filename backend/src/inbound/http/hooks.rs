//! Database webhook receiving row inserts from the hosted backend.
//!
//! ```text
//! POST /api/v1/hooks/changes
//! x-webhook-secret: <shared secret>
//! {"type":"INSERT","table":"emails_to_admin","record":{...}}
//! ```
//!
//! Inserts on the feed tables are fanned out to every open `/ws/feed`
//! socket. Updates and deletes are acknowledged and dropped: each console
//! applies its own mark-read and delete locally.

use actix_web::{HttpRequest, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Change notification posted by the database webhook.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChangePayload {
    /// `INSERT`, `UPDATE` or `DELETE`.
    #[serde(rename = "type")]
    #[schema(example = "INSERT")]
    pub kind: String,
    #[schema(example = "notifications_report")]
    pub table: String,
    /// The inserted row as stored.
    #[serde(default)]
    pub record: serde_json::Value,
}

/// How many live sockets received the change.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAck {
    /// `null` when the change was not relayed.
    pub delivered: Option<usize>,
}

/// Compare digests so the time taken does not depend on how much of the
/// presented secret is right.
fn secrets_match(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

fn check_secret(state: &HttpState, request: &HttpRequest) -> ApiResult<()> {
    let Some(expected) = state.webhook_secret.as_deref() else {
        return Err(Error::forbidden("webhook is disabled"));
    };
    let presented = request
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    match presented {
        Some(secret) if secrets_match(secret, expected) => Ok(()),
        _ => {
            warn!("webhook call with missing or wrong secret");
            Err(Error::unauthorized("invalid webhook secret"))
        }
    }
}

/// Relay a row insert to live feed sessions.
#[utoipa::path(
    post,
    path = "/api/v1/hooks/changes",
    request_body = ChangePayload,
    params(("x-webhook-secret" = String, Header, description = "Shared webhook secret")),
    responses(
        (status = 200, description = "Change accepted", body = ChangeAck),
        (status = 400, description = "Record could not be decoded", body = ErrorSchema),
        (status = 401, description = "Missing or wrong secret", body = ErrorSchema),
        (status = 403, description = "Webhook disabled", body = ErrorSchema)
    ),
    tags = ["hooks"],
    operation_id = "receiveChange",
    security([])
)]
#[post("/hooks/changes")]
pub async fn receive_change(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<ChangePayload>,
) -> ApiResult<web::Json<ChangeAck>> {
    check_secret(&state, &request)?;
    let payload = payload.into_inner();
    if !payload.kind.eq_ignore_ascii_case("insert") {
        debug!(kind = %payload.kind, table = %payload.table, "ignoring non-insert change");
        return Ok(web::Json(ChangeAck { delivered: None }));
    }
    let delivered = state
        .changes
        .publish_insert(&payload.table, payload.record)
        .map_err(|err| {
            warn!(table = %payload.table, error = %err, "undecodable change record");
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "record", "code": "invalid_record" }))
        })?;
    debug!(table = %payload.table, ?delivered, "change relayed");
    Ok(web::Json(ChangeAck { delivered }))
}
