//! WebSocket inbound adapter pushing live feed changes to the console.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, signed-in administrator)
//! - start the per-connection feed session
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, info, warn};
use url::Url;

use crate::domain::TraceId;
use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

/// Handle the WebSocket upgrade for `/ws/feed`.
///
/// The scope registering this handler must carry the session middleware.
#[get("/feed")]
pub async fn feed_entry(
    state: web::Data<state::WsState>,
    session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(origin_header, &state.origins)?;

    let admin = session.require_admin()?;

    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    info!(user_id = %admin.user_id(), "feed socket opened");
    TraceId::spawn_local_scoped(session::handle_feed_session(
        state.get_ref().clone(),
        admin,
        ws_session,
        messages,
    ));
    Ok(response)
}

fn validate_origin(origin_header: &HeaderValue, allowed: &[Url]) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin, allowed) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

/// Returns true when `origin` shares scheme, host and port with an entry
/// of the allow-list. Default ports compare equal to explicit ones.
fn is_allowed_origin(origin: &Url, allowed: &[Url]) -> bool {
    let origin = origin.origin();
    origin.is_tuple() && allowed.iter().any(|entry| entry.origin() == origin)
}
