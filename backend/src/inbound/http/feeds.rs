//! Notification and inbox feed handlers.
//!
//! ```text
//! GET    /api/v1/notifications
//! POST   /api/v1/notifications/{source}/{id}/read
//! DELETE /api/v1/notifications/{source}/{id}
//! GET    /api/v1/emails
//! POST   /api/v1/emails/{id}/read
//! DELETE /api/v1/emails/{id}
//! ```
//!
//! Mutations are idempotent: marking a read item or deleting a missing one
//! still answers `204`. Live updates are pushed over `/ws/feed`.

use actix_web::{HttpResponse, delete, get, post, web};

use crate::domain::{EmailFeed, NotificationFeed, NotificationKey};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_notification_source;

fn notification_key(path: (String, i64)) -> ApiResult<NotificationKey> {
    let (source, id) = path;
    Ok(NotificationKey::new(parse_notification_source(&source)?, id))
}

/// Merged report and patient notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Notification feed with unread count"),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["feeds"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<NotificationFeed>> {
    session.require_admin()?;
    Ok(web::Json(state.feeds.load_notifications().await))
}

/// Mark one notification as read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{source}/{id}/read",
    params(
        ("source" = String, Path, description = "`report` or `patient`"),
        ("id" = i64, Path, description = "Notification id within its source")
    ),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 400, description = "Unknown source", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["feeds"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{source}/{id}/read")]
pub async fn mark_notification_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, i64)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let key = notification_key(path.into_inner())?;
    state.feed_commands.mark_notification_read(key).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete one notification.
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{source}/{id}",
    params(
        ("source" = String, Path, description = "`report` or `patient`"),
        ("id" = i64, Path, description = "Notification id within its source")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Unknown source", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["feeds"],
    operation_id = "deleteNotification"
)]
#[delete("/notifications/{source}/{id}")]
pub async fn delete_notification(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, i64)>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let key = notification_key(path.into_inner())?;
    state.feed_commands.delete_notification(key).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Inbox of the signed-in administrator, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/emails",
    responses(
        (status = 200, description = "Inbox with unread count"),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["feeds"],
    operation_id = "listEmails"
)]
#[get("/emails")]
pub async fn list_emails(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<EmailFeed>> {
    let admin = session.require_admin()?;
    Ok(web::Json(state.feeds.load_inbox(admin.email()).await))
}

/// Mark one inbox message as read.
#[utoipa::path(
    post,
    path = "/api/v1/emails/{id}/read",
    params(("id" = i64, Path, description = "Email id")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["feeds"],
    operation_id = "markEmailRead"
)]
#[post("/emails/{id}/read")]
pub async fn mark_email_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    state.feed_commands.mark_email_read(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete one inbox message.
#[utoipa::path(
    delete,
    path = "/api/v1/emails/{id}",
    params(("id" = i64, Path, description = "Email id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["feeds"],
    operation_id = "deleteEmail"
)]
#[delete("/emails/{id}")]
pub async fn delete_email(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    state.feed_commands.delete_email(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::Value;

    use crate::domain::{
        EmailMessage, NotificationItem, PatientNotification, ReportNotification,
    };
    use crate::inbound::http::test_utils::{ADMIN_EMAIL, Harness, login_cookie, test_app};

    fn seeded() -> Harness {
        let harness = Harness::new();
        let at = |minute| Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).single().expect("time");
        harness
            .backend
            .seed_notification(NotificationItem::Report(ReportNotification {
                id: 1,
                message: "New report".into(),
                created_at: at(0),
                is_read: false,
            }));
        harness
            .backend
            .seed_notification(NotificationItem::Patient(PatientNotification {
                id: 1,
                message: "Glucose alert".into(),
                created_at: at(5),
                is_read: false,
                patient_id: Some(4),
            }));
        for (id, recipient) in [(10, ADMIN_EMAIL), (11, "someone@clinic.test")] {
            harness.backend.seed_email(EmailMessage {
                id,
                recipient_email: recipient.into(),
                subject: "Hello".into(),
                message: "Body".into(),
                created_at: at(1),
                is_read: false,
            });
        }
        harness
    }

    async fn get_json<S>(app: &S, uri: &str, cookie: &actix_web::cookie::Cookie<'static>) -> Value
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let request = actix_test::TestRequest::get()
            .uri(uri)
            .cookie(cookie.clone())
            .to_request();
        actix_test::call_and_read_body_json(app, request).await
    }

    #[rstest]
    #[actix_web::test]
    async fn notifications_merge_newest_first() {
        let app = actix_test::init_service(test_app(seeded().state)).await;
        let cookie = login_cookie(&app).await;
        let body = get_json(&app, "/api/v1/notifications", &cookie).await;
        assert_eq!(body["unreadCount"], 2);
        assert_eq!(body["items"][0]["source"], "patient");
        assert_eq!(body["items"][1]["source"], "report");
    }

    #[rstest]
    #[actix_web::test]
    async fn mark_read_is_idempotent() {
        let app = actix_test::init_service(test_app(seeded().state)).await;
        let cookie = login_cookie(&app).await;
        for _ in 0..2 {
            let request = actix_test::TestRequest::post()
                .uri("/api/v1/notifications/report/1/read")
                .cookie(cookie.clone())
                .to_request();
            let response = actix_test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
        let body = get_json(&app, "/api/v1/notifications", &cookie).await;
        assert_eq!(body["unreadCount"], 1);
    }

    #[rstest]
    #[actix_web::test]
    async fn deleting_a_missing_notification_succeeds() {
        let app = actix_test::init_service(test_app(seeded().state)).await;
        let cookie = login_cookie(&app).await;
        let request = actix_test::TestRequest::delete()
            .uri("/api/v1/notifications/patient/99")
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_source_is_bad_request() {
        let app = actix_test::init_service(test_app(seeded().state)).await;
        let cookie = login_cookie(&app).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/notifications/email/1/read")
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn inbox_is_scoped_to_the_session_email() {
        let app = actix_test::init_service(test_app(seeded().state)).await;
        let cookie = login_cookie(&app).await;
        let body = get_json(&app, "/api/v1/emails", &cookie).await;
        assert_eq!(body["unreadCount"], 1);
        assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["items"][0]["recipientEmail"], ADMIN_EMAIL);

        let delete = actix_test::TestRequest::delete()
            .uri("/api/v1/emails/10")
            .cookie(cookie.clone())
            .to_request();
        assert_eq!(
            actix_test::call_service(&app, delete).await.status(),
            StatusCode::NO_CONTENT
        );
        let body = get_json(&app, "/api/v1/emails", &cookie).await;
        assert_eq!(body["unreadCount"], 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn feeds_require_login() {
        let app = actix_test::init_service(test_app(seeded().state)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/v1/emails")
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
