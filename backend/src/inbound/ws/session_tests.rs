//! Feed socket tests over a real listener.

use super::*;
use crate::domain::{EmailMessage, NotificationItem, PatientNotification, ReportNotification};
use crate::inbound::http::api_routes;
use crate::inbound::http::test_utils::{ADMIN_EMAIL, ADMIN_PASSWORD, Harness};
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use crate::outbound::realtime::ChangeHub;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::HttpMessage;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, dev::Server, dev::ServerHandle, http::header, web};
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message};
use chrono::{DateTime, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::Arc;
use url::Url;

const ORIGIN: &str = "http://localhost:5173";

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

struct TestServer {
    url: String,
    hub: Arc<ChangeHub>,
    server: Server,
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, minute, 0)
        .single()
        .expect("fixture time")
}

fn report_notification(id: i64, minute: u32) -> NotificationItem {
    NotificationItem::Report(ReportNotification {
        id,
        message: format!("report {id}"),
        created_at: at(minute),
        is_read: false,
    })
}

fn email(id: i64, recipient: &str, minute: u32) -> EmailMessage {
    EmailMessage {
        id,
        recipient_email: recipient.to_owned(),
        subject: format!("subject {id}"),
        message: "body".into(),
        created_at: at(minute),
        is_read: false,
    }
}

#[fixture]
fn harness() -> Harness {
    let harness = Harness::new();
    harness.backend.seed_notification(report_notification(1, 0));
    harness
        .backend
        .seed_notification(NotificationItem::Patient(PatientNotification {
            id: 1,
            message: "patient registered".into(),
            created_at: at(5),
            is_read: true,
            patient_id: Some(3),
        }));
    harness.backend.seed_email(email(10, ADMIN_EMAIL, 1));
    harness.backend.seed_email(email(11, "someone@clinic.test", 2));
    harness
}

#[fixture]
fn start_ws_server(harness: Harness) -> TestServer {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let http_state = harness.state.clone();
    let ws_state = WsState::new(
        harness.state.feeds.clone(),
        harness.state.feed_commands.clone(),
        vec![Url::parse(ORIGIN).expect("origin")],
    );
    let key = Key::generate();
    let middleware = move || {
        SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build()
    };
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(http_state.clone()))
            .app_data(web::Data::new(ws_state.clone()))
            .service(
                web::scope("/api/v1")
                    .wrap(middleware())
                    .configure(api_routes),
            )
            .service(web::scope("/ws").wrap(middleware()).service(ws::feed_entry))
    })
    .workers(1)
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    TestServer {
        url: format!("http://{addr}"),
        hub: harness.hub,
        server,
    }
}

async fn login(url: &str) -> actix_web::cookie::Cookie<'static> {
    let response = awc::Client::default()
        .post(format!("{url}/api/v1/login"))
        .send_json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await
        .expect("login request");
    assert!(response.status().is_success(), "login should succeed");
    let cookies = response.cookies().expect("response cookies");
    cookies
        .iter()
        .find(|cookie| cookie.name() == "session")
        .cloned()
        .expect("session cookie")
}

#[fixture]
async fn ws_client(start_ws_server: TestServer) -> (Socket, Arc<ChangeHub>, ServerHandle) {
    let TestServer { url, hub, server } = start_ws_server;
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let cookie = login(&url).await;
    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/ws/feed"))
        .set_header(header::ORIGIN, ORIGIN)
        .cookie(cookie)
        .connect()
        .await
        .expect("websocket connect");

    (socket, hub, handle)
}

/// Next text frame as JSON, answering pings so the session stays alive.
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(payload) => socket
                .send(Message::Pong(payload))
                .await
                .expect("send pong"),
            Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send text");
}

#[rstest]
#[actix_rt::test]
async fn opens_with_a_snapshot_of_both_feeds(
    #[future] ws_client: (Socket, Arc<ChangeHub>, ServerHandle),
) {
    let (mut socket, _hub, _server) = ws_client.await;
    let snapshot = next_json(&mut socket).await;
    assert_eq!(snapshot["type"], "snapshot");
    assert_eq!(snapshot["notifications"]["unreadCount"], 1);
    let notifications = snapshot["notifications"]["items"]
        .as_array()
        .expect("notification items");
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0]["source"], "patient");
    let inbox = snapshot["inbox"]["items"].as_array().expect("inbox items");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["id"], 10);
}

#[rstest]
#[actix_rt::test]
async fn published_inserts_reach_the_socket(
    #[future] ws_client: (Socket, Arc<ChangeHub>, ServerHandle),
) {
    let (mut socket, hub, _server) = ws_client.await;
    next_json(&mut socket).await;

    hub.publish(&ChangeEvent::Email(email(12, "someone@clinic.test", 20)));
    hub.publish(&ChangeEvent::Notification(report_notification(1, 0)));
    hub.publish(&ChangeEvent::Notification(report_notification(2, 30)));

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "notificationAdded");
    assert_eq!(frame["notification"]["id"], 2);
    assert_eq!(frame["unread"], json!({ "notifications": 2, "emails": 1 }));

    hub.publish(&ChangeEvent::Email(email(13, "ADA@clinic.test", 31)));
    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "emailAdded");
    assert_eq!(frame["email"]["id"], 13);
    assert_eq!(frame["unread"]["emails"], 2);
}

#[rstest]
#[actix_rt::test]
async fn client_actions_update_the_feed(
    #[future] ws_client: (Socket, Arc<ChangeHub>, ServerHandle),
) {
    let (mut socket, _hub, _server) = ws_client.await;
    next_json(&mut socket).await;

    send(
        &mut socket,
        json!({ "type": "markNotificationRead", "source": "report", "id": 1 }),
    )
    .await;
    let frame = next_json(&mut socket).await;
    assert_eq!(
        frame,
        json!({
            "type": "notificationRead",
            "source": "report",
            "id": 1,
            "unread": { "notifications": 0, "emails": 1 }
        })
    );

    send(&mut socket, json!({ "type": "deleteEmail", "id": 10 })).await;
    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "emailDeleted");
    assert_eq!(frame["unread"]["emails"], 0);
}

#[rstest]
#[actix_rt::test]
async fn closes_on_malformed_json(#[future] ws_client: (Socket, Arc<ChangeHub>, ServerHandle)) {
    let (mut socket, _hub, _server) = ws_client.await;
    next_json(&mut socket).await;
    socket
        .send(Message::Text("not-json".into()))
        .await
        .expect("send text");

    loop {
        match socket.next().await.expect("response frame").expect("frame") {
            Frame::Ping(_) | Frame::Pong(_) => continue,
            Frame::Close(reason) => {
                assert_eq!(reason.expect("reason").code, CloseCode::Policy);
                break;
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}

#[rstest]
#[actix_rt::test]
async fn closing_releases_the_subscription(
    #[future] ws_client: (Socket, Arc<ChangeHub>, ServerHandle),
) {
    let (mut socket, hub, _server) = ws_client.await;
    next_json(&mut socket).await;
    assert_eq!(hub.active_subscriptions(), 1);

    socket
        .send(Message::Close(Some(CloseCode::Normal.into())))
        .await
        .expect("send close");

    tokio::time::timeout(Duration::from_secs(2), async {
        while hub.active_subscriptions() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription released");
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages(
    #[future] ws_client: (Socket, Arc<ChangeHub>, ServerHandle),
) {
    let (mut socket, hub, _server) = ws_client.await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed_close = tokio::time::timeout(Duration::from_secs(2), async {
        let mut observed = None;
        while let Some(frame) = socket.next().await {
            match frame.expect("frame") {
                Frame::Ping(_) | Frame::Pong(_) | Frame::Text(_) => continue,
                Frame::Close(reason) => {
                    observed = reason;
                    break;
                }
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        observed
    })
    .await
    .expect("close frame missing within timeout")
    .expect("close frame missing after timeout");

    assert_eq!(observed_close.code, CloseCode::Normal);
    assert_eq!(
        observed_close.description.as_deref(),
        Some("heartbeat timeout")
    );
    assert_eq!(hub.active_subscriptions(), 0);
}

#[rstest]
#[actix_rt::test]
async fn upgrade_requires_a_signed_in_admin(start_ws_server: TestServer) {
    let TestServer { url, server, .. } = start_ws_server;
    actix_web::rt::spawn(server);

    let result = awc::Client::default()
        .ws(format!("{url}/ws/feed"))
        .set_header(header::ORIGIN, ORIGIN)
        .connect()
        .await;
    match result {
        Err(awc::error::WsClientError::InvalidResponseStatus(status)) => {
            assert_eq!(status, actix_web::http::StatusCode::UNAUTHORIZED);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("upgrade should be refused"),
    }
}

#[rstest]
#[actix_rt::test]
async fn upgrade_from_foreign_origin_is_forbidden(start_ws_server: TestServer) {
    let TestServer { url, server, .. } = start_ws_server;
    actix_web::rt::spawn(server);
    let cookie = login(&url).await;

    let result = awc::Client::default()
        .ws(format!("{url}/ws/feed"))
        .set_header(header::ORIGIN, "https://evil.example")
        .cookie(cookie)
        .connect()
        .await;
    assert!(matches!(
        result,
        Err(awc::error::WsClientError::InvalidResponseStatus(status))
            if status == actix_web::http::StatusCode::FORBIDDEN
    ));
}

async fn next_close(socket: &mut Socket) -> CloseReason {
    loop {
        match socket.next().await.expect("response frame").expect("frame") {
            Frame::Ping(_) | Frame::Pong(_) => continue,
            Frame::Close(reason) => return reason.expect("close reason"),
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}

#[rstest]
#[actix_rt::test]
async fn email_change_of_another_account_is_ignored(
    #[future] ws_client: (Socket, Arc<ChangeHub>, ServerHandle),
) {
    let (mut socket, hub, _server) = ws_client.await;
    next_json(&mut socket).await;

    let other = crate::domain::UserId::new("someone-else").expect("user id");
    hub.publish(&ChangeEvent::AccountEmailChanged(other));
    hub.publish(&ChangeEvent::Notification(report_notification(2, 30)));

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "notificationAdded");
}

#[rstest]
#[actix_rt::test]
async fn profile_email_change_closes_the_socket(start_ws_server: TestServer) {
    let TestServer { url, hub, server } = start_ws_server;
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let cookie = login(&url).await;
    let (_resp, mut socket) = awc::Client::default()
        .ws(format!("{url}/ws/feed"))
        .set_header(header::ORIGIN, ORIGIN)
        .cookie(cookie.clone())
        .connect()
        .await
        .expect("websocket connect");
    next_json(&mut socket).await;

    let response = awc::Client::default()
        .put(format!("{url}/api/v1/settings/profile"))
        .cookie(cookie)
        .send_json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "username": "countess",
            "email": "countess@clinic.test"
        }))
        .await
        .expect("profile request");
    assert!(response.status().is_success(), "profile update should succeed");

    let reason = tokio::time::timeout(Duration::from_secs(2), next_close(&mut socket))
        .await
        .expect("socket closed after email change");
    assert_eq!(reason.code, CloseCode::Normal);
    assert_eq!(reason.description.as_deref(), Some("account email changed"));
    tokio::time::timeout(Duration::from_secs(2), async {
        while hub.active_subscriptions() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription released");

    handle.stop(true).await;
}
