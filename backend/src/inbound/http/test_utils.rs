//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use crate::domain::fixture_clock::FixtureClock;
use crate::domain::ports::{ChangeSink, NewAccount};
use crate::domain::{
    ArchiveService, AuthService, DirectoryService, Email, FeedService, Password, ReportsService,
    Role, SettingsService, UserId, hash_password,
};
use crate::inbound::http::api_routes;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryBackend;
use crate::outbound::realtime::ChangeHub;

/// Password of the seeded administrator.
pub const ADMIN_PASSWORD: &str = "hunter2";
/// Email of the seeded administrator.
pub const ADMIN_EMAIL: &str = "ada@clinic.test";
/// Shared secret accepted by the webhook in tests.
pub const WEBHOOK_SECRET: &str = "test-secret";

/// Build a session middleware configured for tests.
///
/// Generates a fresh key per invocation, names the cookie `session` and
/// disables the `Secure` flag for plain HTTP test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set on `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// In-memory backend holding one administrator with a legacy plaintext
/// password, plus the handler state built on it.
pub struct Harness {
    pub backend: Arc<InMemoryBackend>,
    pub hub: Arc<ChangeHub>,
    pub admin_id: UserId,
    pub state: HttpState,
}

impl Harness {
    /// Seed the backend and wire every service over it.
    pub fn new() -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let admin_id = backend
            .seed_account(
                &NewAccount {
                    username: "ada".into(),
                    full_name: "Ada Admin".into(),
                    email: Email::new(ADMIN_EMAIL).expect("fixture email"),
                    // Replaced by the raw legacy value below.
                    password_hash: hash_password(&Password::new("unused")).expect("hash"),
                    role: Role::Admin,
                    created_at: FixtureClock::march_2024().utc_now,
                },
                ADMIN_PASSWORD,
            )
            .expect("seed admin");
        let hub = Arc::new(ChangeHub::new());
        let clock = Arc::new(FixtureClock::march_2024());
        let auth = Arc::new(AuthService::new(backend.clone(), clock.clone()));
        let feeds = Arc::new(FeedService::new(
            backend.clone(),
            backend.clone(),
            hub.clone(),
        ));
        let directory = Arc::new(DirectoryService::new(
            backend.clone(),
            backend.clone(),
            clock.clone(),
        ));
        let archive = Arc::new(ArchiveService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
        ));
        let reports = Arc::new(ReportsService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            clock,
        ));
        let settings = Arc::new(SettingsService::new(backend.clone(), backend.clone()));
        let sink: Arc<dyn ChangeSink> = hub.clone();
        let state = HttpState {
            login: auth.clone(),
            accounts: auth,
            feeds: feeds.clone(),
            feed_commands: feeds,
            directory: directory.clone(),
            directory_commands: directory,
            archive: archive.clone(),
            archive_commands: archive,
            reports: reports.clone(),
            reports_commands: reports,
            profile: settings.clone(),
            profile_commands: settings,
            changes: sink,
            webhook_secret: Some(Arc::from(WEBHOOK_SECRET)),
        };
        Self {
            backend,
            hub,
            admin_id,
            state,
        }
    }
}

/// Application serving every `/api/v1` route over `state`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .wrap(test_session_middleware())
            .configure(api_routes),
    )
}

/// Log the seeded administrator in and return the session cookie.
pub async fn login_cookie<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert!(response.status().is_success(), "login should succeed");
    session_cookie(&response)
}

/// Send `request` and return the status with the JSON body, `Null` when the
/// body is empty.
pub async fn call_json<S, B>(app: &S, request: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let response = actix_test::call_service(app, request).await;
    let status = response.status();
    let bytes = actix_test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}
