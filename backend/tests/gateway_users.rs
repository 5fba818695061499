//! Gateway adapters against a stub REST endpoint.
//!
//! The stub evaluates the `eq`, `neq`, `ilike` and `or` filters the console
//! sends against a fixed `users` row and two inbox rows, and records every
//! query and patch, so the tests observe what the console would read and
//! write.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use clinic_console::domain::ports::{AccountCommand, EmailRepository, LoginService, UserRepository};
use clinic_console::domain::{
    AuthService, CredentialMigrationService, Email, ErrorCode, LoginCredentials, MigrationMode,
    MigrationSummary, SignUpParts, SignUpRequest,
};
use clinic_console::outbound::gateway::{
    EMAIL_TABLE, GatewayEmailRepository, GatewayUserRepository, RestGateway,
};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};
use url::Url;

const API_KEY: &str = "anon-key";

#[derive(Default)]
struct Recorded {
    queries: Mutex<Vec<String>>,
    patches: Mutex<Vec<(String, Value)>>,
}

impl Recorded {
    fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries lock").clone()
    }

    fn patches(&self) -> Vec<(String, Value)> {
        self.patches.lock().expect("patches lock").clone()
    }
}

fn legacy_row() -> Value {
    json!({
        "id": 7,
        "username": "ada",
        "full_name": "Ada Admin",
        "email": "ada@clinic.test",
        "password": "hunter2",
        "role": "admin",
        "created_at": "2024-03-15T12:00:00+00:00"
    })
}

fn inbox_rows() -> Vec<Value> {
    ["ada_l@clinic.test", "adaxl@clinic.test"]
        .into_iter()
        .enumerate()
        .map(|(index, recipient)| {
            json!({
                "id": index + 1,
                "recipient_email": recipient,
                "subject": "Shift change",
                "message": "See the roster",
                "created_at": "2024-03-15T12:00:00+00:00",
                "is_read": false
            })
        })
        .collect()
}

fn table_rows(table: &str) -> Vec<Value> {
    match table {
        "users" => vec![legacy_row()],
        EMAIL_TABLE => inbox_rows(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy)]
enum LikeToken {
    Char(char),
    One,
    Many,
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        tokens.push(match ch {
            '\\' => LikeToken::Char(chars.next().unwrap_or('\\')),
            '%' | '*' => LikeToken::Many,
            '_' => LikeToken::One,
            other => LikeToken::Char(other),
        });
    }
    tokens
}

fn like_matches(tokens: &[LikeToken], text: &[char]) -> bool {
    match tokens.split_first() {
        None => text.is_empty(),
        Some((LikeToken::Many, rest)) => (0..=text.len()).any(|skip| like_matches(rest, &text[skip..])),
        Some((LikeToken::One, rest)) => !text.is_empty() && like_matches(rest, &text[1..]),
        Some((LikeToken::Char(expected), rest)) => {
            text.first().is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
                && like_matches(rest, &text[1..])
        }
    }
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map_or_else(
            || value.to_owned(),
            |inner| inner.replace(r#"\""#, "\"").replace(r"\\", r"\"),
        )
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn operand_matches(actual: Option<&str>, operand: &str) -> bool {
    let Some((op, value)) = operand.split_once('.') else {
        return false;
    };
    let value = unquote(value);
    match (op, actual) {
        ("eq", Some(actual)) => actual == value,
        ("neq", actual) => actual != Some(value.as_str()),
        ("ilike", Some(actual)) => {
            let text: Vec<char> = actual.chars().collect();
            like_matches(&like_tokens(&value), &text)
        }
        _ => false,
    }
}

fn row_matches(row: &Value, query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes()).all(|(key, operand)| match key.as_ref() {
        "select" | "limit" | "order" => true,
        "or" => operand
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .any(|clause| {
                clause.split_once('.').is_some_and(|(column, operand)| {
                    operand_matches(column_text(row, column).as_deref(), operand)
                })
            }),
        column => operand_matches(column_text(row, column).as_deref(), &operand),
    })
}

async fn select_rows(
    request: HttpRequest,
    table: web::Path<String>,
    recorded: web::Data<Recorded>,
) -> HttpResponse {
    if request.headers().get("apikey").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return HttpResponse::Unauthorized().finish();
    }
    let query = request.query_string().to_owned();
    let rows: Vec<Value> = table_rows(&table)
        .into_iter()
        .filter(|row| row_matches(row, &query))
        .collect();
    recorded.queries.lock().expect("queries lock").push(query);
    HttpResponse::Ok().json(rows)
}

async fn insert_rows(body: web::Json<Value>) -> HttpResponse {
    let mut row = match body.into_inner() {
        Value::Array(rows) => rows.into_iter().next().unwrap_or(Value::Null),
        row => row,
    };
    row["id"] = json!(8);
    HttpResponse::Created().json(json!([row]))
}

async fn patch_rows(
    request: HttpRequest,
    recorded: web::Data<Recorded>,
    body: web::Json<Value>,
) -> HttpResponse {
    recorded
        .patches
        .lock()
        .expect("patches lock")
        .push((request.query_string().to_owned(), body.into_inner()));
    HttpResponse::Ok().json(json!([legacy_row()]))
}

struct Stub {
    gateway: RestGateway,
    recorded: web::Data<Recorded>,
    handle: ServerHandle,
}

fn start_stub() -> Stub {
    let recorded = web::Data::new(Recorded::default());
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let data = recorded.clone();
    let server = HttpServer::new(move || {
        App::new().app_data(data.clone()).service(
            web::resource("/rest/v1/{table}")
                .route(web::get().to(select_rows))
                .route(web::post().to(insert_rows))
                .route(web::patch().to(patch_rows)),
        )
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .disable_signals()
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    let base = Url::parse(&format!("http://{addr}")).expect("stub url");
    Stub {
        gateway: RestGateway::new(base, API_KEY, Duration::from_secs(5)).expect("gateway"),
        recorded,
        handle,
    }
}

#[rstest]
#[actix_rt::test]
async fn legacy_login_rewrites_the_row_with_a_hash() {
    let stub = start_stub();
    let users = Arc::new(GatewayUserRepository::new(stub.gateway.clone()));
    let auth = AuthService::new(users, Arc::new(DefaultClock));

    let credentials = LoginCredentials::try_from_parts("ada@clinic.test", "hunter2").expect("creds");
    let session = auth.authenticate(&credentials).await.expect("login succeeds");
    assert_eq!(session.user_id().as_ref(), "7");

    let queries = stub.recorded.queries();
    assert!(
        queries.iter().any(|q| q.contains("email=eq.ada%40clinic.test")),
        "queries: {queries:?}"
    );
    let patches = stub.recorded.patches();
    assert_eq!(patches.len(), 1);
    let (query, body) = patches.first().expect("one patch");
    assert_eq!(query, "id=eq.7");
    let hash = body["password"].as_str().expect("password column");
    assert!(hash.starts_with("$2"), "hash: {hash}");
    assert!(bcrypt::verify("hunter2", hash).expect("bcrypt verify"));

    stub.handle.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn wrong_password_writes_nothing() {
    let stub = start_stub();
    let auth = AuthService::new(
        Arc::new(GatewayUserRepository::new(stub.gateway.clone())),
        Arc::new(DefaultClock),
    );
    let credentials = LoginCredentials::try_from_parts("ada@clinic.test", "guess").expect("creds");
    let error = auth.authenticate(&credentials).await.expect_err("rejected");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert!(stub.recorded.patches().is_empty());

    stub.handle.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn migration_dry_run_counts_without_writing() {
    let stub = start_stub();
    let users = Arc::new(GatewayUserRepository::new(stub.gateway.clone()));
    assert_eq!(users.credentials().await.expect("credentials").len(), 1);

    let summary = CredentialMigrationService::new(users)
        .run(MigrationMode::DryRun)
        .await
        .expect("dry run");
    assert_eq!(
        summary,
        MigrationSummary {
            scanned: 1,
            legacy: 1,
            ..MigrationSummary::default()
        }
    );
    assert!(stub.recorded.patches().is_empty());

    stub.handle.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn unreachable_gateway_is_service_unavailable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
        listener.local_addr().expect("probe addr").port()
    };
    let base = Url::parse(&format!("http://127.0.0.1:{port}")).expect("url");
    let gateway = RestGateway::new(base, API_KEY, Duration::from_secs(2)).expect("gateway");
    let auth = AuthService::new(
        Arc::new(GatewayUserRepository::new(gateway)),
        Arc::new(DefaultClock),
    );
    let credentials = LoginCredentials::try_from_parts("ada@clinic.test", "hunter2").expect("creds");
    let error = auth.authenticate(&credentials).await.expect_err("gateway down");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

fn sign_up_request(email: &str, username: &str) -> SignUpRequest {
    SignUpRequest::try_from_parts(SignUpParts {
        full_name: "Grace Admin",
        username,
        email,
        password: "s3cret",
        confirm_password: "s3cret",
    })
    .expect("valid sign-up")
}

#[rstest]
#[case("Ada@Clinic.test", "ada2")]
#[case("ADA@CLINIC.TEST", "grace")]
#[case("grace@clinic.test", "ada")]
#[actix_rt::test]
async fn sign_up_conflicts_on_email_case_variants(#[case] email: &str, #[case] username: &str) {
    let stub = start_stub();
    let auth = AuthService::new(
        Arc::new(GatewayUserRepository::new(stub.gateway.clone())),
        Arc::new(DefaultClock),
    );
    let error = auth
        .sign_up(&sign_up_request(email, username))
        .await
        .expect_err("identity already taken");
    assert_eq!(error.code(), ErrorCode::Conflict);

    stub.handle.stop(true).await;
}

#[rstest]
#[case("grace@clinic.test")]
#[case("ad_@clinic.test")]
#[case("%@clinic.test")]
#[actix_rt::test]
async fn sign_up_treats_wildcards_in_addresses_literally(#[case] email: &str) {
    let stub = start_stub();
    let auth = AuthService::new(
        Arc::new(GatewayUserRepository::new(stub.gateway.clone())),
        Arc::new(DefaultClock),
    );
    let account = auth
        .sign_up(&sign_up_request(email, "grace"))
        .await
        .expect("address is free");
    assert_eq!(account.email.as_str(), email);

    stub.handle.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn inbox_query_matches_the_recipient_literally() {
    let stub = start_stub();
    let emails = GatewayEmailRepository::new(stub.gateway.clone());
    let recipient = Email::new("ADA_L@clinic.test").expect("email");

    let inbox = emails.list_for(&recipient).await.expect("inbox loads");
    let recipients: Vec<&str> = inbox.iter().map(|m| m.recipient_email.as_str()).collect();
    assert_eq!(recipients, ["ada_l@clinic.test"]);

    let queries = stub.recorded.queries();
    assert!(
        queries
            .iter()
            .any(|q| q.contains("recipient_email=ilike.ADA%5C_L%40clinic.test")),
        "queries: {queries:?}"
    );

    stub.handle.stop(true).await;
}
