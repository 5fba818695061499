//! Reqwest client for the hosted backend's REST and storage endpoints.
//!
//! The client owns transport details only: authentication headers, request
//! timeouts, HTTP error mapping and JSON decoding. Port adapters in sibling
//! modules translate rows into domain types.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

const REST_PREFIX: &str = "rest/v1/";
const STORAGE_PREFIX: &str = "storage/v1/object/";
const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_COUNT: &str = "count=exact";

/// Failures raised while talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request could not be built.
    #[error("invalid gateway request: {message}")]
    Request { message: String },
    /// The connection failed before a response arrived.
    #[error("gateway transport failed: {message}")]
    Transport { message: String },
    /// The request exceeded its deadline.
    #[error("gateway request timed out: {message}")]
    Timeout { message: String },
    /// The backend answered with a non-success status.
    #[error("gateway answered {message}")]
    Status { status: u16, message: String },
    /// The response body did not match the expected shape.
    #[error("gateway response could not be decoded: {message}")]
    Decode { message: String },
}

impl GatewayError {
    /// Whether the failure means the backend is unreachable rather than
    /// refusing the request.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => matches!(status, 502..=504),
            Self::Request { .. } | Self::Decode { .. } => false,
        }
    }

    pub(super) fn decode(error: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: error.to_string(),
        }
    }
}

/// Shared client for the backend's REST and storage APIs.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    base: Url,
    api_key: Arc<str>,
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGateway")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl RestGateway {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        mut base: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            api_key: Arc::from(api_key.into()),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, relative: &str) -> Result<Url, GatewayError> {
        self.base
            .join(relative)
            .map_err(|error| GatewayError::Request {
                message: format!("{relative}: {error}"),
            })
    }

    fn table(&self, table: &str) -> Result<Url, GatewayError> {
        self.endpoint(&format!("{REST_PREFIX}{table}"))
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(reqwest::header::AUTHORIZATION, bearer);
        }
        builder.headers(headers)
    }

    /// Fetch rows from `table` matching PostgREST query parameters.
    pub(super) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        let request = self.client.get(self.table(table)?).query(query);
        let body = send(self.authorised(request)).await?;
        decode_rows(&body)
    }

    /// Insert one row and return the stored representation.
    pub(super) async fn insert<B, T>(&self, table: &str, row: &B) -> Result<Vec<T>, GatewayError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .post(self.table(table)?)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(row);
        let body = send(self.authorised(request)).await?;
        decode_rows(&body)
    }

    /// Patch rows matching `query` and return them as stored.
    pub(super) async fn update<B, T>(
        &self,
        table: &str,
        query: &[(&str, String)],
        patch: &B,
    ) -> Result<Vec<T>, GatewayError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .patch(self.table(table)?)
            .query(query)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(patch);
        let body = send(self.authorised(request)).await?;
        decode_rows(&body)
    }

    /// Delete rows matching `query`. Deleting nothing is not an error.
    pub(super) async fn delete(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<(), GatewayError> {
        let request = self.client.delete(self.table(table)?).query(query);
        send(self.authorised(request)).await.map(drop)
    }

    /// Count rows matching `query` without transferring them.
    pub(super) async fn count(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<u64, GatewayError> {
        let request = self
            .client
            .head(self.table(table)?)
            .query(query)
            .header("Prefer", PREFER_COUNT);
        let response = self
            .authorised(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(status, &[]));
        }
        let range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| GatewayError::decode("count response has no Content-Range header"))?;
        parse_content_range_total(range)
    }

    /// Upload an object, replacing any previous version.
    pub(super) async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), GatewayError> {
        let request = self
            .client
            .post(self.endpoint(&format!("{STORAGE_PREFIX}{bucket}/{path}"))?)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes);
        send(self.authorised(request)).await.map(drop)
    }

    /// Whether an object exists. A 400 or 404 answer means absent.
    pub(super) async fn object_exists(&self, bucket: &str, path: &str) -> Result<bool, GatewayError> {
        let request = self
            .client
            .get(self.endpoint(&format!("{STORAGE_PREFIX}{bucket}/{path}"))?);
        let response = self
            .authorised(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(false),
            status => Err(map_status_error(status, &[])),
        }
    }

    /// Public URL of an object in a public bucket.
    pub(super) fn public_object_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&format!("{STORAGE_PREFIX}public/{bucket}/{path}"))
            .map_or_else(
                |_| format!("{}{STORAGE_PREFIX}public/{bucket}/{path}", self.base),
                String::from,
            )
    }
}

async fn send(request: RequestBuilder) -> Result<Vec<u8>, GatewayError> {
    let response: Response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn decode_rows<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(body)
        .map_err(|error| GatewayError::decode(format!("invalid row payload: {error}")))
}

/// Quote a value for use inside a PostgREST `or=(...)` filter.
pub(super) fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', r"\\").replace('"', "\\\""))
}

/// `eq.` filter operand.
pub(super) fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Escape `LIKE` metacharacters so the pattern only matches `value` itself.
///
/// PostgREST accepts `*` as an alias for `%`, so it is escaped too.
pub(super) fn like_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_' | '*') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive exact-match operand.
pub(super) fn ilike_exact(value: &str) -> String {
    format!("ilike.{}", like_literal(value))
}

fn parse_content_range_total(range: &str) -> Result<u64, GatewayError> {
    range
        .rsplit_once('/')
        .map(|(_, total)| total.trim())
        .filter(|total| *total != "*")
        .ok_or_else(|| GatewayError::decode(format!("content range without total: {range}")))?
        .parse()
        .map_err(|error| GatewayError::decode(format!("content range total {range}: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout {
            message: error.to_string(),
        }
    } else {
        GatewayError::Transport {
            message: error.to_string(),
        }
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };
    match status {
        StatusCode::REQUEST_TIMEOUT => GatewayError::Timeout { message },
        _ => GatewayError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
