//! Shared reqwest client for the Appwrite REST API.
//!
//! Owns transport details only: URL construction, project and session
//! headers, timeouts, status mapping and JSON decoding. Adapters translate
//! the resulting [`ApiFailure`] into their own port error.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::ErrorDto;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const SESSION_HEADER: &str = "X-Appwrite-Session";
const FALLBACK_COOKIES_HEADER: &str = "X-Fallback-Cookies";
const USER_AGENT: &str = concat!("skill-exchange/", env!("CARGO_PKG_VERSION"));

/// Endpoint and project an [`AppwriteClient`] talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppwriteConnection {
    /// API root, for example `https://cloud.appwrite.io/v1`.
    pub endpoint: Url,
    /// Project identifier sent with every request.
    pub project_id: String,
}

/// Failure category shared by all Appwrite calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    Transport,
    Timeout,
    RateLimited,
    Unauthorized,
    NotFound,
    Conflict,
    Rejected,
    Decode,
}

/// Transport-neutral description of a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiFailure {
    pub(crate) kind: FailureKind,
    /// Upstream message when the API sent one, otherwise a status summary.
    pub(crate) message: String,
    /// Appwrite error type such as `user_invalid_credentials`.
    pub(crate) error_type: Option<String>,
}

impl ApiFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            error_type: None,
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Decode, message)
    }
}

/// Decoded body plus the response headers.
pub(crate) struct ApiResponse<T> {
    pub(crate) body: T,
    pub(crate) headers: HeaderMap,
}

/// Reqwest client bound to one Appwrite project.
#[derive(Debug, Clone)]
pub struct AppwriteClient {
    http: Client,
    connection: AppwriteConnection,
}

impl AppwriteClient {
    /// Build a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(connection: AppwriteConnection, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, connection })
    }

    /// Project id requests are scoped to.
    pub fn project_id(&self) -> &str {
        self.connection.project_id.as_str()
    }

    /// Start a request for the path formed by `segments` under the endpoint.
    ///
    /// Each segment is percent-encoded. `session` adds the session header.
    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
        session: Option<&str>,
    ) -> Result<RequestBuilder, ApiFailure> {
        let url = self.url(segments)?;
        let mut request = self
            .http
            .request(method, url)
            .header(PROJECT_HEADER, self.connection.project_id.as_str())
            .header(ACCEPT, "application/json");
        if let Some(secret) = session {
            request = request.header(SESSION_HEADER, secret);
        }
        Ok(request)
    }

    /// Send `request` and decode a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiFailure> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let body = serde_json::from_slice(body.as_ref()).map_err(|error| {
            ApiFailure::decode(format!("invalid Appwrite JSON payload: {error}"))
        })?;
        Ok(ApiResponse { body, headers })
    }

    /// Send `request` and discard the body.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiFailure> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiFailure> {
        let mut url = self.connection.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ApiFailure::new(
                    FailureKind::Rejected,
                    format!("endpoint {} cannot be a base URL", self.connection.endpoint),
                )
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

/// Session secret from the response cookies.
///
/// Appwrite omits `secret` from client-created sessions and instead sets
/// the `a_session_<project>` cookie, mirrored in `X-Fallback-Cookies` for
/// clients that cannot store cookies.
pub(crate) fn session_secret_from_headers(headers: &HeaderMap, project_id: &str) -> Option<String> {
    let cookie_name = format!("a_session_{project_id}");
    let from_fallback = headers
        .get(FALLBACK_COOKIES_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw).ok())
        .and_then(|cookies| {
            cookies
                .get(&cookie_name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        });
    from_fallback
        .or_else(|| {
            headers
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .find_map(|cookie| {
                    let (pair, _) = cookie.split_once(';').unwrap_or((cookie, ""));
                    let (name, value) = pair.split_once('=')?;
                    (name.trim() == cookie_name).then(|| value.trim().to_owned())
                })
        })
        .filter(|secret| !secret.is_empty())
}

fn map_transport_error(error: reqwest::Error) -> ApiFailure {
    if error.is_timeout() {
        ApiFailure::new(FailureKind::Timeout, error.to_string())
    } else {
        ApiFailure::new(FailureKind::Transport, error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ApiFailure {
    let (message, error_type) = match serde_json::from_slice::<ErrorDto>(body) {
        Ok(dto) if !dto.message.trim().is_empty() => {
            (dto.message, Some(dto.error_type).filter(|kind| !kind.is_empty()))
        }
        _ => {
            let preview = body_preview(body);
            let message = if preview.is_empty() {
                format!("status {}", status.as_u16())
            } else {
                format!("status {}: {preview}", status.as_u16())
            };
            (message, None)
        }
    };
    debug!(status = status.as_u16(), ?error_type, %message, "appwrite call failed");

    let kind = match status {
        StatusCode::UNAUTHORIZED => FailureKind::Unauthorized,
        StatusCode::NOT_FOUND => FailureKind::NotFound,
        StatusCode::CONFLICT => FailureKind::Conflict,
        StatusCode::TOO_MANY_REQUESTS => FailureKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FailureKind::Timeout,
        _ if status.is_client_error() => FailureKind::Rejected,
        _ => FailureKind::Transport,
    };
    ApiFailure {
        kind,
        message,
        error_type,
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
