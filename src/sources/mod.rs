//! Backend clients and shared HTTP utilities for the search and batch endpoints.

use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::entities::batch::{BatchOutcome, IngestOutcome};
use crate::entities::{SearchRequest, SearchResult};
use crate::error::DocSetError;
use crate::listing::batch_list::SubmissionBody;

pub(crate) mod doc_search;
pub(crate) mod gdrive;
pub(crate) mod request_log;

pub use doc_search::DocSearchClient;
pub use gdrive::GDriveClient;

const ERROR_BODY_MAX_BYTES: usize = 2048;
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub(crate) const BASE_URL_ENV: &str = "DOCSET_BASE_URL";

static HTTP_CLIENT: OnceLock<ClientWithMiddleware> = OnceLock::new();

/// Anything that can answer a search query with result rows.
#[async_trait]
pub trait SearchEndpoint: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, DocSetError>;
}

/// Creates a document set from a batch-list submission.
#[async_trait]
pub trait BatchEndpoint: Send + Sync {
    async fn create_doc_set(&self, body: &SubmissionBody) -> Result<BatchOutcome, DocSetError>;
}

#[async_trait]
pub trait IngestEndpoint: Send + Sync {
    async fn ingest(&self, body: &SubmissionBody) -> Result<IngestOutcome, DocSetError>;
}

pub(crate) fn env_base(default: &'static str, env_var: &str) -> Cow<'static, str> {
    std::env::var(env_var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(Cow::Owned)
        .unwrap_or_else(|| Cow::Borrowed(default))
}

/// Backend base URL: `DOCSET_BASE_URL`, else the local development server.
pub fn default_base_url() -> Cow<'static, str> {
    env_base(DEFAULT_BASE_URL, BASE_URL_ENV)
}

pub(crate) fn endpoint_url(base: &str, route: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), route.trim_start_matches('/'))
}

/// Returns a shared HTTP client with request logging middleware.
///
/// Requests are never retried automatically; a failed search or submission
/// is reported to the caller, who may run it again.
pub(crate) fn shared_client() -> Result<ClientWithMiddleware, DocSetError> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let base_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("docset/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(DocSetError::HttpClientInit)?;

    let client = ClientBuilder::new(base_client)
        .with(request_log::RequestLogMiddleware)
        .build();

    match HTTP_CLIENT.set(client.clone()) {
        Ok(()) => Ok(client),
        Err(_) => HTTP_CLIENT.get().cloned().ok_or_else(|| DocSetError::Api {
            api: "http-client".into(),
            message: "Shared HTTP client initialization race".into(),
        }),
    }
}

pub(crate) fn body_excerpt(bytes: &[u8]) -> String {
    let full = String::from_utf8_lossy(bytes);

    let truncated: &str = if full.len() > ERROR_BODY_MAX_BYTES {
        let mut end = ERROR_BODY_MAX_BYTES;
        while end > 0 && !full.is_char_boundary(end) {
            end -= 1;
        }
        &full[..end]
    } else {
        full.as_ref()
    };

    let mut s = truncated.trim().replace(['\n', '\r', '\t'], " ");
    if full.len() > ERROR_BODY_MAX_BYTES {
        s.push_str(" …");
    }
    s
}

pub(crate) fn ensure_json_content_type(
    api: &str,
    content_type: Option<&HeaderValue>,
    body: &[u8],
) -> Result<(), DocSetError> {
    let Some(content_type) = content_type else {
        return Ok(());
    };

    let raw = match content_type.to_str() {
        Ok(v) => v.trim(),
        Err(_) => {
            warn!(
                source = api,
                "Response content-type header was not valid UTF-8; attempting JSON parse"
            );
            return Ok(());
        }
    };
    if raw.is_empty() {
        return Ok(());
    }

    let media_type = raw
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_ascii_lowercase();
    if matches!(media_type.as_str(), "text/html" | "application/xhtml+xml") {
        return Err(DocSetError::Api {
            api: api.to_string(),
            message: format!(
                "Unexpected HTML response (content-type: {raw}): {}",
                body_excerpt(body)
            ),
        });
    }

    let is_json = media_type == "application/json"
        || media_type == "text/json"
        || media_type.ends_with("+json");
    if !is_json {
        warn!(
            source = api,
            content_type = raw,
            "Unexpected non-JSON content type; attempting JSON parse for compatibility"
        );
    }

    Ok(())
}

pub(crate) async fn read_limited_body(
    mut resp: reqwest::Response,
    api: &str,
) -> Result<Vec<u8>, DocSetError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = resp.chunk().await? {
        let next_len = body.len().saturating_add(chunk.len());
        if next_len > DEFAULT_MAX_BODY_BYTES {
            return Err(DocSetError::Api {
                api: api.to_string(),
                message: format!("Response body exceeded {DEFAULT_MAX_BODY_BYTES} bytes"),
            });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// POSTs `body` as JSON and returns the parsed response body.
///
/// The backend reports domain failures as `{"error": ...}`, sometimes with a
/// non-2xx status. Such bodies are returned as `Ok` so the caller can
/// classify them; any other non-2xx response is an API error.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &ClientWithMiddleware,
    url: &str,
    api: &str,
    body: &B,
) -> Result<Value, DocSetError> {
    let resp = client.post(url).json(body).send().await?;
    let status = resp.status();
    let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).cloned();
    let bytes = read_limited_body(resp, api).await?;

    if !status.is_success() {
        let error_body = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .filter(|value| value.get("error").is_some());
        if let Some(value) = error_body {
            return Ok(value);
        }
        let excerpt = body_excerpt(&bytes);
        return Err(DocSetError::Api {
            api: api.to_string(),
            message: format!("HTTP {status}: {excerpt}"),
        });
    }

    ensure_json_content_type(api, content_type.as_ref(), &bytes)?;
    serde_json::from_slice(&bytes).map_err(|source| DocSetError::ApiJson {
        api: api.to_string(),
        source,
    })
}
