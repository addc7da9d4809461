use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::batch::{BatchOutcome, IngestOutcome};
use crate::entities::{SearchRequest, SearchResult};
use crate::error::DocSetError;
use crate::listing::batch_list::SubmissionBody;
use crate::sources::{BatchEndpoint, IngestEndpoint, SearchEndpoint};

const GDRIVE_SEARCH_API: &str = "gdrive-search";
const GDRIVE_INGEST_API: &str = "gdrive-ingest";
const NEW_DOC_SET_API: &str = "new-doc-set";

/// Client for the cloud drive search and ingest routes.
#[derive(Clone)]
pub struct GDriveClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

#[derive(Debug, Serialize)]
struct GDriveSearchRequest<'a> {
    query: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct GDriveSearchResponse {
    #[serde(default)]
    pub files: Option<Vec<DriveRow>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
}

impl GDriveClient {
    pub fn with_base(base: impl Into<String>) -> Result<Self, DocSetError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base.into()),
        })
    }

    fn endpoint(&self, route: &str) -> String {
        crate::sources::endpoint_url(self.base.as_ref(), route)
    }

    pub async fn search_files(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<DriveRow>, DocSetError> {
        let url = self.endpoint(GDRIVE_SEARCH_API);
        let body = GDriveSearchRequest {
            query: &request.query,
            mime_type: request.mime_type.as_wire(),
        };
        let value =
            crate::sources::post_json(&self.client, &url, GDRIVE_SEARCH_API, &body).await?;
        if let Some(error) = value.get("error") {
            return Err(DocSetError::Api {
                api: GDRIVE_SEARCH_API.to_string(),
                message: error.to_string(),
            });
        }
        let resp: GDriveSearchResponse =
            serde_json::from_value(value).map_err(|source| DocSetError::ApiJson {
                api: GDRIVE_SEARCH_API.to_string(),
                source,
            })?;
        let rows = resp.files.unwrap_or_default();
        debug!(
            query = %request.query,
            mime_type = body.mime_type,
            count = rows.len(),
            "drive search returned"
        );
        Ok(rows)
    }

    /// Pulls the listed drive files into the knowledge store.
    pub async fn ingest(&self, body: &SubmissionBody) -> Result<IngestOutcome, DocSetError> {
        let url = self.endpoint(GDRIVE_INGEST_API);
        let value = crate::sources::post_json(&self.client, &url, GDRIVE_INGEST_API, body).await?;
        Ok(IngestOutcome::from_value(&value))
    }

    pub async fn create_doc_set(&self, body: &SubmissionBody) -> Result<BatchOutcome, DocSetError> {
        let url = self.endpoint(NEW_DOC_SET_API);
        let value = crate::sources::post_json(&self.client, &url, NEW_DOC_SET_API, body).await?;
        Ok(BatchOutcome::from_value(&value))
    }
}

#[async_trait]
impl SearchEndpoint for GDriveClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, DocSetError> {
        let rows = self.search_files(request).await?;
        Ok(crate::transform::drive::from_rows(rows))
    }
}

#[async_trait]
impl BatchEndpoint for GDriveClient {
    async fn create_doc_set(&self, body: &SubmissionBody) -> Result<BatchOutcome, DocSetError> {
        GDriveClient::create_doc_set(self, body).await
    }
}

#[async_trait]
impl IngestEndpoint for GDriveClient {
    async fn ingest(&self, body: &SubmissionBody) -> Result<IngestOutcome, DocSetError> {
        GDriveClient::ingest(self, body).await
    }
}
