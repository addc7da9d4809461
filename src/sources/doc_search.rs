use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::batch::BatchOutcome;
use crate::entities::{SearchRequest, SearchResult};
use crate::error::DocSetError;
use crate::listing::batch_list::SubmissionBody;
use crate::sources::{BatchEndpoint, SearchEndpoint};

const DOC_SEARCH_API: &str = "doc-search";
const NEW_DOC_SET_API: &str = "new-doc-set";

/// Client for the paper corpus search and the document-set creation routes.
#[derive(Clone)]
pub struct DocSearchClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

#[derive(Debug, Serialize)]
struct DocSearchRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocSearchResponse {
    #[serde(default)]
    pub files: Option<Vec<PaperRow>>,
}

/// One matching paper. The backend always sends `pmc_id` and `path`; the
/// rest comes from the metadata file and may be missing. Rows without a
/// path cannot be selected and are dropped by the transform.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperRow {
    #[serde(default)]
    pub pmc_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub article_type: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
}

impl DocSearchClient {
    pub fn with_base(base: impl Into<String>) -> Result<Self, DocSetError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base.into()),
        })
    }

    fn endpoint(&self, route: &str) -> String {
        crate::sources::endpoint_url(self.base.as_ref(), route)
    }

    pub async fn search_papers(&self, query: &str) -> Result<Vec<PaperRow>, DocSetError> {
        let url = self.endpoint(DOC_SEARCH_API);
        let value = crate::sources::post_json(
            &self.client,
            &url,
            DOC_SEARCH_API,
            &DocSearchRequest { query },
        )
        .await?;
        if let Some(error) = value.get("error") {
            return Err(DocSetError::Api {
                api: DOC_SEARCH_API.to_string(),
                message: error.to_string(),
            });
        }
        let resp: DocSearchResponse =
            serde_json::from_value(value).map_err(|source| DocSetError::ApiJson {
                api: DOC_SEARCH_API.to_string(),
                source,
            })?;
        let rows = resp.files.unwrap_or_default();
        debug!(query, count = rows.len(), "paper search returned");
        Ok(rows)
    }

    pub async fn create_doc_set(&self, body: &SubmissionBody) -> Result<BatchOutcome, DocSetError> {
        let url = self.endpoint(NEW_DOC_SET_API);
        let value = crate::sources::post_json(&self.client, &url, NEW_DOC_SET_API, body).await?;
        let outcome = BatchOutcome::from_value(&value);
        debug!(files = body.files.len(), ?outcome, "document set request classified");
        Ok(outcome)
    }
}

#[async_trait]
impl SearchEndpoint for DocSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, DocSetError> {
        let rows = self.search_papers(&request.query).await?;
        Ok(crate::transform::paper::from_rows(rows))
    }
}

#[async_trait]
impl BatchEndpoint for DocSearchClient {
    async fn create_doc_set(&self, body: &SubmissionBody) -> Result<BatchOutcome, DocSetError> {
        DocSearchClient::create_doc_set(self, body).await
    }
}
