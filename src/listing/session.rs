use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entities::batch::{BatchOutcome, IngestOutcome};
use crate::entities::{Collection, SearchRequest, SearchResult};
use crate::error::DocSetError;
use crate::listing::batch_list::{BatchList, DedupeOrder, SubmissionBody};
use crate::listing::pages::{
    FILES_PER_PAGE, Navigation, PageSet, PaginationControls, PaginationCursor,
};
use crate::sources::{BatchEndpoint, IngestEndpoint, SearchEndpoint};

/// Whether a request-backed action may start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Done,
}

impl RequestStatus {
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchState {
    #[default]
    Idle,
    Searching,
    Empty,
    Populated,
}

/// Message shown under the batch list after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitMessage {
    Success { uri: String },
    BadFiles { files: Vec<String> },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestMessage {
    Success,
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlStates {
    pub search: bool,
    pub add_to_list: bool,
    pub submit: bool,
    pub dedupe: bool,
    pub ingest: bool,
}

/// Everything a front end needs to draw the search page.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub collection: Collection,
    pub heading: String,
    pub state: SearchState,
    pub page_size: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub total: usize,
    pub rows: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controls: Option<PaginationControls>,
    pub show_empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_error: Option<String>,
    pub enabled: ControlStates,
    pub batch_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_message: Option<SubmitMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_message: Option<IngestMessage>,
}

impl SessionView {
    pub fn shows_success(&self) -> bool {
        matches!(self.submit_message, Some(SubmitMessage::Success { .. }))
    }

    pub fn shows_bad_files(&self) -> bool {
        matches!(self.submit_message, Some(SubmitMessage::BadFiles { .. }))
    }

    pub fn shows_submit_error(&self) -> bool {
        matches!(self.submit_message, Some(SubmitMessage::Error { .. }))
    }
}

/// One search page: the current result pages, the cursor into them, and the
/// batch list being curated. Results are replaced on every search; the batch
/// list survives until cleared.
#[derive(Debug, Clone)]
pub struct Session {
    collection: Collection,
    page_size: usize,
    pages: PageSet<SearchResult>,
    cursor: PaginationCursor,
    batch: BatchList,
    state: SearchState,
    search_status: RequestStatus,
    submit_status: RequestStatus,
    search_error: Option<String>,
    submit_message: Option<SubmitMessage>,
    ingest_message: Option<IngestMessage>,
}

impl Session {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            page_size: FILES_PER_PAGE,
            pages: PageSet::default(),
            cursor: PaginationCursor::default(),
            batch: BatchList::default(),
            state: SearchState::Idle,
            search_status: RequestStatus::Idle,
            submit_status: RequestStatus::Idle,
            search_error: None,
            submit_message: None,
            ingest_message: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Result<Self, DocSetError> {
        if page_size == 0 {
            return Err(DocSetError::InvalidArgument(
                "page size must be a positive integer".into(),
            ));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn with_batch(mut self, batch: BatchList) -> Self {
        self.batch = batch;
        self
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn search_status(&self) -> RequestStatus {
        self.search_status
    }

    pub fn submit_status(&self) -> RequestStatus {
        self.submit_status
    }

    pub fn pages(&self) -> &PageSet<SearchResult> {
        &self.pages
    }

    pub fn cursor(&self) -> usize {
        self.cursor.index()
    }

    pub fn batch(&self) -> &BatchList {
        &self.batch
    }

    pub fn search_error(&self) -> Option<&str> {
        self.search_error.as_deref()
    }

    pub fn submit_message(&self) -> Option<&SubmitMessage> {
        self.submit_message.as_ref()
    }

    pub fn ingest_message(&self) -> Option<&IngestMessage> {
        self.ingest_message.as_ref()
    }

    /// Enters `Searching`, dropping the previous results.
    pub fn begin_search(&mut self) -> Result<(), DocSetError> {
        if self.search_status.is_pending() {
            return Err(DocSetError::Busy {
                action: "search".into(),
            });
        }
        self.pages = PageSet::default();
        self.cursor.reset();
        self.search_error = None;
        if matches!(self.submit_message, Some(SubmitMessage::Error { .. })) {
            self.submit_message = None;
        }
        self.state = SearchState::Searching;
        self.search_status = RequestStatus::Pending;
        Ok(())
    }

    /// Applies the search response and returns the number of results.
    ///
    /// A failed request is recorded for display rather than returned; the
    /// session stays usable and the search can be run again.
    pub fn finish_search(
        &mut self,
        response: Result<Vec<SearchResult>, DocSetError>,
    ) -> Result<usize, DocSetError> {
        self.search_status = RequestStatus::Done;
        let mut results = match response {
            Ok(results) => results,
            Err(err) => {
                warn!(collection = ?self.collection, error = %err, "search failed");
                self.search_error = Some(err.to_string());
                self.state = SearchState::Idle;
                return Ok(0);
            }
        };

        self.collection.sort_results(&mut results);
        self.pages = PageSet::paginate(&results, self.page_size)?;
        self.cursor.reset();
        self.state = if self.pages.is_empty() {
            SearchState::Empty
        } else {
            SearchState::Populated
        };
        debug!(
            collection = ?self.collection,
            results = results.len(),
            pages = self.pages.page_count(),
            "search results paginated"
        );
        Ok(results.len())
    }

    pub async fn search(
        &mut self,
        endpoint: &dyn SearchEndpoint,
        request: &SearchRequest,
    ) -> Result<usize, DocSetError> {
        self.begin_search()?;
        let response = endpoint.search(request).await;
        self.finish_search(response)
    }

    /// Moves between result pages; returns `false` for a no-op.
    pub fn navigate(&mut self, nav: Navigation) -> bool {
        self.cursor.apply(nav, self.pages.page_count())
    }

    /// Appends every result of the current search to the batch list.
    pub fn add_to_list(&mut self) -> Result<usize, DocSetError> {
        self.ensure_list_editable()?;
        if self.state != SearchState::Populated {
            return Err(DocSetError::InvalidArgument(
                "there are no search results to add".into(),
            ));
        }
        let added = self.batch.append_selection(&self.pages);
        info!(added, total = self.batch.len(), "added search results to batch list");
        Ok(added)
    }

    pub fn push_lines(&mut self, text: &str) -> Result<(), DocSetError> {
        self.ensure_list_editable()?;
        self.batch.push_text(text);
        self.batch.trim();
        Ok(())
    }

    /// Dedupes and sorts the batch list, returning the number of lines removed.
    pub fn dedupe(&mut self, order: Option<DedupeOrder>) -> Result<usize, DocSetError> {
        self.ensure_list_editable()?;
        let order = order.unwrap_or_else(|| self.collection.default_dedupe_order());
        Ok(self.batch.deduplicate_and_sort(order))
    }

    pub fn trim_list(&mut self) -> Result<(), DocSetError> {
        self.ensure_list_editable()?;
        self.batch.trim();
        Ok(())
    }

    pub fn clear_list(&mut self) -> Result<(), DocSetError> {
        self.ensure_list_editable()?;
        self.batch.clear();
        Ok(())
    }

    fn ensure_list_editable(&self) -> Result<(), DocSetError> {
        if self.submit_status.is_pending() {
            return Err(DocSetError::Busy {
                action: "batch submission".into(),
            });
        }
        Ok(())
    }

    /// Builds the submission body and marks the submission as pending.
    pub fn begin_submit(&mut self) -> Result<SubmissionBody, DocSetError> {
        self.ensure_list_editable()?;
        let body = self.batch.submission_body()?;
        self.submit_message = None;
        self.ingest_message = None;
        self.submit_status = RequestStatus::Pending;
        Ok(body)
    }

    pub fn finish_submit(&mut self, response: Result<BatchOutcome, DocSetError>) {
        self.submit_status = RequestStatus::Done;
        let message = match response {
            Ok(BatchOutcome::Created { uri }) => {
                info!(%uri, "document set created");
                SubmitMessage::Success { uri }
            }
            Ok(BatchOutcome::UnknownFiles { files }) => {
                warn!(count = files.len(), "backend rejected unknown files");
                SubmitMessage::BadFiles { files }
            }
            Ok(BatchOutcome::Rejected { message }) => {
                warn!(%message, "document set request rejected");
                SubmitMessage::Error { message }
            }
            Ok(BatchOutcome::Unexpected { body }) => {
                warn!(%body, "unexpected document set response");
                SubmitMessage::Error {
                    message: format!("Unexpected response: {body}"),
                }
            }
            Err(err) => {
                warn!(error = %err, "document set request failed");
                SubmitMessage::Error {
                    message: err.to_string(),
                }
            }
        };
        self.submit_message = Some(message);
    }

    pub async fn submit(&mut self, endpoint: &dyn BatchEndpoint) -> Result<(), DocSetError> {
        let body = self.begin_submit()?;
        let response = endpoint.create_doc_set(&body).await;
        self.finish_submit(response);
        Ok(())
    }

    /// Sends the batch list to the drive ingest job.
    pub async fn ingest(&mut self, endpoint: &dyn IngestEndpoint) -> Result<(), DocSetError> {
        if !self.collection.supports_ingest() {
            return Err(DocSetError::InvalidArgument(format!(
                "ingest is only available for drive files, not {}",
                self.collection.noun()
            )));
        }
        let body = self.begin_submit()?;
        let response = endpoint.ingest(&body).await;
        self.submit_status = RequestStatus::Done;
        self.ingest_message = Some(match response {
            Ok(IngestOutcome::Ingested) => {
                info!(files = body.files.len(), "drive files ingested");
                IngestMessage::Success
            }
            Ok(IngestOutcome::Failed { message }) => {
                warn!(%message, "drive ingest rejected");
                IngestMessage::Error { message }
            }
            Err(err) => {
                warn!(error = %err, "drive ingest failed");
                IngestMessage::Error {
                    message: err.to_string(),
                }
            }
        });
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        let list_ready = !self.batch.is_empty() && !self.submit_status.is_pending();
        let heading = match self.state {
            SearchState::Populated => self.collection.found_label(self.pages.total()),
            _ => self.collection.idle_label().to_string(),
        };
        SessionView {
            collection: self.collection,
            heading,
            state: self.state,
            page_size: self.page_size,
            page_index: self.cursor.index(),
            page_count: self.pages.page_count(),
            total: self.pages.total(),
            rows: self
                .pages
                .page(self.cursor.index())
                .map(<[SearchResult]>::to_vec)
                .unwrap_or_default(),
            controls: PaginationControls::build(self.pages.page_count(), self.cursor.index()),
            show_empty: self.state == SearchState::Empty,
            search_error: self.search_error.clone(),
            enabled: ControlStates {
                search: !self.search_status.is_pending(),
                add_to_list: self.state == SearchState::Populated
                    && !self.submit_status.is_pending(),
                submit: list_ready,
                dedupe: list_ready,
                ingest: list_ready && self.collection.supports_ingest(),
            },
            batch_count: self.batch.len(),
            submit_message: self.submit_message.clone(),
            ingest_message: self.ingest_message.clone(),
        }
    }
}
