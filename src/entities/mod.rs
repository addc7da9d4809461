//! Collection-level search records and per-collection ordering rules.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::listing::batch_list::DedupeOrder;

pub mod batch;

/// One row returned by a search endpoint.
///
/// `id` is the selection key written to the batch list (a file path for
/// papers, a drive file id for drive files); `label` is the display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secondary_fields: BTreeMap<String, String>,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            secondary_fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.secondary_fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.secondary_fields.get(key).map(String::as_str)
    }

    /// The batch-list line for this result: `id<TAB>label`, or the bare id
    /// when there is no label.
    pub fn batch_line(&self) -> String {
        let id = self.id.trim();
        let label = self.label.trim();
        if label.is_empty() {
            id.to_string()
        } else {
            format!("{id}\t{label}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Full-text paper corpus
    Papers,
    /// Cloud drive files
    Drive,
}

impl Collection {
    pub fn noun(self) -> &'static str {
        match self {
            Self::Papers => "papers",
            Self::Drive => "files",
        }
    }

    /// Heading shown before any search has completed.
    pub fn idle_label(self) -> &'static str {
        match self {
            Self::Papers => "Matching papers",
            Self::Drive => "Matching files",
        }
    }

    pub fn found_label(self, count: usize) -> String {
        format!("{count} {} found", self.noun())
    }

    /// Dedupe order used when the caller does not pick one.
    pub fn default_dedupe_order(self) -> DedupeOrder {
        match self {
            Self::Papers => DedupeOrder::Lexicographic,
            Self::Drive => DedupeOrder::Label,
        }
    }

    /// Whether results can be pushed straight into the drive ingest job.
    pub fn supports_ingest(self) -> bool {
        matches!(self, Self::Drive)
    }

    pub fn sort_results(self, results: &mut [SearchResult]) {
        match self {
            Self::Papers => results.sort_by(|a, b| {
                length_then_lexicographic(
                    a.field(PMC_ID_FIELD).unwrap_or(&a.id),
                    b.field(PMC_ID_FIELD).unwrap_or(&b.id),
                )
            }),
            Self::Drive => results.sort_by(|a, b| compare_labels(&a.label, &b.label)),
        }
    }
}

pub const PMC_ID_FIELD: &str = "pmc_id";
pub const ARTICLE_TYPE_FIELD: &str = "article_type";
pub const DOI_FIELD: &str = "doi";
pub const MIME_TYPE_FIELD: &str = "mime_type";

/// Shorter ids first so `PMC9...` sorts before `PMC10...`.
pub fn length_then_lexicographic(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Case-insensitive label comparison with a raw tiebreak for a total order.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MimeFilter {
    #[default]
    All,
    PlainText,
    Pdf,
    GoogleDoc,
}

impl MimeFilter {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::All => "_ALL_",
            Self::PlainText => "text/plain",
            Self::Pdf => "application/pdf",
            Self::GoogleDoc => "application/vnd.google-apps.document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub mime_type: MimeFilter,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mime_type: MimeFilter::All,
        }
    }

    pub fn with_mime_type(mut self, mime_type: MimeFilter) -> Self {
        self.mime_type = mime_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn papers_sort_by_pmc_id_width_first() {
        let mut results = vec![
            SearchResult::new("/p/PMC10.txt", "B").with_field(PMC_ID_FIELD, "PMC10"),
            SearchResult::new("/p/PMC9.txt", "A").with_field(PMC_ID_FIELD, "PMC9"),
            SearchResult::new("/p/PMC11.txt", "C").with_field(PMC_ID_FIELD, "PMC11"),
        ];
        Collection::Papers.sort_results(&mut results);
        let ids: Vec<_> = results.iter().filter_map(|r| r.field(PMC_ID_FIELD)).collect();
        assert_eq!(ids, vec!["PMC9", "PMC10", "PMC11"]);
    }

    #[test]
    fn drive_sorts_by_name_ignoring_case() {
        let mut results = vec![
            SearchResult::new("2", "beta.txt"),
            SearchResult::new("1", "Alpha.txt"),
        ];
        Collection::Drive.sort_results(&mut results);
        assert_eq!(results[0].label, "Alpha.txt");
    }

    #[test]
    fn batch_line_omits_empty_label() {
        assert_eq!(SearchResult::new("id1", "One").batch_line(), "id1\tOne");
        assert_eq!(SearchResult::new(" id2 ", " ").batch_line(), "id2");
    }

    #[test]
    fn mime_filter_wire_values() {
        assert_eq!(MimeFilter::All.as_wire(), "_ALL_");
        assert_eq!(
            MimeFilter::GoogleDoc.as_wire(),
            "application/vnd.google-apps.document"
        );
    }
}
