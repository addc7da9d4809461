use crate::entities::{ARTICLE_TYPE_FIELD, DOI_FIELD, PMC_ID_FIELD, SearchResult};
use crate::sources::doc_search::PaperRow;
use crate::transform::clean_opt;

const TITLE_NOT_FOUND: &str = "[Title not found]";
const TYPE_NOT_FOUND: &str = "[Type not found]";
const DOI_NOT_FOUND: &str = "[DOI not found]";

/// Papers are selected by file path; the PMC id is kept for display and
/// ordering. Rows without a path give `None`.
pub(crate) fn from_row(row: PaperRow) -> Option<SearchResult> {
    let path = clean_opt(row.path.as_deref())?;
    let title = clean_opt(row.title.as_deref()).unwrap_or_else(|| TITLE_NOT_FOUND.to_string());
    let result = SearchResult::new(path, title);
    let result = match clean_opt(row.pmc_id.as_deref()) {
        Some(pmc_id) => result.with_field(PMC_ID_FIELD, pmc_id),
        None => result,
    };
    Some(
        result
            .with_field(
                ARTICLE_TYPE_FIELD,
                clean_opt(row.article_type.as_deref())
                    .unwrap_or_else(|| TYPE_NOT_FOUND.to_string()),
            )
            .with_field(
                DOI_FIELD,
                clean_opt(row.doi.as_deref()).unwrap_or_else(|| DOI_NOT_FOUND.to_string()),
            ),
    )
}

pub(crate) fn from_rows(rows: Vec<PaperRow>) -> Vec<SearchResult> {
    rows.into_iter().filter_map(from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metadata_gets_placeholders() {
        let row: PaperRow = serde_json::from_value(serde_json::json!({
            "pmc_id": "PMC123",
            "path": "/papers/PMC123.txt",
            "title": "  "
        }))
        .unwrap();

        let result = from_row(row).unwrap();
        assert_eq!(result.id, "/papers/PMC123.txt");
        assert_eq!(result.label, "[Title not found]");
        assert_eq!(result.field(PMC_ID_FIELD), Some("PMC123"));
        assert_eq!(result.field(ARTICLE_TYPE_FIELD), Some("[Type not found]"));
        assert_eq!(result.field(DOI_FIELD), Some("[DOI not found]"));
    }

    #[test]
    fn present_metadata_is_kept() {
        let row: PaperRow = serde_json::from_value(serde_json::json!({
            "pmc_id": "PMC9",
            "path": "/papers/PMC9.txt",
            "title": "Mitochondrial dynamics",
            "article_type": "research-article",
            "doi": "10.1000/xyz"
        }))
        .unwrap();

        let result = from_row(row).unwrap();
        assert_eq!(result.label, "Mitochondrial dynamics");
        assert_eq!(result.field(ARTICLE_TYPE_FIELD), Some("research-article"));
        assert_eq!(result.field(DOI_FIELD), Some("10.1000/xyz"));
        assert_eq!(result.batch_line(), "/papers/PMC9.txt\tMitochondrial dynamics");
    }

    #[test]
    fn rows_without_paths_are_dropped() {
        let rows: Vec<PaperRow> = serde_json::from_value(serde_json::json!([
            {"pmc_id": "PMC1", "path": "/papers/PMC1.txt"},
            {"pmc_id": "PMC2", "path": ""},
            {"pmc_id": "PMC3"}
        ]))
        .unwrap();

        let results = from_rows(rows);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].field(PMC_ID_FIELD), Some("PMC1"));
    }
}
