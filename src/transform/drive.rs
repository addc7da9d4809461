use crate::entities::{MIME_TYPE_FIELD, SearchResult};
use crate::sources::gdrive::DriveRow;
use crate::transform::clean_opt;

/// `None` for rows without a usable id.
pub(crate) fn from_row(row: DriveRow) -> Option<SearchResult> {
    let id = clean_opt(row.id.as_deref())?;
    let result = SearchResult::new(id, clean_opt(row.name.as_deref()).unwrap_or_default());
    Some(match clean_opt(row.mime_type.as_deref()) {
        Some(mime_type) => result.with_field(MIME_TYPE_FIELD, mime_type),
        None => result,
    })
}

pub(crate) fn from_rows(rows: Vec<DriveRow>) -> Vec<SearchResult> {
    rows.into_iter().filter_map(from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_without_ids_are_dropped() {
        let rows: Vec<DriveRow> = serde_json::from_value(serde_json::json!([
            {"id": "1", "name": "a.txt"},
            {"id": " ", "name": "ghost.txt"},
            {"name": "orphan.txt"},
            {"id": "2"}
        ]))
        .unwrap();

        let results = from_rows(rows);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].batch_line(), "1\ta.txt");
        assert_eq!(results[1].batch_line(), "2");
        assert_eq!(results[0].field(MIME_TYPE_FIELD), None);
    }
}
