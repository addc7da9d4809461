use serde::Serialize;

use crate::error::DocSetError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, DocSetError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::to_pretty;
    use crate::entities::{Collection, PMC_ID_FIELD, SearchResult};
    use crate::listing::batch_list::BatchList;
    use crate::listing::session::Session;

    #[test]
    fn session_view_serializes_controls_and_rows() {
        let mut session = Session::new(Collection::Papers);
        session.begin_search().unwrap();
        let results: Vec<SearchResult> = (1..=15)
            .map(|i| {
                SearchResult::new(format!("/p/PMC{i}.txt"), format!("Paper {i}"))
                    .with_field(PMC_ID_FIELD, format!("PMC{i}"))
            })
            .collect();
        session.finish_search(Ok(results)).unwrap();

        let json = to_pretty(&session.view()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["collection"], "papers");
        assert_eq!(value["state"], "populated");
        assert_eq!(value["page_count"], 2);
        assert_eq!(value["page_size"], 10);
        assert_eq!(value["rows"][0]["secondary_fields"]["pmc_id"], "PMC1");
        assert_eq!(value["controls"]["items"][0]["kind"], "page");
        assert!(value.get("search_error").is_none());
    }

    #[test]
    fn batch_list_serializes_as_lines() {
        let json = to_pretty(&BatchList::parse("a\tA\nb")).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!(["a\tA", "b"]));
    }
}
