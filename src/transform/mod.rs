//! Transform adapters from backend row shapes into `SearchResult`s.

pub(crate) mod drive;
pub(crate) mod paper;

pub(crate) fn clean_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
