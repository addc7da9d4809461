use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::entities::{SearchResult, compare_labels, length_then_lexicographic};
use crate::error::DocSetError;
use crate::listing::pages::PageSet;

static LINE_BREAK_RE: OnceLock<Regex> = OnceLock::new();

// The editor historically stored rows joined by `<br>`; accept both that and
// plain newlines.
fn line_break_re() -> &'static Regex {
    LINE_BREAK_RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>|\r?\n").expect("valid regex"))
}

/// Selection key of a batch-list line: the first tab-separated field.
pub fn line_id(line: &str) -> &str {
    line.split('\t').next().unwrap_or(line).trim()
}

/// Display label of a tab-composite line, if it has a non-empty one.
pub fn line_label(line: &str) -> Option<&str> {
    line.split('\t')
        .nth(1)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DedupeOrder {
    /// Whole line, plain string order
    Lexicographic,
    /// Id length first, so narrower numeric ids come before wider ones
    LengthThenLexicographic,
    /// Display label; lines without a label come first
    Label,
}

impl DedupeOrder {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexicographic => a.cmp(b),
            Self::LengthThenLexicographic => {
                length_then_lexicographic(line_id(a), line_id(b)).then_with(|| a.cmp(b))
            }
            Self::Label => match (line_label(a), line_label(b)) {
                (None, None) => line_id(a).cmp(line_id(b)).then_with(|| a.cmp(b)),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(la), Some(lb)) => compare_labels(la, lb)
                    .then_with(|| line_id(a).cmp(line_id(b)))
                    .then_with(|| a.cmp(b)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionBody {
    pub files: Vec<String>,
}

/// Free-form list of selected items, one per line.
///
/// Lines are kept exactly as entered until [`BatchList::trim`] or
/// [`BatchList::deduplicate_and_sort`] normalizes them, so duplicates are
/// allowed in between.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchList {
    lines: Vec<String>,
}

impl BatchList {
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::default();
        }
        Self {
            lines: line_break_re().split(text).map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True when no line carries any text.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.lines.iter().filter(|line| !line.trim().is_empty()).count()
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Adds free-form text; embedded line breaks produce several lines.
    pub fn push_text(&mut self, text: &str) {
        self.lines.extend(Self::parse(text).lines);
    }

    /// Trims every line and drops blank ones.
    pub fn trim(&mut self) {
        self.lines = self
            .lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Appends every result of every page, not only the visible one.
    pub fn append_selection(&mut self, pages: &PageSet<SearchResult>) -> usize {
        let before = self.lines.len();
        self.lines.extend(pages.entries().map(SearchResult::batch_line));
        let added = self.lines.len() - before;
        self.trim();
        added
    }

    /// Keeps one line per distinct id (first occurrence wins) and sorts the
    /// survivors by `order`. Running it twice changes nothing.
    pub fn deduplicate_and_sort(&mut self, order: DedupeOrder) -> usize {
        let before = self.len();
        let mut seen: HashSet<String> = HashSet::new();
        let mut unique: Vec<String> = self
            .lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .filter(|line| seen.insert(line_id(line).to_string()))
            .map(str::to_string)
            .collect();
        unique.sort_by(|a, b| order.compare(a, b));
        self.lines = unique;
        before - self.lines.len()
    }

    /// Ids in list order; labels of composite lines are dropped.
    pub fn ids(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line_id(line))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn submission_body(&self) -> Result<SubmissionBody, DocSetError> {
        let files = self.ids();
        if files.is_empty() {
            return Err(DocSetError::InvalidArgument(
                "batch list is empty; add files before submitting".into(),
            ));
        }
        Ok(SubmissionBody { files })
    }
}
