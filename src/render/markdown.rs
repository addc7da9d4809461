use std::sync::OnceLock;

use minijinja::{Environment, Value, context};

use crate::entities::Collection;
use crate::error::DocSetError;
use crate::listing::batch_list::BatchList;
use crate::listing::pages::{PageItem, PaginationControls};
use crate::listing::session::{IngestMessage, SessionView, SubmitMessage};

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn env() -> Result<&'static Environment<'static>, DocSetError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.add_filter("truncate", |s: String, max_bytes: usize| -> String {
        if s.len() <= max_bytes {
            return s;
        }
        if max_bytes == 0 {
            return "…".to_string();
        }
        let mut boundary = max_bytes;
        while boundary > 0 && !s.is_char_boundary(boundary) {
            boundary -= 1;
        }
        let mut out = s[..boundary].trim_end().to_string();
        out.push('…');
        out
    });
    env.add_filter("cell", |v: Value| -> String {
        if v.is_undefined() || v.is_none() {
            return String::new();
        }
        v.to_string()
            .replace(['\n', '\r', '\t'], " ")
            .replace('|', "\\|")
    });
    env.add_template(
        "papers_page.md.j2",
        include_str!("../../templates/papers_page.md.j2"),
    )?;
    env.add_template(
        "drive_page.md.j2",
        include_str!("../../templates/drive_page.md.j2"),
    )?;
    env.add_template(
        "batch_list.md.j2",
        include_str!("../../templates/batch_list.md.j2"),
    )?;
    env.add_template(
        "submit_result.md.j2",
        include_str!("../../templates/submit_result.md.j2"),
    )?;
    env.add_template(
        "ingest_result.md.j2",
        include_str!("../../templates/ingest_result.md.j2"),
    )?;

    let _ = ENV.set(env);
    ENV.get().ok_or_else(|| DocSetError::Api {
        api: "markdown".into(),
        message: "Template environment initialization failed".into(),
    })
}

/// Text rendition of the pagination bar, e.g. `« ‹ … 4 5 [6] 7 8 … › »`.
/// Disabled arrows are shown as `·`.
pub fn controls_line(controls: &PaginationControls) -> String {
    let arrow = |enabled: bool, symbol: &str| {
        if enabled {
            symbol.to_string()
        } else {
            "·".to_string()
        }
    };
    let mut parts = vec![
        arrow(controls.first_enabled, "«"),
        arrow(controls.prev_enabled, "‹"),
    ];
    parts.extend(controls.items.iter().map(|item| match item {
        PageItem::Page {
            number,
            active: true,
            ..
        } => format!("[{number}]"),
        PageItem::Page { number, .. } => number.to_string(),
        PageItem::Ellipsis => "…".to_string(),
    }));
    parts.push(arrow(controls.next_enabled, "›"));
    parts.push(arrow(controls.last_enabled, "»"));
    parts.join(" ")
}

fn page_footer(view: &SessionView) -> String {
    let mut lines = Vec::new();
    if let Some(controls) = &view.controls {
        let start = view.page_index * view.page_size + 1;
        let end = start + view.rows.len().saturating_sub(1);
        lines.push(format!(
            "Page {} of {} (results {start}-{end} of {}): {}",
            view.page_index + 1,
            view.page_count,
            view.total,
            controls_line(controls)
        ));
    }
    if view.batch_count > 0 {
        lines.push(format!("Batch list: {} entries.", view.batch_count));
    }
    lines.join("\n")
}

pub fn search_page_markdown(view: &SessionView, query: &str) -> Result<String, DocSetError> {
    let name = match view.collection {
        Collection::Papers => "papers_page.md.j2",
        Collection::Drive => "drive_page.md.j2",
    };
    let tmpl = env()?.get_template(name)?;
    let mut body = tmpl.render(context! {
        view => view,
        query => query,
        offset => view.page_index * view.page_size,
    })?;

    let footer = page_footer(view);
    if !footer.is_empty() {
        if !body.ends_with('\n') {
            body.push('\n');
        }
        body.push('\n');
        body.push_str(&footer);
        body.push('\n');
    }
    Ok(body)
}

pub fn batch_list_markdown(list: &BatchList) -> Result<String, DocSetError> {
    let tmpl = env()?.get_template("batch_list.md.j2")?;
    let lines: Vec<&str> = list
        .lines()
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    Ok(tmpl.render(context! { lines => lines })?)
}

pub fn submit_message_markdown(message: &SubmitMessage) -> Result<String, DocSetError> {
    let tmpl = env()?.get_template("submit_result.md.j2")?;
    Ok(tmpl.render(context! { message => message })?)
}

pub fn ingest_message_markdown(message: &IngestMessage) -> Result<String, DocSetError> {
    let tmpl = env()?.get_template("ingest_result.md.j2")?;
    Ok(tmpl.render(context! { message => message })?)
}
