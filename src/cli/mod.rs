//! Command line surface: one-shot search, interactive browsing, and batch-list editing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::entities::{Collection, MimeFilter, SearchRequest};
use crate::error::DocSetError;
use crate::listing::batch_list::DedupeOrder;
use crate::listing::pages::{FILES_PER_PAGE, Navigation};
use crate::listing::session::{IngestMessage, SearchState, Session, SubmitMessage};
use crate::render::{json, markdown};
use crate::sources::{DocSearchClient, GDriveClient, SearchEndpoint};
use crate::utils::batch_file;

mod browse;

#[derive(Parser, Debug)]
#[command(
    name = "docset",
    version,
    about = "Search papers or drive files, page through results, and curate batch lists"
)]
pub struct Cli {
    /// Print JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend base URL (default: $DOCSET_BASE_URL or http://127.0.0.1:5000)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Batch list file (default: $DOCSET_BATCH_LIST or <data dir>/docset/batch-list.txt)
    #[arg(long, global = true)]
    pub list: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a collection and print one page of results
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },
    /// Search a collection and page through the results interactively
    Browse {
        #[command(subcommand)]
        target: SearchTarget,
    },
    /// Show, edit, or submit the batch list
    List {
        #[command(subcommand)]
        command: ListCommand,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search text
    pub query: String,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Append every result (all pages) to the batch list
    #[arg(long)]
    pub add: bool,

    /// Results per page
    #[arg(long, default_value_t = FILES_PER_PAGE)]
    pub page_size: usize,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SearchTarget {
    /// Full-text paper corpus
    Papers(SearchArgs),
    /// Cloud drive files
    Drive {
        #[command(flatten)]
        args: SearchArgs,

        /// Restrict results to one file type
        #[arg(long, value_enum, default_value_t = MimeFilter::All)]
        mime_type: MimeFilter,
    },
}

impl SearchTarget {
    fn parts(&self) -> (Collection, &SearchArgs, SearchRequest) {
        match self {
            Self::Papers(args) => (Collection::Papers, args, SearchRequest::new(&args.query)),
            Self::Drive { args, mime_type } => (
                Collection::Drive,
                args,
                SearchRequest::new(&args.query).with_mime_type(*mime_type),
            ),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListCommand {
    /// Print the batch list
    Show,
    /// Append lines (`id` or `id<TAB>label`)
    Add {
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Trim whitespace and drop blank lines
    Trim,
    /// Remove duplicate ids and sort
    Dedupe {
        /// Sort order (default depends on --collection)
        #[arg(long, value_enum)]
        order: Option<DedupeOrder>,

        /// Collection whose default sort order applies
        #[arg(long, value_enum, default_value_t = Collection::Papers)]
        collection: Collection,
    },
    /// Remove every line
    Clear,
    /// Create a document set from the batch list
    Submit,
    /// Send the batch list of drive files to the ingest job
    Ingest,
}

struct Context {
    json: bool,
    base_url: String,
    list_path: PathBuf,
}

impl Context {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            base_url: cli
                .base_url
                .clone()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| crate::sources::default_base_url().into_owned()),
            list_path: cli
                .list
                .clone()
                .unwrap_or_else(batch_file::default_batch_list_path),
        }
    }

    fn search_endpoint(
        &self,
        collection: Collection,
    ) -> Result<Box<dyn SearchEndpoint>, DocSetError> {
        Ok(match collection {
            Collection::Papers => Box::new(DocSearchClient::with_base(self.base_url.clone())?),
            Collection::Drive => Box::new(GDriveClient::with_base(self.base_url.clone())?),
        })
    }

    async fn load_session(&self, collection: Collection) -> Result<Session, DocSetError> {
        let batch = batch_file::load(&self.list_path).await?;
        Ok(Session::new(collection).with_batch(batch))
    }

    async fn save_list(&self, session: &Session) -> Result<(), DocSetError> {
        batch_file::save(&self.list_path, session.batch()).await
    }

    fn render_list(&self, session: &Session) -> Result<String, DocSetError> {
        if self.json {
            json::to_pretty(session.batch())
        } else {
            markdown::batch_list_markdown(session.batch())
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let ctx = Context::from_cli(&cli);
    match cli.command {
        Commands::Search { target } => search(&ctx, &target).await,
        Commands::Browse { target } => {
            let (collection, args, request) = target.parts();
            let endpoint = ctx.search_endpoint(collection)?;
            let mut session = ctx
                .load_session(collection)
                .await?
                .with_page_size(args.page_size)?;
            browse::run(&ctx, &mut session, endpoint.as_ref(), &args.query, request).await
        }
        Commands::List { command } => list(&ctx, command).await,
    }
}

async fn search(ctx: &Context, target: &SearchTarget) -> anyhow::Result<String> {
    let (collection, args, request) = target.parts();
    if args.page == 0 {
        return Err(DocSetError::InvalidArgument("--page starts at 1".into()).into());
    }

    let endpoint = ctx.search_endpoint(collection)?;
    let mut session = ctx
        .load_session(collection)
        .await?
        .with_page_size(args.page_size)?;
    session.search(endpoint.as_ref(), &request).await?;
    if let Some(error) = session.search_error() {
        anyhow::bail!("Search failed: {error}");
    }

    if args.page > 1 && !session.navigate(Navigation::Goto(args.page - 1)) {
        return Err(DocSetError::InvalidArgument(format!(
            "--page must be between 1 and {}",
            session.pages().page_count().max(1)
        ))
        .into());
    }

    if args.add && session.state() == SearchState::Populated {
        let added = session.add_to_list()?;
        ctx.save_list(&session).await?;
        info!(added, path = %ctx.list_path.display(), "batch list updated");
    }

    let view = session.view();
    if ctx.json {
        Ok(json::to_pretty(&view)?)
    } else {
        Ok(markdown::search_page_markdown(&view, &args.query)?)
    }
}

async fn list(ctx: &Context, command: ListCommand) -> anyhow::Result<String> {
    let collection = match &command {
        ListCommand::Dedupe { collection, .. } => *collection,
        ListCommand::Ingest => Collection::Drive,
        _ => Collection::Papers,
    };
    let mut session = ctx.load_session(collection).await?;

    match command {
        ListCommand::Show => Ok(ctx.render_list(&session)?),
        ListCommand::Add { lines } => {
            for line in &lines {
                session.push_lines(line)?;
            }
            ctx.save_list(&session).await?;
            Ok(ctx.render_list(&session)?)
        }
        ListCommand::Trim => {
            session.trim_list()?;
            ctx.save_list(&session).await?;
            Ok(ctx.render_list(&session)?)
        }
        ListCommand::Dedupe { order, .. } => {
            let removed = session.dedupe(order)?;
            ctx.save_list(&session).await?;
            info!(removed, "batch list deduplicated");
            Ok(ctx.render_list(&session)?)
        }
        ListCommand::Clear => {
            session.clear_list()?;
            ctx.save_list(&session).await?;
            Ok(ctx.render_list(&session)?)
        }
        ListCommand::Submit => {
            let client = DocSearchClient::with_base(ctx.base_url.clone())?;
            session.submit(&client).await?;
            let Some(message) = session.submit_message() else {
                anyhow::bail!("Submission finished without a response");
            };
            let rendered = if ctx.json {
                json::to_pretty(message)?
            } else {
                markdown::submit_message_markdown(message)?
            };
            match message {
                SubmitMessage::Success { .. } => Ok(rendered),
                _ => anyhow::bail!(rendered),
            }
        }
        ListCommand::Ingest => {
            let client = GDriveClient::with_base(ctx.base_url.clone())?;
            session.ingest(&client).await?;
            let Some(message) = session.ingest_message() else {
                anyhow::bail!("Ingest finished without a response");
            };
            let rendered = if ctx.json {
                json::to_pretty(message)?
            } else {
                markdown::ingest_message_markdown(message)?
            };
            match message {
                IngestMessage::Success => Ok(rendered),
                IngestMessage::Error { .. } => anyhow::bail!(rendered),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn parses_drive_search_with_mime_type() {
        let parsed = cli(&[
            "docset",
            "search",
            "drive",
            "budget",
            "--mime-type",
            "google-doc",
            "--page",
            "2",
            "--page-size",
            "5",
        ]);
        match parsed.command {
            Commands::Search {
                target: SearchTarget::Drive { args, mime_type },
            } => {
                assert_eq!(args.query, "budget");
                assert_eq!(args.page, 2);
                assert_eq!(args.page_size, 5);
                assert_eq!(mime_type, MimeFilter::GoogleDoc);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_dedupe_order() {
        let parsed = cli(&[
            "docset",
            "list",
            "dedupe",
            "--order",
            "length-then-lexicographic",
        ]);
        assert!(matches!(
            parsed.command,
            Commands::List {
                command: ListCommand::Dedupe {
                    order: Some(DedupeOrder::LengthThenLexicographic),
                    collection: Collection::Papers,
                }
            }
        ));
    }

    #[tokio::test]
    async fn search_with_add_persists_every_result() {
        let server = MockServer::start().await;
        let files: Vec<serde_json::Value> = (1..=12)
            .map(|i| {
                serde_json::json!({
                    "pmc_id": format!("PMC{i}"),
                    "path": format!("/papers/PMC{i}.txt"),
                    "title": format!("Paper {i}")
                })
            })
            .collect();
        Mock::given(method("POST"))
            .and(path("/doc-search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": files})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("batch.txt");
        let parsed = cli(&[
            "docset",
            "--base-url",
            &server.uri(),
            "--list",
            list_path.to_str().unwrap(),
            "search",
            "papers",
            "cells",
            "--page",
            "2",
            "--add",
        ]);

        let out = run(parsed).await.unwrap();
        assert!(out.contains("12 papers found"));
        assert!(out.contains("| 11 | PMC10 |"));

        let saved = batch_file::load(&list_path).await.unwrap();
        assert_eq!(saved.len(), 12);
        assert_eq!(saved.lines()[0], "/papers/PMC1.txt\tPaper 1");
    }

    #[tokio::test]
    async fn search_rejects_zero_page_size_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("batch.txt");
        let parsed = cli(&[
            "docset",
            "--base-url",
            "http://127.0.0.1:9",
            "--list",
            list_path.to_str().unwrap(),
            "search",
            "papers",
            "cells",
            "--page-size",
            "0",
        ]);

        let err = run(parsed).await.unwrap_err();
        assert!(err.to_string().contains("page size must be a positive integer"));
    }

    #[tokio::test]
    async fn search_rejects_page_past_the_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/doc-search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [{"pmc_id": "PMC1", "path": "/papers/PMC1.txt"}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("batch.txt");
        let parsed = cli(&[
            "docset",
            "--base-url",
            &server.uri(),
            "--list",
            list_path.to_str().unwrap(),
            "search",
            "papers",
            "cells",
            "--page",
            "3",
        ]);

        let err = run(parsed).await.unwrap_err();
        assert!(err.to_string().contains("--page must be between 1 and 1"));
    }

    #[tokio::test]
    async fn submit_sends_ids_only_and_reports_bad_files() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/new-doc-set"))
            .and(body_json(serde_json::json!({"files": ["id1", "x.txt"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Unknown files",
                "detail": ["x.txt"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("batch.txt");
        batch_file::save(
            &list_path,
            &crate::listing::batch_list::BatchList::parse("id1\tLabel One\nx.txt"),
        )
        .await
        .unwrap();

        let parsed = cli(&[
            "docset",
            "--base-url",
            &server.uri(),
            "--list",
            list_path.to_str().unwrap(),
            "list",
            "submit",
        ]);
        let err = run(parsed).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("x.txt"));
        assert!(!msg.contains("Document set created"));
    }

    #[tokio::test]
    async fn list_add_then_dedupe_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("batch.txt");
        let list_arg = list_path.to_str().unwrap();

        run(cli(&["docset", "--list", list_arg, "list", "add", "b", "a", "a"]))
            .await
            .unwrap();
        let out = run(cli(&["docset", "--json", "--list", list_arg, "list", "dedupe"]))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!(["a", "b"]));
    }
}
