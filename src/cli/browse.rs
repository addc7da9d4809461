//! Interactive pager over one search: move between pages, add results to the
//! batch list, or run a new query without leaving the session.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::Context;
use crate::entities::SearchRequest;
use crate::listing::pages::Navigation;
use crate::listing::session::Session;
use crate::render::{json, markdown};
use crate::sources::SearchEndpoint;

const PROMPT: &str = "[n]ext [p]rev [f]irst [l]ast <page> [a]dd [s]earch <text> [q]uit > ";

const HELP: &str = "\
n, next          next page
p, prev          previous page
f, first         first page
l, last          last page
<number>         jump to that page
a, add           append every result to the batch list
s, search <text> run a new search
r, show          print the current page again
q, quit          save the batch list and exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Navigate(Navigation),
    Add,
    Search(String),
    Show,
    Help,
    Quit,
}

fn parse_command(input: &str) -> Result<BrowseCommand, String> {
    let input = input.trim();
    let (word, rest) = match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" | "r" | "show" => Ok(BrowseCommand::Show),
        "n" | "next" => Ok(BrowseCommand::Navigate(Navigation::Next)),
        "p" | "prev" => Ok(BrowseCommand::Navigate(Navigation::Prev)),
        "f" | "first" => Ok(BrowseCommand::Navigate(Navigation::First)),
        "l" | "last" => Ok(BrowseCommand::Navigate(Navigation::Last)),
        "a" | "add" => Ok(BrowseCommand::Add),
        "h" | "?" | "help" => Ok(BrowseCommand::Help),
        "q" | "quit" | "exit" => Ok(BrowseCommand::Quit),
        "s" | "search" if rest.is_empty() => Err("search needs some text".into()),
        "s" | "search" => Ok(BrowseCommand::Search(rest.to_string())),
        other => match other.parse::<usize>() {
            Ok(0) => Err("pages start at 1".into()),
            Ok(number) => Ok(BrowseCommand::Navigate(Navigation::Goto(number - 1))),
            Err(_) => Err(format!("unknown command: {other} (type `help`)")),
        },
    }
}

pub(super) async fn run(
    ctx: &Context,
    session: &mut Session,
    endpoint: &dyn SearchEndpoint,
    query: &str,
    request: SearchRequest,
) -> anyhow::Result<String> {
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    run_with(ctx, session, endpoint, query, request, input, &mut output).await
}

async fn run_with<R, W>(
    ctx: &Context,
    session: &mut Session,
    endpoint: &dyn SearchEndpoint,
    query: &str,
    mut request: SearchRequest,
    input: R,
    output: &mut W,
) -> anyhow::Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut query = query.to_string();
    let mut lines = input.lines();

    session.search(endpoint, &request).await?;
    write_page(ctx, session, &query, output).await?;

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Ok(BrowseCommand::Quit) => break,
            Ok(BrowseCommand::Help) => output.write_all(HELP.as_bytes()).await?,
            Ok(BrowseCommand::Show) => write_page(ctx, session, &query, output).await?,
            Ok(BrowseCommand::Navigate(nav)) => {
                if session.navigate(nav) {
                    write_page(ctx, session, &query, output).await?;
                } else {
                    output.write_all(b"No page to move to.\n").await?;
                }
            }
            Ok(BrowseCommand::Add) => match session.add_to_list() {
                Ok(added) => {
                    ctx.save_list(session).await?;
                    let msg = format!(
                        "Added {added} entries; the batch list now has {}.\n",
                        session.batch().len()
                    );
                    output.write_all(msg.as_bytes()).await?;
                }
                Err(err) => output.write_all(format!("{err}\n").as_bytes()).await?,
            },
            Ok(BrowseCommand::Search(text)) => {
                request.query = text.clone();
                query = text;
                session.search(endpoint, &request).await?;
                write_page(ctx, session, &query, output).await?;
            }
            Err(msg) => output.write_all(format!("{msg}\n").as_bytes()).await?,
        }
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(format!(
        "Batch list: {} entries in {}",
        session.batch().len(),
        ctx.list_path.display()
    ))
}

async fn write_page<W>(
    ctx: &Context,
    session: &Session,
    query: &str,
    output: &mut W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let view = session.view();
    let mut text = if ctx.json {
        json::to_pretty(&view)?
    } else {
        markdown::search_page_markdown(&view, query)?
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    output.write_all(text.as_bytes()).await?;
    Ok(())
}
