use std::path::Path;

use anyhow::{Context, Result};
use newsdesk_core::models::SearchRequest;
use newsdesk_core::{Newsdesk, ingest};

use crate::cli::{Commands, ImportArgs, SearchArgs};

pub fn run_from_root(root: &Path, command: Commands) -> Result<()> {
    let desk = Newsdesk::open(root)?;
    match command {
        Commands::Search(args) => run_search(&desk, args),
        Commands::Import(args) => run_import(&desk, &args),
        Commands::Status => run_status(&desk),
    }
}

fn run_search(desk: &Newsdesk, args: SearchArgs) -> Result<()> {
    let page = desk.search(&SearchRequest {
        q: args.query,
        categories: args.categories,
        page: args.page,
        limit: args.limit,
    })?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn run_import(desk: &Newsdesk, args: &ImportArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file).with_context(|| format!("read {}", args.file))?;
    let outcome = ingest::import_jsonl(&desk.state, &raw)?;
    let summary = serde_json::json!({
        "imported": outcome.imported,
        "skipped_lines": outcome.skipped_lines,
        "first_error": outcome
            .first_error
            .map(|(line_no, message)| serde_json::json!({ "line": line_no, "message": message })),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_status(desk: &Newsdesk) -> Result<()> {
    let status = desk.status()?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
