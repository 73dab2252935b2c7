use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;


pub use args::{ImportArgs, SearchArgs};

#[derive(Debug, Parser)]
#[command(name = "newsdesk")]
#[command(about = "Hybrid lexical+fuzzy search over a news corpus", version)]
pub struct Cli {
    #[arg(long, default_value = ".newsdesk")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Search(SearchArgs),
    Import(ImportArgs),
    Status,
}
