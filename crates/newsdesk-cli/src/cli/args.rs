use clap::Args;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text query; omit to list newest articles instead.
    #[arg(long, allow_hyphen_values = true)]
    pub query: Option<String>,
    /// Comma-separated category slugs (e.g. technology,business).
    #[arg(long)]
    pub categories: Option<String>,
    /// 1-based page number; non-numeric input falls back to 1.
    #[arg(long)]
    pub page: Option<String>,
    /// Page size; non-numeric input falls back to the default.
    #[arg(long)]
    pub limit: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSONL file with one article record per line.
    pub file: String,
}
