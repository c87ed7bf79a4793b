use clap::Parser;
use std::path::PathBuf;

/// Interactive GitHub repository search with debounced input, saved queries
/// and rate-limit awareness.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Search GitHub repositories interactively. Filters are restored from a URL-style query string and from saved preferences, and every change is reflected back into the query string."
)]
pub struct Args {
    /// Initial URL query string, e.g. "q=react&lang=TypeScript&page=2".
    #[clap(short, long, default_value = "")]
    pub url: String,

    /// File holding preferences, the saved token and saved queries.
    /// Defaults to ~/.config/github-repo-search/storage.json.
    #[clap(short, long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// GitHub API token to save before searching (also read from GITHUB_TOKEN).
    #[clap(short, long)]
    pub token: Option<String>,

    /// Never send the saved token.
    #[clap(long)]
    pub no_token: bool,

    /// Milliseconds the search term must be stable before it is searched.
    #[clap(short = 'd', long, value_name = "MS")]
    pub debounce_ms: Option<u64>,
}
