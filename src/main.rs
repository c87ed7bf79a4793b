use clap::Parser;
use dotenv::dotenv;
use github_repo_search::{
    badge_text, format_reset, format_timestamp, EmptyState, FileStorage, GitHubSearcher,
    KeyCommand, KeyOutcome, MemoryUrl, OrchestratorConfig, PageSize, SearchOrchestrator, Update,
    UrlSync, ALLOWED_PAGE_SIZES, LANGUAGES,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod args;

use crate::args::Args;

const HELP: &str = "\
Type a search term and press Enter. Commands:
  :sort best|stars|updated   :order asc|desc   :per 10|20|30|50|100
  :lang <Language>           :lang             (clear language)
  :n / :p                    next / previous page
  :page <N>                  jump to page
  :clear                     clear the search term
  :retry                     repeat the last request
  :save  :saved  :load <N>  :unsave <N>
  :token <TOKEN>  :token clear  :token
  :url  :help  :quit";

enum Input {
    Line(Option<String>),
    Update(Update),
}

enum Flow {
    Continue,
    Quit,
}

/// Prints through the spinner while one is active so output is not mangled.
struct Screen {
    spinner: Option<ProgressBar>,
}

impl Screen {
    fn say(&self, message: impl AsRef<str>) {
        match &self.spinner {
            Some(pb) => pb.println(message.as_ref()),
            None => println!("{}", message.as_ref()),
        }
    }

    fn track_loading(&mut self, search: &SearchOrchestrator) {
        if !search.is_loading() {
            if let Some(pb) = self.spinner.take() {
                pb.finish_and_clear();
            }
            return;
        }

        let pb = self.spinner.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        });
        if let Some(request) = search.last_request() {
            pb.set_message(format!("Searching {} - page {}", request.query, request.page));
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Logs go to stderr so they do not interleave with results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv().ok();

    let args = Args::parse();

    let mut config = OrchestratorConfig::from_env();
    if let Some(ms) = args.debounce_ms {
        config.debounce = Duration::from_millis(ms);
    }
    if args.no_token {
        config.features.credentials = false;
    }
    config.validate()?;

    let state_file = args
        .state_file
        .clone()
        .or_else(FileStorage::default_path)
        .ok_or("No HOME directory found; pass --state-file")?;
    info!("Using state file {}", state_file.display());

    let storage = Arc::new(FileStorage::new(state_file));
    let url = Arc::new(MemoryUrl::new(&args.url));
    let client = Arc::new(GitHubSearcher::new(&config)?);
    let mut search = SearchOrchestrator::new(config, url.clone(), storage, client);

    // Token from arguments or environment
    let seed = args
        .token
        .clone()
        .or_else(|| env::var("GITHUB_TOKEN").ok())
        .filter(|t| !t.trim().is_empty());
    if let Some(token) = seed {
        if !search.save_token(&token) {
            warn!("Ignoring token that does not look like a GitHub token");
        }
    }

    let mut screen = Screen { spinner: None };
    screen.say(HELP);
    search.hydrate();
    screen.track_loading(&search);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            update = search.next_update() => Input::Update(update),
        };

        match input {
            Input::Line(None) => break,
            Input::Line(Some(line)) => {
                if let Flow::Quit = handle_line(&mut search, &screen, url.as_ref(), line.trim()) {
                    break;
                }
            }
            Input::Update(Update::TermSettled { term, changed }) => {
                if changed {
                    info!("Searching for {:?}", term);
                }
            }
            Input::Update(Update::Settled) => {
                screen.track_loading(&search);
                render(&search, &screen, url.as_ref());
            }
        }
        screen.track_loading(&search);
    }

    search.shutdown();
    if let Some(pb) = screen.spinner.take() {
        pb.finish_and_clear();
    }
    Ok(())
}

fn handle_line(
    search: &mut SearchOrchestrator,
    screen: &Screen,
    url: &dyn UrlSync,
    line: &str,
) -> Flow {
    let Some(command) = line.strip_prefix(':') else {
        search.set_term(line);
        return Flow::Continue;
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((command, ""));

    match name {
        "q" | "quit" => return Flow::Quit,
        "h" | "help" => screen.say(HELP),
        "/" | "focus" => {
            if search.handle_key(KeyCommand::FocusSearch) == KeyOutcome::FocusSearch {
                screen.say(format!("Search term: {:?}", search.filters().term));
            }
        }
        "clear" => {
            if search.handle_key(KeyCommand::Escape) == KeyOutcome::Ignored {
                screen.say("Search term is already empty");
            }
        }
        "n" | "next" => {
            if search.handle_key(KeyCommand::NextPage) == KeyOutcome::Ignored {
                screen.say("Already on the last page");
            }
        }
        "p" | "prev" => {
            if search.handle_key(KeyCommand::PreviousPage) == KeyOutcome::Ignored {
                screen.say("Already on the first page");
            }
        }
        "page" => match arg.parse::<u32>() {
            Ok(page) => search.go_to_page(page),
            Err(_) => screen.say("Usage: :page <N>"),
        },
        "sort" => match arg.parse() {
            Ok(sort) => search.set_sort(sort),
            Err(e) => screen.say(e),
        },
        "order" => match arg.parse() {
            Ok(order) => search.set_order(order),
            Err(e) => screen.say(e),
        },
        "per" => match arg.parse::<u32>().ok().and_then(PageSize::new) {
            Some(size) => search.set_page_size(size),
            None => screen.say(format!("Page size must be one of {:?}", ALLOWED_PAGE_SIZES)),
        },
        "lang" => {
            if !arg.is_empty() && !LANGUAGES.contains(&arg) {
                screen.say(format!("Note: {} is not one of {:?}", arg, LANGUAGES));
            }
            search.set_language(arg);
        }
        "retry" => search.retry(),
        "save" => {
            if search.save_current_query() {
                screen.say("Saved");
            } else if search.is_current_query_saved() {
                screen.say("Already saved");
            } else {
                screen.say("Saved queries are disabled");
            }
        }
        "saved" => {
            let saved = search.saved_queries();
            screen.say(format!("Saved queries ({})", badge_text(saved.len())));
            for (i, query) in saved.iter().enumerate() {
                screen.say(format!("  {:>2}. {}", i + 1, query.label()));
            }
        }
        "load" | "unsave" => {
            let saved = search.saved_queries();
            let picked = arg
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| saved.get(i));
            match (name, picked) {
                ("load", Some(query)) => search.apply_saved(query),
                (_, Some(query)) => {
                    search.remove_saved_query(&query.id);
                    screen.say(format!("Removed {}", query.label()));
                }
                (_, None) => screen.say("No such saved query; see :saved"),
            }
        }
        "token" => match arg {
            "" if search.has_token() => screen.say(format!("Token {}", search.redacted_token())),
            "" => screen.say("No token saved"),
            "clear" => {
                search.clear_token();
                screen.say("Token removed");
            }
            draft => {
                if search.save_token(draft) {
                    screen.say(format!("Token saved {}", search.redacted_token()));
                } else {
                    screen.say("That does not look like a GitHub token (github_pat_... or ghp_...)");
                }
            }
        },
        "url" => screen.say(format!("?{}", url.read())),
        other => screen.say(format!("Unknown command :{} (see :help)", other)),
    }
    Flow::Continue
}

fn render(search: &SearchOrchestrator, screen: &Screen, url: &dyn UrlSync) {
    if let Some(err) = search.error() {
        match err.status() {
            Some(status) => error!("Search failed with {}", status),
            None => error!("Search failed"),
        }
        screen.say(format!("✗ {}", err));
        if !err.is_rate_limit() {
            screen.say("  :retry to try again");
        }
    } else if let Some(empty) = search.empty_state() {
        match empty {
            EmptyState::NoMatches { term } => {
                screen.say(format!("No repositories found for “{}”.", term))
            }
            EmptyState::NoQuery => screen.say("Nothing to show yet. Type a term to search."),
        }
    } else if let Some(results) = search.results() {
        screen.say(format!(
            "\n{} repositories{}",
            results.total_count,
            if results.truncated { " (incomplete)" } else { "" }
        ));
        for repo in &results.items {
            screen.say(format!(
                "  {}  ★ {}  · updated {}",
                repo.full_name,
                repo.stargazers_count,
                format_timestamp(&repo.updated_at)
            ));
            if let Some(description) = &repo.description {
                screen.say(format!("    {}", description));
            }
            screen.say(format!("    {}", repo.html_url));
        }
    }

    let total = search.total_pages();
    let window = search.page_window();
    let current = search.filters().page;
    let mut pages: Vec<String> = Vec::new();
    if window.first().is_some_and(|first| *first > 1) {
        pages.push("1 …".to_string());
    }
    pages.extend(window.iter().map(|page| {
        if *page == current {
            format!("[{}]", page)
        } else {
            page.to_string()
        }
    }));
    if window.last().is_some_and(|last| *last < total) {
        pages.push(format!("… {}", total));
    }
    screen.say(format!("Pages: {}", pages.join(" ")));

    let rate = search.rate();
    if let (Some(remaining), Some(limit)) = (rate.remaining, rate.limit) {
        let reset = rate
            .reset
            .and_then(format_reset)
            .map(|at| format!(", resets {}", at))
            .unwrap_or_default();
        screen.say(format!("Rate limit: {}/{}{}", remaining, limit, reset));
    }
    screen.say(format!("URL: ?{}", url.read()));
}
