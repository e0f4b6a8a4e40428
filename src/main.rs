use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use console::{Emoji, Term};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podpage::{
    DEFAULT_ENDPOINT, ListingKind, LoadOutcome, NoopReporter, Pager, PagerOptions, ProgressEvent,
    ProgressReporter, ReqwestClient, SharedProgressReporter,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static FILTER: Emoji<'_, '_> = Emoji("🎚️  ", "[f] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");

/// Content type filter as offered on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FilterChoice {
    All,
    Episodes,
    Shows,
}

impl FilterChoice {
    fn kind(self) -> Option<ListingKind> {
        match self {
            Self::All => None,
            Self::Episodes => Some(ListingKind::Episode),
            Self::Shows => Some(ListingKind::Show),
        }
    }
}

/// Browse podcast episode and show listings page by page
#[derive(Parser, Debug)]
#[command(name = "podpage")]
#[command(about = "Browse podcast episode and show listings page by page")]
#[command(version)]
struct Args {
    /// Content type to list
    #[arg(short = 't', long = "type", value_enum, default_value = "all")]
    filter: FilterChoice,

    /// Number of listings per page
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,

    /// Listing endpoint URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Keep loading pages until everything is listed, without prompting
    #[arg(short, long)]
    all: bool,

    /// Quiet mode - suppress banner and spinner
    #[arg(short, long)]
    quiet: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// What the user wants after a page was shown
enum Next {
    More,
    Filter(Option<ListingKind>),
    Quit,
}

/// Progress reporter showing a spinner while a page is in flight
struct SpinnerReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl SpinnerReporter {
    fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn start(&self, message: String) {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .expect("spinner template is valid");

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message);
        bar.enable_steady_tick(std::time::Duration::from_millis(100));

        if let Some(previous) = self.spinner.lock().unwrap().replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn stop(&self) {
        if let Some(bar) = self.spinner.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for SpinnerReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingPage {
                filter_type,
                offset,
                limit,
            } => {
                self.start(format!(
                    "{SEARCH}Fetching {} {}-{}",
                    filter_type.as_deref().unwrap_or("all listings").cyan(),
                    (offset + 1).to_string().cyan(),
                    (offset + u64::from(limit)).to_string().cyan()
                ));
            }

            ProgressEvent::FilterChanged { filter_type } => {
                self.stop();
                println!(
                    "\n{FILTER}{} {}",
                    "Filter:".bold(),
                    filter_type.as_deref().unwrap_or("all").yellow()
                );
            }

            ProgressEvent::FetchFailed { .. }
            | ProgressEvent::PageMerged { .. }
            | ProgressEvent::EmptyPage { .. }
            | ProgressEvent::StaleResponseDiscarded { .. } => self.stop(),
        }
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "podpage=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_listings<C>(pager: &Pager<C>, from: usize) -> usize
where
    C: podpage::HttpClient,
{
    for (index, listing) in pager.listings().iter().enumerate().skip(from) {
        println!(
            "  {} {} {}",
            format!("{:>3}.", index + 1).dimmed(),
            listing.title,
            format!("#{}", listing.id).dimmed()
        );
    }
    pager.listings().len()
}

fn prompt(term: &Term, has_more: bool) -> Result<Next> {
    let hint = if has_more {
        "[Enter] load more, [e]pisodes, [s]hows, [a]ll, [q]uit"
    } else {
        "[e]pisodes, [s]hows, [a]ll, [q]uit"
    };

    loop {
        term.write_line(&format!("{}", hint.dimmed()))?;
        let key = term.read_char().context("Failed to read from terminal")?;

        let next = match key {
            '\n' | '\r' | ' ' | 'm' if has_more => Next::More,
            'e' => Next::Filter(Some(ListingKind::Episode)),
            's' => Next::Filter(Some(ListingKind::Show)),
            'a' => Next::Filter(None),
            'q' | 'n' => Next::Quit,
            _ => continue,
        };
        term.clear_last_lines(1)?;
        return Ok(next);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podpage".bold().magenta(),
            "- Podcast Listings".dimmed()
        );
    }

    let options = PagerOptions {
        limit: args.limit,
        endpoint: args.endpoint.clone(),
        filter_type: args.filter.kind().map(|k| k.as_filter().to_string()),
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(SpinnerReporter::new())
    };

    let mut pager = Pager::new(ReqwestClient::new(), &options, reporter)
        .context("Invalid pager configuration")?;

    pager.mount().await.context("Failed to load listings")?;
    let mut printed = print_listings(&pager, 0);

    let term = Term::stdout();
    loop {
        let next = if args.all {
            if pager.has_more() { Next::More } else { Next::Quit }
        } else if term.is_term() {
            prompt(&term, pager.has_more())?
        } else {
            Next::Quit
        };

        match next {
            Next::More => {
                let outcome = pager
                    .load_more()
                    .await
                    .context("Failed to load more listings")?;
                if outcome == LoadOutcome::Empty {
                    // The server keeps claiming more listings but sends none
                    break;
                }
                printed = print_listings(&pager, printed);
            }
            Next::Filter(kind) => {
                pager
                    .change_filter(kind.map(|k| k.as_filter()))
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to load {}",
                            kind.map(|k| k.label()).unwrap_or("listings")
                        )
                    })?;
                printed = print_listings(&pager, 0);
            }
            Next::Quit => break,
        }
    }

    if !args.quiet {
        println!(
            "\n{PARTY}{} {} listed{}\n",
            "Done:".bold().green(),
            pager.listings().len().to_string().green().bold(),
            if pager.has_more() {
                format!(", {}", "more available".yellow())
            } else {
                String::new()
            }
        );
    }

    Ok(())
}
