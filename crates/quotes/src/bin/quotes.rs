// ABOUTME: CLI binary for the quotes extractor.
// ABOUTME: Loads stock pages (or a local HTML file) and prints the extracted quote and tables.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use futures::future::join_all;
use quotes::{load_builtin_profile, Client, PageExtraction, Profile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_TICKER: &str = "mult3";

#[derive(Parser, Debug)]
#[command(name = "quotes")]
#[command(about = "Fetch stock pages and extract the quote and dividend history")]
struct Args {
    /// Tickers to load through the profile URL template (default: mult3)
    #[arg()]
    tickers: Vec<String>,

    /// Load this URL instead of the profile URL (label for --html input)
    #[arg(long = "url")]
    url: Option<String>,

    /// HTML file to extract from instead of fetching
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// JSON profile with the URL template and descriptors (default: builtin)
    #[arg(long = "profile")]
    profile: Option<PathBuf>,

    /// Output as JSON instead of text
    #[arg(long = "json")]
    json_output: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Log extraction details to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "quotes=debug" } else { "quotes=warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn format_output(pages: &[PageExtraction], json_output: bool) -> Result<String, serde_json::Error> {
    if json_output {
        if pages.len() == 1 {
            serde_json::to_string_pretty(&pages[0])
        } else {
            serde_json::to_string_pretty(pages)
        }
    } else {
        Ok(pages
            .iter()
            .map(PageExtraction::format_text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

/// URLs to fetch: the explicit --url, or one per ticker.
fn target_urls(args: &Args, profile: &Profile) -> Vec<String> {
    if let Some(url) = &args.url {
        return vec![url.clone()];
    }
    if args.tickers.is_empty() {
        return vec![profile.url_for(DEFAULT_TICKER)];
    }
    args.tickers.iter().map(|t| profile.url_for(t)).collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if (args.html.is_some() || args.url.is_some()) && !args.tickers.is_empty() {
        eprintln!("error: tickers cannot be combined with --url or --html");
        return ExitCode::from(1);
    }

    let profile = match &args.profile {
        Some(path) => match Profile::from_path(path) {
            Ok(profile) => profile,
            Err(e) => {
                eprintln!("error loading profile: {}", e);
                return ExitCode::from(1);
            }
        },
        None => load_builtin_profile(),
    };

    let client = match Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .try_build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let start = Instant::now();
    let pages: Vec<PageExtraction> = if let Some(html_path) = &args.html {
        let label = args
            .url
            .clone()
            .unwrap_or_else(|| html_path.display().to_string());
        match fs::read(html_path) {
            Ok(body) => vec![client.extract_bytes(&body, None, &label, &profile.descriptors)],
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                return ExitCode::from(1);
            }
        }
    } else {
        let urls = target_urls(&args, &profile);
        join_all(
            urls.iter()
                .map(|url| client.extract_page(url, &profile.descriptors)),
        )
        .await
    };
    let elapsed = start.elapsed();

    let mut had_error = false;
    for page in pages.iter().filter(|p| p.is_failed()) {
        if let Some(failure) = page.failure() {
            eprintln!("error loading {}: {}", page.url, failure.message);
        }
        had_error = true;
    }

    match format_output(&pages, args.json_output) {
        Ok(output_str) => {
            if let Some(output_path) = &args.output {
                if let Err(e) = fs::write(output_path, &output_str) {
                    eprintln!("error writing to {:?}: {}", output_path, e);
                    had_error = true;
                }
            } else {
                println!("{}", output_str);
            }
        }
        Err(e) => {
            eprintln!("error formatting output: {}", e);
            had_error = true;
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
