mod config;
mod decision;
mod detect;
mod fetch;
mod matching;
mod notify;
mod parser;
mod run;
mod state;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use config::{
    env_f64, env_or, DEFAULT_MATCH_KEYWORDS, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_STATE_FILE,
    DEFAULT_TARGET_URL,
};

#[derive(Parser)]
#[command(name = "notice_monitor", about = "College announcement monitor with Telegram alerts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one monitoring pass: fetch, detect, notify, persist
    Run,
    /// Fetch the page and list extracted candidates with match verdicts
    Candidates,
    /// Summarize the persisted state file
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run => run::run_monitor().await,
        Commands::Candidates => print_candidates().await,
        Commands::Status => print_status(),
    };
    ExitCode::from(code)
}

/// Diagnostic: show what the extractor and matcher would do, without
/// touching state or Telegram. Needs no credentials.
async fn print_candidates() -> u8 {
    let url = env_or("TARGET_URL", DEFAULT_TARGET_URL);
    let keywords = env_or("MATCH_KEYWORDS", DEFAULT_MATCH_KEYWORDS);
    let threshold = env_f64("SIMILARITY_THRESHOLD", DEFAULT_SIMILARITY_THRESHOLD);

    let html = match fetch::fetch_page(&url).await {
        Ok(html) => html,
        Err(err) => {
            error!("{:#}", err);
            return 1;
        }
    };

    let candidates = parser::extract_candidates(&html);
    println!("{} candidate(s) from {}", candidates.len(), url);
    for (i, cand) in candidates.iter().enumerate() {
        let hit = matching::keyword_match(&cand.text, &keywords, threshold);
        println!("{:>3} {} {}", i + 1, if hit { "*" } else { " " }, truncate(&cand.text, 96));
        if let Some(pdf) = &cand.pdf_url {
            println!("       -> {}", pdf);
        }
    }
    0
}

fn print_status() -> u8 {
    let path = std::path::PathBuf::from(env_or("STATE_FILE", DEFAULT_STATE_FILE));
    let state = state::load_state(&path);

    println!("State file:  {}", path.display());
    println!("Monitoring:  {}", if state.monitoring_enabled { "enabled" } else { "disabled" });
    println!("Last run:    {}", state.last_run_time.as_deref().unwrap_or("-"));
    println!(
        "Last status: {}",
        state.last_run_status.map(|s| s.as_str()).unwrap_or("-")
    );
    if let Some(err) = &state.last_error_message {
        println!("Last error:  {}", truncate(err, 96));
    }
    match &state.last_announcement {
        Some(ann) => {
            println!("Announcement: {}", truncate(&ann.text, 96));
            println!("  first seen: {}", ann.first_detected);
            if let Some(pdf) = &ann.pdf_url {
                println!("  pdf:        {}", pdf);
            }
        }
        None => println!("Announcement: -"),
    }
    0
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
