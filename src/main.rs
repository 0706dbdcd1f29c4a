//! regassist - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use regassist::{
    bootstrap,
    cli::{Args, Commands, Verbosity},
    config::Config,
    corpus::{Chunk, ChunkType},
    logging,
    rag::{SearchOutcome, SearchResult},
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    // Explicit flags beat the config file's default verbosity
    let verbosity = if args.quiet || args.verbose > 0 {
        args.verbosity()
    } else {
        Verbosity::from_name(&config.telemetry.default_verbosity).unwrap_or(Verbosity::Normal)
    };
    logging::init(verbosity);

    match &args.command {
        Commands::Search { query, json, .. } => run_search(&config, query, *json, verbosity).await,
        Commands::Chunks { chunk_type } => list_chunks(&config, chunk_type.map(ChunkType::from)),
        Commands::Config => show_config(&config, Config::source_path(args.config.as_deref())),
    }
}

async fn run_search(config: &Config, query: &str, json: bool, verbosity: Verbosity) -> Result<()> {
    let spinner = (!json && verbosity.show_progress() && config.telemetry.show_progress_bars)
        .then(|| spinner("Loading corpus and models..."));

    let result = async {
        let pipeline = bootstrap::build_pipeline(config).await?;
        if let Some(pb) = &spinner {
            pb.set_message("Searching...");
        }
        let outcome = pipeline.search_ranked(query).await.context("Search failed")?;
        Ok::<_, anyhow::Error>((pipeline, outcome))
    }
    .await;

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let (pipeline, outcome) = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.partitioned())?);
        return Ok(());
    }

    print_outcome(&outcome, verbosity);

    if verbosity.show_details() {
        let stats = pipeline.cache_stats().await;
        println!(
            "{}",
            format!(
                "cache: {} entries, {} hits, {} misses, {} clears",
                stats.entries, stats.hits, stats.misses, stats.clears
            )
            .dimmed()
        );
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_outcome(outcome: &SearchOutcome, verbosity: Verbosity) {
    let SearchResult { regulation, qa } = outcome.partitioned();

    if verbosity.show_details() {
        println!(
            "{}",
            format!(
                "{} candidates retrieved, {} kept, {} ms",
                outcome.documents_retrieved,
                outcome.ranked.len(),
                outcome.elapsed.as_millis()
            )
            .dimmed()
        );
        for scored in &outcome.ranked {
            println!("  {:>8.4}  {}", scored.score, scored.chunk.id);
        }
        println!();
    }

    print_section("Relevant regulations", &regulation);
    print_section("Related Q&A examples", &qa);
}

fn print_section(title: &str, chunks: &[Chunk]) {
    println!("{}", title.bold().green());
    if chunks.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for chunk in chunks {
        println!("{} {}", "▸".cyan(), chunk.id.bold());
        println!("{}", chunk.content);
    }
    println!();
}

fn list_chunks(config: &Config, filter: Option<ChunkType>) -> Result<()> {
    let corpus = bootstrap::load_corpus(config).context("Failed to load corpus")?;

    for chunk in corpus.iter().filter(|c| filter.map_or(true, |t| c.chunk_type == t)) {
        let kind = match chunk.chunk_type {
            ChunkType::Regulation => chunk.chunk_type.as_str().blue(),
            ChunkType::Qa => chunk.chunk_type.as_str().magenta(),
        };
        println!("{:<10} {:<40} {}", kind, chunk.id, chunk.section.dimmed());
    }

    Ok(())
}

fn show_config(config: &Config, source: Option<PathBuf>) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;

    let origin = match source {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    };
    println!("{}", format!("# {}", origin).dimmed());
    println!("{}", rendered);
    Ok(())
}
