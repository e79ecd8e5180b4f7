//! Resume indexer: parse, segment and index resume documents

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use resume_indexer::cli::{self, Cli, Commands, ConfigAction};
use resume_indexer::config::{Config, OutputFormat};
use resume_indexer::input::{InputManager, RawDocument};
use resume_indexer::output::{formatter::save_report_to_file, ReportGenerator};
use resume_indexer::processing::IntakePipeline;
use resume_indexer::storage::DocumentStore;
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {:#}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("reading configuration from {}", path.display())),
        None => Config::load().context("reading default configuration"),
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    let reports = ReportGenerator::new(config.output.color_output);

    match command {
        Commands::Inspect { file, output, save } => {
            let format = output_format(output.as_deref(), &config)?;
            let mut input_manager = InputManager::new().with_cache(config.intake.enable_caching);
            let raw = input_manager
                .load(&file)
                .await
                .with_context(|| format!("loading {}", file.display()))?;

            let document = IntakePipeline::from_config(&config).process(&raw)?;
            emit(&reports.formatter(format).format_document(&document)?, save.as_deref())?;
        }

        Commands::Search {
            files,
            filters,
            apply_tags,
            output,
            save,
        } => {
            let format = output_format(output.as_deref(), &config)?;
            let query = filters.to_query().map_err(|e| anyhow!(e))?;

            let store = DocumentStore::new();
            ingest_files(&store, &files, &apply_tags, &config).await?;

            let results = store.search(&query)?;
            debug!("Search matched {} of {} documents", results.total, store.active_count());
            emit(&reports.formatter(format).format_search(&results)?, save.as_deref())?;
        }

        Commands::Stats {
            files,
            apply_tags,
            output,
            save,
        } => {
            let format = output_format(output.as_deref(), &config)?;
            let store = DocumentStore::new();
            ingest_files(&store, &files, &apply_tags, &config).await?;

            emit(&reports.formatter(format).format_stats(&store.stats())?, save.as_deref())?;
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
                    println!("# {}\n{}", path.display(), rendered);
                }
                Some(ConfigAction::Reset) => {
                    Config::default()
                        .save_to(&path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Configuration reset: {}", path.display());
                }
                Some(ConfigAction::Path) => {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn emit(content: &str, save: Option<&Path>) -> Result<()> {
    match save {
        Some(path) => {
            save_report_to_file(content, path).with_context(|| format!("saving to {}", path.display()))?;
            info!("Saved output to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn output_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(format) => cli::parse_output_format(format).map_err(|e| anyhow!(e)),
        None => Ok(config.output.format),
    }
}

/// Loads every file, processes them in parallel and stores the successes.
/// Files that fail are reported and skipped.
async fn ingest_files(store: &DocumentStore, files: &[PathBuf], tags: &[String], config: &Config) -> Result<()> {
    let mut input_manager = InputManager::new().with_cache(config.intake.enable_caching);
    let tags: Vec<String> = config
        .intake
        .default_tags
        .iter()
        .chain(tags.iter())
        .cloned()
        .collect();

    let pb = ProgressBar::new(files.len() as u64 * 2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| anyhow!("progress template: {}", e))?
            .progress_chars("#>-"),
    );

    let mut raws: Vec<RawDocument> = Vec::with_capacity(files.len());
    let mut failures = 0usize;
    for path in files {
        pb.set_message(format!("loading {}", path.display()));
        match input_manager.load(path).await {
            Ok(raw) => raws.push(raw),
            Err(e) => {
                pb.suspend(|| warn!("Skipping {}: {}", path.display(), e));
                failures += 1;
                pb.inc(1);
            }
        }
        pb.inc(1);
    }

    pb.set_message("processing");
    let pipeline = IntakePipeline::from_config(config);
    for (raw, processed) in raws.iter().zip(pipeline.process_batch(&raws)) {
        let outcome = processed.and_then(|document| store.store(document, &tags));
        if let Err(e) = outcome {
            pb.suspend(|| warn!("Skipping {}: {}", raw.filename, e));
            failures += 1;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Indexed {} documents ({} skipped, {} distinct tokens)",
        store.active_count(),
        failures,
        store.indexed_token_count()
    );

    if store.is_empty() {
        return Err(anyhow!("none of the {} input files could be indexed", files.len()));
    }
    Ok(())
}
