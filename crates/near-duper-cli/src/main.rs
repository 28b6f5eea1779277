mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use near_duper_core::stale::find_old_files;
use near_duper_core::{
    AppConfig, CorpusSource, DuplicateGroupStore, GroupEntry, IndexFile, LoadOutcome,
    OldFileSettings, RemoveOutcome, SearchQuery,
};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match near_duper_core::config::load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Find { no_save }) => run_find(&config, no_save),
        Some(Commands::Search {
            query,
            sort_by,
            order,
            length_range,
            json,
        }) => {
            let query = SearchQuery::new(query)
                .sort(sort_by, order)
                .length_range(length_range);
            run_search(&config, &query, json)
        }
        Some(Commands::RemoveFile { path }) => run_remove_file(&config, &path),
        Some(Commands::RemoveGroup { group_id }) => run_remove_group(&config, &group_id),
        Some(Commands::Clear) => {
            match prompt_confirm(
                "Are you SURE you want to DELETE every saved duplicate group?",
                Some(false),
            ) {
                Ok(true) => run_clear(&config),
                _ => process::exit(0),
            }
        }
        Some(Commands::OldFiles {
            max_age_days,
            limit,
            sort_by,
            order,
        }) => {
            let mut settings = config.old_files.clone();
            if let Some(days) = max_age_days {
                settings.max_age_days = days;
            }
            if let Some(limit) = limit {
                settings.limit = limit;
            }
            if let Some(sort_by) = sort_by {
                settings.sort_by = sort_by;
            }
            if let Some(order) = order {
                settings.order = order;
            }
            run_old_files(&config, &settings)
        }
        Some(Commands::PrintConfig) => {
            let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
            println!("{}", rendered);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }

    Ok(())
}

fn run_find(config: &AppConfig, no_save: bool) -> Result<()> {
    let mut store = DuplicateGroupStore::from_config(config)?;
    let index = IndexFile::new(&config.index_file);
    let reporter = CliReporter::new();
    info!(
        "Searching {} for near duplicates with {} workers",
        index.path().display(),
        store.engine().worker_threads()
    );
    store.compute(&index, &reporter)?;

    if let Some(stats) = store.last_run() {
        println!();
        info!(
            "Signatures: {}, Compare: {}, Cluster: {}",
            format!("{:.2}s", stats.signature_duration.as_secs_f64()).green(),
            format!("{:.2}s", stats.compare_duration.as_secs_f64()).green(),
            format!("{:.2}s", stats.cluster_duration.as_secs_f64()).green(),
        );
        info!(
            "{} duplicate groups covering {} files, {} of {} files skipped",
            format!("{}", stats.groups).red(),
            format!("{}", stats.grouped_files).red(),
            format!("{}", stats.skipped.len()).yellow(),
            stats.files_seen,
        );
    }

    if no_save {
        info!("--no-save given, {} left untouched", config.dupe_file);
        return Ok(());
    }
    store.save()?;
    Ok(())
}

/// Load the saved groups; a missing dupe file is reported but not an error.
fn load_store(config: &AppConfig) -> Result<DuplicateGroupStore> {
    let mut store = DuplicateGroupStore::from_config(config)?;
    if matches!(store.load()?, LoadOutcome::NoData) {
        warn!(
            "No duplicate data at {}, run `near-duper find` first",
            config.dupe_file
        );
    }
    Ok(store)
}

fn run_search(config: &AppConfig, query: &SearchQuery, json: bool) -> Result<()> {
    let store = load_store(config)?;
    let hits = store.search(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    for entry in &hits {
        print_group(entry);
    }
    info!(
        "{} of {} groups match",
        format!("{}", hits.len()).cyan(),
        store.len()
    );
    Ok(())
}

fn print_group(entry: &GroupEntry) {
    let group = &entry.group;
    println!(
        "{}  similarity {}  length {}  {} files",
        entry.group_id.bold(),
        format!("{:.3}", group.avg_similarity).green(),
        group.length_range,
        group.file_count,
    );
    for file in &group.files {
        println!(
            "    {}  {} bytes  {}",
            file.path,
            file.size_bytes,
            file.modified_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn run_remove_file(config: &AppConfig, path: &str) -> Result<()> {
    let mut store = load_store(config)?;
    match store.remove_file(path) {
        RemoveOutcome::NotFound => {
            warn!("{} is not part of any duplicate group", path);
            return Ok(());
        }
        RemoveOutcome::Shrunk {
            group_id,
            remaining,
        } => info!("Removed {} from {}, {} files left", path, group_id, remaining),
        RemoveOutcome::GroupDeleted { group_id } => {
            info!("Removed {}, group {} dissolved", path, group_id)
        }
    }
    store.save()?;
    Ok(())
}

fn run_remove_group(config: &AppConfig, group_id: &str) -> Result<()> {
    let mut store = load_store(config)?;
    if !store.remove_group(group_id) {
        warn!("No duplicate group with id {}", group_id);
        return Ok(());
    }
    store.save()?;
    info!("Group {} removed", group_id);
    Ok(())
}

fn run_clear(config: &AppConfig) -> Result<()> {
    let mut store = load_store(config)?;
    let count = store.len();
    store.clear();
    store.save()?;
    println!("{} duplicate groups deleted", count);
    Ok(())
}

fn run_old_files(config: &AppConfig, settings: &OldFileSettings) -> Result<()> {
    let index = IndexFile::new(&config.index_file);
    let snapshot = index
        .snapshot()
        .with_context(|| format!("reading index {}", index.path().display()))?;
    let now = Utc::now();
    let found = find_old_files(&snapshot.records, settings, now);

    for file in &found {
        let age_days = (now - file.modified_at).num_days();
        println!(
            "{}  {} days  {} bytes",
            file.path,
            format!("{}", age_days).yellow(),
            file.size_bytes
        );
    }
    info!(
        "{} files older than {} days (sorted by {}, {})",
        format!("{}", found.len()).cyan(),
        settings.max_age_days,
        settings.sort_by,
        settings.order,
    );
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
