use clap::{Parser, Subcommand};
use near_duper_core::stale::{OldFilesOrder, OldFilesSortBy};
use near_duper_core::{SortBy, SortOrder};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "near-duper")]
#[command(about = "Find groups of near-duplicate text files", long_about = None)]
pub struct Cli {
    /// Configuration file to use instead of ./Config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Recompute duplicate groups from the index and save them
    Find {
        /// Print the summary without writing the dupe file
        #[arg(long)]
        no_save: bool,
    },
    /// Search the saved duplicate groups
    Search {
        /// Terms that must all appear in a member's name or path
        #[arg(short, long, default_value = "")]
        query: String,
        /// similarity, length or file_count
        #[arg(long, default_value_t = SortBy::Similarity)]
        sort_by: SortBy,
        /// asc or desc
        #[arg(long, default_value_t = SortOrder::Desc)]
        order: SortOrder,
        /// Keep only groups with exactly this length range, e.g. 100-149
        #[arg(long, default_value = "")]
        length_range: String,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove one file from its duplicate group
    RemoveFile { path: String },
    /// Remove a whole duplicate group
    RemoveGroup { group_id: String },
    /// Delete every saved duplicate group
    Clear,
    /// List files that have not been modified for a while
    OldFiles {
        #[arg(long)]
        max_age_days: Option<u32>,
        /// 0 lists every match
        #[arg(long)]
        limit: Option<usize>,
        /// age or size
        #[arg(long)]
        sort_by: Option<OldFilesSortBy>,
        /// normal or inverted
        #[arg(long)]
        order: Option<OldFilesOrder>,
    },
    /// Print configuration values
    PrintConfig,
}
