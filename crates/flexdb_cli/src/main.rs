//! FlexDB CLI
//!
//! Command-line tools for inspecting and maintaining a FlexDB file.
//!
//! # Commands
//!
//! - `inspect` - List entity types and record counts
//! - `get` - Print one record
//! - `query` - Filter, order and page records of one type
//! - `delete` - Delete records and commit
//! - `migration-status` - Show the version marker
//! - `verify` - Decode the file and report totals

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// FlexDB command-line database tools.
#[derive(Parser)]
#[command(name = "flexdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entity types and record counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print one record as JSON
    Get {
        /// Entity type
        entity_type: String,
        /// Record id
        id: String,
    },

    /// Query records of one entity type
    Query {
        /// Entity type
        entity_type: String,

        /// Equality filter as field=value (repeatable)
        #[arg(short = 'w', long = "where", value_name = "FIELD=VALUE")]
        filters: Vec<String>,

        /// Substring filter as field=text
        #[arg(long, value_name = "FIELD=TEXT")]
        like: Option<String>,

        /// Field to order by
        #[arg(short, long)]
        order_by: Option<String>,

        /// Order descending
        #[arg(long, requires = "order_by")]
        desc: bool,

        /// Results to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Build an index on this field before querying (repeatable)
        #[arg(long = "index", value_name = "FIELD")]
        indexes: Vec<String>,
    },

    /// Delete records and commit
    Delete {
        /// Entity type
        entity_type: String,
        /// Record ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show the current migration version
    MigrationStatus,

    /// Verify the database file decodes
    Verify,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = cli.path.ok_or(commands::CliError::MissingPath)?;

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&path, &format)?,
        Commands::Get { entity_type, id } => commands::get::run(&path, &entity_type, &id)?,
        Commands::Query {
            entity_type,
            filters,
            like,
            order_by,
            desc,
            offset,
            limit,
            indexes,
        } => {
            let args = commands::query::QueryArgs {
                filters,
                like,
                order_by,
                descending: desc,
                offset,
                limit,
                indexes,
            };
            commands::query::run(&path, &entity_type, &args)?;
        }
        Commands::Delete { entity_type, ids } => {
            commands::delete::run(&path, &entity_type, &ids)?;
        }
        Commands::MigrationStatus => commands::migration_status::run(&path)?,
        Commands::Verify => commands::verify::run(&path)?,
    }

    Ok(())
}
