mod api;
mod calc;
mod cmd;
mod data;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "burnup", about = "labor burn projection against a contract ceiling")]
struct Cli {
    /// Path to the data directory containing config and data files (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize data files with starter content
    Init,
    /// Generate and print the burn chart for a job
    Chart {
        /// Job code id
        job_id: i64,
        /// Override the ceiling record's PoP start (YYYY-MM-DD)
        #[arg(long)]
        pop_start: Option<NaiveDate>,
        /// Override the ceiling record's PoP end (YYYY-MM-DD)
        #[arg(long)]
        pop_end: Option<NaiveDate>,
        /// Fetch actuals through this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        query_stop: Option<NaiveDate>,
    },
    /// List the job code tree
    Jobs,
    /// List a job's ceiling releases
    Releases {
        /// Job code id
        job_id: i64,
    },
    /// Add a ceiling release to a job
    AddRelease {
        /// Job code id
        job_id: i64,
        /// Effective date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Released hours; negative values reduce the ceiling
        #[arg(long, allow_hyphen_values = true)]
        hours: f64,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove a ceiling release from a job
    RemoveRelease {
        /// Job code id
        job_id: i64,
        /// Release id (see `releases`)
        release_id: String,
    },
    /// Set a job's period of performance
    SetPop {
        /// Job code id
        job_id: i64,
        /// PoP start (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// PoP end (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
    },
    /// List the observed federal holidays for a year
    Holidays {
        year: i32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Resolve data_dir to an absolute path so file I/O works regardless of
    // future directory changes within the process.
    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };
    data::persistence::set_data_dir(data_dir.clone());

    // Auto-init when the data directory is missing or empty and the user did
    // not explicitly invoke the `init` subcommand.
    let is_init_command = matches!(cli.command, Commands::Init);
    if !is_init_command && dir_needs_init(&data_dir) {
        eprintln!(
            "Data directory '{}' is missing or empty - running init...",
            data_dir.display()
        );
        cmd::init::run()?;
    }

    match cli.command {
        Commands::Init => cmd::init::run(),
        Commands::Chart {
            job_id,
            pop_start,
            pop_end,
            query_stop,
        } => cmd::chart::run(
            job_id,
            cmd::chart::PopOverrides {
                pop_start,
                pop_end,
                query_stop,
            },
        ),
        Commands::Jobs => cmd::jobs::run(),
        Commands::Releases { job_id } => cmd::releases::run_list(job_id),
        Commands::AddRelease {
            job_id,
            date,
            hours,
            note,
        } => cmd::releases::run_add(job_id, date, hours, note.as_deref()),
        Commands::RemoveRelease { job_id, release_id } => {
            cmd::releases::run_remove(job_id, &release_id)
        }
        Commands::SetPop { job_id, start, end } => cmd::releases::run_set_pop(job_id, start, end),
        Commands::Holidays { year } => cmd::holidays::run(year),
    }
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &std::path::Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
