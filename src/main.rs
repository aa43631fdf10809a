use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use mealgrid::config::AppConfig;
use mealgrid::meals::handlers::{self, GridKind, MealEdit, MealInput, Prompt};
use mealgrid::meals::repo_types::{MealDate, MealSlot};
use mealgrid::reconcile::ImportMode;
use mealgrid::state::AppState;

/// mealgrid - log meals and see them on a calendar heat-grid
#[derive(Parser)]
#[command(name = "mealgrid", version)]
#[command(about = "Track breakfast, lunch and dinner on a calendar heat-grid", long_about = None)]
struct Cli {
    /// Directory holding the meal store (overrides MEALGRID_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a meal, replacing any entry already in that slot
    Log {
        /// breakfast, lunch, dinner or skipped
        slot: MealSlot,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<MealDate>,
        /// Record the meal as skipped
        #[arg(long)]
        skipped: bool,
        /// home or outside
        #[arg(long)]
        location: Option<String>,
        /// healthy or unhealthy
        #[arg(long)]
        healthiness: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Delete a logged meal
    Delete {
        date: MealDate,
        slot: MealSlot,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Change a logged meal; fields not given keep their value
    Edit {
        date: MealDate,
        slot: MealSlot,
        #[arg(long)]
        to_date: Option<MealDate>,
        #[arg(long)]
        to_slot: Option<MealSlot>,
        #[arg(long)]
        skipped: Option<bool>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        healthiness: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List logged meals, newest first
    History {
        /// Only this date
        #[arg(long)]
        date: Option<MealDate>,
    },
    /// Print the calendar heat-grid
    Grid {
        /// One square per meal instead of one per day
        #[arg(long)]
        detailed: bool,
        /// Days to show, ending today
        #[arg(long)]
        days: Option<u32>,
        /// Print the grid model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the classification and tooltip of a day or a single meal
    Show {
        date: MealDate,
        slot: Option<MealSlot>,
    },
    /// Write a backup file
    Export {
        /// Defaults to meal-tracker-backup-YYYY-MM-DD.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a backup file, merging with or replacing current data
    Import {
        file: PathBuf,
        /// merge or replace; asked interactively when omitted
        #[arg(long)]
        mode: Option<ImportMode>,
        /// Don't ask for confirmation before replacing
        #[arg(short, long)]
        yes: bool,
    },
}

struct StdinPrompt {
    assume_yes: bool,
}

impl StdinPrompt {
    fn ask(&self, question: &str) -> String {
        eprint!("{question} ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_lowercase()
    }
}

impl Prompt for StdinPrompt {
    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        matches!(self.ask(&format!("{question} [y/N]")).as_str(), "y" | "yes")
    }

    fn choose_import_mode(&mut self) -> Option<ImportMode> {
        match self
            .ask("Import mode: [m]erge, [r]eplace or [c]ancel?")
            .as_str()
        {
            "m" | "merge" => Some(ImportMode::Merge),
            "r" | "replace" => Some(ImportMode::Replace),
            _ => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "mealgrid=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let mut state = AppState::init(config)?;

    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let today = now.date();

    let output = match cli.command {
        Commands::Log {
            slot,
            date,
            skipped,
            location,
            healthiness,
            notes,
        } => {
            let input = MealInput {
                skipped,
                location,
                healthiness,
                notes,
            };
            let date = date.map_or(today, MealDate::date);
            handlers::log_meal(&mut state, date, slot, input, now)?
        }
        Commands::Delete { date, slot, yes } => {
            let mut prompt = StdinPrompt { assume_yes: yes };
            handlers::delete_meal(&mut state, date.date(), slot, &mut prompt)?
        }
        Commands::Edit {
            date,
            slot,
            to_date,
            to_slot,
            skipped,
            location,
            healthiness,
            notes,
        } => {
            let edit = MealEdit {
                date: to_date.map(MealDate::date),
                slot: to_slot,
                skipped,
                location,
                healthiness,
                notes,
            };
            handlers::edit_meal(&mut state, date.date(), slot, edit, now)?
        }
        Commands::History { date } => handlers::history(&state, date.map(MealDate::date)),
        Commands::Grid {
            detailed,
            days,
            json,
        } => {
            let kind = if detailed {
                GridKind::Detailed
            } else {
                GridKind::Coarse
            };
            handlers::grid(&state, kind, today, days, json)?
        }
        Commands::Show { date, slot } => handlers::show(&state, date.date(), slot),
        Commands::Export { output } => {
            let path = handlers::export(&state, now, output)?;
            format!("Exported to {}", path.display())
        }
        Commands::Import { file, mode, yes } => {
            let mut prompt = StdinPrompt { assume_yes: yes };
            handlers::import(&mut state, &file, mode, &mut prompt)?
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}
