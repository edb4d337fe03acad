//! Formwright CLI
//!
//! Command-line interface for building, previewing and storing forms.
//!
//! # Usage
//!
//! ```bash
//! formwright forms create "Invoice"
//! formwright fields Invoice add number --label Qty
//! formwright fields Invoice derive Total "Qty * 2"
//! formwright preview Invoice --set Qty=3 --submit
//! formwright forms export Invoice --format json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formwright_core::{FormRepository, JsonFileFormRepository};

mod commands;
mod config;
mod output;

use commands::fields::FieldEdit;

#[derive(Parser)]
#[command(name = "formwright")]
#[command(author = "Formwright")]
#[command(version = "0.1.0")]
#[command(about = "Formwright form builder", long_about = None)]
struct Cli {
    /// Directory holding saved forms and the auto-saved draft
    #[arg(long, env = "FORMWRIGHT_STORAGE_DIR", global = true)]
    storage_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage saved forms
    Forms {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Edit the fields of a saved form
    Fields {
        /// Form id or name
        form: String,
        #[command(subcommand)]
        edit: FieldEdit,
    },
    /// Fill in a form and show values, derived results and errors
    Preview {
        /// Form id or name
        form: String,
        /// Field value as LABEL=VALUE (comma separated for checkboxes)
        #[arg(long = "set", value_name = "LABEL=VALUE")]
        set: Vec<String>,
        /// Validate every field as a submission would
        #[arg(long)]
        submit: bool,
    },
    /// Edit a form interactively with periodic auto-save
    Edit {
        /// Form id or name; starts a new form when omitted
        form: Option<String>,
        /// Name for a new form
        #[arg(long, default_value = "Untitled form")]
        name: String,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum FormCommands {
    /// List saved forms
    List,
    /// Show a form's fields
    Show { form: String },
    /// Create an empty form
    Create { name: String },
    /// Save a form definition from a JSON file
    Import {
        file: PathBuf,
    },
    /// Write a form definition as JSON
    Export {
        form: String,
        /// Output file (stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a saved form
    Delete { form: String },
    /// Save the auto-saved draft as a form
    Restore,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = cli.profile.as_deref();
    let config = config::Config::load(profile).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable config file");
        config::Config::default()
    });

    let format = match cli.format {
        Some(format) => format,
        None => config
            .default_format
            .as_deref()
            .and_then(|f| output::OutputFormat::from_str(f, true).ok())
            .unwrap_or(output::OutputFormat::Table),
    };
    let storage_dir = cli.storage_dir.clone().unwrap_or_else(|| config.storage_dir());
    tracing::debug!(storage_dir = %storage_dir.display(), "Using form storage");
    let repo: Arc<dyn FormRepository> = Arc::new(JsonFileFormRepository::new(storage_dir));

    match cli.command {
        Commands::Forms { action } => commands::forms::handle(action, repo, format).await,
        Commands::Fields { form, edit } => commands::fields::handle(&form, edit, repo).await,
        Commands::Preview { form, set, submit } => {
            commands::preview::handle(&form, &set, submit, repo, format).await
        }
        Commands::Edit { form, name } => {
            commands::edit::handle(form.as_deref(), &name, repo, config.auto_save_interval()).await
        }
        Commands::Config { action } => commands::config::handle(action, profile),
    }
}
