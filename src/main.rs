use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use medwise::{cli, config, server};

#[derive(Parser)]
#[command(name = "medwise", version, about = "Symptom-to-disease advisor and medicine finder")]
struct Cli {
    /// Config file (defaults to ~/.medwise/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Predict a disease from comma-separated symptoms
    Predict {
        symptoms: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check reference data, models, and the database
    Doctor,
    /// List pharmacies near a place, optionally with who stocks a medicine
    Pharmacies {
        place: String,
        #[arg(long)]
        medicine: Option<String>,
    },
    /// Send an SMS medicine reminder
    Remind {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        medicine: String,
        #[arg(long)]
        time: String,
    },
    /// Import data files
    Import {
        #[command(subcommand)]
        what: ImportAction,
    },
    /// Manage the medicine search model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ImportAction {
    /// Register pharmacy accounts from a JSON array of {username, password, name}
    Pharmacies { file: PathBuf },
    /// Load stock from a CSV with medicine_name, quantity, added_by columns
    Inventory { file: PathBuf },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the sentence encoder to ~/.medwise/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::MedwiseConfig::load_from(path)?,
        None => config::MedwiseConfig::load()?,
    };

    // Log to stderr so command output on stdout stays clean.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Predict { symptoms, json } => cli::predict::predict(&config, &symptoms, json)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Pharmacies { place, medicine } => {
            cli::pharmacies::pharmacies(&config, &place, medicine.as_deref()).await?
        }
        Command::Remind {
            phone,
            medicine,
            time,
        } => cli::remind::remind(&config, &phone, &medicine, &time).await?,
        Command::Import { what } => match what {
            ImportAction::Pharmacies { file } => cli::import::import_pharmacies(&config, &file)?,
            ImportAction::Inventory { file } => cli::import::import_inventory(&config, &file)?,
        },
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.matcher).await?,
        },
    }

    Ok(())
}
