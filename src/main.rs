use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

#[derive(Debug, Parser)]
#[command(name = "yieldcast")]
#[command(about = "Crop yield predictions from the command line")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit the crop parameters and render the predicted yield
    Predict {
        /// Override a form field, e.g. --set Crop_Type=Wheat (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List form fields, defaults and allowed values
    Fields,
    /// Check the prediction service and show effective settings
    Health,
    /// Show recent prediction cycles
    History {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Inspect or initialise the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.yieldcast/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Predict { set, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            if !cli::run_predict(&set, fmt)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Fields => cli::run_fields(),
        Commands::Health => cli::run_health(),
        Commands::History { format, days } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, days)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
        },
    }
}
