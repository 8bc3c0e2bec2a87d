pub mod commands;

use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tastebud_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "tastebud",
    about = "Tastebud operator CLI",
    long_about = "Score ordering conversations, rank menu recommendations, and manage the local catalog.",
    after_help = "Examples:\n  tastebud migrate\n  tastebud seed\n  tastebud chat \"I'm craving something spicy\" --limit 2\n  tastebud products --category pizza --dietary vegetarian\n  tastebud analytics"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo menu; existing products are left untouched")]
    Seed,
    #[command(about = "Score one message and return the updated conversation with recommendations")]
    Chat {
        message: String,
        #[arg(long, help = "Continue an existing conversation instead of starting a new one")]
        conversation: Option<String>,
        #[arg(long, help = "Maximum number of recommendations (1-20)")]
        limit: Option<usize>,
    },
    #[command(about = "Browse the catalog by category, price, dietary labels and moods")]
    Products {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long, help = "Comma-separated dietary labels; every label must be met")]
        dietary: Option<String>,
        #[arg(long, help = "Comma-separated mood tags; any one is enough")]
        mood: Option<String>,
    },
    #[command(about = "Mark a recommended product as clicked, or as ordered")]
    Feedback {
        #[arg(long)]
        conversation: String,
        #[arg(long)]
        product: String,
        #[arg(long, help = "Record an order instead of a click")]
        ordered: bool,
    },
    #[command(about = "Report engagement, catalog and recommendation uptake aggregates")]
    Analytics,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report configuration problems themselves; logging only needs
    // a config that loads.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        if let Err(error) = init_logging(&config) {
            eprintln!("{error:#}");
        }
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Chat { message, conversation, limit } => {
            commands::chat::run(&message, conversation.as_deref(), limit)
        }
        Command::Products { category, min_price, max_price, dietary, mood } => {
            commands::products::run(commands::products::ProductFilters {
                category,
                min_price,
                max_price,
                dietary,
                mood,
            })
        }
        Command::Feedback { conversation, product, ordered } => {
            commands::feedback::run(&conversation, &product, ordered)
        }
        Command::Analytics => commands::analytics::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
