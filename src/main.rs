use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use filing_watch::{
    Config, Credentials, CsvLedger, FederalRegisterClient, GeminiAdapter, Ledger,
    ModelClassifier, ModelProvider, OpenAiAdapter, Orchestrator, ResendNotifier, TextModel,
};

#[derive(Parser)]
#[command(name = "filing-watch")]
#[command(about = "Watch the daily regulatory feed for new drug filings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file
    #[arg(long, default_value = ".filing-watch/config.yml")]
    config: PathBuf,

    /// Path to ledger CSV (overrides config)
    #[arg(long, env = "FILING_WATCH_LEDGER")]
    ledger_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check today's notices once (default)
    Run,

    /// List every finding recorded in the ledger
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("filing_watch=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let ledger_path = cli.ledger_path.unwrap_or_else(|| config.ledger.path.clone());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_once(config, ledger_path).await,
        Commands::History => show_history(ledger_path),
    }
}

async fn run_once(config: Config, ledger_path: PathBuf) -> Result<()> {
    let credentials = Credentials::from_env(config.model.provider)?;

    match config.model.provider {
        ModelProvider::Gemini => {
            let mut model = GeminiAdapter::new(credentials.model_api_key.clone())
                .with_model(&config.model.name)
                .with_temperature(config.model.temperature);
            if let Some(base_url) = &config.model.base_url {
                model = model.with_base_url(base_url);
            }
            execute(&config, credentials, ledger_path, model).await
        }
        ModelProvider::OpenAi => {
            let mut model = OpenAiAdapter::new(credentials.model_api_key.clone())
                .with_model(&config.model.name)
                .with_temperature(config.model.temperature);
            if let Some(base_url) = &config.model.base_url {
                model = model.with_base_url(base_url);
            }
            execute(&config, credentials, ledger_path, model).await
        }
    }
}

async fn execute<M: TextModel>(
    config: &Config,
    credentials: Credentials,
    ledger_path: PathBuf,
    model: M,
) -> Result<()> {
    let feed = FederalRegisterClient::new(&config.feed);
    let classifier = ModelClassifier::new(model);
    let ledger = CsvLedger::new(&ledger_path);
    let notifier = ResendNotifier::new(
        &config.email,
        credentials.email_api_key,
        credentials.recipient,
    );

    info!(ledger = %ledger_path.display(), model = %config.model.name, "Starting run");

    let orchestrator = Orchestrator::new(feed, classifier, ledger, notifier);
    let summary = orchestrator.run(Local::now().date_naive()).await?;

    println!("{}", summary.message());

    Ok(())
}

fn show_history(ledger_path: PathBuf) -> Result<()> {
    let ledger = CsvLedger::new(&ledger_path);
    let records = ledger.records()?;

    if records.is_empty() {
        println!("No filings recorded.");
        return Ok(());
    }

    println!("Recorded Filings:\n");
    for record in records {
        println!(
            "  {} {} ({}) by {}",
            record.date_found, record.drug, record.filing_type, record.sponsor
        );
        println!("    ID: {}", record.id);
        println!("    Source: {}", record.source_url);
        println!();
    }

    Ok(())
}
