use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod ai;
mod api;
mod config;
mod email;
mod error;
mod extractor;
mod llm;
mod models;
mod name;
mod normalize;
mod phone;
mod phone_format;
mod processor;
mod reconcile;

use crate::config::SettingsArgs;
use crate::extractor::ContactExtractor;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract contact details from a single plain-text document
    Extract {
        /// Path to the document text
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include the regex and AI candidates in the output
        #[arg(long, default_value = "false")]
        detailed: bool,
    },
    /// Process a JSON file containing document records
    Process {
        /// Path to the input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Start the API server
    Serve {
        /// Port to listen on (overrides the configuration file)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::build_config(&cli.settings)?;
    let extractor = Arc::new(ContactExtractor::new(&config)?);

    match cli.command {
        Commands::Extract {
            input,
            output,
            detailed,
        } => {
            info!("Extracting contact details from {}", input.display());
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read document {}", input.display()))?;
            let report = extractor.extract_detailed(&text).await;
            let output_data = if detailed {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string_pretty(&report.contact)?
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, output_data)?;
                    info!("Wrote contact record to {}", path.display());
                }
                None => println!("{}", output_data),
            }
        }
        Commands::Process { input, output } => {
            info!("Processing documents from {} to {}", input.display(), output.display());
            process_file(extractor, input, output, config.max_concurrency).await?;
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            api::start_api_server(extractor, port, config.max_concurrency).await;
        }
    }

    Ok(())
}

async fn process_file(
    extractor: Arc<ContactExtractor>,
    input: PathBuf,
    output: PathBuf,
    workers: usize,
) -> Result<()> {
    let documents = processor::read_documents(&input)?;
    info!("Loaded {} documents from {}", documents.len(), input.display());

    let progress_bar = indicatif::ProgressBar::new(documents.len() as u64);
    progress_bar.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let progress_bar_clone = progress_bar.clone();
    let results = processor::process_all(extractor, documents, workers, move || {
        progress_bar_clone.inc(1)
    })
    .await?;

    progress_bar.finish_with_message("Processing complete");

    processor::write_results(&output, &results)?;
    info!("Wrote {} results to {}", results.len(), output.display());

    Ok(())
}
