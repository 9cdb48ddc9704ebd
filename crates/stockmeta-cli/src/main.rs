mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use stockmeta::config::{default_config_path, validate_config};
use stockmeta::secrets::DEFAULT_API_KEY_ENV_VAR;
use stockmeta::{
    load_config, load_config_or_default, resolve_secret, write_csv, BatchOrchestrator, Config,
    Credential, ProgressBroadcaster, ProgressEvent, Session, SubmittedFile,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate Shutterstock metadata for a batch of images with a Gemini vision model"
)]
struct Cli {
    #[arg(short, long, help = "Config file (defaults to <config dir>/stockmeta/config.json)")]
    config: Option<PathBuf>,

    #[arg(long, conflicts_with = "api_key_file", help = "Gemini API key")]
    api_key: Option<String>,

    #[arg(long, help = "File containing the Gemini API key")]
    api_key_file: Option<String>,

    #[arg(short, long, help = "Model name, overrides the config file")]
    model: Option<String>,

    #[arg(short, long, help = "CSV report path, overrides the config file")]
    output: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,

    #[arg(required = true, help = "Images to process")]
    images: Vec<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info,stockmeta=debug,stockmeta_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Config> {
    let mut config = match (&cli.config, default_config_path()) {
        (Some(path), _) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        (None, Some(path)) => load_config_or_default(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        (None, None) => Config::default(),
    };

    if let Some(model) = &cli.model {
        config.extractor.model = model.clone();
    }
    if let Some(output) = &cli.output {
        config.export.output_file = output.display().to_string();
    }

    validate_config(&config).context("Invalid settings")?;
    Ok(config)
}

fn resolve_credential(cli: &Cli) -> Result<Credential> {
    let secret = resolve_secret(
        cli.api_key.as_deref(),
        cli.api_key_file.as_deref(),
        Some(DEFAULT_API_KEY_ENV_VAR),
    )
    .with_context(|| {
        format!(
            "No API key: pass --api-key, --api-key-file or set {}",
            DEFAULT_API_KEY_ENV_VAR
        )
    })?;

    Ok(Credential::from_secret(secret)?)
}

/// Reads every path that can be read. Type filtering is left to the session.
fn read_files(paths: &[PathBuf]) -> Vec<SubmittedFile> {
    paths
        .iter()
        .filter_map(|path| match SubmittedFile::from_path(path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable file");
                None
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_settings(&cli)?;
    let credential = resolve_credential(&cli)?;
    let orchestrator =
        BatchOrchestrator::from_config(&config).context("Failed to set up the extractor")?;
    debug!(model = %config.extractor.model, "Extractor ready");

    let mut session = Session::new();
    session.set_credential(credential)?;

    let accepted = session.add_files(read_files(&cli.images))?;
    if accepted == 0 {
        bail!("No image files to process");
    }

    let broadcaster = ProgressBroadcaster::default();
    let mut events = broadcaster.subscribe();
    let renderer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render::event_line(&event, accepted) {
                        println!("{}", line);
                    }
                    if matches!(event, ProgressEvent::RunFinished { .. }) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Progress renderer skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let summary = session.start(&orchestrator, &broadcaster).await?;
    drop(broadcaster);
    let _ = renderer.await;

    let Some(summary) = summary else {
        bail!("No image files to process");
    };

    let output = PathBuf::from(&config.export.output_file);
    write_csv(session.results(), &output)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    for line in render::summary_lines(&summary, session.results()) {
        println!("{}", line);
    }
    println!("Report written to {}", output.display());
    info!("Done");

    Ok(())
}
