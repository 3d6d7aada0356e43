// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use local_converter::capability;
use local_converter::config::{load_and_validate_config, Config};
use local_converter::context::{download_name, InputFile};
use local_converter::errors::ConversionError;
use local_converter::service::{ConversionOptions, ConversionProgress, ConversionService, ConversionStatus};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "local-converter", version, about = "Convert files locally between formats")]
struct Cli {
    /// YAML config file; the built-in registry is used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set (e.g. "debug")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a file to another format
    Convert {
        input: PathBuf,

        /// Target format, e.g. "png"
        #[arg(short, long)]
        to: String,

        /// Source format; taken from the input's extension when omitted
        #[arg(short, long)]
        from: Option<String>,

        /// Output path; defaults to the input name with the target extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List supported conversions
    Formats {
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report whether this environment can run conversions
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Convert {
            input,
            to,
            from,
            output,
        } => convert(&config, &input, &to, from, output).await,
        Commands::Formats { json } => formats(&config, json),
        Commands::Status => {
            println!("{}", capability::status_message());
            Ok(())
        }
    }
}

async fn convert(
    config: &Config,
    input: &Path,
    target_format: &str,
    source_format: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let file = InputFile::from_path(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let source_format = source_format.unwrap_or_else(|| file.extension());
    let output = output.unwrap_or_else(|| input.with_file_name(download_name(&file.name, target_format)));

    let service = ConversionService::from_config(config);
    let options = ConversionOptions::new(source_format, target_format).on_progress(print_progress);

    let start_time = Instant::now();
    let result = service.convert_file(file, options).await;
    service.dispose();

    let blob = match result {
        Ok(blob) => blob,
        Err(error) => return Err(report_failure(error)),
    };

    tokio::fs::write(&output, blob.bytes())
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("✅ Wrote {} ({} bytes, {})", output.display(), blob.len(), blob.content_type);
    println!("⏱️  Conversion Time: {:?}", start_time.elapsed());
    Ok(())
}

fn print_progress(event: ConversionProgress) {
    match event.status {
        ConversionStatus::Converting => {
            let progress = event.progress.unwrap_or(0.0);
            eprintln!("🔄 {} {:>3.0}%", event.status.label(), progress);
        }
        ConversionStatus::Completed => eprintln!("🎉 {}", event.status.label()),
        ConversionStatus::Error => eprintln!(
            "❌ {} {}",
            event.status.label(),
            event.error.unwrap_or_default()
        ),
    }
}

/// The verbatim failure followed by the generic remediation hint.
fn report_failure(error: ConversionError) -> anyhow::Error {
    anyhow::anyhow!("{}\n{}", error, error.remediation_hint())
}

fn formats(config: &Config, json: bool) -> Result<()> {
    let service = ConversionService::from_config(config);
    let table = service.get_supported_conversions();

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("📋 Supported conversions:");
    for (source, targets) in table.iter() {
        println!("  {} → {}", source, targets.join(", "));
    }
    Ok(())
}
