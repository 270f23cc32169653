//! pdfsieve command-line interface.
//!
//! ```text
//! pdfsieve capabilities
//! pdfsieve extract report.pdf -o report_results --zip
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdfsieve::{
    Capabilities, DiagnosticLevel, ExtractionConfig, ExtractionResult, archive_file_name, export_archive,
    export_to_dir, extract_file,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "pdfsieve", version, about = "Extract text, tables, page images and OCR text from PDFs")]
struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which optional providers are available, with install hints
    Capabilities {
        /// Configuration file (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Extract a PDF and write the result tree
    Extract {
        /// PDF file to extract
        path: PathBuf,

        /// Output directory (default: `<stem>_results` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write `<stem>_results.zip`
        #[arg(long)]
        zip: bool,

        /// Render resolution for page images
        #[arg(long)]
        dpi: Option<u32>,

        /// Skip OCR even when an engine is available
        #[arg(long)]
        no_ocr: bool,

        /// Configuration file (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Capabilities { config, format } => {
            let config = load_config(config.as_deref())?;
            let capabilities = Capabilities::detect(&config).await;
            print_capabilities(&capabilities, format)?;
        }
        Command::Extract {
            path,
            output,
            zip,
            dpi,
            no_ocr,
            config,
            format,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dpi) = dpi {
                config.target_dpi = dpi;
            }
            if no_ocr {
                config.ocr.enabled = false;
            }
            if zip {
                config.archive = true;
            }
            config.validate().context("Invalid configuration")?;

            let result = extract_file(&path, &config)
                .await
                .with_context(|| format!("Failed to extract {}", path.display()))?;

            let output_dir = output.unwrap_or_else(|| default_output_dir(&path));
            let summary = export_to_dir(&result, &output_dir)
                .with_context(|| format!("Failed to write results to {}", output_dir.display()))?;

            let archive = if config.archive {
                let zip_path = output_dir
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(archive_file_name(&path));
                Some(export_archive(&result, &zip_path).context("Failed to write archive")?)
            } else {
                None
            };

            print_result(&result, &summary.root, archive.as_deref(), format)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Explicit file, else a discovered `pdfsieve.toml`, else defaults; then
/// environment overrides.
fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    let config = match path {
        Some(path) => ExtractionConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ExtractionConfig::discover()
            .context("Failed to load discovered config")?
            .unwrap_or_default(),
    };
    config.with_env_overrides().context("Invalid environment override")
}

fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_results", stem))
}

fn print_capabilities(capabilities: &Capabilities, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for line in capabilities.status_lines() {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(capabilities).context("Failed to serialize capabilities")?
            );
        }
    }
    Ok(())
}

fn print_result(result: &ExtractionResult, root: &Path, archive: Option<&Path>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (key, value) in result.metadata.entries() {
                println!("{}: {}", key, value);
            }
            println!();
            println!("text blocks: {}", result.text.len());
            println!("tables:      {}", result.tables.len());
            println!("images:      {}", result.images.len());
            println!("ocr pages:   {}", result.ocr_text.len());

            let warnings: Vec<_> = result
                .diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Warning)
                .collect();
            if !warnings.is_empty() {
                println!();
                for warning in warnings {
                    println!("{}", warning);
                }
            }

            println!();
            println!("results: {}", root.display());
            if let Some(archive) = archive {
                println!("archive: {}", archive.display());
            }
        }
        OutputFormat::Json => {
            let mut value = serde_json::to_value(result.summary()).context("Failed to serialize result")?;
            value["output_dir"] = serde_json::json!(root.display().to_string());
            if let Some(archive) = archive {
                value["archive"] = serde_json::json!(archive.display().to_string());
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&value).context("Failed to serialize result")?
            );
        }
    }
    Ok(())
}
