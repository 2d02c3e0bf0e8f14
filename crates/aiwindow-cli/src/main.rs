use aiwindow_core::compression::HistoryCompressor;
use aiwindow_core::config::{AppConfig, ConfigLoader};
use aiwindow_core::core_types::ChatTurn;
use aiwindow_core::parsing::{enrich_with_metrics, ParseMode, ResponseParser};
use aiwindow_core::tokens;
use aiwindow_core::YandexGptSummarizer;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[derive(Parser, Debug)]
#[clap(
    name = "aiwindow",
    author,
    version = "0.1.0",
    about = "Parse structured LLM replies and compress chat history"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, help = "YAML configuration file; defaults apply when omitted")]
    config: Option<PathBuf>,

    #[clap(long, short, help = "Log level; overrides logging.level from the config file")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a model reply and print the outcome as JSON
    Parse {
        #[clap(long, help = "Reject anything that is not clean JSON")]
        strict: bool,

        #[clap(long, short, help = "Read the reply from a file instead of stdin")]
        file: Option<PathBuf>,

        #[clap(long, help = "Add word count and step-structure metadata")]
        metrics: bool,
    },
    /// Print the estimated token count of a text
    Tokens {
        #[clap(long, short, help = "Read the text from a file instead of stdin")]
        file: Option<PathBuf>,
    },
    /// Compress a JSON chat history with the YandexGPT summarizer
    Compress {
        #[clap(long, help = "JSON array of chat turns")]
        history: PathBuf,

        #[clap(long, help = "Override the configured compression threshold")]
        threshold: Option<usize>,

        #[clap(long, help = "Override the number of recent turns kept verbatim")]
        keep: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before the logger exists so the file can supply the level.
    let config = load_config(cli.config.as_deref()).await?;

    let level = resolve_log_level(cli.log_level.as_deref(), &config);
    // stdout carries command output; logs go to stderr.
    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .init();

    if let Some(path) = &cli.config {
        log::info!("Loaded configuration from file: {}", path.display());
    }

    match cli.command {
        Commands::Parse {
            strict,
            file,
            metrics,
        } => run_parse(&config, strict, file.as_deref(), metrics).await,
        Commands::Tokens { file } => run_tokens(file.as_deref()).await,
        Commands::Compress {
            history,
            threshold,
            keep,
        } => run_compress(config, &history, threshold, keep).await,
    }
}

async fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(ConfigLoader::from_file(path).await?),
        None => Ok(AppConfig::default()),
    }
}

/// The `--log-level` flag wins over `logging.level`; unparsable values fall back to info.
fn resolve_log_level(flag: Option<&str>, config: &AppConfig) -> LevelFilter {
    flag.unwrap_or(config.logging.level.as_str())
        .parse()
        .unwrap_or(LevelFilter::Info)
}

async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

async fn run_parse(config: &AppConfig, strict: bool, file: Option<&Path>, metrics: bool) -> Result<()> {
    let raw = read_input(file).await?;
    let parser = ResponseParser::new(config.parser.clone());
    let mode = if strict { ParseMode::Strict } else { ParseMode::Lenient };

    let mut outcome = parser.parse(&raw, mode);
    if metrics {
        outcome = outcome.map(enrich_with_metrics);
    }
    if let Some(warning) = outcome.warning() {
        log::warn!("Parsed with warning: {}", warning);
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn run_tokens(file: Option<&Path>) -> Result<()> {
    let text = read_input(file).await?;
    let estimate = tokens::estimate_tokens(&text);
    println!("≈{} tokens", tokens::format_token_count(estimate));
    Ok(())
}

async fn run_compress(
    config: AppConfig,
    history_path: &Path,
    threshold: Option<usize>,
    keep: Option<usize>,
) -> Result<()> {
    let content = tokio::fs::read_to_string(history_path)
        .await
        .with_context(|| format!("Failed to read history {}", history_path.display()))?;
    let history: Vec<ChatTurn> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of chat turns", history_path.display()))?;

    let yandex = config.yandex.clone().unwrap_or_default();
    let summarizer = YandexGptSummarizer::from_config(&yandex)?;

    let mut compressor = HistoryCompressor::new(Arc::new(summarizer), config.compression.clone());
    if let Some(threshold) = threshold {
        compressor = compressor.with_threshold(threshold);
    }
    if let Some(keep) = keep {
        compressor = compressor.with_keep_recent_count(keep);
    }
    compressor.config().validate()?;

    let keep_recent_count = compressor.config().keep_recent_count;
    let result = compressor.compress_or_keep(&history, keep_recent_count).await;
    if let Some(error) = &result.error {
        log::error!("Compression failed, history left unchanged: {}", error);
    }

    if result.compressed {
        let stats = HistoryCompressor::calculate_compression_stats(&history, &result.history);
        log::info!(
            "Turns: {} -> {}, tokens: {} -> {} ({:.1}% saved)",
            stats.original_message_count,
            stats.compressed_message_count,
            tokens::format_token_count(stats.original_tokens),
            tokens::format_token_count(stats.compressed_tokens),
            stats.compression_ratio
        );
    } else if result.error.is_none() {
        log::info!("Compression not needed for {} turns", history.len());
    }

    println!("{}", serde_json::to_string_pretty(&result.history)?);
    Ok(())
}
