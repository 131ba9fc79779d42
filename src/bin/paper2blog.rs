//! CLI binary for paper2blog.
//!
//! A thin shim over the library crate: maps flags to `ConversionConfig`,
//! picks a backend from the environment, runs extraction + conversion,
//! and prints the resulting blog record as JSON. Images are not uploaded
//! anywhere — the output keeps its `{{IMAGE_i}}` placeholders, which is
//! enough to inspect what the pipeline produced.

use anyhow::{bail, Context, Result};
use clap::Parser;
use paper2blog::{
    convert_to_blog, extract, ConversionConfig, GeminiBackend, GenerativeBackend,
    OpenRouterBackend, RateLimiter,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "paper2blog",
    version,
    about = "Convert an academic PDF into a structured blog post via a vision language model"
)]
struct Cli {
    /// Path to the input PDF.
    input: PathBuf,

    /// Backend: "gemini" or "openrouter".
    #[arg(long, default_value = "gemini")]
    backend: String,

    /// Model identifier for the chosen backend.
    #[arg(long)]
    model: Option<String>,

    /// API key; falls back to GEMINI_API_KEY / OPENROUTER_API_KEY.
    #[arg(long, env = "PAPER2BLOG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Minimum seconds between backend calls.
    #[arg(long, default_value_t = 3)]
    min_interval_secs: u64,

    /// Per-call timeout in seconds.
    #[arg(long, default_value_t = 60)]
    api_timeout_secs: u64,

    /// Password for encrypted PDFs.
    #[arg(long)]
    password: Option<String>,

    /// Extract only; skip the conversion call and print the extraction.
    #[arg(long)]
    extract_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = ConversionConfig::builder()
        .min_call_interval(Duration::from_secs(cli.min_interval_secs))
        .api_timeout(Duration::from_secs(cli.api_timeout_secs));
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    let config = builder.build()?;

    let backend = make_backend(&cli, &config)?;
    let limiter = RateLimiter::new(config.min_call_interval);

    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let extraction = extract(&bytes, Some(&backend), &limiter, &config).await?;

    if cli.extract_only {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    let blog = convert_to_blog(&extraction, &[], &backend, &limiter, &config).await?;
    println!("{}", serde_json::to_string_pretty(&blog)?);
    Ok(())
}

fn make_backend(cli: &Cli, config: &ConversionConfig) -> Result<Arc<dyn GenerativeBackend>> {
    match cli.backend.as_str() {
        "gemini" => {
            let key = cli
                .api_key
                .clone()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .context("no API key: pass --api-key or set GEMINI_API_KEY")?;
            let model = cli.model.clone().unwrap_or_else(|| "gemini-2.0-flash".into());
            Ok(Arc::new(GeminiBackend::new(key, model, config.api_timeout)?))
        }
        "openrouter" => {
            let key = cli
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .context("no API key: pass --api-key or set OPENROUTER_API_KEY")?;
            let model = cli
                .model
                .clone()
                .context("--model is required for the openrouter backend")?;
            Ok(Arc::new(OpenRouterBackend::new(key, model, config.api_timeout)?))
        }
        other => bail!("unknown backend '{other}' (expected: gemini, openrouter)"),
    }
}
