use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use listening_insights as lib;
use lib::aggregate::Aggregator;
use lib::config::Config;
use lib::models::CredentialPair;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::subscriber as tracing_subscriber_global;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "listening-insights", version)]
struct Cli {
    /// Path to config TOML (defaults plus SPOTIFY_* env vars when omitted)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve POST /spotify-data (long-running)
    Serve,
    /// Compute the taste profile once and print it as JSON
    Insights {
        #[arg(long, env = "SPOTIFY_ACCESS_TOKEN")]
        access_token: String,
        #[arg(long, env = "SPOTIFY_REFRESH_TOKEN")]
        refresh_token: String,
    },
    /// OAuth helpers for obtaining a credential pair
    Auth {
        #[command(subcommand)]
        sub: AuthCommands,
    },
    /// Validate config file and exit
    ConfigValidate,
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Print the Spotify authorization URL
    Url,
    /// Exchange the code in a pasted redirect URL for tokens
    Exchange {
        #[arg(long)]
        redirect_url: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => Config::from_path(p).with_context(|| format!("loading config from {}", p.display())),
        None => Config::from_env().context("loading config from environment"),
    }
}

/// Logs go to stderr (stdout carries command output) and, when `log_dir` is
/// set, to a daily-rotated file.
fn init_logging(cfg: &Config) -> Result<Option<WorkerGuard>> {
    let _ = LogTracer::init();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &cfg.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "listening-insights.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(non_blocking)), Some(guard))
        }
        None => (None, None),
    };
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer);
    tracing_subscriber_global::set_global_default(subscriber)
        .context("failed to set global tracing subscriber")?;
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ConfigValidate = cli.command {
        match load_config(cli.config.as_ref()) {
            Ok(_) => println!("OK"),
            Err(e) => {
                eprintln!("Config validation failed: {:#}", e);
                std::process::exit(2);
            }
        }
        return Ok(());
    }

    let cfg = load_config(cli.config.as_ref())?;
    let _guard = init_logging(&cfg)?;

    match cli.command {
        Commands::Serve => {
            let aggregator = Arc::new(Aggregator::new(&cfg, lib::token_cache_from_config(&cfg)));
            lib::server::run(&cfg, aggregator)
                .await
                .with_context(|| "running server".to_string())?;
        }
        Commands::Insights {
            access_token,
            refresh_token,
        } => {
            let aggregator = Aggregator::new(&cfg, lib::token_cache_from_config(&cfg));
            let creds = CredentialPair {
                access_token,
                refresh_token,
            };
            let resp = aggregator.insights(&creds).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Commands::Auth { sub } => match sub {
            AuthCommands::Url => {
                let url = lib::api::spotify_auth::authorize_url(&cfg)?;
                println!(
                    "Open this URL in your browser and authorize the application:\n\n{}\n",
                    url
                );
                println!("Then run `auth exchange --redirect-url <URL you were sent to>`.");
            }
            AuthCommands::Exchange { redirect_url } => {
                let code = lib::api::spotify_auth::code_from_redirect(&redirect_url)?;
                let client = reqwest::Client::new();
                let tokens = lib::api::spotify_auth::exchange_code(&client, &cfg, &code).await?;
                let pair = tokens.credential_pair()?;
                println!("{}", serde_json::to_string_pretty(&pair)?);
            }
        },
        // handled before logging init
        Commands::ConfigValidate => {}
    }

    Ok(())
}
