mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use seat_core::{
    extract_count, HttpLoader, Observation, PageLoader, TelegramCredentials, TelegramNotifier,
    Watcher,
};

use crate::config::{AppConfig, Overrides};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        VERSION
    } else {
        // Called once, lives for the program's lifetime.
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Watch an event page and get a Telegram message when a seat frees up.
#[derive(Parser)]
#[command(name = "seat-watch", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WatchArgs {
    /// Path to TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Event page URL. Overrides config file.
    #[arg(long)]
    url: Option<String>,

    /// Notify when the count drops below this value.
    #[arg(long)]
    threshold: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the page, notify on free seats and serve the health endpoint.
    Run {
        #[command(flatten)]
        watch: WatchArgs,

        /// Listen address for the health endpoint (e.g. 0.0.0.0:8080).
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Seconds between checks.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Fetch the page once and print the participant count.
    Check {
        #[command(flatten)]
        watch: WatchArgs,

        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            watch,
            listen,
            interval,
        } => {
            let overrides = Overrides {
                listen,
                url: watch.url,
                threshold: watch.threshold,
                interval_secs: interval,
            };
            run_service(watch.config, overrides).await;
        }
        Commands::Check { watch, json } => {
            fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            let overrides = Overrides {
                url: watch.url,
                threshold: watch.threshold,
                ..Overrides::default()
            };
            run_check(watch.config, overrides, json).await;
        }
    }
}

async fn run_service(config_path: Option<PathBuf>, overrides: Overrides) {
    let app_config = match AppConfig::resolve(config_path.as_deref(), overrides) {
        Ok(c) => {
            init_tracing(&c.server.log_format);
            if let Some(ref path) = config_path {
                tracing::info!(path = %path.display(), "Loaded config file");
            }
            c
        }
        Err(e) => {
            init_tracing("pretty");
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let watch_config = app_config.watch.to_watch_config();

    let client = HttpLoader::build_client(watch_config.request_timeout, &watch_config.user_agent);
    let client = match client {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let notifier = Arc::new(
        TelegramNotifier::new(client.clone(), TelegramCredentials::from_env())
            .with_api_base(&app_config.telegram.api_base)
            .with_timeout(watch_config.request_timeout),
    );
    if !notifier.has_credentials() {
        tracing::warn!("BOT_TOKEN or CHAT_ID missing, notifications are disabled");
    }
    let loader = Arc::new(HttpLoader::with_client(client));

    tracing::info!("Starting participant watch");
    let watcher = Watcher::new(watch_config, loader, notifier).start().await;

    let listen = app_config.server.listen;
    tracing::info!(%listen, "Starting health endpoint");
    let served = seat_api::serve_with_shutdown(listen, seat_api::shutdown_signal()).await;

    tracing::info!("Stopping watcher...");
    watcher.stop().await;
    match tokio::time::timeout(Duration::from_secs(15), watcher.join()).await {
        Ok(Ok(_)) => tracing::info!("Watcher shut down"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Watcher task failed"),
        Err(_) => tracing::warn!("Watcher did not shut down in time"),
    }

    if let Err(e) = served {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}

#[derive(Serialize)]
struct CheckReport<'a> {
    url: &'a str,
    #[serde(flatten)]
    observation: Observation,
    threshold: u64,
    slot_free: bool,
}

async fn run_check(config_path: Option<PathBuf>, overrides: Overrides, json: bool) {
    let app_config = match AppConfig::resolve(config_path.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(2);
        }
    };
    let config = app_config.watch.to_watch_config();

    let loader = match HttpLoader::from_config(&config) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(2);
        }
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("{spinner} {wide_msg}") {
        spinner.set_style(s);
    }
    spinner.set_message(format!("Fetching {}", style(&config.url).dim()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = loader.load(&config.url).await;
    spinner.finish_and_clear();

    let count = match result {
        Ok(body) => extract_count(&body),
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let Some(count) = count else {
        eprintln!(
            "{} no participant count found on {}",
            style("error:").red().bold(),
            config.url
        );
        std::process::exit(1);
    };

    let slot_free = count < config.threshold;

    if json {
        let report = CheckReport {
            url: &config.url,
            observation: Observation::new(count),
            threshold: config.threshold,
            slot_free,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("{} {}", style("error:").red().bold(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    let ratio = format!("{}/{}", count, config.threshold);
    let (ratio, note) = if slot_free {
        (style(ratio).green().bold(), style("slot free").green())
    } else {
        (style(ratio).yellow().bold(), style("full").yellow())
    };
    println!("{} {}  {}", style("Teilnehmer:").bold(), ratio, note);
    println!("  {} {}", style("url:").dim(), config.url);
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "seat-watch",
            "run",
            "--listen",
            "127.0.0.1:9000",
            "--threshold",
            "30",
            "--interval",
            "60",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                watch,
                listen,
                interval,
            } => {
                assert_eq!(listen.unwrap().port(), 9000);
                assert_eq!(watch.threshold, Some(30));
                assert_eq!(interval, Some(60));
                assert!(watch.config.is_none());
            }
            Commands::Check { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn parses_check_with_json() {
        let cli = Cli::try_parse_from([
            "seat-watch",
            "check",
            "--url",
            "https://example.com/e",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Check { watch, json } => {
                assert!(json);
                assert_eq!(watch.url.as_deref(), Some("https://example.com/e"));
            }
            Commands::Run { .. } => panic!("expected check"),
        }
    }
}
