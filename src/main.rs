mod config;
mod data;
mod engine;
mod feed;
mod indicators;
mod ml;
mod report;
mod sim;
mod types;

use std::time::Duration;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};

use crate::config::SimConfig;
use crate::engine::{run_session, SessionResult};
use crate::feed::{FeedEvent, LiveFeed};
use crate::ml::train_model;
use crate::report::{GeminiReporter, ReportClient};

#[derive(Parser)]
#[command(name = "intraday-sim", about = "Intraday prediction and trading simulator")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "sim.toml")]
    config: String,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full simulated session for one date.
    Backtest {
        /// Session date, YYYY-MM-DD.
        date: String,
        /// Emit the full session result as JSON instead of a summary.
        #[arg(long)]
        json: bool,
        /// Request an analyst report after the session.
        #[arg(long)]
        report: bool,
    },
    /// Stream live prices (mock feed unless a URL is given).
    Live {
        /// Websocket endpoint; omit to use the built-in mock feed.
        #[arg(long)]
        url: Option<String>,
    },
    /// Train and print the regime parameters for a date.
    Train {
        /// Session date, YYYY-MM-DD.
        date: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();

    let config = SimConfig::load(&cli.config)?;
    if let Err(errors) = config.validate() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }

    match cli.command {
        Commands::Backtest { date, json, report } => {
            run_backtest(&config, &date, json, report).await
        }
        Commands::Live { url } => run_live(&config, url).await,
        Commands::Train { date } => run_train(&date),
    }
}

async fn run_backtest(
    config: &SimConfig,
    date: &str,
    json: bool,
    report: bool,
) -> anyhow::Result<()> {
    let date = parse_date(date)?;
    let result = run_session(date, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_session(&result);
    }

    if report {
        let reporter = GeminiReporter::from_env(
            config.report.model.clone(),
            config.report.max_trades_in_prompt,
        );
        let text = reporter.summarize(&result.analysis, &result.trades).await;
        println!("\nANALYST REPORT\n{}", "-".repeat(60));
        println!("{text}");
    }
    Ok(())
}

fn print_session(result: &SessionResult) {
    println!("Session {} | regime: {}", result.date, result.params.regime);
    println!(
        "Model: bias {:+.3}, vol tier {:.1}, momentum seed {:.1}",
        result.params.trend_bias,
        result.params.base_vol_threshold,
        result.params.momentum_weight
    );
    println!();

    if result.trades.is_empty() {
        println!("No trades taken.");
    } else {
        for t in &result.trades {
            let reason = t
                .exit_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "open".to_string());
            println!(
                "{} {} {:>5} {:>8.2} -> {:>8.2}  {:>7.2}  {:>3}m  {}",
                t.id,
                t.time,
                t.direction.to_string(),
                t.entry_price,
                t.exit_price.unwrap_or(t.entry_price),
                t.profit.unwrap_or(0.0),
                t.duration_minutes.unwrap_or(0),
                reason,
            );
        }
    }
    println!("\nRejections logged: {}", result.rejections.len());
    println!();
    result.analysis.print_summary();
}

async fn run_live(config: &SimConfig, url: Option<String>) -> anyhow::Result<()> {
    let tick = Duration::from_secs(config.feed.tick_interval_secs);
    let feed = match url.or_else(|| config.feed.url.clone()) {
        Some(url) => LiveFeed::new(url, config.symbol.clone(), tick),
        None => LiveFeed::mock(config.symbol.clone(), tick),
    };
    let (handle, mut events) = feed.connect();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down feed");
                handle.disconnect();
                break;
            }
            event = events.recv() => {
                match event {
                    Some(FeedEvent::Bar(bar)) => {
                        info!("{} {} {:.2} vol {}", config.symbol, bar.time, bar.close, bar.volume);
                    }
                    Some(FeedEvent::Disconnected) => warn!("feed disconnected, waiting for reconnect"),
                    Some(FeedEvent::Error(e)) => error!("feed error: {e}"),
                    None => break,
                }
            }
        }
    }
    Ok(())
}

fn run_train(date: &str) -> anyhow::Result<()> {
    let date = parse_date(date)?;
    let params = train_model(date);
    println!("Regime for {date}: {}", params.regime);
    println!("  trend bias:       {:+.4}", params.trend_bias);
    println!("  vol tier:         {:.1}", params.base_vol_threshold);
    println!("  momentum weight:  {:.1}", params.momentum_weight);
    Ok(())
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}
