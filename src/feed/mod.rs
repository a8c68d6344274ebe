//! Live price feed.
//!
//! Two modes behind one event stream: a built-in mock that emits a seeded
//! random walk at a fixed tick interval, and a real websocket client for a
//! Finnhub-style trade stream. Both deliver [`FeedEvent`]s over a bounded
//! channel; dropping or disconnecting the handle tears the task down.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::types::{round_cents, Bar};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const MOCK_BASE_PRICE: f64 = 590.0;
const MOCK_STEP_SCALE: f64 = 0.15;

#[derive(Debug, Clone)]
pub enum FeedEvent {
    Bar(Bar),
    Disconnected,
    Error(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("websocket connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Wire shape of one Finnhub-style trade frame.
#[derive(Debug, Deserialize)]
struct TradeFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Vec<TradeTick>,
}

#[derive(Debug, Deserialize)]
struct TradeTick {
    /// Last price.
    p: f64,
    /// Epoch milliseconds.
    t: i64,
    /// Share volume.
    #[serde(default)]
    v: f64,
}

pub struct LiveFeed {
    url: Option<String>,
    symbol: String,
    tick_interval: Duration,
}

/// Handle to the background feed task.
pub struct FeedHandle {
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub fn disconnect(&self) {
        self.task.abort();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl LiveFeed {
    /// Feed backed by a real websocket endpoint.
    pub fn new(url: String, symbol: String, tick_interval: Duration) -> Self {
        Self {
            url: Some(url),
            symbol,
            tick_interval,
        }
    }

    /// Built-in mock feed, deterministic per symbol.
    pub fn mock(symbol: String, tick_interval: Duration) -> Self {
        Self {
            url: None,
            symbol,
            tick_interval,
        }
    }

    /// Spawn the feed task and return its handle plus the event stream.
    pub fn connect(self) -> (FeedHandle, mpsc::Receiver<FeedEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let task = match self.url {
            Some(url) => {
                info!("connecting live feed for {} at {url}", self.symbol);
                tokio::spawn(run_websocket(url, self.symbol, tx))
            }
            None => {
                info!("starting mock feed for {}", self.symbol);
                tokio::spawn(run_mock(self.symbol, self.tick_interval, tx))
            }
        };
        (FeedHandle { task }, rx)
    }
}

async fn run_mock(symbol: String, tick_interval: Duration, tx: mpsc::Sender<FeedEvent>) {
    let mut rng = crate::sim::SeededRandom::new(&symbol);
    let mut price = MOCK_BASE_PRICE;

    let start = tokio::time::Instant::now() + tick_interval;
    let mut ticker = tokio::time::interval_at(start, tick_interval);
    loop {
        ticker.tick().await;

        let change = (rng.next() - 0.5) * MOCK_STEP_SCALE;
        price += change;
        let close = round_cents(price);
        let now = Utc::now();
        let bar = Bar {
            time: now.format("%H:%M").to_string(),
            timestamp: now,
            close,
            open: close,
            high: round_cents(price + change.abs()),
            low: round_cents(price - change.abs()),
            volume: (rng.next() * 5000.0).floor() as u64 + 100,
            volume_ma: None,
            obv: None,
            realized_vol: None,
            parkinson_vol: None,
            prediction: None,
            predicted_here: None,
        };
        if tx.send(FeedEvent::Bar(bar)).await.is_err() {
            debug!("mock feed receiver dropped, stopping");
            return;
        }
    }
}

async fn run_websocket(url: String, symbol: String, tx: mpsc::Sender<FeedEvent>) {
    loop {
        match stream_once(&url, &symbol, &tx).await {
            Ok(()) => {
                warn!("feed stream for {symbol} ended");
            }
            Err(e) => {
                error!("feed error for {symbol}: {e}");
                if tx.send(FeedEvent::Error(e.to_string())).await.is_err() {
                    return;
                }
            }
        }
        if tx.send(FeedEvent::Disconnected).await.is_err() {
            return;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
        info!("reconnecting feed for {symbol}");
    }
}

/// One connect-subscribe-stream cycle. Returns when the server closes.
async fn stream_once(
    url: &str,
    symbol: &str,
    tx: &mpsc::Sender<FeedEvent>,
) -> Result<(), FeedError> {
    let (stream, _) = connect_async(url).await?;
    let (mut write, mut read) = stream.split();

    let subscribe = serde_json::json!({ "type": "subscribe", "symbol": symbol });
    write.send(Message::Text(subscribe.to_string())).await?;
    info!("subscribed to {symbol}");

    while let Some(message) = read.next().await {
        match message? {
            Message::Text(text) => {
                let frame: TradeFrame = match serde_json::from_str(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        debug!("skipping unparseable frame: {e}");
                        continue;
                    }
                };
                if frame.kind != "trade" {
                    continue;
                }
                for tick in frame.data {
                    if tx.send(FeedEvent::Bar(tick_to_bar(&tick))).await.is_err() {
                        return Ok(());
                    }
                }
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

fn tick_to_bar(tick: &TradeTick) -> Bar {
    let timestamp: DateTime<Utc> = Utc
        .timestamp_millis_opt(tick.t)
        .single()
        .unwrap_or_else(Utc::now);
    let close = round_cents(tick.p);
    Bar {
        time: timestamp.format("%H:%M").to_string(),
        timestamp,
        close,
        open: close,
        high: close,
        low: close,
        volume: tick.v.max(0.0) as u64,
        volume_ma: None,
        obv: None,
        realized_vol: None,
        parkinson_vol: None,
        prediction: None,
        predicted_here: None,
    }
}
