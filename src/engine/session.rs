//! Full-session backtest orchestration.
//!
//! One sequential pass over the synthesized bars: the forecaster enriches
//! bar `i`, then the trading engine acts on it. The trading engine only ever
//! reads state at or before the current index, so the interleaving observes
//! exactly what two separate passes would.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::config::SimConfig;
use crate::engine::{analyze, ForecastEngine, MarketAnalysis, TradingEngine};
use crate::ml::{train_model, ModelParameters};
use crate::sim::generate_session;
use crate::types::{Bar, TradeRejection, TradeSignal};

/// Everything one simulated session produces.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub date: NaiveDate,
    pub params: ModelParameters,
    pub bars: Vec<Bar>,
    pub trades: Vec<TradeSignal>,
    pub rejections: Vec<TradeRejection>,
    pub analysis: MarketAnalysis,
}

/// Run the complete pipeline for one date.
pub fn run_session(date: NaiveDate, config: &SimConfig) -> SessionResult {
    let params = train_model(date);
    info!("session {date}: regime {}", params.regime);

    let mut bars = generate_session(date, config.base_price);
    let mut forecaster = ForecastEngine::new(&params);
    let mut trader = TradingEngine::new(&params, config);

    for i in 0..bars.len() {
        let features = forecaster.process_bar(&mut bars, i).unwrap_or_default();
        trader.on_bar(&bars, i, features);
    }

    let (trades, rejections) = trader.finish();
    let analysis = analyze(&trades);
    info!(
        "session {date}: {} trades, {} rejections, net ${:.2}",
        trades.len(),
        rejections.len(),
        analysis.total_gain
    );

    SessionResult {
        date,
        params,
        bars,
        trades,
        rejections,
        analysis,
    }
}
