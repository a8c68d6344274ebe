use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Minutes in a regular session (09:30 through 16:00 inclusive is 391 bars).
pub const SESSION_MINUTES: usize = 390;

/// One minute of the trading session.
///
/// `close` is the tick price produced by the synthesizer; open/high/low and
/// volume are filled by the enrichment pass, and the optional derived fields
/// by the forecast engine as the session is processed in time order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Display label, "HH:MM".
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub volume_ma: Option<f64>,
    pub obv: Option<f64>,
    /// Std-dev of 30 one-minute log returns, in basis points.
    pub realized_vol: Option<f64>,
    /// Parkinson high-low estimator over 30 bars, in basis points.
    pub parkinson_vol: Option<f64>,
    /// Forecast made at this bar for the bar 15 minutes ahead.
    pub prediction: Option<f64>,
    /// The forecast that was made 15 minutes earlier *for* this bar.
    pub predicted_here: Option<f64>,
}

impl Bar {
    pub fn at_minute(session_open: DateTime<Utc>, minute: usize, close: f64) -> Self {
        let timestamp = session_open + chrono::Duration::minutes(minute as i64);
        Self {
            time: timestamp.format("%H:%M").to_string(),
            timestamp,
            close,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            volume: 0,
            volume_ma: None,
            obv: None,
            realized_vol: None,
            parkinson_vol: None,
            prediction: None,
            predicted_here: None,
        }
    }
}

/// 09:30 on the given date. The simulation clock is naive wall time carried
/// as UTC; no exchange-timezone conversion is performed.
pub fn session_open(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(9, 30, 0)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
        .and_utc()
}

/// Round to cents, matching how prices are quoted throughout the simulator.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
