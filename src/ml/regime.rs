//! Daily regime trainer.
//!
//! Fits session-level model parameters from the daily anchors of the same
//! calendar month before the target date. Recent days dominate through an
//! exponential recency weight; a streak of same-direction days amplifies the
//! bias. With no prior data the trainer hands back conservative baselines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{self, DailyAnchor};

const RECENCY_DECAY: f64 = 0.85;
const PERSISTENCE_STREAK: i64 = 3;
const PERSISTENCE_AMPLIFIER: f64 = 1.5;

/// Session-level parameters produced by the trainer and consumed by the
/// forecast and trading engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Directional lean in [-1.5, 1.5]; positive favors longs.
    pub trend_bias: f64,
    /// Entry-threshold scale tier: 0.8, 1.0 or 1.5.
    pub base_vol_threshold: f64,
    /// Seed for the adaptive momentum weight: 1.0 or 1.5.
    pub momentum_weight: f64,
    /// Human-readable regime label.
    pub regime: String,
}

impl ModelParameters {
    pub fn baseline() -> Self {
        Self {
            trend_bias: 0.0,
            base_vol_threshold: 1.0,
            momentum_weight: 0.5,
            regime: "Baseline (No Prior Data)".to_string(),
        }
    }
}

/// Train parameters for `date` from the stored daily history.
pub fn train_model(date: NaiveDate) -> ModelParameters {
    let history = data::prior_days_in_month(date);
    let params = train_from_history(&history);
    debug!(
        "regime for {date}: {} (bias {:+.3}, vol tier {:.1}, momentum {:.1})",
        params.regime, params.trend_bias, params.base_vol_threshold, params.momentum_weight
    );
    params
}

/// Train from an explicit ascending day sequence, most recent last.
pub fn train_from_history(days: &[DailyAnchor]) -> ModelParameters {
    if days.is_empty() {
        return ModelParameters::baseline();
    }

    let mut weighted_return_sum = 0.0;
    let mut weighted_vol_sum = 0.0;
    let mut weight_sum = 0.0;

    for (i, day) in days.iter().enumerate() {
        let weight = RECENCY_DECAY.powi((days.len() - 1 - i) as i32);
        let daily_return = (day.close - day.open) / day.open;
        let daily_range = (day.high - day.low) / day.open;
        weighted_return_sum += finite_or_zero(daily_return) * weight;
        weighted_vol_sum += finite_or_zero(daily_range) * weight;
        weight_sum += weight;
    }

    let avg_return = weighted_return_sum / weight_sum;
    let avg_vol = weighted_vol_sum / weight_sum;

    // Signed count of consecutive same-direction days ending at the most
    // recent one. Equal open and close counts as a down day.
    let last_dir = day_direction(days[days.len() - 1]);
    let mut persistence: i64 = 0;
    for day in days.iter().rev() {
        if day_direction(*day) != last_dir {
            break;
        }
        persistence += last_dir;
    }

    let mut trend_bias = (avg_return * 100.0).clamp(-1.0, 1.0);
    let persistent = persistence.abs() >= PERSISTENCE_STREAK;
    if persistent {
        trend_bias *= PERSISTENCE_AMPLIFIER;
    }

    if !trend_bias.is_finite() {
        trend_bias = 0.0;
    }
    let avg_vol = if avg_vol.is_finite() { avg_vol } else { 0.0 };

    let base_vol_threshold = if avg_vol > 0.012 {
        1.5
    } else if avg_vol < 0.005 {
        0.8
    } else {
        1.0
    };

    let momentum_weight = if trend_bias.abs() > 0.2 { 1.5 } else { 1.0 };

    let mut regime = if trend_bias > 0.1 {
        "Bullish Trend".to_string()
    } else if trend_bias < -0.1 {
        "Bearish Trend".to_string()
    } else {
        "Choppy / Neutral".to_string()
    };
    if persistent {
        regime.push_str(" (Persistent)");
    }
    if avg_vol > 0.01 {
        regime.push_str(" [High Vol]");
    } else {
        regime.push_str(" [Stable]");
    }

    ModelParameters {
        trend_bias,
        base_vol_threshold,
        momentum_weight,
        regime,
    }
}

fn day_direction(day: DailyAnchor) -> i64 {
    if day.close > day.open {
        1
    } else {
        -1
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
