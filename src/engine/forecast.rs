//! Per-bar feature extraction and horizon-ahead price forecasting.

use tracing::trace;

use crate::indicators::{
    obv_step, parkinson_volatility, realized_volatility, sma_close, volume_ma,
};
use crate::ml::{
    AdaptiveWeights, FeatureStore, FeatureVector, ModelParameters, LOOKBACK_WINDOW,
    PREDICTION_HORIZON,
};
use crate::types::{round_cents, Bar};

const WARMUP_BARS: usize = 5;
const SMOOTHING_START: usize = 20;
const PRICE_SMA_WINDOW: usize = 5;
const OBV_SLOPE_SPAN: usize = 10;
const MAX_DEVIATION_PCT: f64 = 0.05;
const TREND_BIAS_SCALE: f64 = 0.1;

/// Streaming forecaster: walks the session once, enriching each bar with
/// indicators and a horizon-ahead prediction while the NLMS weights adapt
/// from errors observed a full horizon earlier.
pub struct ForecastEngine {
    weights: AdaptiveWeights,
    features: FeatureStore,
    trend_bias: f64,
}

impl ForecastEngine {
    pub fn new(params: &ModelParameters) -> Self {
        Self {
            weights: AdaptiveWeights::new(params.momentum_weight),
            features: FeatureStore::default(),
            trend_bias: params.trend_bias,
        }
    }

    pub fn weights(&self) -> &AdaptiveWeights {
        &self.weights
    }

    /// Process bar `i` in place. Bars before the warmup stay untouched.
    /// Returns the feature snapshot captured at this bar.
    pub fn process_bar(&mut self, bars: &mut [Bar], i: usize) -> Option<FeatureVector> {
        if i < WARMUP_BARS {
            return None;
        }
        let close = bars[i].close;

        bars[i].volume_ma = Some(volume_ma(bars, i));
        let prev_obv = bars[i - 1].obv.unwrap_or(0.0);
        bars[i].obv = Some(obv_step(prev_obv, bars[i - 1].close, &bars[i]));
        bars[i].parkinson_vol = parkinson_volatility(bars, i);
        bars[i].realized_vol = realized_volatility(bars, i);

        let features = self.extract_features(bars, i);
        self.features.insert(i, features);

        // Delayed supervision: the prediction made one horizon ago has now
        // resolved, so replay its features against the realized change.
        if i >= PREDICTION_HORIZON {
            let t = i - PREDICTION_HORIZON;
            if t >= WARMUP_BARS {
                if let Some(past) = self.features.get(t) {
                    let actual_change = close - bars[t].close;
                    let error = self.weights.update(&past, actual_change);
                    trace!("bar {i}: trained on t={t}, error {error:+.4}");
                }
            }
        }

        let delta = self.weights.predict_delta(&features);
        let mut prediction = close + delta + self.trend_bias * TREND_BIAS_SCALE;
        if !prediction.is_finite() {
            prediction = close;
        }
        let max_deviation = close * MAX_DEVIATION_PCT;
        prediction = round_cents(prediction.clamp(close - max_deviation, close + max_deviation));

        bars[i].prediction = Some(prediction);
        if i + PREDICTION_HORIZON < bars.len() {
            bars[i + PREDICTION_HORIZON].predicted_here = Some(prediction);
        }

        Some(features)
    }

    fn extract_features(&self, bars: &[Bar], i: usize) -> FeatureVector {
        let close = bars[i].close;
        let lookback = i.min(LOOKBACK_WINDOW);
        let past_index = i - lookback;

        // Raw endpoint slope early in the session, 5-bar smoothed endpoints
        // once enough history exists for both ends.
        let mut current_anchor = close;
        let mut past_anchor = bars[past_index].close;
        if i >= SMOOTHING_START {
            current_anchor = sma_close(bars, i, PRICE_SMA_WINDOW);
            if past_index >= PRICE_SMA_WINDOW {
                past_anchor = sma_close(bars, past_index, PRICE_SMA_WINDOW);
            }
        }
        let slope = finite_or_zero((current_anchor - past_anchor) / lookback as f64);

        let obv_now = bars[i].obv.unwrap_or(0.0);
        let obv_start = if i >= OBV_SLOPE_SPAN {
            bars[i - OBV_SLOPE_SPAN]
                .obv
                .filter(|&v| v != 0.0)
                .unwrap_or(obv_now)
        } else {
            obv_now
        };
        let mut vol_ma = bars[i].volume_ma.unwrap_or(1.0);
        if vol_ma < 1.0 {
            vol_ma = 1.0;
        }
        let obv_slope = finite_or_zero((obv_now - obv_start) / OBV_SLOPE_SPAN as f64 / vol_ma);

        FeatureVector { slope, obv_slope }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::generate_session;
    use chrono::NaiveDate;

    fn run_forecast(date: NaiveDate) -> Vec<Bar> {
        let params = crate::ml::train_model(date);
        let mut bars = generate_session(date, 545.0);
        let mut engine = ForecastEngine::new(&params);
        for i in 0..bars.len() {
            engine.process_bar(&mut bars, i);
        }
        bars
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn warmup_bars_stay_unenriched() {
        let bars = run_forecast(date(2024, 5, 1));
        for bar in &bars[..5] {
            assert!(bar.prediction.is_none());
            assert!(bar.obv.is_none());
            assert!(bar.volume_ma.is_none());
        }
        for bar in &bars[5..] {
            assert!(bar.prediction.is_some());
            assert!(bar.obv.is_some());
        }
    }

    #[test]
    fn predictions_clamped_and_cent_rounded() {
        let bars = run_forecast(date(2024, 6, 18));
        for bar in &bars[5..] {
            let p = bar.prediction.unwrap();
            assert!(p.is_finite());
            assert!((p - bar.close).abs() <= bar.close * 0.05 + 1e-9);
            assert!((p * 100.0 - (p * 100.0).round()).abs() < 1e-6);
        }
    }

    #[test]
    fn predicted_here_links_back_one_horizon() {
        let bars = run_forecast(date(2024, 4, 25));
        for i in 5..bars.len() - PREDICTION_HORIZON {
            assert_eq!(bars[i + PREDICTION_HORIZON].predicted_here, bars[i].prediction);
        }
    }

    #[test]
    fn volatility_columns_fill_after_window() {
        let bars = run_forecast(date(2024, 4, 25));
        assert!(bars[29].realized_vol.is_none());
        assert!(bars[30].realized_vol.is_some());
        assert!(bars[30].parkinson_vol.is_some());
        assert!(bars[100].realized_vol.unwrap() >= 0.0);
    }

    #[test]
    fn weights_respect_floor_after_full_session() {
        let d = date(2024, 5, 1);
        let params = crate::ml::train_model(d);
        let mut bars = generate_session(d, 545.0);
        let mut engine = ForecastEngine::new(&params);
        for i in 0..bars.len() {
            engine.process_bar(&mut bars, i);
        }
        assert!(engine.weights().momentum >= 0.1);
        assert!(engine.weights().obv >= 0.1);
    }

    #[test]
    fn past_anchor_stays_raw_until_five_bars_precede_it() {
        use crate::types::session_open;

        let open = session_open(date(2024, 5, 1));
        let closes: Vec<f64> = (0..40)
            .map(|i| match i {
                0..=4 => 400.0 + 10.0 * i as f64,
                5 => 450.0,
                _ => 500.0,
            })
            .collect();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::at_minute(open, i, c))
            .collect();
        let engine = ForecastEngine::new(&crate::ml::ModelParameters::baseline());

        // i = 34 puts the past anchor at index 4, one short of a full
        // smoothing window, so the raw close 440 must be used.
        let f34 = engine.extract_features(&bars, 34);
        assert!((f34.slope - (500.0 - 440.0) / 30.0).abs() < 1e-9);

        // i = 35 puts it at index 5, where the 5-bar mean applies.
        let f35 = engine.extract_features(&bars, 35);
        let past_sma = (410.0 + 420.0 + 430.0 + 440.0 + 450.0) / 5.0;
        assert!((f35.slope - (500.0 - past_sma) / 30.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_pass_is_deterministic() {
        let a = run_forecast(date(2024, 7, 2));
        let b = run_forecast(date(2024, 7, 2));
        let preds = |bars: &[Bar]| bars.iter().map(|x| x.prediction).collect::<Vec<_>>();
        assert_eq!(preds(&a), preds(&b));
    }
}
