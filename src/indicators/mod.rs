//! Rolling indicator math over minute-bar slices.
//!
//! All helpers are pure functions of the bar history up to an index. Values
//! that would be undefined (short windows, non-positive logs) recover with
//! neutral defaults instead of propagating NaN.

use crate::types::Bar;

pub const VOLUME_MA_WINDOW: usize = 5;
pub const VOLATILITY_WINDOW: usize = 30;

/// Simple mean of the last `window` closes ending at `end` (inclusive).
/// Requires at least `window` bars at or before `end`.
pub fn sma_close(bars: &[Bar], end: usize, window: usize) -> f64 {
    debug_assert!(window >= 1 && end + 1 >= window, "window {window} exceeds history at {end}");
    let start = end + 1 - window;
    let sum: f64 = bars[start..=end].iter().map(|b| b.close).sum();
    sum / window as f64
}

/// Mean volume of the last [`VOLUME_MA_WINDOW`] bars, or the bar's own volume
/// while the window is still filling.
pub fn volume_ma(bars: &[Bar], i: usize) -> f64 {
    if i + 1 >= VOLUME_MA_WINDOW {
        let sum: u64 = bars[i + 1 - VOLUME_MA_WINDOW..=i].iter().map(|b| b.volume).sum();
        sum as f64 / VOLUME_MA_WINDOW as f64
    } else {
        bars[i].volume as f64
    }
}

/// One step of on-balance volume: add volume on an up close, subtract on a
/// down close, hold when unchanged.
pub fn obv_step(prev_obv: f64, prev_close: f64, bar: &Bar) -> f64 {
    if bar.close > prev_close {
        prev_obv + bar.volume as f64
    } else if bar.close < prev_close {
        prev_obv - bar.volume as f64
    } else {
        prev_obv
    }
}

/// Parkinson high-low volatility over the last [`VOLATILITY_WINDOW`] bars,
/// in basis points. `None` until the window fills.
pub fn parkinson_volatility(bars: &[Bar], i: usize) -> Option<f64> {
    if i < VOLATILITY_WINDOW {
        return None;
    }
    let mut sum_range_sq = 0.0;
    for j in 0..VOLATILITY_WINDOW {
        let bar = &bars[i - j];
        let high = if bar.high > 0.0 { bar.high } else { bar.close };
        let low = if bar.low > 0.0 { bar.low } else { bar.close };
        let ratio = high / low;
        if ratio > 0.0 && ratio.is_finite() {
            let ln_hl = ratio.ln();
            sum_range_sq += ln_hl * ln_hl;
        }
    }
    let k = 1.0 / (4.0 * 2.0_f64.ln());
    Some(((k * sum_range_sq) / VOLATILITY_WINDOW as f64).sqrt() * 10_000.0)
}

/// Realized volatility: standard deviation of the last 30 one-minute log
/// returns, in basis points. `None` until the window fills.
pub fn realized_volatility(bars: &[Bar], i: usize) -> Option<f64> {
    if i < VOLATILITY_WINDOW {
        return None;
    }
    let mut returns = [0.0; VOLATILITY_WINDOW];
    for (j, ret) in returns.iter_mut().enumerate() {
        let curr = bars[i - j].close;
        let prev = bars[i - j - 1].close;
        let r = (curr / prev).ln();
        *ret = if r.is_finite() { r } else { 0.0 };
    }
    let n = VOLATILITY_WINDOW as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() * 10_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::session_open;
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let open = session_open(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let mut b = Bar::at_minute(open, i, c);
                b.open = c;
                b.high = c;
                b.low = c;
                b.volume = 10_000;
                b
            })
            .collect()
    }

    #[test]
    fn volume_ma_uses_own_volume_until_window_fills() {
        let mut bars = bars_from_closes(&[1.0; 10]);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = (i as u64 + 1) * 1000;
        }
        assert_eq!(volume_ma(&bars, 2), 3000.0);
        // Last five of 1000..=7000 is 3000+4000+5000+6000+7000.
        assert_eq!(volume_ma(&bars, 6), 5000.0);
    }

    #[test]
    fn sma_close_averages_the_tail() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sma_close(&bars, 4, 3), 4.0);
        assert_eq!(sma_close(&bars, 4, 5), 3.0);
    }

    #[test]
    #[should_panic(expected = "exceeds history")]
    fn sma_close_rejects_short_history() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        sma_close(&bars, 2, 5);
    }

    #[test]
    fn obv_adds_subtracts_and_holds() {
        let bars = bars_from_closes(&[100.0, 101.0, 100.5, 100.5]);
        let mut obv = 0.0;
        obv = obv_step(obv, bars[0].close, &bars[1]);
        assert_eq!(obv, 10_000.0);
        obv = obv_step(obv, bars[1].close, &bars[2]);
        assert_eq!(obv, 0.0);
        obv = obv_step(obv, bars[2].close, &bars[3]);
        assert_eq!(obv, 0.0);
    }

    #[test]
    fn volatility_none_before_window() {
        let bars = bars_from_closes(&[500.0; 31]);
        assert!(parkinson_volatility(&bars, 29).is_none());
        assert!(realized_volatility(&bars, 29).is_none());
    }

    #[test]
    fn realized_vol_zero_for_constant_prices() {
        let bars = bars_from_closes(&[500.0; 40]);
        assert_eq!(realized_volatility(&bars, 35), Some(0.0));
    }

    #[test]
    fn parkinson_matches_hand_computation() {
        // Every bar has high/low = e, so ln(h/l)^2 = 1 for all 30 bars.
        let mut bars = bars_from_closes(&[500.0; 40]);
        for bar in bars.iter_mut() {
            bar.high = 500.0 * std::f64::consts::E;
            bar.low = 500.0;
        }
        let expected = (1.0 / (4.0 * 2.0_f64.ln())).sqrt() * 10_000.0;
        let got = parkinson_volatility(&bars, 30).unwrap();
        assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn parkinson_falls_back_to_close_when_wicks_missing() {
        // Unenriched bars (high/low zero) contribute nothing.
        let open = session_open(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let bars: Vec<Bar> = (0..40).map(|i| Bar::at_minute(open, i, 500.0)).collect();
        assert_eq!(parkinson_volatility(&bars, 30), Some(0.0));
    }
}
