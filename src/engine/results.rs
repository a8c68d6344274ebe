//! Session performance summary.

use serde::{Deserialize, Serialize};

use crate::types::{round_cents, TradeSignal};

/// Aggregate statistics over the closed trades of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    /// Net profit in dollars, rounded to cents.
    pub total_gain: f64,
    pub total_trades: usize,
    /// Winning-trade percentage rounded to one decimal, 0 when no trades.
    pub accuracy: f64,
    /// Largest peak-to-trough drop of the running profit curve, in dollars.
    pub max_drawdown: f64,
    /// Winning-trade fraction in [0, 1].
    pub win_rate: f64,
}

/// Fold the trade list into a [`MarketAnalysis`].
pub fn analyze(trades: &[TradeSignal]) -> MarketAnalysis {
    let profits: Vec<f64> = trades.iter().filter_map(|t| t.profit).collect();
    let total = profits.len();
    let wins = profits.iter().filter(|&&p| p > 0.0).count();

    let total_gain = round_cents(profits.iter().sum());
    let accuracy = if total > 0 {
        round_tenth(100.0 * wins as f64 / total as f64)
    } else {
        0.0
    };
    let win_rate = if total > 0 {
        wins as f64 / total as f64
    } else {
        0.0
    };

    let mut running = 0.0;
    let mut peak = 0.0_f64;
    let mut max_drawdown = 0.0_f64;
    for p in &profits {
        running += p;
        peak = peak.max(running);
        max_drawdown = max_drawdown.max(peak - running);
    }

    MarketAnalysis {
        total_gain,
        total_trades: total,
        accuracy,
        max_drawdown: round_cents(max_drawdown),
        win_rate,
    }
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

impl MarketAnalysis {
    pub fn print_summary(&self) {
        println!("{}", "=".repeat(60));
        println!("SESSION PERFORMANCE");
        println!("{}", "=".repeat(60));
        println!("Total trades:   {}", self.total_trades);
        println!("Net profit:     ${:.2}", self.total_gain);
        println!("Accuracy:       {:.1}%", self.accuracy);
        println!("Win rate:       {:.2}", self.win_rate);
        println!("Max drawdown:   ${:.2}", self.max_drawdown);
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{session_open, Direction, ExitReason, TradeStatus};
    use chrono::NaiveDate;

    fn closed_trade(i: usize, profit: f64) -> TradeSignal {
        let open = session_open(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        TradeSignal {
            id: format!("TRD-{i}"),
            time: "10:00".to_string(),
            timestamp: open,
            direction: Direction::Long,
            entry_price: 500.0,
            predicted_price: 500.5,
            stop_loss: 499.25,
            take_profit: 501.5,
            status: TradeStatus::Closed,
            exit_time: Some("10:10".to_string()),
            exit_price: Some(500.0 + profit),
            exit_reason: Some(ExitReason::TakeProfit),
            profit: Some(profit),
            duration_minutes: Some(10),
        }
    }

    #[test]
    fn empty_session_is_all_zeros() {
        let a = analyze(&[]);
        assert_eq!(a.total_gain, 0.0);
        assert_eq!(a.total_trades, 0);
        assert_eq!(a.accuracy, 0.0);
        assert_eq!(a.max_drawdown, 0.0);
        assert_eq!(a.win_rate, 0.0);
    }

    #[test]
    fn known_profit_sequence() {
        let trades = vec![
            closed_trade(30, 1.0),
            closed_trade(60, -2.0),
            closed_trade(90, 3.0),
        ];
        let a = analyze(&trades);
        assert_eq!(a.total_gain, 2.0);
        assert_eq!(a.total_trades, 3);
        assert_eq!(a.accuracy, 66.7);
        // Curve 1.0 -> -1.0 -> 2.0; worst drop from the 1.0 peak is 2.0.
        assert_eq!(a.max_drawdown, 2.0);
        assert!((a.win_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn all_losers_draw_down_from_zero() {
        let trades = vec![closed_trade(30, -1.5), closed_trade(60, -0.5)];
        let a = analyze(&trades);
        assert_eq!(a.total_gain, -2.0);
        assert_eq!(a.accuracy, 0.0);
        assert_eq!(a.max_drawdown, 2.0);
    }
}
