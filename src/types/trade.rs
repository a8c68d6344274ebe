use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    Closed,
}

/// Why an open position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Convergence,
    StopLoss,
    TakeProfit,
    Reversal,
    TimeOut,
    EndOfDay,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Convergence => write!(f, "Convergence"),
            ExitReason::StopLoss => write!(f, "Stop Loss"),
            ExitReason::TakeProfit => write!(f, "Take Profit"),
            ExitReason::Reversal => write!(f, "Reversal"),
            ExitReason::TimeOut => write!(f, "Time Out"),
            ExitReason::EndOfDay => write!(f, "End of Day"),
        }
    }
}

/// One position, open or completed. Created on entry, mutated in place while
/// open (the breakeven ratchet moves `stop_loss`), finalized on exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: String,
    /// Entry time label, "HH:MM".
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub entry_price: f64,
    pub predicted_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub status: TradeStatus,
    pub exit_time: Option<String>,
    pub exit_price: Option<f64>,
    pub exit_reason: Option<ExitReason>,
    /// Per-share P&L, fixed one-unit notional.
    pub profit: Option<f64>,
    pub duration_minutes: Option<i64>,
}

impl TradeSignal {
    /// Fractional gain of the open position at `price`, signed by direction.
    pub fn unrealized_pct(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Long => (price - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - price) / self.entry_price,
        }
    }

}

/// Why a near-miss signal did not become a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    Exhaustion,
    TrendFilter,
    LowConviction,
    HighVolatility,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::Exhaustion => write!(f, "Exhaustion"),
            RejectionReason::TrendFilter => write!(f, "Trend Filter"),
            RejectionReason::LowConviction => write!(f, "Low Conviction"),
            RejectionReason::HighVolatility => write!(f, "High Volatility"),
        }
    }
}

/// Append-only diagnostic record; never mutated after logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRejection {
    pub id: String,
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub reason: RejectionReason,
    pub details: String,
    pub divergence: f64,
    pub threshold_required: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_trade(direction: Direction, entry: f64) -> TradeSignal {
        TradeSignal {
            id: "TRD-30".to_string(),
            time: "10:00".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            direction,
            entry_price: entry,
            predicted_price: entry + 1.0,
            stop_loss: entry * 0.9985,
            take_profit: entry * 1.0030,
            status: TradeStatus::Open,
            exit_time: None,
            exit_price: None,
            exit_reason: None,
            profit: None,
            duration_minutes: None,
        }
    }

    #[test]
    fn unrealized_pct_is_signed_by_direction() {
        let long = open_trade(Direction::Long, 500.0);
        let short = open_trade(Direction::Short, 500.0);
        assert!(long.unrealized_pct(501.0) > 0.0);
        assert!(short.unrealized_pct(501.0) < 0.0);
        assert!((long.unrealized_pct(501.0) - 0.002).abs() < 1e-12);
    }
}
