//! Trading state machine: entry gating, rejection diagnostics and exits.

use tracing::debug;

use crate::config::SimConfig;
use crate::ml::{FeatureVector, ModelParameters};
use crate::types::{
    round_cents, Bar, Direction, ExitReason, RejectionReason, TradeRejection, TradeSignal,
    TradeStatus,
};

/// Bars of history required before the engine will act.
pub const TRADING_START: usize = 30;

const MIN_EFFECTIVE_THRESHOLD: f64 = 0.00001;
const DEFAULT_REALIZED_VOL: f64 = 8.0;
const VOL_MULT_MIN: f64 = 0.6;
const VOL_MULT_MAX: f64 = 2.5;
const BIAS_IMPACT_SCALE: f64 = 0.3;
const BIAS_IMPACT_CAP: f64 = 0.25;
const EXHAUSTION_MOVE_PCT: f64 = 0.0025;
const EXHAUSTION_SPAN: usize = 5;
const BREAKEVEN_MOVE_PCT: f64 = 0.0010;
const CONVERGENCE_EPS: f64 = 0.0002;
const MAX_TRADE_MINUTES: i64 = 20;
const END_OF_DAY_WINDOW: usize = 10;
const REJECTION_LOG_SPACING: usize = 15;

/// One open position at a time, with full entry and exit bookkeeping.
pub struct TradingEngine {
    trend_bias: f64,
    vol_tier: f64,
    base_entry_threshold: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    position: Option<TradeSignal>,
    trades: Vec<TradeSignal>,
    rejections: Vec<TradeRejection>,
    last_rejection_bar: usize,
}

impl TradingEngine {
    pub fn new(params: &ModelParameters, config: &SimConfig) -> Self {
        Self {
            trend_bias: params.trend_bias,
            vol_tier: params.base_vol_threshold,
            base_entry_threshold: config.base_entry_threshold,
            stop_loss_pct: config.stop_loss_pct,
            take_profit_pct: config.take_profit_pct,
            position: None,
            trades: Vec::new(),
            rejections: Vec::new(),
            last_rejection_bar: 0,
        }
    }

    /// Evaluate bar `i`. Bars without a prediction are skipped outright.
    pub fn on_bar(&mut self, bars: &[Bar], i: usize, features: FeatureVector) {
        if i < TRADING_START {
            return;
        }
        let bar = &bars[i];
        let Some(prediction) = bar.prediction else {
            return;
        };

        // Realized vol of zero means the column has not stabilized yet, so
        // it gets the same conservative default as a missing value.
        let realized = bar
            .realized_vol
            .filter(|&v| v != 0.0)
            .unwrap_or(DEFAULT_REALIZED_VOL);
        let vol_multiplier = (realized / 10.0).clamp(VOL_MULT_MIN, VOL_MULT_MAX);
        let initial_threshold = self.base_entry_threshold * self.vol_tier * vol_multiplier;
        let effective_threshold = initial_threshold.max(MIN_EFFECTIVE_THRESHOLD);

        let divergence = (prediction - bar.close) / bar.close;
        let end_of_day = i + END_OF_DAY_WINDOW >= bars.len();

        if self.position.is_some() {
            self.manage_position(bar, divergence, end_of_day);
        } else if !end_of_day {
            self.try_enter(
                bars,
                i,
                divergence,
                initial_threshold,
                effective_threshold,
                vol_multiplier,
                features,
            );
        }
    }

    pub fn finish(self) -> (Vec<TradeSignal>, Vec<TradeRejection>) {
        if self.position.is_some() {
            debug!("session ended with a position still open");
        }
        (self.trades, self.rejections)
    }

    #[allow(clippy::too_many_arguments)]
    fn try_enter(
        &mut self,
        bars: &[Bar],
        i: usize,
        divergence: f64,
        initial_threshold: f64,
        effective_threshold: f64,
        vol_multiplier: f64,
        features: FeatureVector,
    ) {
        let bar = &bars[i];
        let price_before = bars[i - EXHAUSTION_SPAN].close;
        let recent_move = (bar.close - price_before) / price_before;
        let exhausted = recent_move.abs() > EXHAUSTION_MOVE_PCT;

        if divergence.abs() > MIN_EFFECTIVE_THRESHOLD {
            self.classify_rejection(
                bar,
                i,
                divergence,
                initial_threshold,
                effective_threshold,
                vol_multiplier,
                features,
                exhausted,
                recent_move,
            );
        }
        if exhausted {
            return;
        }

        let (long_threshold, short_threshold) =
            self.directional_thresholds(effective_threshold, features.slope);

        if divergence > long_threshold {
            self.open_position(bar, i, Direction::Long, divergence);
        } else if divergence < -short_threshold {
            self.open_position(bar, i, Direction::Short, divergence);
        }
    }

    fn directional_thresholds(&self, threshold: f64, slope: f64) -> (f64, f64) {
        let bias_impact = (self.trend_bias * BIAS_IMPACT_SCALE).clamp(-BIAS_IMPACT_CAP, BIAS_IMPACT_CAP);
        let mut long_threshold = threshold * (1.0 - bias_impact);
        let mut short_threshold = threshold * (1.0 + bias_impact);

        // Fighting the tape costs extra conviction, in two tiers.
        if slope < -0.02 {
            long_threshold *= 1.15;
        }
        if slope < -0.05 {
            long_threshold *= 1.1;
        }
        if slope > 0.02 {
            short_threshold *= 1.15;
        }
        if slope > 0.05 {
            short_threshold *= 1.1;
        }
        (long_threshold, short_threshold)
    }

    #[allow(clippy::too_many_arguments)]
    fn classify_rejection(
        &mut self,
        bar: &Bar,
        i: usize,
        divergence: f64,
        initial_threshold: f64,
        effective_threshold: f64,
        vol_multiplier: f64,
        features: FeatureVector,
        exhausted: bool,
        recent_move: f64,
    ) {
        // Diagnostic mirror of the entry gate. Recomputed here rather than
        // shared so the classification can evolve independently of the gate.
        let bias_impact =
            (self.trend_bias * BIAS_IMPACT_SCALE).clamp(-BIAS_IMPACT_CAP, BIAS_IMPACT_CAP);
        let mut long_threshold = effective_threshold * (1.0 - bias_impact);
        let mut short_threshold = effective_threshold * (1.0 + bias_impact);
        if features.slope < -0.02 {
            long_threshold *= 1.15;
        }
        if features.slope < -0.05 {
            long_threshold *= 1.1;
        }
        if features.slope > 0.02 {
            short_threshold *= 1.15;
        }
        if features.slope > 0.05 {
            short_threshold *= 1.1;
        }

        let classified = if exhausted {
            Some((
                RejectionReason::Exhaustion,
                format!(
                    "Price spike of {:.2}% in 5m detected. Waiting for stability.",
                    recent_move * 100.0
                ),
                effective_threshold,
            ))
        } else if divergence > 0.0
            && divergence < long_threshold
            && divergence > initial_threshold
        {
            Some((
                RejectionReason::TrendFilter,
                format!(
                    "Long signal (+{:.3}%) too weak to fight negative momentum ({:.4}). Req: {:.3}%",
                    divergence * 100.0,
                    features.slope,
                    long_threshold * 100.0
                ),
                long_threshold,
            ))
        } else if divergence < 0.0
            && divergence.abs() < short_threshold
            && divergence.abs() > initial_threshold
        {
            Some((
                RejectionReason::TrendFilter,
                format!(
                    "Short signal ({:.3}%) too weak to fight positive momentum ({:.4}). Req: {:.3}%",
                    divergence * 100.0,
                    features.slope,
                    short_threshold * 100.0
                ),
                short_threshold,
            ))
        } else if divergence.abs() < effective_threshold {
            Some((
                RejectionReason::LowConviction,
                format!(
                    "Divergence {:.3}% below dynamic threshold {:.3}% (Vol Mult: {:.1}x)",
                    divergence * 100.0,
                    effective_threshold * 100.0,
                    vol_multiplier
                ),
                effective_threshold,
            ))
        } else {
            None
        };

        let Some((reason, details, threshold_required)) = classified else {
            return;
        };

        // Low-conviction noise is rate limited; structural rejections always
        // get through.
        let spaced = i - self.last_rejection_bar > REJECTION_LOG_SPACING;
        let always = matches!(
            reason,
            RejectionReason::TrendFilter | RejectionReason::Exhaustion
        );
        if spaced || always {
            debug!("bar {i}: rejected {} ({})", reason, details);
            self.rejections.push(TradeRejection {
                id: format!("REJ-{i}"),
                time: bar.time.clone(),
                timestamp: bar.timestamp,
                reason,
                details,
                divergence,
                threshold_required,
            });
            self.last_rejection_bar = i;
        }
    }

    fn open_position(&mut self, bar: &Bar, i: usize, direction: Direction, divergence: f64) {
        let (stop_loss, take_profit) = match direction {
            Direction::Long => (
                round_cents(bar.close * (1.0 - self.stop_loss_pct)),
                round_cents(bar.close * (1.0 + self.take_profit_pct)),
            ),
            Direction::Short => (
                round_cents(bar.close * (1.0 + self.stop_loss_pct)),
                round_cents(bar.close * (1.0 - self.take_profit_pct)),
            ),
        };
        debug!(
            "bar {i}: {} entry at {:.2} (divergence {:+.4}%)",
            direction,
            bar.close,
            divergence * 100.0
        );
        self.position = Some(TradeSignal {
            id: format!("TRD-{i}"),
            time: bar.time.clone(),
            timestamp: bar.timestamp,
            direction,
            entry_price: bar.close,
            predicted_price: bar.prediction.unwrap_or(bar.close),
            stop_loss,
            take_profit,
            status: TradeStatus::Open,
            exit_time: None,
            exit_price: None,
            exit_reason: None,
            profit: None,
            duration_minutes: None,
        });
    }

    fn manage_position(&mut self, bar: &Bar, divergence: f64, end_of_day: bool) {
        let Some(trade) = self.position.as_mut() else {
            return;
        };

        // Breakeven ratchet: once the move covers the breakeven distance,
        // the stop migrates to entry, never backwards.
        if trade.unrealized_pct(bar.close) >= BREAKEVEN_MOVE_PCT {
            match trade.direction {
                Direction::Long if trade.stop_loss < trade.entry_price => {
                    trade.stop_loss = trade.entry_price;
                }
                Direction::Short if trade.stop_loss > trade.entry_price => {
                    trade.stop_loss = trade.entry_price;
                }
                _ => {}
            }
        }

        let mut exit = match trade.direction {
            Direction::Long => {
                if bar.close <= trade.stop_loss {
                    Some(ExitReason::StopLoss)
                } else if bar.close >= trade.take_profit {
                    Some(ExitReason::TakeProfit)
                } else {
                    None
                }
            }
            Direction::Short => {
                if bar.close >= trade.stop_loss {
                    Some(ExitReason::StopLoss)
                } else if bar.close <= trade.take_profit {
                    Some(ExitReason::TakeProfit)
                } else {
                    None
                }
            }
        };

        if exit.is_none() {
            if divergence.abs() < CONVERGENCE_EPS {
                exit = Some(ExitReason::Convergence);
            } else if trade.direction == Direction::Long && divergence < -CONVERGENCE_EPS {
                exit = Some(ExitReason::Reversal);
            } else if trade.direction == Direction::Short && divergence > CONVERGENCE_EPS {
                exit = Some(ExitReason::Reversal);
            }
        }

        if exit.is_none() {
            let held = (bar.timestamp - trade.timestamp).num_minutes();
            if held >= MAX_TRADE_MINUTES {
                exit = Some(ExitReason::TimeOut);
            }
        }

        // The closing window trumps every other verdict.
        if end_of_day {
            exit = Some(ExitReason::EndOfDay);
        }

        if let Some(reason) = exit {
            self.close_position(bar, reason);
        }
    }

    fn close_position(&mut self, bar: &Bar, reason: ExitReason) {
        let Some(mut trade) = self.position.take() else {
            return;
        };
        let pnl = match trade.direction {
            Direction::Long => bar.close - trade.entry_price,
            Direction::Short => trade.entry_price - bar.close,
        };
        trade.exit_time = Some(bar.time.clone());
        trade.exit_price = Some(bar.close);
        trade.exit_reason = Some(reason);
        trade.profit = Some(round_cents(pnl));
        trade.duration_minutes = Some((bar.timestamp - trade.timestamp).num_minutes());
        trade.status = TradeStatus::Closed;
        debug!(
            "closed {} at {:.2}: {} ({:+.2})",
            trade.id,
            bar.close,
            reason,
            trade.profit.unwrap_or(0.0)
        );
        self.trades.push(trade);
    }
}
