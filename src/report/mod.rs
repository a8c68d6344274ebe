//! Post-session analyst report.
//!
//! A session summary is rendered into a prompt and sent to the Gemini API.
//! The reporter degrades instead of failing: a missing API key or a dead
//! network both produce a fixed placeholder string so the session output
//! stays complete.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::engine::MarketAnalysis;
use crate::types::TradeSignal;

pub const NO_KEY_PLACEHOLDER: &str =
    "Simulation Mode: API key not found. Provide GEMINI_API_KEY to generate the analyst report.";
pub const UNAVAILABLE_PLACEHOLDER: &str =
    "Error connecting to the analyst service. Check your network or API quota.";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response contained no text")]
    EmptyResponse,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportClient: Send + Sync {
    /// Produce a narrative report for the session. Never fails; degraded
    /// backends return placeholder text.
    async fn summarize(&self, analysis: &MarketAnalysis, trades: &[TradeSignal]) -> String;
}

pub struct GeminiReporter {
    api_key: Option<String>,
    model: String,
    max_trades: usize,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiReporter {
    pub fn from_env(model: String, max_trades: usize) -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            model,
            max_trades,
            client: reqwest::Client::new(),
        }
    }

    fn build_prompt(&self, analysis: &MarketAnalysis, trades: &[TradeSignal]) -> String {
        let mut prompt = String::from(
            "You are a quantitative trading analyst. Review this intraday \
             mean-reversion session on SPY and give a concise assessment of \
             the strategy's behavior, strengths and weaknesses.\n\n",
        );
        prompt.push_str(&format!(
            "Session stats:\n\
             - Total trades: {}\n\
             - Net profit: ${:.2}\n\
             - Accuracy: {:.1}%\n\
             - Max drawdown: ${:.2}\n\n",
            analysis.total_trades, analysis.total_gain, analysis.accuracy, analysis.max_drawdown
        ));
        if !trades.is_empty() {
            prompt.push_str("Trades:\n");
            for trade in trades.iter().take(self.max_trades) {
                prompt.push_str(&format!(
                    "{} ({}): Entry {:.2} -> Exit {:.2} ({}m duration). Profit: {:.2}\n",
                    trade.time,
                    trade.direction,
                    trade.entry_price,
                    trade.exit_price.unwrap_or(trade.entry_price),
                    trade.duration_minutes.unwrap_or(0),
                    trade.profit.unwrap_or(0.0),
                ));
            }
        }
        prompt
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String, ReportError> {
        let url = format!("{API_BASE}/{}:generateContent?key={api_key}", self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response: GenerateResponse = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or(ReportError::EmptyResponse)
    }
}

#[async_trait]
impl ReportClient for GeminiReporter {
    async fn summarize(&self, analysis: &MarketAnalysis, trades: &[TradeSignal]) -> String {
        let Some(api_key) = self.api_key.clone() else {
            return NO_KEY_PLACEHOLDER.to_string();
        };
        let prompt = self.build_prompt(analysis, trades);
        match self.request(&api_key, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("analyst report unavailable: {e}");
                UNAVAILABLE_PLACEHOLDER.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::analyze;
    use crate::types::{session_open, Direction, ExitReason, TradeStatus};
    use chrono::NaiveDate;

    fn sample_trade() -> TradeSignal {
        let open = session_open(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        TradeSignal {
            id: "TRD-42".to_string(),
            time: "10:12".to_string(),
            timestamp: open,
            direction: Direction::Long,
            entry_price: 501.30,
            predicted_price: 501.80,
            stop_loss: 500.55,
            take_profit: 502.80,
            status: TradeStatus::Closed,
            exit_time: Some("10:20".to_string()),
            exit_price: Some(501.95),
            exit_reason: Some(ExitReason::TakeProfit),
            profit: Some(0.65),
            duration_minutes: Some(8),
        }
    }

    fn reporter_without_key() -> GeminiReporter {
        GeminiReporter {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            max_trades: 15,
            client: reqwest::Client::new(),
        }
    }

    #[test]
    fn prompt_includes_stats_and_trade_lines() {
        let trades = vec![sample_trade()];
        let analysis = analyze(&trades);
        let prompt = reporter_without_key().build_prompt(&analysis, &trades);
        assert!(prompt.contains("Total trades: 1"));
        assert!(prompt.contains("Net profit: $0.65"));
        assert!(prompt.contains("10:12 (LONG): Entry 501.30 -> Exit 501.95 (8m duration). Profit: 0.65"));
    }

    #[test]
    fn prompt_caps_the_trade_list() {
        let trades: Vec<TradeSignal> = (0..40).map(|_| sample_trade()).collect();
        let analysis = analyze(&trades);
        let prompt = reporter_without_key().build_prompt(&analysis, &trades);
        assert_eq!(prompt.matches("10:12 (LONG)").count(), 15);
    }

    #[tokio::test]
    async fn missing_key_degrades_to_placeholder() {
        let trades = vec![sample_trade()];
        let analysis = analyze(&trades);
        let report = reporter_without_key().summarize(&analysis, &trades).await;
        assert_eq!(report, NO_KEY_PLACEHOLDER);
    }

    #[tokio::test]
    async fn callers_accept_any_client_impl() {
        let mut mock = MockReportClient::new();
        mock.expect_summarize()
            .returning(|_, _| "Solid session.".to_string());

        let client: Box<dyn ReportClient> = Box::new(mock);
        let analysis = analyze(&[]);
        let report = client.summarize(&analysis, &[]).await;
        assert_eq!(report, "Solid session.");
    }
}
