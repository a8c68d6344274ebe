//! Runtime configuration.
//!
//! Loaded from a TOML file when one exists, otherwise defaults. Every field
//! has a default so a partial file only overrides what it names.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticker used for seeding the live feed and labeling output.
    pub symbol: String,
    /// Anchor price for fully synthetic sessions.
    pub base_price: f64,
    /// Base entry threshold as a price fraction, before regime and
    /// volatility scaling.
    pub base_entry_threshold: f64,
    /// Stop-loss distance as a fraction of the entry price.
    pub stop_loss_pct: f64,
    /// Take-profit distance as a fraction of the entry price.
    pub take_profit_pct: f64,
    pub feed: FeedSettings,
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Websocket endpoint; absent means the built-in mock feed.
    pub url: Option<String>,
    pub tick_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub model: String,
    pub max_trades_in_prompt: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            base_price: 545.0,
            base_entry_threshold: 0.00015,
            stop_loss_pct: 0.0015,
            take_profit_pct: 0.0030,
            feed: FeedSettings::default(),
            report: ReportSettings::default(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: None,
            tick_interval_secs: 1,
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_trades_in_prompt: 15,
        }
    }
}

impl SimConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            info!("config file {path} not found, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing config {path}"))?;
        info!("loaded config from {path}");
        Ok(config)
    }

    /// Collect every invalid field instead of stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.symbol.trim().is_empty() {
            errors.push("symbol must not be empty".to_string());
        }
        if self.base_price <= 0.0 {
            errors.push(format!("base_price must be positive, got {}", self.base_price));
        }
        if self.base_entry_threshold <= 0.0 {
            errors.push(format!(
                "base_entry_threshold must be positive, got {}",
                self.base_entry_threshold
            ));
        }
        if self.stop_loss_pct <= 0.0 {
            errors.push(format!(
                "stop_loss_pct must be positive, got {}",
                self.stop_loss_pct
            ));
        }
        if self.take_profit_pct <= 0.0 {
            errors.push(format!(
                "take_profit_pct must be positive, got {}",
                self.take_profit_pct
            ));
        }
        if self.feed.tick_interval_secs == 0 {
            errors.push("feed.tick_interval_secs must be at least 1".to_string());
        }
        if self.report.max_trades_in_prompt == 0 {
            errors.push("report.max_trades_in_prompt must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: SimConfig = toml::from_str(
            r#"
            base_price = 600.0

            [feed]
            tick_interval_secs = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.base_price, 600.0);
        assert_eq!(config.feed.tick_interval_secs, 2);
        assert_eq!(config.symbol, "SPY");
        assert_eq!(config.stop_loss_pct, 0.0015);
    }

    #[test]
    fn validation_collects_all_errors() {
        let config = SimConfig {
            base_price: -1.0,
            stop_loss_pct: 0.0,
            ..SimConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("base_price"));
        assert!(errors[1].contains("stop_loss_pct"));
    }
}
