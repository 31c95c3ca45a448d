//! Line-oriented `key=value` configuration loader. Unknown keys are
//! ignored; malformed numerics fall back to defaults rather than failing
//! the whole load.

use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    MissingFile(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub symbol: String,
    pub strategy: String,
    pub log_file: String,
    pub exchange_host: String,
    pub exchange_port: u16,
    pub spread_bps: f64,
    pub quote_size: u32,
    pub lookback_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub max_position: i64,
    pub max_order_size: u32,
    pub max_loss: f64,
    pub price_collar: f64,
    pub max_orders_per_sec: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: "SIM".to_string(),
            strategy: "market_making".to_string(),
            log_file: "apex-engine.log".to_string(),
            exchange_host: "127.0.0.1".to_string(),
            exchange_port: 0,
            spread_bps: 10.0,
            quote_size: 10,
            lookback_period: 30,
            entry_threshold: 2.0,
            exit_threshold: 0.5,
            max_position: 1_000,
            max_order_size: 500,
            max_loss: 10_000.0,
            price_collar: 5.0,
            max_orders_per_sec: 50,
        }
    }
}

impl Config {
    /// Parses a `key=value` text file. Blank lines and lines starting with
    /// `#` are skipped. A missing file is fatal; a malformed numeric value
    /// falls back silently to the default.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::MissingFile(path.display().to_string()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut raw = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                raw.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        let defaults = Config::default();
        let string_or = |key: &str, default: String| {
            raw.get(key).cloned().unwrap_or(default)
        };
        let num_or = |key: &str, default: f64| -> f64 {
            raw.get(key).and_then(|v| v.parse::<f64>().ok()).unwrap_or(default)
        };

        Self {
            symbol: string_or("symbol", defaults.symbol),
            strategy: string_or("strategy", defaults.strategy),
            log_file: string_or("log_file", defaults.log_file),
            exchange_host: string_or("exchange_host", defaults.exchange_host),
            exchange_port: raw
                .get("exchange_port")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(defaults.exchange_port),
            spread_bps: num_or("spread_bps", defaults.spread_bps),
            quote_size: num_or("quote_size", defaults.quote_size as f64) as u32,
            lookback_period: num_or("lookback_period", defaults.lookback_period as f64) as usize,
            entry_threshold: num_or("entry_threshold", defaults.entry_threshold),
            exit_threshold: num_or("exit_threshold", defaults.exit_threshold),
            max_position: num_or("max_position", defaults.max_position as f64) as i64,
            max_order_size: num_or("max_order_size", defaults.max_order_size as f64) as u32,
            max_loss: num_or("max_loss", defaults.max_loss),
            price_collar: num_or("price_collar", defaults.price_collar),
            max_orders_per_sec: num_or("max_orders_per_sec", defaults.max_orders_per_sec as f64) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_keys() {
        let cfg = Config::parse(
            "symbol=BTCUSD\n# a comment\nstrategy=stat_arb\nspread_bps=12.5\n\nmax_order_size=250\n",
        );
        assert_eq!(cfg.symbol, "BTCUSD");
        assert_eq!(cfg.strategy, "stat_arb");
        assert_eq!(cfg.spread_bps, 12.5);
        assert_eq!(cfg.max_order_size, 250);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = Config::parse("totally_unknown=123\nsymbol=ETHUSD\n");
        assert_eq!(cfg.symbol, "ETHUSD");
    }

    #[test]
    fn malformed_numeric_falls_back_to_default() {
        let cfg = Config::parse("spread_bps=not_a_number\n");
        assert_eq!(cfg.spread_bps, Config::default().spread_bps);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load("/nonexistent/path/apex.cfg").unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }
}
