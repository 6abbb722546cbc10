//! Run configuration: built once from a [`ConfigPort`], validated before any
//! simulation work, then passed by reference into every component.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::indicator::IndicatorParams;
use crate::domain::portfolio::PortfolioConfig;
use crate::domain::predictor::ModelParams;
use crate::domain::signal::SignalThresholds;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub indicators: IndicatorParams,
    pub thresholds: SignalThresholds,
    pub exposure_cap: f64,
    pub cash_reserve: f64,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub predictor_enabled: bool,
    pub model: ModelParams,
}

impl RunConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let symbols = match config.get_string("backtest", "symbols") {
            Some(s) => parse_symbols(&s)?,
            None => {
                return Err(TraderError::ConfigMissing {
                    section: "backtest".to_string(),
                    key: "symbols".to_string(),
                })
            }
        };
        let start_date = parse_date(config.get_string("backtest", "start_date"), "start_date")?;
        let end_date = parse_date(config.get_string("backtest", "end_date"), "end_date")?;

        let defaults = IndicatorParams::default();
        let indicators = IndicatorParams {
            rsi_period: window(config, "rsi_period", defaults.rsi_period),
            sma_short: window(config, "sma_short", defaults.sma_short),
            sma_long: window(config, "sma_long", defaults.sma_long),
        };

        let t = SignalThresholds::default();
        let thresholds = SignalThresholds {
            buy_rsi: config.get_double("signals", "buy_rsi", t.buy_rsi),
            buy_cross_rsi: config.get_double("signals", "buy_cross_rsi", t.buy_cross_rsi),
            sell_cross_rsi: config.get_double("signals", "sell_cross_rsi", t.sell_cross_rsi),
            sell_rsi: config.get_double("signals", "sell_rsi", t.sell_rsi),
        };

        let m = ModelParams::default();
        let model = ModelParams {
            iterations: usize::try_from(config.get_int(
                "predictor",
                "iterations",
                m.iterations as i64,
            ))
            .unwrap_or(0),
            learning_rate: config.get_double("predictor", "learning_rate", m.learning_rate),
            l2: config.get_double("predictor", "l2", m.l2),
            validation_fraction: config.get_double(
                "predictor",
                "validation_fraction",
                m.validation_fraction,
            ),
        };

        let portfolio = PortfolioConfig::default();
        Ok(RunConfig {
            symbols,
            start_date,
            end_date,
            initial_cash: config.get_double("backtest", "initial_cash", portfolio.initial_cash),
            commission_rate: config.get_double(
                "backtest",
                "commission_rate",
                portfolio.execution.commission_rate,
            ),
            indicators,
            thresholds,
            exposure_cap: config.get_double("portfolio", "exposure_cap", portfolio.exposure_cap),
            cash_reserve: config.get_double("portfolio", "cash_reserve", portfolio.cash_reserve),
            data_dir: config
                .get_path("data", "dir")
                .unwrap_or_else(|| PathBuf::from("data")),
            output_dir: config
                .get_path("report", "output_dir")
                .unwrap_or_else(|| PathBuf::from("reports")),
            predictor_enabled: config.get_bool("predictor", "enabled", false),
            model,
        })
    }

    pub fn validate(&self) -> Result<(), TraderError> {
        if self.symbols.is_empty() {
            return Err(TraderError::invalid("symbols", "at least one symbol is required"));
        }
        for (i, symbol) in self.symbols.iter().enumerate() {
            if symbol.trim().is_empty() {
                return Err(TraderError::invalid("symbols", "empty symbol"));
            }
            if self.symbols[..i].contains(symbol) {
                return Err(TraderError::invalid(
                    "symbols",
                    format!("duplicate symbol {symbol}"),
                ));
            }
        }

        if self.start_date > self.end_date {
            return Err(TraderError::invalid(
                "start_date",
                "start_date must not be after end_date",
            ));
        }
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(TraderError::invalid("initial_cash", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(TraderError::invalid("commission_rate", "must be within [0, 1)"));
        }

        for (key, value) in [
            ("rsi_period", self.indicators.rsi_period),
            ("sma_short", self.indicators.sma_short),
            ("sma_long", self.indicators.sma_long),
        ] {
            if value == 0 {
                return Err(TraderError::invalid(key, "window length must be positive"));
            }
        }

        for (key, value) in [
            ("buy_rsi", self.thresholds.buy_rsi),
            ("buy_cross_rsi", self.thresholds.buy_cross_rsi),
            ("sell_cross_rsi", self.thresholds.sell_cross_rsi),
            ("sell_rsi", self.thresholds.sell_rsi),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(TraderError::invalid(key, "RSI threshold must be within [0, 100]"));
            }
        }

        if !(0.0..=1.0).contains(&self.exposure_cap) {
            return Err(TraderError::invalid("exposure_cap", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.cash_reserve) {
            return Err(TraderError::invalid("cash_reserve", "must be within [0, 1]"));
        }

        self.model.validate()
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: self.commission_rate,
        }
    }

    pub fn backtest(&self) -> BacktestConfig {
        BacktestConfig {
            initial_cash: self.initial_cash,
            execution: self.execution(),
        }
    }

    pub fn portfolio(&self) -> PortfolioConfig {
        PortfolioConfig {
            initial_cash: self.initial_cash,
            exposure_cap: self.exposure_cap,
            cash_reserve: self.cash_reserve,
            execution: self.execution(),
        }
    }
}

fn window(config: &dyn ConfigPort, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int("indicators", key, default as i64)).unwrap_or(0)
}

fn parse_date(value: Option<String>, field: &str) -> Result<NaiveDate, TraderError> {
    match value {
        None => Err(TraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| TraderError::invalid(field, "expected YYYY-MM-DD")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig {
        values: HashMap<(String, String), String>,
    }

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig {
                values: entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            }
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .map(|v| v == "true")
                .unwrap_or(default)
        }
    }

    fn minimal() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("backtest", "symbols", "RELIANCE,TCS"),
            ("backtest", "start_date", "2023-01-01"),
            ("backtest", "end_date", "2024-01-01"),
        ]
    }

    fn valid() -> RunConfig {
        RunConfig::from_port(&MapConfig::new(&minimal())).unwrap()
    }

    #[test]
    fn defaults_applied() {
        let c = valid();
        assert_eq!(c.symbols, vec!["RELIANCE", "TCS"]);
        assert_eq!(c.indicators, IndicatorParams::default());
        assert_eq!(c.thresholds, SignalThresholds::default());
        assert!((c.initial_cash - 1_000_000.0).abs() < f64::EPSILON);
        assert!((c.commission_rate - 0.0005).abs() < f64::EPSILON);
        assert!((c.exposure_cap - 0.25).abs() < f64::EPSILON);
        assert!((c.cash_reserve - 0.10).abs() < f64::EPSILON);
        assert_eq!(c.data_dir, PathBuf::from("data"));
        assert!(!c.predictor_enabled);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn overrides_read_from_port() {
        let mut entries = minimal();
        entries.push(("indicators", "rsi_period", "7"));
        entries.push(("signals", "buy_rsi", "30"));
        entries.push(("portfolio", "exposure_cap", "0.5"));
        entries.push(("predictor", "enabled", "true"));
        let c = RunConfig::from_port(&MapConfig::new(&entries)).unwrap();
        assert_eq!(c.indicators.rsi_period, 7);
        assert!((c.thresholds.buy_rsi - 30.0).abs() < f64::EPSILON);
        assert!((c.portfolio().exposure_cap - 0.5).abs() < f64::EPSILON);
        assert!(c.predictor_enabled);
    }

    #[test]
    fn blank_dirs_fall_back() {
        let mut entries = minimal();
        entries.push(("data", "dir", "  "));
        entries.push(("report", "output_dir", "out/run1"));
        let c = RunConfig::from_port(&MapConfig::new(&entries)).unwrap();
        assert_eq!(c.data_dir, PathBuf::from("data"));
        assert_eq!(c.output_dir, PathBuf::from("out/run1"));
    }

    #[test]
    fn missing_symbols_is_config_missing() {
        let err = RunConfig::from_port(&MapConfig::new(&[
            ("backtest", "start_date", "2023-01-01"),
            ("backtest", "end_date", "2024-01-01"),
        ]))
        .unwrap_err();
        assert!(matches!(err, TraderError::ConfigMissing { key, .. } if key == "symbols"));
    }

    #[test]
    fn bad_date_is_invalid() {
        let mut entries = minimal();
        entries[1] = ("backtest", "start_date", "01/01/2023");
        let err = RunConfig::from_port(&MapConfig::new(&entries)).unwrap_err();
        assert!(matches!(err, TraderError::InvalidConfiguration { key, .. } if key == "start_date"));
    }

    #[test]
    fn negative_window_rejected() {
        let mut entries = minimal();
        entries.push(("indicators", "sma_long", "-5"));
        let c = RunConfig::from_port(&MapConfig::new(&entries)).unwrap();
        let err = c.validate().unwrap_err();
        assert!(matches!(err, TraderError::InvalidConfiguration { key, .. } if key == "sma_long"));
    }

    #[test]
    fn fractions_must_be_in_unit_interval() {
        let c = RunConfig {
            exposure_cap: 1.5,
            ..valid()
        };
        assert!(c.validate().is_err());
        let c = RunConfig {
            cash_reserve: -0.1,
            ..valid()
        };
        assert!(c.validate().is_err());
        let c = RunConfig {
            exposure_cap: 1.0,
            cash_reserve: 0.0,
            ..valid()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn dates_must_be_ordered() {
        let c = RunConfig {
            end_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            ..valid()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn single_day_range_is_valid() {
        let day = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let c = RunConfig {
            start_date: day,
            end_date: day,
            ..valid()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn cash_and_commission_checked() {
        assert!(RunConfig {
            initial_cash: 0.0,
            ..valid()
        }
        .validate()
        .is_err());
        assert!(RunConfig {
            commission_rate: 1.0,
            ..valid()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let c = RunConfig {
            symbols: vec!["TCS".into(), "TCS".into()],
            ..valid()
        };
        assert!(c.validate().is_err());
        let c = RunConfig {
            symbols: vec![],
            ..valid()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn thresholds_bounded() {
        let c = RunConfig {
            thresholds: SignalThresholds {
                sell_rsi: 120.0,
                ..SignalThresholds::default()
            },
            ..valid()
        };
        assert!(c.validate().is_err());
    }
}
