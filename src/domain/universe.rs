//! Symbol universe: list parsing and per-symbol loading with isolation.
//!
//! A symbol whose data cannot be fetched, or whose every close is
//! degenerate, is skipped and reported; the remaining symbols still run.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::domain::error::TraderError;
use crate::domain::ohlcv::PricePoint;
use crate::ports::data_port::DataPort;

pub fn parse_symbols(input: &str) -> Result<Vec<String>, TraderError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(TraderError::invalid("symbols", "empty token in symbol list"));
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(TraderError::invalid(
                "symbols",
                format!("duplicate symbol {symbol}"),
            ));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSymbol {
    pub symbol: String,
    pub points: Vec<PricePoint>,
    /// Points removed because their close was degenerate.
    pub dropped: usize,
    pub insufficient_history: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoData(String),
    AllPricesDegenerate { dropped: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoData(reason) => write!(f, "no data ({reason})"),
            SkipReason::AllPricesDegenerate { dropped } => {
                write!(f, "all {dropped} closes degenerate")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct UniverseLoad {
    pub loaded: Vec<LoadedSymbol>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Remove points whose close cannot be traded, returning one error per drop.
pub fn drop_degenerate(points: Vec<PricePoint>) -> (Vec<PricePoint>, Vec<TraderError>) {
    let mut kept = Vec::with_capacity(points.len());
    let mut dropped = Vec::new();
    for point in points {
        if point.has_tradable_close() {
            kept.push(point);
        } else {
            dropped.push(TraderError::ArithmeticDegenerate {
                symbol: point.symbol.clone(),
                date: point.date,
                reason: format!("close is {}", point.close),
            });
        }
    }
    (kept, dropped)
}

pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_history: usize,
) -> Result<UniverseLoad, TraderError> {
    let mut load = UniverseLoad::default();

    for symbol in symbols {
        let raw = match data_port.fetch(symbol, start_date, end_date) {
            Ok(points) if !points.is_empty() => points,
            Ok(_) => {
                warn!(%symbol, "skipping symbol: no data in range");
                load.skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData("empty range".to_string()),
                });
                continue;
            }
            Err(e) if e.is_per_symbol() => {
                warn!(%symbol, error = %e, "skipping symbol");
                load.skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData(e.to_string()),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let (points, degenerate) = drop_degenerate(raw);
        for err in &degenerate {
            warn!(error = %err, "dropping price point");
        }
        if points.is_empty() {
            warn!(%symbol, "skipping symbol: every close is degenerate");
            load.skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::AllPricesDegenerate {
                    dropped: degenerate.len(),
                },
            });
            continue;
        }

        let insufficient_history = points.len() < min_history;
        if insufficient_history {
            let err = TraderError::InsufficientHistory {
                symbol: symbol.clone(),
                have: points.len(),
                need: min_history,
            };
            warn!(error = %err, "signals stay Hold for the whole run");
        }

        info!(%symbol, points = points.len(), dropped = degenerate.len(), "loaded");
        load.loaded.push(LoadedSymbol {
            symbol: symbol.clone(),
            points,
            dropped: degenerate.len(),
            insufficient_history,
        });
    }

    if load.loaded.is_empty() {
        return Err(TraderError::DataUnavailable {
            symbol: symbols.join(","),
            reason: "every requested symbol failed to load".to_string(),
        });
    }

    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StubPort {
        data: HashMap<String, Vec<PricePoint>>,
    }

    impl DataPort for StubPort {
        fn fetch(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PricePoint>, TraderError> {
            self.data
                .get(symbol)
                .cloned()
                .ok_or_else(|| TraderError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    fn point(symbol: &str, day: u32, close: f64) -> PricePoint {
        PricePoint {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
    }

    #[test]
    fn parse_symbols_basic() {
        assert_eq!(
            parse_symbols("RELIANCE, tcs ,INFY").unwrap(),
            vec!["RELIANCE", "TCS", "INFY"]
        );
    }

    #[test]
    fn parse_symbols_rejects_empty_token() {
        assert!(matches!(
            parse_symbols("TCS,,INFY"),
            Err(TraderError::InvalidConfiguration { .. })
        ));
        assert!(parse_symbols("").is_err());
    }

    #[test]
    fn parse_symbols_rejects_duplicate() {
        let err = parse_symbols("TCS,INFY,tcs").unwrap_err();
        assert!(err.to_string().contains("duplicate symbol TCS"));
    }

    #[test]
    fn drop_degenerate_filters_bad_closes() {
        let (kept, dropped) = drop_degenerate(vec![
            point("TCS", 1, 100.0),
            point("TCS", 2, 0.0),
            point("TCS", 3, f64::NAN),
            point("TCS", 4, -1.0),
            point("TCS", 5, 101.0),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped.len(), 3);
        assert!(matches!(dropped[0], TraderError::ArithmeticDegenerate { .. }));
    }

    #[test]
    fn load_isolates_missing_symbols() {
        let mut data = HashMap::new();
        data.insert("TCS".to_string(), vec![point("TCS", 1, 100.0), point("TCS", 2, 101.0)]);
        data.insert("BAD".to_string(), vec![point("BAD", 1, 0.0)]);
        let port = StubPort { data };
        let (start, end) = range();

        let symbols = vec!["TCS".to_string(), "GONE".to_string(), "BAD".to_string()];
        let load = load_universe(&port, &symbols, start, end, 51).unwrap();

        assert_eq!(load.loaded.len(), 1);
        assert!(load.loaded[0].insufficient_history);
        assert_eq!(load.skipped.len(), 2);
        assert_eq!(load.skipped[0].symbol, "GONE");
        assert!(matches!(load.skipped[0].reason, SkipReason::NoData(_)));
        assert_eq!(
            load.skipped[1].reason,
            SkipReason::AllPricesDegenerate { dropped: 1 }
        );
    }

    #[test]
    fn load_fails_when_nothing_loads() {
        let port = StubPort {
            data: HashMap::new(),
        };
        let (start, end) = range();
        let err = load_universe(&port, &["X".to_string()], start, end, 1).unwrap_err();
        assert!(matches!(err, TraderError::DataUnavailable { .. }));
    }
}
