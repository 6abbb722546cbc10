//! Drawdown and performance statistics over NAV series and round trips.

use chrono::NaiveDate;

use super::backtest::SingleAssetResult;
use super::portfolio::{NavPoint, PortfolioState};
use super::position::RoundTrip;
use super::trade::{Side, Trade};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    /// (peak - nav) / peak, in [0, 1].
    pub drawdown: f64,
}

/// Running drawdown from the peak NAV so far. The peak only ratchets upward.
pub fn drawdown_series(nav: &[NavPoint]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;
    nav.iter()
        .map(|point| {
            peak = peak.max(point.total_equity);
            let drawdown = if peak > 0.0 {
                (peak - point.total_equity) / peak
            } else {
                0.0
            };
            DrawdownPoint {
                date: point.date,
                drawdown,
            }
        })
        .collect()
}

pub fn max_drawdown(nav: &[NavPoint]) -> f64 {
    drawdown_series(nav)
        .iter()
        .map(|p| p.drawdown)
        .fold(0.0, f64::max)
}

fn daily_returns(nav: &[NavPoint]) -> Vec<f64> {
    nav.windows(2)
        .map(|w| {
            let prev = w[0].total_equity;
            if prev > 0.0 {
                (w[1].total_equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualised Sharpe and Sortino with a zero risk-free rate.
pub fn compute_risk_adjusted(nav: &[NavPoint]) -> (f64, f64) {
    let returns = daily_returns(nav);
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let sharpe = if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_variance = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>()
        / n;
    let downside_stddev = downside_variance.sqrt();

    let sortino = if downside_stddev > 0.0 {
        mean / downside_stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

pub fn win_rate(round_trips: &[RoundTrip]) -> f64 {
    if round_trips.is_empty() {
        return 0.0;
    }
    let won = round_trips.iter().filter(|t| t.pnl > 0.0).count();
    won as f64 / round_trips.len() as f64
}

pub fn average_holding_days(round_trips: &[RoundTrip]) -> f64 {
    if round_trips.is_empty() {
        return 0.0;
    }
    let days: i64 = round_trips.iter().map(RoundTrip::holding_days).sum();
    days as f64 / round_trips.len() as f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_pct: f64,
    pub trade_count: usize,
    pub round_trip_count: usize,
    pub win_rate: f64,
    pub avg_holding_days: f64,
}

impl PerformanceSummary {
    pub fn compute(
        initial_value: f64,
        nav: &[NavPoint],
        trades: &[Trade],
        round_trips: &[RoundTrip],
    ) -> Self {
        let final_value = nav.last().map(|p| p.total_equity).unwrap_or(initial_value);

        let total_return = if initial_value > 0.0 {
            (final_value - initial_value) / initial_value
        } else {
            0.0
        };

        let years = nav.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(nav);

        PerformanceSummary {
            initial_value,
            final_value,
            total_return_pct: total_return * 100.0,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown_pct: max_drawdown(nav) * 100.0,
            trade_count: trades.len(),
            round_trip_count: round_trips.len(),
            win_rate: win_rate(round_trips),
            avg_holding_days: average_holding_days(round_trips),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub performance: PerformanceSummary,
    pub cash: f64,
    pub open_positions: usize,
}

impl PortfolioSummary {
    pub fn compute(state: &PortfolioState) -> Self {
        PortfolioSummary {
            performance: PerformanceSummary::compute(
                state.initial_cash,
                &state.nav_history,
                &state.trade_log,
                &state.round_trips,
            ),
            cash: state.cash,
            open_positions: state.position_count(),
        }
    }
}

/// One symbol's share of the portfolio run, alongside its standalone backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSummary {
    pub symbol: String,
    pub trade_count: usize,
    pub total_invested: f64,
    pub total_received: f64,
    pub realized_pnl: f64,
    pub shares: u64,
    pub position_value: f64,
    /// Open position marked at the last close, against its average cost.
    pub unrealized_pnl: f64,
    pub insufficient_history: bool,
    pub standalone: PerformanceSummary,
}

impl SymbolSummary {
    pub fn compute(
        symbol: &str,
        state: &PortfolioState,
        standalone: &SingleAssetResult,
        insufficient_history: bool,
    ) -> Self {
        let mut trade_count = 0;
        let mut total_invested = 0.0;
        let mut total_received = 0.0;
        for trade in state.trade_log.iter().filter(|t| t.symbol == symbol) {
            trade_count += 1;
            match trade.side {
                Side::Buy => total_invested += trade.value + trade.commission,
                Side::Sell => total_received += trade.value - trade.commission,
            }
        }

        let realized_pnl = state
            .round_trips
            .iter()
            .filter(|t| t.symbol == symbol)
            .map(|t| t.pnl)
            .sum();

        SymbolSummary {
            symbol: symbol.to_string(),
            trade_count,
            total_invested,
            total_received,
            realized_pnl,
            shares: state.positions.get(symbol).map(|p| p.shares).unwrap_or(0),
            position_value: state.position_value(symbol),
            unrealized_pnl: match (state.positions.get(symbol), state.last_close(symbol)) {
                (Some(pos), Some(close)) => pos.unrealized_pnl(close),
                _ => 0.0,
            },
            insufficient_history,
            standalone: PerformanceSummary::compute(
                standalone.initial_cash,
                &standalone.nav,
                &standalone.trades,
                &standalone.round_trips,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_nav(values: &[f64]) -> Vec<NavPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| NavPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                cash: v,
                positions_value: 0.0,
                total_equity: v,
            })
            .collect()
    }

    fn trip(pnl: f64) -> RoundTrip {
        held_trip(pnl, 1)
    }

    fn held_trip(pnl: f64, days: i64) -> RoundTrip {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        RoundTrip {
            symbol: "SBIN".into(),
            quantity: 1,
            entry_price: 1.0,
            exit_price: 1.0,
            entry_date: entry,
            exit_date: entry + chrono::Duration::days(days),
            pnl,
        }
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        let dd = drawdown_series(&make_nav(&[100.0, 120.0, 90.0, 130.0, 117.0]));
        let values: Vec<f64> = dd.iter().map(|p| p.drawdown).collect();
        assert_relative_eq!(values[0], 0.0);
        assert_relative_eq!(values[1], 0.0);
        assert_relative_eq!(values[2], 0.25);
        assert_relative_eq!(values[3], 0.0);
        assert_relative_eq!(values[4], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn peak_starts_at_first_nav() {
        let dd = drawdown_series(&make_nav(&[100.0, 80.0]));
        assert_relative_eq!(dd[1].drawdown, 0.2);
        assert_relative_eq!(max_drawdown(&make_nav(&[100.0, 80.0, 90.0])), 0.2);
    }

    #[test]
    fn drawdown_of_empty_series() {
        assert!(drawdown_series(&[]).is_empty());
        assert_relative_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn flat_nav_has_zero_risk_metrics() {
        let nav = make_nav(&[100.0; 30]);
        assert_eq!(compute_risk_adjusted(&nav), (0.0, 0.0));
        let summary = PerformanceSummary::compute(100.0, &nav, &[], &[]);
        assert_relative_eq!(summary.total_return_pct, 0.0);
        assert_relative_eq!(summary.max_drawdown_pct, 0.0);
        assert_relative_eq!(summary.annualized_return, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn choppy_uptrend_positive_ratios() {
        let nav = make_nav(&[100.0, 102.0, 101.0, 104.0, 103.0, 106.0]);
        let (sharpe, sortino) = compute_risk_adjusted(&nav);
        assert!(sharpe > 0.0);
        assert!(sortino > sharpe);
    }

    #[test]
    fn only_gains_have_no_sortino() {
        let (_, sortino) = compute_risk_adjusted(&make_nav(&[100.0, 101.0, 103.0]));
        assert_relative_eq!(sortino, 0.0);
    }

    #[test]
    fn summary_returns() {
        let summary = PerformanceSummary::compute(100.0, &make_nav(&[100.0, 110.0]), &[], &[]);
        assert_relative_eq!(summary.final_value, 110.0);
        assert_relative_eq!(summary.total_return_pct, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn win_rate_over_round_trips() {
        assert_relative_eq!(win_rate(&[trip(5.0), trip(-2.0), trip(0.0), trip(1.0)]), 0.5);
        assert_relative_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn holding_days_averaged_over_round_trips() {
        let trips = [held_trip(1.0, 3), held_trip(-1.0, 9)];
        assert_relative_eq!(average_holding_days(&trips), 6.0);
        assert_relative_eq!(average_holding_days(&[]), 0.0);
        let summary = PerformanceSummary::compute(100.0, &make_nav(&[100.0, 101.0]), &[], &trips);
        assert_relative_eq!(summary.avg_holding_days, 6.0);
    }

    #[test]
    fn symbol_summary_marks_open_position() {
        use crate::domain::position::Position;

        let entry = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut state = PortfolioState::new(10_000.0);
        state.positions.insert(
            "TCS".into(),
            Position {
                symbol: "TCS".into(),
                shares: 10,
                avg_cost: 100.0,
                entry_date: entry,
                entry_commission: 0.5,
            },
        );
        state.mark("TCS", 112.0);
        let standalone = SingleAssetResult {
            symbol: "TCS".into(),
            initial_cash: 10_000.0,
            cash: 10_000.0,
            position: None,
            trades: vec![],
            round_trips: vec![],
            nav: make_nav(&[10_000.0]),
        };

        let summary = SymbolSummary::compute("TCS", &state, &standalone, false);
        assert_relative_eq!(summary.position_value, 1120.0);
        assert_relative_eq!(summary.unrealized_pnl, 120.0, epsilon = 1e-9);
        assert_eq!(summary.shares, 10);

        let flat = SymbolSummary::compute("INFY", &state, &standalone, false);
        assert_relative_eq!(flat.unrealized_pnl, 0.0);
    }
}
