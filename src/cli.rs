//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{write_symbol_summaries, CsvReportSink};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_sink::LogSink;
use crate::domain::config::RunConfig;
use crate::domain::engine::{self, BacktestReport, SymbolPrediction};
use crate::domain::error::TraderError;
use crate::domain::universe::parse_symbols;
use crate::ports::report_port::ReportSink;

#[derive(Parser, Debug)]
#[command(name = "rsitrader", about = "RSI / moving-average signal backtester")]
pub struct Cli {
    /// Log filter, e.g. `debug` or `rsitrader=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a portfolio backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated symbols, replacing [backtest] symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Fit the next-day direction model per symbol
    Predict {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            output,
            symbols,
            dry_run,
        } => {
            let overrides = Overrides {
                data_dir,
                output,
                symbols,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Predict { config, data_dir } => run_predict(
            &config,
            &Overrides {
                data_dir,
                ..Overrides::default()
            },
        ),
    }
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub symbols: Option<String>,
}

fn fail(err: &TraderError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

/// Read the INI file, apply command-line overrides and validate.
pub fn load_run_config(path: &Path, overrides: &Overrides) -> Result<RunConfig, TraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let mut config = RunConfig::from_port(&adapter)?;
    if let Some(dir) = &overrides.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &overrides.output {
        config.output_dir = dir.clone();
    }
    if let Some(symbols) = &overrides.symbols {
        config.symbols = parse_symbols(symbols)?;
    }
    config.validate()?;
    Ok(config)
}

fn print_config(config: &RunConfig) {
    eprintln!("  symbols:      {}", config.symbols.join(", "));
    eprintln!("  period:       {} to {}", config.start_date, config.end_date);
    eprintln!("  initial cash: {:.2}", config.initial_cash);
    eprintln!("  commission:   {:.4}%", config.commission_rate * 100.0);
    eprintln!(
        "  indicators:   RSI({}) SMA({}/{})",
        config.indicators.rsi_period, config.indicators.sma_short, config.indicators.sma_long
    );
    eprintln!(
        "  thresholds:   buy<{} (cross<{})  sell>{} (cross>{})",
        config.thresholds.buy_rsi,
        config.thresholds.buy_cross_rsi,
        config.thresholds.sell_rsi,
        config.thresholds.sell_cross_rsi
    );
    eprintln!(
        "  exposure cap: {:.0}%   cash reserve: {:.0}%",
        config.exposure_cap * 100.0,
        config.cash_reserve * 100.0
    );
    eprintln!("  data dir:     {}", config.data_dir.display());
    eprintln!("  output dir:   {}", config.output_dir.display());
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    match load_run_config(config_path, &Overrides::default()) {
        Ok(config) => {
            print_config(&config);
            eprintln!("\nConfiguration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    match load_run_config(config_path, overrides) {
        Ok(config) => {
            print_config(&config);
            eprintln!("\nDry run complete: configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_run_config(config_path, overrides) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let data = CsvAdapter::new(config.data_dir.clone());
    let mut log_sink = LogSink::new();
    let mut csv_sink = match CsvReportSink::create(&config.output_dir) {
        Ok(sink) => Some(sink),
        Err(e) => {
            warn!(error = %e, dir = %config.output_dir.display(), "CSV reports disabled");
            None
        }
    };

    let mut sinks: Vec<&mut dyn ReportSink> = vec![&mut log_sink];
    if let Some(sink) = csv_sink.as_mut() {
        sinks.push(sink);
    }

    eprintln!(
        "Backtesting {} symbols from {} to {}...",
        config.symbols.len(),
        config.start_date,
        config.end_date
    );
    let report = match engine::run_backtest(&config, &data, &mut sinks) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_report(&report);

    if let Some(sink) = &csv_sink {
        let path = sink.dir().join("summary.csv");
        match write_symbol_summaries(&path, &report.symbol_summaries) {
            Ok(()) => eprintln!("\nReports written to: {}", sink.dir().display()),
            Err(e) => warn!(error = %e, "failed to write summary.csv"),
        }
    }

    if config.predictor_enabled {
        print_predictions(&config, &data);
    }

    ExitCode::SUCCESS
}

fn print_report(report: &BacktestReport) {
    for skipped in &report.skipped {
        eprintln!("warning: skipped {} ({})", skipped.symbol, skipped.reason);
    }

    let perf = &report.summary.performance;
    eprintln!("\n=== Portfolio Results ===");
    eprintln!("Initial Value:    {:.2}", perf.initial_value);
    eprintln!("Final Value:      {:.2}", perf.final_value);
    eprintln!("Total Return:     {:.2}%", perf.total_return_pct);
    eprintln!("Annualized:       {:.2}%", perf.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", perf.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", perf.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", perf.max_drawdown_pct);
    eprintln!("Total Trades:     {}", perf.trade_count);
    eprintln!("Win Rate:         {:.1}%", perf.win_rate * 100.0);
    eprintln!("Avg Holding:      {:.1} days", perf.avg_holding_days);
    eprintln!("Cash:             {:.2}", report.summary.cash);
    eprintln!("Open Positions:   {}", report.summary.open_positions);
    if report.sink_failures > 0 {
        eprintln!("Sink Failures:    {}", report.sink_failures);
    }

    if !report.symbol_summaries.is_empty() {
        eprintln!("\n=== Per-Symbol Summary ===");
        for s in &report.symbol_summaries {
            let pnl_sign = if s.realized_pnl >= 0.0 { "+" } else { "" };
            let flag = if s.insufficient_history {
                "  [insufficient history]"
            } else {
                ""
            };
            eprintln!(
                "  {}:  {} trades, realized {}{:.2}, {} shares held (unrealized {:.2}) | standalone {:.2}% (max dd {:.1}%){}",
                s.symbol,
                s.trade_count,
                pnl_sign,
                s.realized_pnl,
                s.shares,
                s.unrealized_pnl,
                s.standalone.total_return_pct,
                s.standalone.max_drawdown_pct,
                flag
            );
        }
    }
}

fn prediction_line(prediction: &SymbolPrediction, indent: &str) -> String {
    match &prediction.outcome {
        Ok(pred) => format!(
            "{indent}{}:  P(up) = {:.3}, validation accuracy {:.1}% -> {}",
            prediction.symbol,
            pred.prob_up,
            pred.validation_accuracy * 100.0,
            pred.call
        ),
        Err(e) => format!("{indent}{}:  {e}", prediction.symbol),
    }
}

fn print_predictions(config: &RunConfig, data: &CsvAdapter) {
    eprintln!("\n=== Next-Day Predictions ===");
    match engine::run_predictions(config, data) {
        Ok(predictions) => {
            for p in &predictions {
                eprintln!("{}", prediction_line(p, "  "));
            }
        }
        Err(e) => eprintln!("error: {e}"),
    }
}

fn run_predict(config_path: &Path, overrides: &Overrides) -> ExitCode {
    let config = match load_run_config(config_path, overrides) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data = CsvAdapter::new(config.data_dir.clone());
    match engine::run_predictions(&config, &data) {
        Ok(predictions) => {
            for p in &predictions {
                eprintln!("{}", prediction_line(p, ""));
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
