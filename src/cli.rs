//! CLI definition and dispatch.
//!
//! Progress goes to stderr through `tracing`; summaries meant for the user
//! are printed to stdout.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::notifier::{LogNotifier, OutboxNotifier};
use crate::domain::config_validation::validate_config;
use crate::domain::error::{ConfigError, SigtraderError};
use crate::domain::pipeline::{BacktestResult, run_backtest};
use crate::domain::position::TradeRecord;
use crate::domain::report::Report;
use crate::domain::scanner::{ScanOutcome, run_scan};
use crate::domain::strategy::{Strategy, builtin_condition};
use crate::domain::universe::{
    CancelToken, DataConfig, SkippedSymbol, resolve_symbols, run_universe,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::notifier_port::NotifierPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Scored-signal backtester and market scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the strategy on one symbol or the configured universe
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols overriding [data] symbols
        #[arg(long)]
        symbol: Option<String>,
        /// Write the trade log to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the combined equity curve to this CSV file
        #[arg(long)]
        equity: Option<PathBuf>,
    },
    /// Evaluate the latest bar of every symbol and send alerts
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Write alerts to this CSV file and attach it to the notification
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and list its conditions
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging();
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
            equity,
        } => backtest_command(
            &config,
            symbol.as_deref(),
            BacktestOutputs {
                trades: output.as_deref(),
                equity: equity.as_deref(),
            },
        ),
        Command::Scan { config, output } => scan_command(&config, output.as_deref()),
        Command::Validate { config } => validate_command(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// A loaded and fully validated configuration file.
pub struct LoadedConfig {
    pub adapter: FileConfigAdapter,
    pub strategy: Strategy,
    pub data: DataConfig,
}

pub fn load_config(path: &Path) -> Result<LoadedConfig, SigtraderError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    match validate_config(&adapter) {
        Ok((strategy, data)) => Ok(LoadedConfig {
            adapter,
            strategy,
            data,
        }),
        Err(err) => {
            show_condition_context(&err, &adapter);
            Err(err.into())
        }
    }
}

fn show_condition_context(err: &ConfigError, config: &dyn ConfigPort) {
    let ConfigError::Condition { name, source } = err else {
        return;
    };
    let text = config
        .get_string("conditions", name)
        .or_else(|| builtin_condition(name).map(str::to_string));
    if let Some(text) = text {
        eprintln!("{}", source.display_with_context(text.trim()));
    }
}

pub fn backtest_command(
    config_path: &Path,
    symbol: Option<&str>,
    outputs: BacktestOutputs<'_>,
) -> Result<(), SigtraderError> {
    let loaded = load_config(config_path)?;
    let data_port = CsvAdapter::new(&loaded.data.dir);
    let symbols = resolve_symbols(&loaded.data, &data_port, symbol)?;
    let summary = run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter::new(),
        &loaded.strategy,
        &loaded.data,
        &symbols,
        outputs,
    )?;
    print_backtest(&loaded.strategy, &summary);
    Ok(())
}

pub fn scan_command(config_path: &Path, output: Option<&Path>) -> Result<(), SigtraderError> {
    let loaded = load_config(config_path)?;
    let data_port = CsvAdapter::new(&loaded.data.dir);
    let symbols = resolve_symbols(&loaded.data, &data_port, None)?;
    let notifier = build_notifier(&loaded.adapter);
    let outcome = run_scan_pipeline(
        &data_port,
        notifier.as_ref(),
        &CsvReportAdapter::new(),
        &loaded.strategy,
        &loaded.data,
        &symbols,
        output,
        &CancelToken::new(),
    )?;
    print_scan(&outcome);
    Ok(())
}

pub fn validate_command(config_path: &Path) -> Result<(), SigtraderError> {
    let loaded = load_config(config_path)?;
    let strategy = &loaded.strategy;
    let scoring = &strategy.scoring;

    println!("Strategy: {} ({})", strategy.name, strategy.simulator.side);
    println!(
        "Min score: {} of {}",
        scoring.min_score,
        scoring.conditions.len()
    );
    println!("\nConditions:");
    for c in &scoring.conditions {
        println!("  {} = {}", c.name, c.condition);
    }
    println!("\nFilters:");
    if scoring.filters.is_empty() {
        println!("  (none)");
    }
    for f in &scoring.filters {
        println!("  {} = {}", f.name, f.condition);
    }

    println!("\nData: {}", loaded.data.dir.display());
    match &loaded.data.symbols {
        Some(symbols) => println!("  symbols: {}", symbols.join(", ")),
        None => println!("  symbols: from data directory"),
    }
    println!("  workers: {}", loaded.data.workers);
    println!(
        "  warmup:  {} bars",
        strategy.indicators.longest_warmup()
    );

    println!("\nConfiguration is valid.");
    Ok(())
}

/// Outbox notifier when `[notify] outbox` is set, otherwise the log notifier.
pub fn build_notifier(config: &dyn ConfigPort) -> Box<dyn NotifierPort> {
    let outbox = config
        .get_string("notify", "outbox")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    match outbox {
        Some(dir) => match OutboxNotifier::new(&dir) {
            Ok(n) => Box::new(n),
            Err(e) => {
                error!("{}; falling back to log notifier", e);
                Box::new(LogNotifier)
            }
        },
        None => Box::new(LogNotifier),
    }
}

/// Optional CSV destinations for a backtest.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktestOutputs<'a> {
    pub trades: Option<&'a Path>,
    pub equity: Option<&'a Path>,
}

/// Per-symbol results plus the combined trade log.
#[derive(Debug, Clone)]
pub struct BacktestSummary {
    pub results: Vec<BacktestResult>,
    pub skipped: Vec<SkippedSymbol>,
    /// Every trade, ordered by exit time then symbol.
    pub trades: Vec<TradeRecord>,
    pub combined: Report,
}

fn nothing_processed(symbols: &[String], mut skipped: Vec<SkippedSymbol>) -> SigtraderError {
    if symbols.len() == 1 && skipped.len() == 1 {
        if let Some(only) = skipped.pop() {
            return only.into_error();
        }
    }
    SigtraderError::NoData {
        symbol: format!("all {} symbols", symbols.len()),
    }
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    data: &DataConfig,
    symbols: &[String],
    outputs: BacktestOutputs<'_>,
) -> Result<BacktestSummary, SigtraderError> {
    if symbols.is_empty() {
        return Err(ConfigError::missing("data", "symbols").into());
    }
    info!(strategy = %strategy.name, symbols = symbols.len(), "running backtest");

    let universe = run_universe(
        data_port,
        symbols,
        &data.history_request(),
        data.workers,
        &CancelToken::new(),
        |symbol, bars| run_backtest(symbol, bars, strategy),
    )?;
    if universe.completed.is_empty() {
        return Err(nothing_processed(symbols, universe.skipped));
    }

    let results: Vec<BacktestResult> = universe.completed.into_iter().map(|r| r.value).collect();
    let mut trades: Vec<TradeRecord> = results
        .iter()
        .flat_map(|r| r.simulation.trades.iter().cloned())
        .collect();
    let combined = Report::combined(&mut trades, strategy.simulator.initial_equity);

    if let Some(path) = outputs.trades {
        report_port.write_trades(&trades, path)?;
        info!(path = %path.display(), trades = trades.len(), "trade log written");
    }
    if let Some(path) = outputs.equity {
        report_port.write_equity(&combined, path)?;
        info!(
            path = %path.display(),
            points = combined.equity_curve.len(),
            "equity curve written"
        );
    }

    Ok(BacktestSummary {
        results,
        skipped: universe.skipped,
        trades,
        combined,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn run_scan_pipeline(
    data_port: &dyn DataPort,
    notifier: &dyn NotifierPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    data: &DataConfig,
    symbols: &[String],
    output: Option<&Path>,
    cancel: &CancelToken,
) -> Result<ScanOutcome, SigtraderError> {
    if symbols.is_empty() {
        return Err(ConfigError::missing("data", "symbols").into());
    }
    info!(strategy = %strategy.name, symbols = symbols.len(), "scanning");

    let outcome = run_scan(
        data_port,
        symbols,
        &data.history_request(),
        strategy,
        data.min_price,
        data.workers,
        cancel,
    )?;
    if outcome.scanned == 0 {
        return Err(nothing_processed(symbols, outcome.skipped));
    }

    if let Err(e) = notifier.notify(&outcome.summary(&strategy.name)) {
        error!("{}", e);
    }

    if let Some(path) = output {
        report_port.write_alerts(&outcome.alerts, path)?;
        info!(path = %path.display(), alerts = outcome.alerts.len(), "alerts written");
        if !outcome.alerts.is_empty() {
            let caption = format!("{} alerts ({})", strategy.name, outcome.alerts.len());
            if let Err(e) = notifier.send_file(path, &caption) {
                error!("{}", e);
            }
        }
    }

    Ok(outcome)
}

fn print_report(report: &Report) {
    println!("Total Trades:     {}", report.total_trades);
    println!(
        "Win Rate:         {:.1}% ({} won, {} lost)",
        report.win_rate, report.winning_trades, report.losing_trades
    );
    println!("Avg Trade:        {:.2}%", report.average_pnl_percent);
    println!("Total P&L:        {:.2}", report.total_pnl);
    println!(
        "Equity:           {:.2} -> {:.2}",
        report.initial_equity, report.final_equity
    );
    println!("Profit Factor:    {:.2}", report.profit_factor);
    println!("Max Drawdown:     -{:.1}%", report.max_drawdown * 100.0);
    println!("Avg Bars Held:    {:.1}", report.average_bars_held);
}

fn print_backtest(strategy: &Strategy, summary: &BacktestSummary) {
    if summary.results.len() == 1 {
        let result = &summary.results[0];
        println!("=== {}: {} ===", strategy.name, result.symbol);
        print_report(&result.report);
    } else {
        println!("=== {}: combined ===", strategy.name);
        print_report(&summary.combined);

        println!("\n=== Per-Symbol Summary ===");
        for r in &summary.results {
            let sign = if r.report.total_pnl >= 0.0 { "+" } else { "" };
            println!(
                "  {}:  {} trades, {:.1}% win rate, {}{:.2}",
                r.symbol, r.report.total_trades, r.report.win_rate, sign, r.report.total_pnl
            );
        }
    }

    if !summary.skipped.is_empty() {
        println!("\nSkipped:");
        for s in &summary.skipped {
            println!("  {}: {}", s.symbol, s.reason);
        }
    }
}

fn print_scan(outcome: &ScanOutcome) {
    println!(
        "Scanned {} symbol(s), {} alert(s)",
        outcome.scanned,
        outcome.alerts.len()
    );
    for alert in &outcome.alerts {
        println!("  {}", alert.summary_line());
    }
    for s in &outcome.skipped {
        println!("  skipped {}: {}", s.symbol, s.reason);
    }
}
