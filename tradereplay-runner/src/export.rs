//! Ledger and feature-table export.
//!
//! The ledger is written one row per closed trade with columns
//! `side, entry_time, entry_price, exit_time, exit_price, realized_pnl`, as CSV
//! or pretty JSON depending on the file extension. An empty ledger writes
//! nothing.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tradereplay_core::domain::{Ledger, Position};
use tradereplay_core::indicators::{FeatureRow, FeatureTable};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unsupported export format '{0}' (use .csv or .json)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Pick the format from the file extension; no extension means CSV.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(ExportFormat::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(ExportFormat::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ExportFormat::Json),
            Some(other) => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, trades: usize },
    NothingToExport,
}

impl std::fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportOutcome::Written { path, trades } => {
                write!(f, "exported {trades} trades to {}", path.display())
            }
            ExportOutcome::NothingToExport => f.write_str("no trades to export"),
        }
    }
}

/// One exported ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub side: String,
    pub entry_time: String,
    pub entry_price: f64,
    pub exit_time: String,
    pub exit_price: f64,
    pub realized_pnl: f64,
}

impl TradeRow {
    pub const COLUMNS: [&'static str; 6] = [
        "side",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "realized_pnl",
    ];

    /// `None` for a position that is still open.
    pub fn from_position(p: &Position) -> Option<Self> {
        Some(Self {
            side: p.side.as_str().to_string(),
            entry_time: p.entry_time.format(TIME_FORMAT).to_string(),
            entry_price: p.entry_price,
            exit_time: p.exit_time()?.format(TIME_FORMAT).to_string(),
            exit_price: p.exit_price()?,
            realized_pnl: p.realized_pnl()?,
        })
    }
}

fn rows(ledger: &Ledger) -> Vec<TradeRow> {
    ledger.trades().iter().filter_map(TradeRow::from_position).collect()
}

/// Render the ledger as CSV. Prices and P&L keep full `f64` precision.
pub fn ledger_to_csv(ledger: &Ledger) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(vec![]);
    wtr.write_record(TradeRow::COLUMNS)?;
    for r in rows(ledger) {
        wtr.serialize(r)?;
    }
    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}

pub fn ledger_to_json(ledger: &Ledger) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&rows(ledger))?)
}

/// Write the ledger to `path`. Creates parent directories if needed.
pub fn export_ledger(ledger: &Ledger, path: &Path) -> Result<ExportOutcome, ExportError> {
    let format = ExportFormat::from_path(path)?;
    if ledger.is_empty() {
        info!("no trades to export");
        return Ok(ExportOutcome::NothingToExport);
    }

    let content = match format {
        ExportFormat::Csv => ledger_to_csv(ledger)?,
        ExportFormat::Json => ledger_to_json(ledger)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;

    let outcome = ExportOutcome::Written {
        path: path.to_path_buf(),
        trades: ledger.len(),
    };
    info!(path = %path.display(), trades = ledger.len(), "exported trade ledger");
    Ok(outcome)
}

// ─── Feature table ──────────────────────────────────────────────────

fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        String::new()
    }
}

/// Render the feature table as CSV. Warmup values are left empty.
pub fn features_to_csv(table: &FeatureTable) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(FeatureTable::columns())?;

    for row in &table.rows {
        let FeatureRow {
            bar,
            ma_50,
            rsi,
            macd,
            stoch_k,
            stoch_signal,
            signal,
        } = row;
        wtr.write_record([
            bar.time.format(TIME_FORMAT).to_string(),
            fmt_value(bar.open),
            fmt_value(bar.high),
            fmt_value(bar.low),
            fmt_value(bar.close),
            fmt_value(bar.volume),
            fmt_value(*ma_50),
            fmt_value(*rsi),
            fmt_value(*macd),
            fmt_value(*stoch_k),
            fmt_value(*stoch_signal),
            format!("{signal:?}"),
            signal.code().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_features_csv(table: &FeatureTable, path: &Path) -> anyhow::Result<()> {
    let csv = features_to_csv(table)?;
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write feature table to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use tradereplay_core::domain::{PriceBar, Side};
    use tradereplay_core::engine::TradeEngine;

    fn t(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 12)
            .unwrap()
            .and_hms_opt(7, m, 0)
            .unwrap()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("a.JSON")).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("trades")).unwrap(), ExportFormat::Csv);
        assert!(matches!(
            ExportFormat::from_path(Path::new("a.xlsx")),
            Err(ExportError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn trade_row_skips_open_positions() {
        let open = Position::open(Side::Long, t(0), 1.25);
        assert!(TradeRow::from_position(&open).is_none());

        let closed = open.close(t(15), 1.255);
        let row = TradeRow::from_position(&closed).unwrap();
        assert_eq!(row.side, "long");
        assert_eq!(row.entry_time, "2024-11-12 07:00:00");
        assert_eq!(row.exit_time, "2024-11-12 07:15:00");
        assert!((row.realized_pnl - 0.005).abs() < 1e-9);
    }

    #[test]
    fn csv_keeps_sub_pip_precision() {
        let prices: Vec<PriceBar> = [(0, 0.0000123), (15, 0.0000164), (30, 0.0000101)]
            .into_iter()
            .map(|(m, c)| PriceBar::new(t(m), c, c, c, c, 0.0))
            .collect();
        let mut engine = TradeEngine::new();
        engine.set_current_time(t(0));
        engine.open_long(&prices).unwrap();
        engine.set_current_time(t(15));
        engine.open_short(&prices).unwrap();
        engine.set_current_time(t(30));
        engine.close(&prices).unwrap();
        let ledger = engine.ledger();

        let csv = ledger_to_csv(ledger).unwrap();
        let mut rdr = csv::Reader::from_reader(csv.as_bytes());
        let back: Vec<TradeRow> = rdr.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(back, rows(ledger));
        assert!(back[0].realized_pnl > 0.0);
        assert_eq!(back[0].realized_pnl, 0.0000164 - 0.0000123);
    }

    #[test]
    fn empty_ledger_csv_is_header_only() {
        let csv = ledger_to_csv(&Ledger::new()).unwrap();
        assert_eq!(
            csv,
            "side,entry_time,entry_price,exit_time,exit_price,realized_pnl\n"
        );
    }
}
