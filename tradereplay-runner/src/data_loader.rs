//! Bar loading for the replay session.
//!
//! Reads a CSV bar file (header `time,open,high,low,close[,volume]`), or
//! generates a synthetic intraday series when asked to. Loaded series are:
//! 1. sorted ascending by time
//! 2. de-duplicated on timestamp (first row kept)
//! 3. stripped of bars that fail the OHLC sanity check
//! 4. filtered to the requested `[start, end]` range (inclusive)
//!
//! Synthetic data is a developer-only mode and is tagged as such.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDateTime};
use thiserror::Error;
use tracing::{info, warn};

use tradereplay_core::domain::PriceBar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read bar file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("bar file has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("unrecognised timestamp '{value}' on line {line}")]
    Timestamp { line: u64, value: String },

    #[error("no bars left in the requested range (use --synthetic for synthetic data)")]
    Empty,
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic,
}

/// Result of loading bars, including what was dropped on the way.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
    pub duplicates: usize,
    pub rejected: usize,
}

impl LoadedData {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load a CSV bar file and clean it up.
pub fn load_csv(path: &Path, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = read_bars(file, opts)?;
    info!(
        path = %path.display(),
        bars = loaded.bars.len(),
        duplicates = loaded.duplicates,
        rejected = loaded.rejected,
        "loaded bar file"
    );
    Ok(LoadedData {
        source: DataSource::Csv(path.to_path_buf()),
        ..loaded
    })
}

/// Parse bars from any CSV reader. Column order is taken from the header.
pub fn read_bars<R: Read>(reader: R, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let columns = Columns::from_headers(rdr.headers()?)?;

    let mut bars = Vec::new();
    let mut rejected = 0;
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let field = |i: usize| record.get(i).unwrap_or("");

        let raw_time = field(columns.time);
        let time = parse_timestamp(raw_time).ok_or_else(|| LoadError::Timestamp {
            line,
            value: raw_time.to_string(),
        })?;

        let number = |i: usize| field(i).parse::<f64>().ok();
        let volume = match columns.volume {
            Some(i) => number(i).unwrap_or(0.0),
            None => 0.0,
        };
        let bar = match (
            number(columns.open),
            number(columns.high),
            number(columns.low),
            number(columns.close),
        ) {
            (Some(o), Some(h), Some(l), Some(c)) => PriceBar::new(time, o, h, l, c, volume),
            _ => {
                warn!(line, "skipping bar with unparseable prices");
                rejected += 1;
                continue;
            }
        };

        bars.push(bar);
    }

    let (bars, duplicates) = canonicalize(bars);
    let before = bars.len();
    let bars: Vec<PriceBar> = bars
        .into_iter()
        .filter(|bar| {
            let sane = bar.is_sane();
            if !sane {
                warn!(time = %bar.time, "skipping bar that fails OHLC sanity check");
            }
            sane
        })
        .collect();
    rejected += before - bars.len();
    let bars = filter_range(bars, opts);
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }

    Ok(LoadedData {
        bars,
        source: DataSource::Synthetic,
        duplicates,
        rejected,
    })
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str], label: &'static str| {
            find(names).ok_or(LoadError::MissingColumn(label))
        };
        Ok(Self {
            time: require(&["time", "timestamp", "datetime", "date"], "time")?,
            open: require(&["open"], "open")?,
            high: require(&["high"], "high")?,
            low: require(&["low"], "low")?,
            close: require(&["close"], "close")?,
            volume: find(&["volume"]),
        })
    }
}

/// Sort ascending and drop repeated timestamps, keeping the first occurrence
/// in file order. Returns the cleaned series and the number of rows dropped.
pub fn canonicalize(mut bars: Vec<PriceBar>) -> (Vec<PriceBar>, usize) {
    // Stable sort keeps file order among equal timestamps.
    bars.sort_by_key(|b| b.time);
    let before = bars.len();
    bars.dedup_by(|later, first| {
        let dup = later.time == first.time;
        if dup {
            warn!(time = %later.time, "duplicate timestamp, keeping the first bar");
        }
        dup
    });
    let dropped = before - bars.len();
    (bars, dropped)
}

fn filter_range(bars: Vec<PriceBar>, opts: &LoadOptions) -> Vec<PriceBar> {
    bars.into_iter()
        .filter(|b| opts.start.map_or(true, |s| b.time >= s))
        .filter(|b| opts.end.map_or(true, |e| b.time <= e))
        .collect()
}

/// Parse a bar timestamp in any of the common export formats.
///
/// Accepts unix seconds or milliseconds, RFC 3339 (converted to UTC wall
/// time), and the usual `Y-m-d`, `Y/m/d`, `d/m/Y`, `m/d/Y` layouts with or
/// without seconds or a `T` separator. Day-first wins over month-first when
/// both would parse.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(unix) = value.parse::<i64>() {
        if (1_000_000_000..10_000_000_000).contains(&unix) {
            return DateTime::from_timestamp(unix, 0).map(|dt| dt.naive_utc());
        }
        if unix >= 1_000_000_000_000 {
            return DateTime::from_timestamp_millis(unix).map(|dt| dt.naive_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    const FORMATS: [&str; 12] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Load bars from the configured file, or synthesize them.
pub fn load_bars(
    data_path: &Path,
    instrument: &str,
    increment_minutes: i64,
    synthetic: bool,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    if !synthetic {
        return load_csv(data_path, opts);
    }

    warn!(instrument, "generating synthetic data, results are not from real prices");
    let now = chrono::Utc::now().naive_utc();
    let end = opts.end.unwrap_or(now);
    let start = opts.start.unwrap_or(end - chrono::Duration::days(14));
    let bars = generate_synthetic_bars(instrument, start, end, increment_minutes);
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(LoadedData {
        bars,
        source: DataSource::Synthetic,
        duplicates: 0,
        rejected: 0,
    })
}

/// Deterministic random-walk intraday bars, one every `increment_minutes`
/// over `[start, end]`, skipping weekends. Seeded from the instrument name.
pub fn generate_synthetic_bars(
    instrument: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    increment_minutes: i64,
) -> Vec<PriceBar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(instrument.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let step = chrono::Duration::minutes(increment_minutes.max(1));
    let mut bars = Vec::new();
    let mut price = 1.25_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += step;
            continue;
        }

        let open = price;
        let close = (price + rng.gen_range(-0.0008..0.0008)).max(0.0001);
        let high = open.max(close) + rng.gen_range(0.0..0.0004);
        let low = (open.min(close) - rng.gen_range(0.0..0.0004)).max(0.00005);
        let volume = rng.gen_range(50..500u32) as f64;

        bars.push(PriceBar::new(current, open, high, low, close, volume));
        price = close;
        current += step;
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn parses_common_formats() {
        let expected = dt(12, 7, 30);
        for s in [
            "2024-11-12 07:30:00",
            "2024-11-12 07:30",
            "2024-11-12T07:30:00",
            "2024-11-12T07:30:00Z",
            "2024-11-12T07:30:00+00:00",
            "2024/11/12 07:30",
            "12/11/2024 07:30",
            "1731396600",
            "1731396600000",
        ] {
            assert_eq!(parse_timestamp(s), Some(expected), "format {s}");
        }
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("42"), None);
    }

    #[test]
    fn sorts_dedups_and_filters() {
        let csv = "\
time,open,high,low,close,volume
2024-11-12 08:00,1.2,1.3,1.1,1.25,10
2024-11-12 07:30,1.2,1.3,1.1,1.21,10
2024-11-12 07:45,1.2,1.3,1.1,1.22,10
2024-11-12 07:45,1.2,1.3,1.1,9.99,10
2024-11-12 08:15,1.2,1.1,1.3,1.26,10
";
        let opts = LoadOptions {
            start: Some(dt(12, 7, 45)),
            end: None,
        };
        let loaded = read_bars(csv.as_bytes(), &opts).unwrap();
        let closes: Vec<f64> = loaded.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.22, 1.25]);
        assert_eq!(loaded.duplicates, 1);
        assert_eq!(loaded.rejected, 1, "high < low row is rejected");
    }

    #[test]
    fn insane_first_row_is_not_replaced_by_a_later_duplicate() {
        let csv = "\
time,open,high,low,close
2024-11-12 07:30,1.2,1.3,1.1,1.21
2024-11-12 07:45,1.2,1.1,1.3,1.22
2024-11-12 07:45,1.2,1.3,1.1,1.23
2024-11-12 08:00,1.2,1.3,1.1,1.24
";
        let loaded = read_bars(csv.as_bytes(), &LoadOptions::default()).unwrap();
        let closes: Vec<f64> = loaded.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.21, 1.24]);
        assert_eq!(loaded.duplicates, 1);
        assert_eq!(loaded.rejected, 1);
    }

    #[test]
    fn volume_column_is_optional() {
        let csv = "time,open,high,low,close\n2024-11-12 07:30,1.2,1.3,1.1,1.25\n";
        let loaded = read_bars(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.bars[0].volume, 0.0);
    }

    #[test]
    fn missing_close_column_is_an_error() {
        let csv = "time,open,high,low\n2024-11-12 07:30,1.2,1.3,1.1\n";
        assert!(matches!(
            read_bars(csv.as_bytes(), &LoadOptions::default()),
            Err(LoadError::MissingColumn("close"))
        ));
    }

    #[test]
    fn bad_timestamp_reports_line() {
        let csv = "time,open,high,low,close\nnot-a-time,1,1,1,1\n";
        match read_bars(csv.as_bytes(), &LoadOptions::default()) {
            Err(LoadError::Timestamp { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "not-a-time");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn empty_range_is_an_error() {
        let csv = "time,open,high,low,close\n2024-11-12 07:30,1.2,1.3,1.1,1.25\n";
        let opts = LoadOptions {
            start: Some(dt(13, 0, 0)),
            end: None,
        };
        assert!(matches!(read_bars(csv.as_bytes(), &opts), Err(LoadError::Empty)));
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        let a = generate_synthetic_bars("GBP_USD", dt(11, 0, 0), dt(15, 0, 0), 15);
        let b = generate_synthetic_bars("GBP_USD", dt(11, 0, 0), dt(15, 0, 0), 15);
        assert_eq!(a, b);
        let c = generate_synthetic_bars("EUR_USD", dt(11, 0, 0), dt(15, 0, 0), 15);
        assert_ne!(a, c);
    }

    #[test]
    fn synthetic_data_skips_weekends_and_is_sane() {
        // 2024-11-16 is a Saturday.
        let bars = generate_synthetic_bars("GBP_USD", dt(15, 0, 0), dt(18, 23, 45), 15);
        assert!(bars.iter().all(|b| b.is_sane()));
        assert!(bars
            .iter()
            .all(|b| !matches!(b.time.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)));
        assert_eq!(bars.len(), 2 * 96);
        assert!(bars.windows(2).all(|w| w[0].time < w[1].time));
    }
}
