//! CSV price file adapter.
//!
//! Reads a historical price export with a header row and normalizes it into
//! [`PriceBar`]s: the timestamp column may be `Datetime`, `Date` or
//! `timestamp`, the close column `Close` or `Adj Close`, and `Volume` is
//! optional. Missing closes are forward-filled.

use crate::domain::error::TradesimError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::PriceDataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TIMESTAMP_COLUMNS: [&str; 3] = ["datetime", "date", "timestamp"];
const CLOSE_COLUMNS: [&str; 2] = ["close", "adj close"];

#[derive(Debug)]
pub struct CsvPriceAdapter {
    path: PathBuf,
}

struct Columns {
    timestamp: usize,
    close: usize,
    volume: Option<usize>,
}

impl CsvPriceAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, TradesimError> {
        let find = |names: &[&str]| {
            names.iter().find_map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(name))
            })
        };

        let timestamp = find(&TIMESTAMP_COLUMNS).ok_or_else(|| TradesimError::Data {
            reason: "missing timestamp column (Datetime, Date or timestamp)".into(),
        })?;
        let close = find(&CLOSE_COLUMNS).ok_or_else(|| TradesimError::Data {
            reason: "missing close column".into(),
        })?;
        let volume = find(&["volume"]);

        Ok(Columns {
            timestamp,
            close,
            volume,
        })
    }
}

/// Parses the timestamp formats produced by common price exports. Offsets are
/// dropped and the local wall time kept.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, TradesimError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TradesimError::Data {
            reason: format!("invalid timestamp format: {}", value),
        })
}

fn parse_number(value: &str, column: &str) -> Result<f64, TradesimError> {
    value.trim().parse().map_err(|e| TradesimError::Data {
        reason: format!("invalid {} value '{}': {}", column, value, e),
    })
}

impl PriceDataPort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, TradesimError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TradesimError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| TradesimError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Self::locate_columns(headers)?;

        let mut rows: Vec<(NaiveDateTime, Option<f64>, Option<f64>)> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TradesimError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp_str = record.get(columns.timestamp).unwrap_or_default();
            if timestamp_str.trim().is_empty() {
                continue;
            }
            let timestamp = parse_timestamp(timestamp_str)?;

            let close = match record.get(columns.close) {
                Some(c) if !c.trim().is_empty() => Some(parse_number(c, "close")?),
                _ => None,
            };
            let volume = match columns.volume.and_then(|i| record.get(i)) {
                Some(v) if !v.trim().is_empty() => Some(parse_number(v, "volume")?),
                _ => None,
            };
            rows.push((timestamp, close, volume));
        }

        // Fill from the previous timestamp, not the previous line of the file.
        rows.sort_by_key(|(timestamp, _, _)| *timestamp);

        let mut bars = Vec::new();
        let mut last_close: Option<f64> = None;
        let mut filled = 0usize;

        for (timestamp, close, volume) in rows {
            let close = match close {
                Some(close) => close,
                None => {
                    filled += 1;
                    last_close.ok_or_else(|| TradesimError::Data {
                        reason: format!("no close at {} and nothing to fill from", timestamp),
                    })?
                }
            };
            last_close = Some(close);

            let date = timestamp.date();
            if start_date.is_some_and(|start| date < start) || end_date.is_some_and(|end| date > end)
            {
                continue;
            }

            bars.push(PriceBar {
                timestamp,
                close,
                volume,
            });
        }

        if filled > 0 {
            debug!(filled, "forward-filled missing closes");
        }

        info!(path = %self.path.display(), bars = bars.len(), "loaded price data");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reads_daily_export() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "AAPL_daily.csv",
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-02,187.15,188.44,183.89,185.64,184.73,82488700\n\
             2024-01-03,184.22,185.88,183.43,184.25,183.35,58414500\n",
        );
        let bars = CsvPriceAdapter::new(path).fetch_prices(None, None).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, date(2024, 1, 2).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(bars[0].close, 185.64);
        assert_eq!(bars[0].volume, Some(82_488_700.0));
    }

    #[test]
    fn reads_processed_hourly_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "AAPL_hourly.csv",
            "Datetime,Close,Volume\n\
             2024-01-02 09:30:00-05:00,185.1,1000\n\
             2024-01-02 10:30:00-05:00,185.9,1200\n",
        );
        let bars = CsvPriceAdapter::new(path).fetch_prices(None, None).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[1].timestamp,
            date(2024, 1, 2).and_hms_opt(10, 30, 0).unwrap()
        );
        assert_eq!(bars[1].close, 185.9);
    }

    #[test]
    fn falls_back_to_adj_close_and_no_volume() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "timestamp,Adj Close\n2024-01-02T10:00:00,50.5\n");
        let bars = CsvPriceAdapter::new(path).fetch_prices(None, None).unwrap();
        assert_eq!(bars[0].close, 50.5);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn forward_fills_missing_close() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "p.csv",
            "Date,Close\n2024-01-02,10.0\n2024-01-03,\n2024-01-04,12.0\n",
        );
        let bars = CsvPriceAdapter::new(path).fetch_prices(None, None).unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.0, 10.0, 12.0]);
    }

    #[test]
    fn leading_missing_close_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "Date,Close\n2024-01-02,\n2024-01-03,11.0\n");
        assert!(CsvPriceAdapter::new(path).fetch_prices(None, None).is_err());
    }

    #[test]
    fn filters_by_date_range() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "p.csv",
            "Date,Close\n2024-01-02,10.0\n2024-01-03,11.0\n2024-01-04,12.0\n",
        );
        let bars = CsvPriceAdapter::new(path)
            .fetch_prices(Some(date(2024, 1, 3)), Some(date(2024, 1, 3)))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 11.0);
    }

    #[test]
    fn sorts_rows_by_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "Date,Close\n2024-01-03,11.0\n2024-01-02,10.0\n");
        let bars = CsvPriceAdapter::new(path).fetch_prices(None, None).unwrap();
        assert_eq!(bars[0].close, 10.0);
    }

    #[test]
    fn forward_fill_follows_timestamp_order() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "p.csv",
            "Date,Close\n2024-01-04,12.0\n2024-01-02,10.0\n2024-01-03,\n",
        );
        let bars = CsvPriceAdapter::new(path).fetch_prices(None, None).unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.0, 10.0, 12.0]);
    }

    #[test]
    fn fill_source_may_precede_date_range() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "Date,Close\n2024-01-02,10.0\n2024-01-03,\n");
        let bars = CsvPriceAdapter::new(path)
            .fetch_prices(Some(date(2024, 1, 3)), None)
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 10.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = CsvPriceAdapter::new("/nonexistent/prices.csv").fetch_prices(None, None);
        assert!(matches!(result, Err(TradesimError::Data { .. })));
    }

    #[test]
    fn missing_close_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "Date,Open\n2024-01-02,10.0\n");
        assert!(CsvPriceAdapter::new(path).fetch_prices(None, None).is_err());
    }

    #[test]
    fn invalid_number_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "Date,Close\n2024-01-02,abc\n");
        assert!(CsvPriceAdapter::new(path).fetch_prices(None, None).is_err());
    }

    #[test]
    fn data_range_reports_bounds() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "Date,Close\n2024-01-02,10.0\n2024-01-05,11.0\n");
        let (first, last, count) = CsvPriceAdapter::new(path).data_range().unwrap().unwrap();
        assert_eq!(first.date(), date(2024, 1, 2));
        assert_eq!(last.date(), date(2024, 1, 5));
        assert_eq!(count, 2);
    }

    #[test]
    fn data_range_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "p.csv", "Date,Close\n");
        assert!(CsvPriceAdapter::new(path).data_range().unwrap().is_none());
    }

    #[test]
    fn parse_timestamp_formats() {
        let expected = date(2024, 3, 1).and_hms_opt(14, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01 14:00:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 14:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T14:00:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            date(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("03/01/2024").is_err());
    }
}
