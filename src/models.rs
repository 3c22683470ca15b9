/// Data Models Module
///
/// This module defines the core data structures used throughout the application.
/// These models represent CoinGecko market data (current snapshots, historical
/// time series, global statistics) and the audit-log rows we persist.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single point in an upstream time series.
///
/// CoinGecko encodes these as two-element arrays `[timestamp_ms, value]`,
/// so deserialization goes through the tuple form. Timestamps arrive as
/// epoch milliseconds and occasionally carry a fractional part.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(f64, f64)")]
pub struct TimePoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl TimePoint {
    #[allow(dead_code)]
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self { timestamp_ms, value }
    }
}

impl From<(f64, f64)> for TimePoint {
    fn from((timestamp_ms, value): (f64, f64)) -> Self {
        Self { timestamp_ms: timestamp_ms as i64, value }
    }
}

/// The `/coins/{id}/market_chart` response body: three independently-indexed
/// series sampled at the same cadence. Any of them may be missing or shorter
/// than the others; the aligner decides how they combine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<TimePoint>,
    #[serde(default)]
    pub market_caps: Vec<TimePoint>,
    #[serde(default)]
    pub total_volumes: Vec<TimePoint>,
}

/// One aligned per-timestamp row for `raw_data.historical_data`.
///
/// Built fresh per extraction, held in memory only, and consumed immediately
/// by the loader. The timestamp is always taken from the prices series (the
/// anchor); market cap and volume are absent where their series ran short.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRecord {
    pub coin_id: String,
    pub timestamp_ms: i64,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
    pub extracted_at: DateTime<Utc>,
}

/// Return-on-investment sub-object attached to some market rows.
///
/// Sometimes absent, sometimes a nested mapping; modeled as an optional
/// struct and serialized to JSON text only at batch-build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub times: f64,
    pub currency: String,
    pub percentage: f64,
}

/// One row of the `/coins/markets` endpoint (current per-coin snapshot).
#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<i32>,
    #[serde(rename = "price_change_percentage_1h_in_currency")]
    pub price_change_percentage_1h: Option<f64>,
    #[serde(rename = "price_change_percentage_24h_in_currency")]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(rename = "price_change_percentage_7d_in_currency")]
    pub price_change_percentage_7d: Option<f64>,
    pub roi: Option<Roi>,
}

/// The `/global` endpoint wraps its payload in a `data` object.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalResponse {
    pub data: GlobalMarket,
}

/// Global cryptocurrency market statistics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalMarket {
    pub active_cryptocurrencies: Option<i64>,
    pub markets: Option<i64>,
    #[serde(default)]
    pub total_market_cap: HashMap<String, f64>,
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
    #[serde(default)]
    pub market_cap_percentage: HashMap<String, f64>,
    pub market_cap_change_percentage_24h_usd: Option<f64>,
}

/// Types of extraction runs we audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionType {
    MarketData,
    Historical,
    Global,
}

impl ExtractionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MarketData => "market_data",
            Self::Historical => "historical",
            Self::Global => "global",
        }
    }
}

/// Outcome of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    Success,
    Failed,
    Partial,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Partial => "partial",
        }
    }

    /// Derive the run status from per-unit counts: every unit failed means
    /// the run failed, any failure among successes is partial.
    pub fn from_counts(attempted: usize, failed: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else if failed >= attempted {
            Self::Failed
        } else {
            Self::Partial
        }
    }
}

/// One append-only audit row for `raw_data.extraction_log`.
#[derive(Debug, Clone)]
pub struct ExtractionLogEntry {
    pub extraction_type: ExtractionType,
    pub status: ExtractionStatus,
    pub records_extracted: Option<i64>,
    pub records_inserted: Option<i64>,
    pub error_message: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_point_from_array() {
        let point: TimePoint = serde_json::from_str("[1700000000000, 42000.5]").unwrap();
        assert_eq!(point.timestamp_ms, 1_700_000_000_000);
        assert_eq!(point.value, 42000.5);
    }

    #[test]
    fn test_time_point_fractional_timestamp() {
        // CoinGecko sometimes sends the millisecond timestamp with a decimal point
        let point: TimePoint = serde_json::from_str("[1700000000000.0, 1.25]").unwrap();
        assert_eq!(point.timestamp_ms, 1_700_000_000_000);
        assert_eq!(point.value, 1.25);
    }

    #[test]
    fn test_market_chart_deserialization() {
        let json = serde_json::json!({
            "prices": [[1000, 100.0], [2000, 101.0]],
            "market_caps": [[1000, 5.0e9]],
            "total_volumes": []
        });

        let chart: MarketChart = serde_json::from_value(json).unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.market_caps.len(), 1);
        assert!(chart.total_volumes.is_empty());
        assert_eq!(chart.prices[1], TimePoint::new(2000, 101.0));
    }

    #[test]
    fn test_market_chart_missing_series_defaults_empty() {
        let chart: MarketChart = serde_json::from_str(r#"{"prices": [[1000, 1.0]]}"#).unwrap();
        assert_eq!(chart.prices.len(), 1);
        assert!(chart.market_caps.is_empty());
        assert!(chart.total_volumes.is_empty());
    }

    #[test]
    fn test_coin_market_deserialization() {
        let json = serde_json::json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 42000.0,
            "market_cap": 8.2e11,
            "market_cap_rank": 1,
            "price_change_percentage_1h_in_currency": 0.1,
            "price_change_percentage_24h_in_currency": -1.5,
            "price_change_percentage_7d_in_currency": 3.2,
            "roi": null,
            "ath": 69000.0
        });

        let coin: CoinMarket = serde_json::from_value(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.market_cap_rank, Some(1));
        assert_eq!(coin.price_change_percentage_24h, Some(-1.5));
        assert!(coin.roi.is_none());
    }

    #[test]
    fn test_coin_market_roi_present() {
        let json = serde_json::json!({
            "id": "ethereum",
            "symbol": "eth",
            "name": "Ethereum",
            "current_price": 2500.0,
            "market_cap": 3.0e11,
            "market_cap_rank": 2,
            "roi": { "times": 75.3, "currency": "btc", "percentage": 7530.0 }
        });

        let coin: CoinMarket = serde_json::from_value(json).unwrap();
        let roi = coin.roi.unwrap();
        assert_eq!(roi.times, 75.3);
        assert_eq!(roi.currency, "btc");
    }

    #[test]
    fn test_extraction_type_as_str() {
        assert_eq!(ExtractionType::MarketData.as_str(), "market_data");
        assert_eq!(ExtractionType::Historical.as_str(), "historical");
        assert_eq!(ExtractionType::Global.as_str(), "global");
    }

    #[test]
    fn test_status_from_counts() {
        assert_eq!(ExtractionStatus::from_counts(10, 0), ExtractionStatus::Success);
        assert_eq!(ExtractionStatus::from_counts(10, 3), ExtractionStatus::Partial);
        assert_eq!(ExtractionStatus::from_counts(10, 10), ExtractionStatus::Failed);
        // An empty batch attempted nothing and failed nothing
        assert_eq!(ExtractionStatus::from_counts(0, 0), ExtractionStatus::Success);
    }
}
