/// Alignment Module
///
/// Reconstructs unified per-timestamp records from the three positionally-
/// indexed series CoinGecko returns (prices, market caps, total volumes).
///
/// The API samples all three series at the same cadence over the same range,
/// so elements are matched by index, not by timestamp value. The prices
/// series is the anchor: it determines the number of records and supplies
/// every record's timestamp. Market-cap and volume points beyond the anchor
/// length are dropped; where those series run short the fields stay absent,
/// never backfilled from a prior position.
use crate::models::{AlignedRecord, MarketChart, TimePoint};
use chrono::{DateTime, Utc};

/// Merge three time series into aligned records.
///
/// Total over any three inputs, including empty ones: an empty anchor yields
/// an empty output, and the output length always equals `prices.len()`.
pub fn align(
    coin_id: &str,
    extracted_at: DateTime<Utc>,
    prices: &[TimePoint],
    market_caps: &[TimePoint],
    volumes: &[TimePoint],
) -> Vec<AlignedRecord> {
    let mut records: Vec<AlignedRecord> = prices
        .iter()
        .map(|point| AlignedRecord {
            coin_id: coin_id.to_string(),
            timestamp_ms: point.timestamp_ms,
            price: Some(point.value),
            market_cap: None,
            volume: None,
            extracted_at,
        })
        .collect();

    for (record, point) in records.iter_mut().zip(market_caps) {
        record.market_cap = Some(point.value);
    }
    for (record, point) in records.iter_mut().zip(volumes) {
        record.volume = Some(point.value);
    }

    records
}

/// Align a full `/market_chart` response for one coin.
pub fn align_chart(coin_id: &str, extracted_at: DateTime<Utc>, chart: &MarketChart) -> Vec<AlignedRecord> {
    align(coin_id, extracted_at, &chart.prices, &chart.market_caps, &chart.total_volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimePoint;

    fn points(pairs: &[(i64, f64)]) -> Vec<TimePoint> {
        pairs.iter().map(|&(t, v)| TimePoint::new(t, v)).collect()
    }

    fn now() -> DateTime<Utc> {
        "2024-01-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_output_length_follows_anchor() {
        let prices = points(&[(1000, 1.0), (2000, 2.0), (3000, 3.0)]);
        let caps = points(&[(1000, 10.0)]);
        let vols = points(&[(1000, 5.0), (2000, 6.0), (3000, 7.0), (4000, 8.0), (5000, 9.0)]);

        let records = align("bitcoin", now(), &prices, &caps, &vols);
        assert_eq!(records.len(), prices.len());
    }

    #[test]
    fn test_empty_anchor_yields_empty_output() {
        let caps = points(&[(1000, 10.0), (2000, 11.0)]);
        let vols = points(&[(1000, 5.0)]);

        let records = align("bitcoin", now(), &[], &caps, &vols);
        assert!(records.is_empty());
    }

    #[test]
    fn test_short_series_leaves_fields_absent() {
        // Scenario: 3 prices, 2 market caps, no volumes
        let prices = points(&[(1000, 100.0), (2000, 101.0), (3000, 102.0)]);
        let caps = points(&[(1000, 5.0e9), (2000, 5.1e9)]);

        let records = align("bitcoin", now(), &prices, &caps, &[]);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].market_cap, Some(5.0e9));
        assert_eq!(records[1].market_cap, Some(5.1e9));
        // Position 2 has no market-cap point; it must stay absent, not
        // repeat the value from position 1.
        assert_eq!(records[2].market_cap, None);
        assert!(records.iter().all(|r| r.volume.is_none()));
    }

    #[test]
    fn test_surplus_points_beyond_anchor_are_dropped() {
        let prices = points(&[(1000, 100.0), (2000, 101.0)]);
        let caps = points(&[(1000, 1.0), (2000, 2.0), (3000, 3.0), (4000, 4.0)]);
        let vols = points(&[(1000, 9.0), (2000, 8.0), (3000, 7.0)]);

        let records = align("bitcoin", now(), &prices, &caps, &vols);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].market_cap, Some(2.0));
        assert_eq!(records[1].volume, Some(8.0));
    }

    #[test]
    fn test_alignment_is_positional_not_by_timestamp() {
        // The market-cap point at index 0 has a timestamp that doesn't match
        // the anchor's. Its value is still taken at position 0: alignment is
        // by index, mirroring the upstream cadence guarantee.
        let prices = points(&[(1000, 100.0), (2000, 101.0)]);
        let caps = points(&[(1500, 7.0e9), (2500, 7.1e9)]);

        let records = align("bitcoin", now(), &prices, &caps, &[]);

        assert_eq!(records[0].timestamp_ms, 1000);
        assert_eq!(records[0].market_cap, Some(7.0e9));
        assert_eq!(records[1].timestamp_ms, 2000);
        assert_eq!(records[1].market_cap, Some(7.1e9));
    }

    #[test]
    fn test_record_fields_come_from_anchor_and_metadata() {
        let extracted_at = now();
        let prices = points(&[(1000, 100.0)]);

        let records = align("ethereum", extracted_at, &prices, &[], &[]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coin_id, "ethereum");
        assert_eq!(records[0].timestamp_ms, 1000);
        assert_eq!(records[0].price, Some(100.0));
        assert_eq!(records[0].extracted_at, extracted_at);
    }

    #[test]
    fn test_align_chart_uses_all_three_series() {
        let chart = MarketChart {
            prices: points(&[(1000, 100.0), (2000, 101.0)]),
            market_caps: points(&[(1000, 5.0e9), (2000, 5.1e9)]),
            total_volumes: points(&[(1000, 1.0e8), (2000, 1.1e8)]),
        };

        let records = align_chart("bitcoin", now(), &chart);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].price, Some(101.0));
        assert_eq!(records[1].market_cap, Some(5.1e9));
        assert_eq!(records[1].volume, Some(1.1e8));
    }
}
