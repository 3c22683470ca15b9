/// Transform Module
///
/// Turns in-memory records into uniform tabular batches ready for bulk load.
/// The destination storage model is flat, so the one structured sub-field
/// (the ROI object on market rows) is serialized to JSON text here, as an
/// explicit encoding step rather than a stringify-on-write.
use crate::error::EtlError;
use crate::models::{AlignedRecord, CoinMarket, GlobalMarket, Roi};
use chrono::{DateTime, Utc};

/// A typed, named column of values. `None` entries become storage NULLs.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i32>>),
    BigInt(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<DateTime<Utc>>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::BigInt(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Timestamp(v) => v.len(),
        }
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn new(name: &str, values: ColumnValues) -> Self {
        Self { name: name.to_string(), values }
    }
}

/// An ordered set of equal-length named columns: one batch, ready to load.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularBatch {
    columns: Vec<Column>,
}

impl TabularBatch {
    /// Assemble a batch, enforcing the equal-length column invariant.
    pub fn new(columns: Vec<Column>) -> Result<Self, EtlError> {
        if let Some(first) = columns.first() {
            let rows = first.values.len();
            for column in &columns {
                if column.values.len() != rows {
                    return Err(EtlError::build(format!(
                        "column {} has {} values, expected {}",
                        column.name,
                        column.values.len(),
                        rows
                    )));
                }
            }
        }

        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.values)
    }
}

/// Build the `raw_data.historical_data` batch from aligned records.
pub fn build_historical_batch(records: &[AlignedRecord]) -> Result<TabularBatch, EtlError> {
    let mut coin_ids = Vec::with_capacity(records.len());
    let mut timestamps = Vec::with_capacity(records.len());
    let mut prices = Vec::with_capacity(records.len());
    let mut market_caps = Vec::with_capacity(records.len());
    let mut volumes = Vec::with_capacity(records.len());
    let mut extracted_ats = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.coin_id.trim().is_empty() {
            return Err(EtlError::build(format!("record {} has an empty coin_id", index)));
        }
        let timestamp = DateTime::from_timestamp_millis(record.timestamp_ms)
            .ok_or_else(|| EtlError::build(format!("record {} timestamp {} ms is out of range", index, record.timestamp_ms)))?;

        coin_ids.push(Some(record.coin_id.clone()));
        timestamps.push(Some(timestamp));
        prices.push(record.price);
        market_caps.push(record.market_cap);
        volumes.push(record.volume);
        extracted_ats.push(Some(record.extracted_at));
    }

    TabularBatch::new(vec![
        Column::new("coin_id", ColumnValues::Text(coin_ids)),
        Column::new("timestamp", ColumnValues::Timestamp(timestamps)),
        Column::new("price", ColumnValues::Float(prices)),
        Column::new("market_cap", ColumnValues::Float(market_caps)),
        Column::new("volume", ColumnValues::Float(volumes)),
        Column::new("extracted_at", ColumnValues::Timestamp(extracted_ats)),
    ])
}

/// Build the `raw_data.cryptocurrency_data` batch from market snapshot rows.
pub fn build_market_batch(rows: &[CoinMarket], extracted_at: DateTime<Utc>) -> Result<TabularBatch, EtlError> {
    let mut ids = Vec::with_capacity(rows.len());
    let mut symbols = Vec::with_capacity(rows.len());
    let mut names = Vec::with_capacity(rows.len());
    let mut current_prices = Vec::with_capacity(rows.len());
    let mut market_caps = Vec::with_capacity(rows.len());
    let mut ranks = Vec::with_capacity(rows.len());
    let mut changes_1h = Vec::with_capacity(rows.len());
    let mut changes_24h = Vec::with_capacity(rows.len());
    let mut changes_7d = Vec::with_capacity(rows.len());
    let mut rois = Vec::with_capacity(rows.len());
    let mut extracted_ats = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        if row.id.trim().is_empty() {
            return Err(EtlError::build(format!("market row {} has an empty id", index)));
        }

        ids.push(Some(row.id.clone()));
        symbols.push(Some(row.symbol.clone()));
        names.push(Some(row.name.clone()));
        current_prices.push(row.current_price);
        market_caps.push(row.market_cap);
        ranks.push(row.market_cap_rank);
        changes_1h.push(row.price_change_percentage_1h);
        changes_24h.push(row.price_change_percentage_24h);
        changes_7d.push(row.price_change_percentage_7d);
        rois.push(encode_roi(row.roi.as_ref())?);
        extracted_ats.push(Some(extracted_at));
    }

    TabularBatch::new(vec![
        Column::new("id", ColumnValues::Text(ids)),
        Column::new("symbol", ColumnValues::Text(symbols)),
        Column::new("name", ColumnValues::Text(names)),
        Column::new("current_price", ColumnValues::Float(current_prices)),
        Column::new("market_cap", ColumnValues::Float(market_caps)),
        Column::new("market_cap_rank", ColumnValues::Int(ranks)),
        Column::new("price_change_percentage_1h", ColumnValues::Float(changes_1h)),
        Column::new("price_change_percentage_24h", ColumnValues::Float(changes_24h)),
        Column::new("price_change_percentage_7d", ColumnValues::Float(changes_7d)),
        Column::new("roi", ColumnValues::Text(rois)),
        Column::new("extracted_at", ColumnValues::Timestamp(extracted_ats)),
    ])
}

/// Build the one-row `raw_data.global_market_data` batch.
pub fn build_global_batch(global: &GlobalMarket, extracted_at: DateTime<Utc>) -> Result<TabularBatch, EtlError> {
    TabularBatch::new(vec![
        Column::new("active_cryptocurrencies", ColumnValues::BigInt(vec![global.active_cryptocurrencies])),
        Column::new("markets", ColumnValues::BigInt(vec![global.markets])),
        Column::new("total_market_cap_usd", ColumnValues::Float(vec![global.total_market_cap.get("usd").copied()])),
        Column::new("total_volume_usd", ColumnValues::Float(vec![global.total_volume.get("usd").copied()])),
        Column::new("btc_dominance", ColumnValues::Float(vec![global.market_cap_percentage.get("btc").copied()])),
        Column::new(
            "market_cap_change_percentage_24h_usd",
            ColumnValues::Float(vec![global.market_cap_change_percentage_24h_usd]),
        ),
        Column::new("extracted_at", ColumnValues::Timestamp(vec![Some(extracted_at)])),
    ])
}

/// Serialize an ROI sub-object to its canonical JSON text.
///
/// An absent ROI encodes to None (storage NULL) - never the literal text
/// "null" and never an empty object.
pub fn encode_roi(roi: Option<&Roi>) -> Result<Option<String>, EtlError> {
    match roi {
        Some(roi) => {
            let text = serde_json::to_string(roi).map_err(|e| EtlError::build(format!("roi encoding failed: {}", e)))?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}
