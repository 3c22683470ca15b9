/// Extract Module
///
/// Fetches data from the CoinGecko API and stamps each extraction with the
/// time the source snapshot was taken. The stamp is assigned once per call,
/// so every record produced from one extraction shares it.
use crate::api::CoinGeckoClient;
use crate::error::EtlError;
use crate::models::{CoinMarket, GlobalMarket, MarketChart};
use chrono::{DateTime, Utc};

/// Current per-coin market rows plus the snapshot time.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub rows: Vec<CoinMarket>,
    pub extracted_at: DateTime<Utc>,
}

/// Historical series for one coin plus the snapshot time.
#[derive(Debug, Clone)]
pub struct CoinHistory {
    pub coin_id: String,
    pub extracted_at: DateTime<Utc>,
    pub chart: MarketChart,
}

/// Global market statistics plus the snapshot time.
#[derive(Debug, Clone)]
pub struct GlobalSnapshot {
    pub data: GlobalMarket,
    pub extracted_at: DateTime<Utc>,
}

/// Fetch the current market snapshot for the top `limit` coins.
pub async fn extract_markets(client: &CoinGeckoClient, limit: usize) -> Result<MarketSnapshot, EtlError> {
    let rows = client.markets(limit).await?;

    Ok(MarketSnapshot { rows, extracted_at: Utc::now() })
}

/// Fetch `days` of price/market-cap/volume history for one coin.
pub async fn extract_history(client: &CoinGeckoClient, coin_id: &str, days: u32) -> Result<CoinHistory, EtlError> {
    let chart = client.market_chart(coin_id, days).await?;

    tracing::info!("Extracted {} price points for {}", chart.prices.len(), coin_id);
    Ok(CoinHistory { coin_id: coin_id.to_string(), extracted_at: Utc::now(), chart })
}

/// Fetch global market statistics.
pub async fn extract_global(client: &CoinGeckoClient) -> Result<GlobalSnapshot, EtlError> {
    let data = client.global().await?;

    Ok(GlobalSnapshot { data, extracted_at: Utc::now() })
}
