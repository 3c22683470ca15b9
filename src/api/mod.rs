/// API Client Module
///
/// This module handles all interactions with the CoinGecko REST API. It wraps
/// a reqwest client and provides typed methods for the three endpoints the
/// pipeline consumes: current market snapshots, per-coin historical charts,
/// and global market statistics.
///
/// Transport and HTTP errors surface as `EtlError::Fetch` and are propagated
/// as-is; this client never retries and never substitutes defaults.
use crate::error::EtlError;
use crate::models::{CoinMarket, GlobalMarket, GlobalResponse, MarketChart};
use std::time::Duration;

/// CoinGecko caps `/coins/markets` at 250 rows per page.
const MARKETS_PAGE_CAP: usize = 250;

const USER_AGENT: &str = "coingecko-etl/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Create a new API client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, EtlError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { http, base_url: base_url.into() })
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the API is reachable (GET /ping).
    pub async fn ping(&self) -> Result<(), EtlError> {
        let url = format!("{}/ping", self.base_url);
        self.http.get(&url).send().await?.error_for_status()?;

        Ok(())
    }

    /// Fetch the top cryptocurrencies by market cap (GET /coins/markets).
    pub async fn markets(&self, limit: usize) -> Result<Vec<CoinMarket>, EtlError> {
        let url = format!("{}/coins/markets", self.base_url);
        let params = [
            ("vs_currency", "usd".to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", markets_per_page(limit).to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "1h,24h,7d".to_string()),
        ];

        tracing::info!("Fetching top {} cryptocurrencies", limit);
        let rows =
            self.http.get(&url).query(&params).send().await?.error_for_status()?.json::<Vec<CoinMarket>>().await?;

        tracing::info!("Fetched {} market rows", rows.len());
        Ok(rows)
    }

    /// Fetch historical price, market cap, and volume series for one coin
    /// (GET /coins/{id}/market_chart).
    pub async fn market_chart(&self, coin_id: &str, days: u32) -> Result<MarketChart, EtlError> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, coin_id);
        let params = [
            ("vs_currency", "usd".to_string()),
            ("days", days.to_string()),
            ("interval", chart_interval(days).to_string()),
        ];

        tracing::info!("Fetching {} days of history for {}", days, coin_id);
        let chart =
            self.http.get(&url).query(&params).send().await?.error_for_status()?.json::<MarketChart>().await?;

        Ok(chart)
    }

    /// Fetch global market statistics (GET /global).
    pub async fn global(&self) -> Result<GlobalMarket, EtlError> {
        let url = format!("{}/global", self.base_url);

        tracing::info!("Fetching global market data");
        let response = self.http.get(&url).send().await?.error_for_status()?.json::<GlobalResponse>().await?;

        Ok(response.data)
    }
}

fn markets_per_page(limit: usize) -> usize {
    limit.min(MARKETS_PAGE_CAP)
}

/// Multi-day requests use daily sampling; a single day comes back hourly.
fn chart_interval(days: u32) -> &'static str {
    if days > 1 {
        "daily"
    } else {
        "hourly"
    }
}
