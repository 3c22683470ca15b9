/// CLI Module
///
/// Command-line interface configuration using clap.
use clap::Parser;

/// CoinGecko Data Fetcher - ETL Pipeline
///
/// Extract, transform, and load cryptocurrency market data into PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "coingecko-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Coin ids for the historical batch, comma-separated (e.g. bitcoin,ethereum).
    /// Defaults to the top coins from the market snapshot.
    #[arg(short = 'c', long, value_name = "IDS", value_delimiter = ',')]
    pub coins: Vec<String>,

    /// Number of top coins for the market snapshot
    #[arg(short = 'l', long, value_name = "COUNT")]
    pub limit: Option<usize>,

    /// Days of history per coin (1-365)
    #[arg(short = 'd', long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// CoinGecko API base URL (overrides COINGECKO_API_URL env var)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Database connection URL (overrides DATABASE_URL env var)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Delay between API calls in milliseconds (overrides API_RATE_LIMIT_DELAY)
    #[arg(long, value_name = "MS")]
    pub rate_limit_ms: Option<u64>,

    /// Skip the market snapshot extraction
    #[arg(long)]
    pub skip_market_data: bool,

    /// Skip the historical extraction
    #[arg(long)]
    pub skip_historical: bool,

    /// Skip the global market extraction
    #[arg(long)]
    pub skip_global: bool,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(days) = self.days {
            if !(1..=365).contains(&days) {
                anyhow::bail!("Days must be between 1 and 365, got {}", days);
            }
        }

        if let Some(limit) = self.limit {
            if limit == 0 {
                anyhow::bail!("Limit must be greater than 0");
            }
        }

        if self.coins.iter().any(|id| id.trim().is_empty()) {
            anyhow::bail!("Coin ids must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            coins: Vec::new(),
            limit: None,
            days: None,
            api_url: None,
            database_url: None,
            rate_limit_ms: None,
            skip_market_data: false,
            skip_historical: false,
            skip_global: false,
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base_cli().validate().is_ok());
    }

    #[test]
    fn test_days_out_of_range() {
        let cli = Cli { days: Some(0), ..base_cli() };
        assert!(cli.validate().is_err());

        let cli = Cli { days: Some(400), ..base_cli() };
        assert!(cli.validate().is_err());

        let cli = Cli { days: Some(365), ..base_cli() };
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let cli = Cli { limit: Some(0), ..base_cli() };
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_blank_coin_id_rejected() {
        let cli = Cli { coins: vec!["bitcoin".to_string(), " ".to_string()], ..base_cli() };
        assert!(cli.validate().is_err());
    }
}
