/// Pipeline Module
///
/// Orchestrates the complete ETL pipeline: Extract → Align → Build → Load,
/// with per-coin isolation in the historical batch loop and one audit-log
/// row per extraction run.
///
/// The pipeline performs no retries of its own; a transport failure surfaces
/// exactly once. Within the historical batch a failed coin is logged and
/// skipped while the remaining coins proceed.
use crate::api::CoinGeckoClient;
use crate::db::{Database, TableRef};
use crate::error::EtlError;
use crate::etl::load::LoadMode;
use crate::etl::{align, extract, load, transform};
use crate::models::{ExtractionLogEntry, ExtractionStatus, ExtractionType};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// How many snapshot coins feed the historical batch when no explicit coin
/// list is configured.
const DEFAULT_HISTORY_COINS: usize = 10;

/// Pipeline execution statistics
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub coins_attempted: usize,
    pub coins_succeeded: usize,
    pub coins_failed: usize,
    pub records_extracted: usize,
    pub records_inserted: usize,
    pub elapsed_time: Duration,
    pub errors: Vec<PipelineError>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_rate(&self) -> f64 {
        if self.coins_attempted == 0 {
            0.0
        } else {
            (self.coins_succeeded as f64 / self.coins_attempted as f64) * 100.0
        }
    }

    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.records_inserted as f64 / secs
        }
    }
}

/// Pipeline error with context
#[derive(Debug, Clone)]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub coin_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetch,
    Build,
    Load,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Fetch => write!(f, "Fetch"),
            PipelineStage::Build => write!(f, "Build"),
            PipelineStage::Load => write!(f, "Load"),
        }
    }
}

fn stage_of(error: &EtlError) -> PipelineStage {
    match error {
        EtlError::Fetch(_) => PipelineStage::Fetch,
        EtlError::Build(_) => PipelineStage::Build,
        EtlError::Load(_) => PipelineStage::Load,
    }
}

/// Configuration for pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How many top coins the market snapshot covers.
    pub limit: usize,
    /// Days of history per coin.
    pub days: u32,
    /// Explicit coin list for the historical batch; when empty, the top
    /// snapshot coins are used.
    pub coin_ids: Vec<String>,
    /// Pause between per-coin history fetches.
    pub rate_limit_delay: Duration,
    pub skip_market_data: bool,
    pub skip_historical: bool,
    pub skip_global: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            days: 7,
            coin_ids: Vec::new(),
            rate_limit_delay: Duration::from_millis(1200),
            skip_market_data: false,
            skip_historical: false,
            skip_global: false,
        }
    }
}

/// Main ETL Pipeline
pub struct ExtractionPipeline {
    client: CoinGeckoClient,
    database: Database,
    config: PipelineConfig,
}

impl ExtractionPipeline {
    /// Create a new pipeline instance
    pub fn new(client: CoinGeckoClient, database: Database, config: PipelineConfig) -> Self {
        Self { client, database, config }
    }

    /// Run the configured extraction types sequentially. A failed extraction
    /// type is logged and does not abort the others.
    pub async fn run(&self) -> PipelineStats {
        let started = Instant::now();
        let mut stats = PipelineStats::new();

        tracing::info!("Starting extraction pipeline");

        let snapshot_ids = if self.config.skip_market_data {
            Vec::new()
        } else {
            self.run_market_snapshot(&mut stats).await
        };

        if !self.config.skip_historical {
            let coins = history_coins(&self.config.coin_ids, &snapshot_ids);
            self.run_historical(&coins, &mut stats).await;
        }

        if !self.config.skip_global {
            self.run_global(&mut stats).await;
        }

        stats.elapsed_time = started.elapsed();

        println!("\n✅ Pipeline complete!");
        self.print_final_stats(&stats);

        stats
    }

    /// Extract and load the current market snapshot. Returns the coin ids it
    /// saw so the historical batch can reuse them.
    async fn run_market_snapshot(&self, stats: &mut PipelineStats) -> Vec<String> {
        let start_time = Utc::now();

        println!("\n📊 Extracting market snapshot (top {} coins)...", self.config.limit);

        match self.market_snapshot_inner().await {
            Ok((ids, extracted, inserted)) => {
                stats.records_extracted += extracted;
                stats.records_inserted += inserted as usize;
                println!("   ✅ Inserted {} market rows", inserted);
                self.log_run(
                    ExtractionType::MarketData,
                    ExtractionStatus::Success,
                    Some(extracted as i64),
                    Some(inserted as i64),
                    None,
                    start_time,
                )
                .await;
                ids
            }
            Err(e) => {
                tracing::error!("Market snapshot extraction failed: {}", e);
                stats.errors.push(PipelineError { stage: stage_of(&e), coin_id: None, message: e.to_string() });
                self.log_run(ExtractionType::MarketData, ExtractionStatus::Failed, None, None, Some(e.to_string()), start_time)
                    .await;
                Vec::new()
            }
        }
    }

    async fn market_snapshot_inner(&self) -> Result<(Vec<String>, usize, u64), EtlError> {
        let snapshot = extract::extract_markets(&self.client, self.config.limit).await?;
        let ids: Vec<String> = snapshot.rows.iter().map(|row| row.id.clone()).collect();

        let batch = transform::build_market_batch(&snapshot.rows, snapshot.extracted_at)?;
        let inserted =
            load::load(self.database.pool(), &batch, &TableRef::cryptocurrency_data(), LoadMode::Append).await?;

        Ok((ids, snapshot.rows.len(), inserted))
    }

    /// Extract, align, and load history for each coin in turn. One coin's
    /// failure does not abort the batch: it is recorded and skipped.
    async fn run_historical(&self, coins: &[String], stats: &mut PipelineStats) {
        let start_time = Utc::now();
        let mut extracted_total: i64 = 0;
        let mut inserted_total: i64 = 0;
        let mut failed = 0;

        println!("\n📈 Extracting {} days of history for {} coins...", self.config.days, coins.len());

        for (index, coin_id) in coins.iter().enumerate() {
            stats.coins_attempted += 1;

            match self.process_coin(coin_id).await {
                Ok((extracted, inserted)) => {
                    stats.coins_succeeded += 1;
                    extracted_total += extracted;
                    inserted_total += inserted;
                    println!("   ✅ {}: {} records", coin_id, inserted);
                }
                Err(e) => {
                    failed += 1;
                    stats.coins_failed += 1;
                    tracing::warn!("Skipping {}: {}", coin_id, e);
                    stats.errors.push(PipelineError {
                        stage: stage_of(&e),
                        coin_id: Some(coin_id.clone()),
                        message: e.to_string(),
                    });
                }
            }

            // Rate limiting (skip after the last coin)
            if index + 1 < coins.len() && !self.config.rate_limit_delay.is_zero() {
                tokio::time::sleep(self.config.rate_limit_delay).await;
            }
        }

        stats.records_extracted += extracted_total as usize;
        stats.records_inserted += inserted_total as usize;

        let status = ExtractionStatus::from_counts(coins.len(), failed);
        let error_message =
            if failed > 0 { Some(format!("{} of {} coins failed", failed, coins.len())) } else { None };
        self.log_run(
            ExtractionType::Historical,
            status,
            Some(extracted_total),
            Some(inserted_total),
            error_message,
            start_time,
        )
        .await;
    }

    /// One coin, start to finish: fetch → align → build → load.
    async fn process_coin(&self, coin_id: &str) -> Result<(i64, i64), EtlError> {
        let history = extract::extract_history(&self.client, coin_id, self.config.days).await?;
        let records = align::align_chart(&history.coin_id, history.extracted_at, &history.chart);
        let batch = transform::build_historical_batch(&records)?;
        let inserted = load::load(self.database.pool(), &batch, &TableRef::historical_data(), LoadMode::Append).await?;

        Ok((records.len() as i64, inserted as i64))
    }

    /// Extract and load the global market snapshot.
    async fn run_global(&self, stats: &mut PipelineStats) {
        let start_time = Utc::now();

        println!("\n🌍 Extracting global market data...");

        match self.global_inner().await {
            Ok(inserted) => {
                stats.records_extracted += 1;
                stats.records_inserted += inserted as usize;
                println!("   ✅ Inserted global market row");
                self.log_run(ExtractionType::Global, ExtractionStatus::Success, Some(1), Some(inserted as i64), None, start_time)
                    .await;
            }
            Err(e) => {
                tracing::error!("Global extraction failed: {}", e);
                stats.errors.push(PipelineError { stage: stage_of(&e), coin_id: None, message: e.to_string() });
                self.log_run(ExtractionType::Global, ExtractionStatus::Failed, None, None, Some(e.to_string()), start_time)
                    .await;
            }
        }
    }

    async fn global_inner(&self) -> Result<u64, EtlError> {
        let snapshot = extract::extract_global(&self.client).await?;
        let batch = transform::build_global_batch(&snapshot.data, snapshot.extracted_at)?;
        let inserted = load::load(self.database.pool(), &batch, &TableRef::global_market_data(), LoadMode::Append).await?;

        Ok(inserted)
    }

    /// Append one audit row for a finished run. A failed audit write must
    /// not fail the run it describes.
    async fn log_run(
        &self,
        extraction_type: ExtractionType,
        status: ExtractionStatus,
        records_extracted: Option<i64>,
        records_inserted: Option<i64>,
        error_message: Option<String>,
        start_time: DateTime<Utc>,
    ) {
        let end_time = Utc::now();
        let duration_seconds = (end_time - start_time).num_milliseconds() as f64 / 1000.0;

        let entry = ExtractionLogEntry {
            extraction_type,
            status,
            records_extracted,
            records_inserted,
            error_message,
            start_time,
            end_time,
            duration_seconds: Some(duration_seconds),
        };

        if let Err(e) = self.database.insert_extraction_log(&entry).await {
            tracing::warn!("Failed to write extraction log entry: {}", e);
        }
    }

    /// Print final statistics
    fn print_final_stats(&self, stats: &PipelineStats) {
        println!("\n📊 Pipeline Statistics:");
        println!("   ⏱️  Total time: {:.2}s", stats.elapsed_time.as_secs_f64());
        println!(
            "   🪙 Coins: {} attempted, {} succeeded, {} failed",
            stats.coins_attempted, stats.coins_succeeded, stats.coins_failed
        );
        println!("   ✅ Success rate: {:.1}%", stats.success_rate());
        println!("   📝 Records extracted: {}", stats.records_extracted);
        println!("   💾 Records inserted: {}", stats.records_inserted);
        println!("   ⚡ Throughput: {:.0} records/sec", stats.records_per_second());

        if !stats.errors.is_empty() {
            println!("\n❌ Errors encountered: {}", stats.errors.len());
            for (i, error) in stats.errors.iter().take(5).enumerate() {
                match &error.coin_id {
                    Some(coin) => println!("   {}. [{}] {}: {}", i + 1, error.stage, coin, error.message),
                    None => println!("   {}. [{}] {}", i + 1, error.stage, error.message),
                }
            }
            if stats.errors.len() > 5 {
                println!("   ... and {} more errors", stats.errors.len() - 5);
            }
        }
    }
}

/// Pick the coins for the historical batch: an explicit list wins, otherwise
/// the top snapshot coins, otherwise bitcoin alone.
fn history_coins(configured: &[String], snapshot_ids: &[String]) -> Vec<String> {
    if !configured.is_empty() {
        configured.to_vec()
    } else if !snapshot_ids.is_empty() {
        snapshot_ids.iter().take(DEFAULT_HISTORY_COINS).cloned().collect()
    } else {
        vec!["bitcoin".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_history_coins_prefers_configured_list() {
        let picked = history_coins(&coins(&["dogecoin"]), &coins(&["bitcoin", "ethereum"]));
        assert_eq!(picked, coins(&["dogecoin"]));
    }

    #[test]
    fn test_history_coins_falls_back_to_snapshot() {
        let snapshot: Vec<String> = (0..20).map(|i| format!("coin{}", i)).collect();
        let picked = history_coins(&[], &snapshot);
        assert_eq!(picked.len(), DEFAULT_HISTORY_COINS);
        assert_eq!(picked[0], "coin0");
    }

    #[test]
    fn test_history_coins_defaults_to_bitcoin() {
        assert_eq!(history_coins(&[], &[]), coins(&["bitcoin"]));
    }

    #[test]
    fn test_stage_of_maps_error_variants() {
        assert_eq!(stage_of(&EtlError::build("bad record")), PipelineStage::Build);
        assert_eq!(stage_of(&EtlError::Load(sqlx::Error::PoolClosed)), PipelineStage::Load);
    }

    #[test]
    fn test_success_rate() {
        let stats = PipelineStats { coins_attempted: 4, coins_succeeded: 3, ..Default::default() };
        assert_eq!(stats.success_rate(), 75.0);

        let empty = PipelineStats::new();
        assert_eq!(empty.success_rate(), 0.0);
    }
}
