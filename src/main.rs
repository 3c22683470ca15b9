/// CoinGecko Data Fetcher
///
/// An ETL pipeline for extracting, transforming, and loading cryptocurrency
/// market data from the CoinGecko API into PostgreSQL.
mod api;
mod cli;
mod config;
mod db;
mod error;
mod etl;
mod models;
mod pipeline;

use anyhow::{Context, Result};
use api::CoinGeckoClient;
use clap::Parser;
use config::Settings;
use db::{Database, TableRef};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = cli::Cli::parse();
    cli.validate()?;

    // Configuration is read once here; CLI flags win over the environment
    let mut settings = Settings::from_env().context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        settings.api_url = url.clone();
    }
    if let Some(url) = &cli.database_url {
        settings.database_url = url.clone();
    }
    if let Some(ms) = cli.rate_limit_ms {
        settings.rate_limit_delay = Duration::from_millis(ms);
    }

    println!("🚀 Starting CoinGecko Data Fetcher...");

    // Initialize API client and check the endpoint is reachable
    let client = CoinGeckoClient::new(&settings.api_url).context("Failed to create API client")?;
    client.ping().await.context("Failed to reach the CoinGecko API")?;
    println!("✅ Connected to: {}", client.base_url());

    // Initialize database connection
    println!("\n💾 Connecting to PostgreSQL database...");
    let database =
        Database::new(&settings.database_url).await.context("Failed to connect to PostgreSQL database")?;
    database.test_connection().await.context("Database connection test failed")?;
    println!("✅ Database connected successfully!");

    // Run database migrations
    println!("📋 Running database migrations...");
    database.migrate().await.context("Failed to run database migrations")?;
    println!("✅ Database schema ready!");

    for schema in database.schema_summary().await.context("Failed to read schema summary")? {
        println!("   🗂️  {}: {} tables", schema.schema_name, schema.table_count);
    }

    if let Some(latest) = database
        .latest_extraction_time(&TableRef::cryptocurrency_data())
        .await
        .context("Failed to read latest extraction time")?
    {
        println!("⏰ Last market extraction: {}", latest.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let existing_rows = database
        .table_row_count(&TableRef::historical_data())
        .await
        .context("Failed to read historical row count")?;
    println!("📦 Historical rows already loaded: {}", existing_rows);

    tracing::info!("CoinGecko Data Fetcher initialized successfully");

    // Configure and run the pipeline
    let pipeline_config = pipeline::PipelineConfig {
        limit: cli.limit.unwrap_or(settings.default_crypto_limit),
        days: cli.days.unwrap_or(settings.default_historical_days),
        coin_ids: cli.coins.clone(),
        rate_limit_delay: settings.rate_limit_delay,
        skip_market_data: cli.skip_market_data,
        skip_historical: cli.skip_historical,
        skip_global: cli.skip_global,
    };

    let pipeline = pipeline::ExtractionPipeline::new(client, database, pipeline_config);
    let stats = pipeline.run().await;

    println!("\n✨ Extraction complete! {} records inserted", stats.records_inserted);

    Ok(())
}
