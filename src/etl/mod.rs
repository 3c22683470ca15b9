/// ETL Pipeline Module
///
/// This module holds the Extract, Transform, Load stages:
/// - Extract: fetch market snapshots and per-coin history from CoinGecko
/// - Transform: align the three time series positionally and build uniform
///   tabular batches
/// - Load: append batches into PostgreSQL
pub mod align;
pub mod extract;
pub mod load;
pub mod transform;
