/// Error Module
///
/// The crate-wide error taxonomy. Alignment is a total function and has no
/// error kind; everything else falls into one of three buckets that map to
/// the pipeline stages: fetching from the API, building a tabular batch,
/// and loading into PostgreSQL.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    /// Transport or HTTP failure from the upstream API. Opaque to the core;
    /// the pipeline propagates it without interpreting or retrying.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// A record that cannot be turned into a tabular row, e.g. a missing
    /// coin id or an unrepresentable timestamp.
    #[error("build failed: {0}")]
    Build(String),

    /// Destination unavailable, unknown target table, or a value that
    /// violates the destination column type. Callers assume zero rows were
    /// written when they see this.
    #[error("load failed: {0}")]
    Load(#[from] sqlx::Error),
}

impl EtlError {
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_message() {
        let err = EtlError::build("record 3 has an empty coin_id");
        assert_eq!(err.to_string(), "build failed: record 3 has an empty coin_id");
    }
}
