use async_trait::async_trait;

use crate::{domain::CheckResult, Result};

/// Hexagonal port for an external AML risk-scoring backend.
///
/// Implementations issue exactly one upstream request per call and never retry.
/// Empty identifiers must be rejected with `Error::InvalidInput` before any I/O.
#[async_trait]
pub trait AmlProvider: Send + Sync {
    async fn check_address(&self, address: &str) -> Result<CheckResult>;
    async fn check_transaction(&self, tx_hash: &str) -> Result<CheckResult>;
}
