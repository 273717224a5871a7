//! AML service: adapts raw provider verdicts to the shape the chat layer renders.

use std::sync::Arc;

use crate::{
    domain::{AmlResult, TransactionResult},
    ports::AmlProvider,
    Result,
};

/// Thin adapter over an [`AmlProvider`].
///
/// No caching and no deduplication: every call is a fresh upstream request, and provider
/// errors are returned unchanged.
pub struct AmlService {
    provider: Arc<dyn AmlProvider>,
}

impl AmlService {
    pub fn new(provider: Arc<dyn AmlProvider>) -> Self {
        Self { provider }
    }

    /// Surrounding whitespace is stripped before the query, and the result echoes the
    /// identifier that was actually queried.
    pub async fn check_address(&self, address: &str) -> Result<AmlResult> {
        let address = address.trim();
        let result = self.provider.check_address(address).await?;
        Ok(AmlResult {
            address: address.to_string(),
            is_suspicious: result.is_suspicious,
            risk_score: result.risk_score,
            details: vec![result.details],
        })
    }

    pub async fn check_transaction(&self, tx_hash: &str) -> Result<TransactionResult> {
        let tx_hash = tx_hash.trim();
        let result = self.provider.check_transaction(tx_hash).await?;
        Ok(TransactionResult {
            transaction_id: tx_hash.to_string(),
            is_suspicious: result.is_suspicious,
            risk_score: result.risk_score,
            details: vec![result.details],
        })
    }
}
