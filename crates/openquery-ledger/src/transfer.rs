//! External value-transfer boundary
//!
//! Value transfer is an atomic external primitive. The ledger never assumes
//! a transfer succeeded without an explicit success signal, and it never
//! decrements a locked balance without a compensating transfer attempt.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use openquery_types::{ActorId, Amount, MarketError, Result};
use tokio::sync::RwLock;

/// External value-transfer primitive
#[async_trait::async_trait]
pub trait ValueTransfer: Send + Sync {
    /// Transfer `amount` to `to`, confirming success explicitly
    async fn transfer(&self, to: &ActorId, amount: Amount) -> Result<()>;
}

/// In-memory transfer sink crediting a balance map
///
/// Used by tests and demos. Transfers to actors in the failure set are
/// rejected, which exercises the `TransferFailed` path.
#[derive(Clone)]
pub struct InMemoryTransfer {
    balances: Arc<RwLock<HashMap<ActorId, Amount>>>,
    failing: Arc<RwLock<HashSet<ActorId>>>,
}

impl InMemoryTransfer {
    /// Create an empty transfer sink
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Get the credited balance of an actor
    pub async fn balance(&self, actor: &ActorId) -> Amount {
        self.balances
            .read()
            .await
            .get(actor)
            .copied()
            .unwrap_or_default()
    }

    /// Make every transfer to `actor` fail until cleared
    pub async fn fail_transfers_to(&self, actor: ActorId) {
        self.failing.write().await.insert(actor);
    }

    /// Clear a transfer failure for `actor`
    pub async fn clear_failure(&self, actor: &ActorId) {
        self.failing.write().await.remove(actor);
    }
}

impl Default for InMemoryTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ValueTransfer for InMemoryTransfer {
    async fn transfer(&self, to: &ActorId, amount: Amount) -> Result<()> {
        if self.failing.read().await.contains(to) {
            return Err(MarketError::TransferFailed {
                to: to.to_string(),
                reason: "transfer rejected by counterparty".to_string(),
            });
        }

        let mut balances = self.balances.write().await;
        let current = balances.get(to).copied().unwrap_or_default();
        balances.insert(to.clone(), current.checked_add(amount)?);
        Ok(())
    }
}
