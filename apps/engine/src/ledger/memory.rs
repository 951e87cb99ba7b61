use async_trait::async_trait;
use dashmap::DashMap;

use super::BalanceLedger;
use crate::domain::ids::PlayerId;
use crate::error::AppError;

/// Process-local balances for tests and the simulator.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: DashMap<PlayerId, u64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (PlayerId, u64)>,
    {
        Self {
            balances: balances.into_iter().collect(),
        }
    }

    /// Sum of every balance; settlement moves tokens without creating any
    /// unless a loser was clamped.
    pub fn total(&self) -> u64 {
        self.balances.iter().map(|e| *e.value()).sum()
    }
}

#[async_trait]
impl BalanceLedger for MemoryLedger {
    async fn read_balance(&self, uid: &PlayerId) -> Result<u64, AppError> {
        Ok(self.balances.get(uid).map(|b| *b).unwrap_or(0))
    }

    async fn write_balance(&self, uid: &PlayerId, value: u64) -> Result<(), AppError> {
        self.balances.insert(uid.clone(), value);
        Ok(())
    }
}
