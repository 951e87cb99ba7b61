//! Balance collaborator: read and write a player's token balance.

pub mod memory;
pub mod sea;

use async_trait::async_trait;

use crate::domain::ids::PlayerId;
use crate::error::AppError;

pub use memory::MemoryLedger;
pub use sea::SeaLedger;

#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// Unknown players read as zero.
    async fn read_balance(&self, uid: &PlayerId) -> Result<u64, AppError>;

    async fn write_balance(&self, uid: &PlayerId, value: u64) -> Result<(), AppError>;
}
