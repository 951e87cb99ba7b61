use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

use super::BalanceLedger;
use crate::adapters::wallets_sea;
use crate::domain::ids::PlayerId;
use crate::error::AppError;
use crate::errors::ErrorCode;

/// Balances persisted in the `wallets` table.
#[derive(Debug, Clone)]
pub struct SeaLedger {
    db: DatabaseConnection,
}

impl SeaLedger {
    /// Wrap an open connection, creating the table if needed.
    pub async fn new(db: DatabaseConnection) -> Result<Self, AppError> {
        wallets_sea::ensure_schema(&db).await?;
        Ok(Self { db })
    }

    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let db = Database::connect(url).await?;
        info!(backend = ?db.get_database_backend(), "ledger database connected");
        Self::new(db).await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl BalanceLedger for SeaLedger {
    async fn read_balance(&self, uid: &PlayerId) -> Result<u64, AppError> {
        let Some(wallet) = wallets_sea::find_by_user(&self.db, uid.as_str()).await? else {
            return Ok(0);
        };
        u64::try_from(wallet.tokens).map_err(|_| AppError::Storage {
            code: ErrorCode::DataCorruption,
            detail: format!("wallet for {uid} holds {} tokens", wallet.tokens),
        })
    }

    async fn write_balance(&self, uid: &PlayerId, value: u64) -> Result<(), AppError> {
        let tokens = i64::try_from(value)
            .map_err(|_| AppError::internal(format!("balance {value} does not fit a wallet")))?;
        wallets_sea::upsert_tokens(&self.db, uid.as_str(), tokens).await?;
        Ok(())
    }
}
