//! SeaORM-backed balance ledger against in-memory SQLite.

use domino_engine::adapters::wallets_sea;
use domino_engine::domain::PlayerId;
use domino_engine::error::AppError;
use domino_engine::errors::ErrorCode;
use domino_engine::ledger::{BalanceLedger, SeaLedger};
use engine_test_support::unique_uid;

async fn ledger() -> Result<SeaLedger, AppError> {
    SeaLedger::connect("sqlite::memory:").await
}

#[tokio::test]
async fn test_unknown_player_reads_zero() -> Result<(), AppError> {
    let ledger = ledger().await?;
    let uid = PlayerId::from(unique_uid("ghost").as_str());
    assert_eq!(ledger.read_balance(&uid).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_write_then_overwrite_balance() -> Result<(), AppError> {
    let ledger = ledger().await?;
    let uid = PlayerId::from(unique_uid("alice").as_str());

    ledger.write_balance(&uid, 500).await?;
    assert_eq!(ledger.read_balance(&uid).await?, 500);

    ledger.write_balance(&uid, 600).await?;
    assert_eq!(ledger.read_balance(&uid).await?, 600);

    let row = wallets_sea::find_by_user(ledger.connection(), uid.as_str())
        .await?
        .expect("wallet row");
    assert_eq!(row.tokens, 600);
    Ok(())
}

#[tokio::test]
async fn test_schema_bootstrap_is_idempotent() -> Result<(), AppError> {
    let ledger = ledger().await?;
    let uid = PlayerId::from(unique_uid("bob").as_str());
    ledger.write_balance(&uid, 42).await?;

    // Wrapping the same connection again must not drop existing rows.
    let again = SeaLedger::new(ledger.connection().clone()).await?;
    assert_eq!(again.read_balance(&uid).await?, 42);
    Ok(())
}

#[tokio::test]
async fn test_negative_tokens_read_as_corruption() -> Result<(), AppError> {
    let ledger = ledger().await?;
    let uid = unique_uid("broken");
    wallets_sea::upsert_tokens(ledger.connection(), &uid, -5).await?;

    let err = ledger
        .read_balance(&PlayerId::from(uid.as_str()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DataCorruption);
    Ok(())
}
