//! SeaORM adapter for the wallets table.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, EntityTrait, Schema, Set};

use crate::entities::wallets;

// Adapter functions return DbErr; the ledger maps to AppError via From<DbErr>.

/// Create the wallets table when it does not exist yet.
pub async fn ensure_schema<C: ConnectionTrait>(conn: &C) -> Result<(), sea_orm::DbErr> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(wallets::Entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;
    Ok(())
}

pub async fn find_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
) -> Result<Option<wallets::Model>, sea_orm::DbErr> {
    wallets::Entity::find_by_id(user_id.to_string())
        .one(conn)
        .await
}

/// Insert or overwrite a wallet's token count.
pub async fn upsert_tokens<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    tokens: i64,
) -> Result<(), sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let wallet = wallets::ActiveModel {
        user_id: Set(user_id.to_string()),
        tokens: Set(tokens),
        updated_at: Set(now),
    };

    wallets::Entity::insert(wallet)
        .on_conflict(
            OnConflict::column(wallets::Column::UserId)
                .update_columns([wallets::Column::Tokens, wallets::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
