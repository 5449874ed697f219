pub mod core;

use std::str::FromStr;

use chrono::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::domain::{
    core::{ParseStatusError, PriceError},
    BoxError, DataAccessError, Entity, Id,
};

impl From<sqlx::Error> for DataAccessError {
    fn from(value: sqlx::Error) -> Self {
        let wrap: fn(BoxError) -> Self = match &value {
            sqlx::Error::Database(e) if e.is_unique_violation() => Self::UniqueViolation,
            sqlx::Error::Database(e) if e.is_foreign_key_violation() || e.is_check_violation() => {
                Self::WriteError
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionError,
            sqlx::Error::RowNotFound
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => Self::ReadError,
            sqlx::Error::Configuration(_) | sqlx::Error::Protocol(_) => Self::ClientSideError,
            _ => Self::QueryError,
        };
        wrap(Box::new(value))
    }
}

impl From<RowConvertError> for DataAccessError {
    fn from(value: RowConvertError) -> Self {
        DataAccessError::ClientSideError(Box::new(value))
    }
}

/// 行とエンティティの変換エラー
#[derive(Error, Debug)]
pub enum RowConvertError {
    #[error("Failed to convert status: {0}")]
    Status(#[from] ParseStatusError),
    #[error("Failed to convert price: {0}")]
    Price(#[from] PriceError),
    #[error("Failed to parse price: {0}")]
    PriceText(#[from] rust_decimal::Error),
    #[error("Duration is out of range: {0}")]
    DurationOverflow(Duration),
}

/// 接続プールを作成する。外部キー制約は常に有効
pub async fn connect(config: &crate::Database) -> Result<SqlitePool, DataAccessError> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        // インメモリDBは接続が閉じると消える
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    info!("データベースに接続しました: {}", config.url);
    Ok(pool)
}

/// スキーマを最新にする
pub async fn migrate(pool: &SqlitePool) -> Result<(), DataAccessError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DataAccessError::WriteError(Box::new(e)))
}

fn encode_duration(duration: Duration) -> Result<i64, RowConvertError> {
    duration
        .num_microseconds()
        .ok_or(RowConvertError::DurationOverflow(duration))
}

fn decode_duration(microseconds: i64) -> Duration {
    Duration::microseconds(microseconds)
}

async fn delete_by_id<E>(pool: &SqlitePool, id: E::Id) -> Result<bool, DataAccessError>
where
    E: Entity,
    E::Id: Id<Inner = i64>,
{
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", E::ENTITY_NAME))
        .bind(*id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = connect(&crate::Database {
        url: "sqlite::memory:".to_owned(),
        max_connections: 1,
    })
    .await
    .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
