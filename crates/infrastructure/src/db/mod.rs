//! 数据库连接与仓储实现。

use domain::RepositoryError;
use sqlx::{PgPool, Pool, Postgres};

pub mod repositories;

pub type DbPool = Pool<Postgres>;

/// 内置迁移器，启动时由二进制执行。
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

pub async fn create_pg_pool(database_url: &str, max_size: u32) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_size)
        .connect(database_url)
        .await
}

/// sqlx 错误到仓储错误的统一映射。
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}
