mod db;
mod errors;

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;

use std::{env, str::FromStr, time::Duration};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/market.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn db_url() -> String {
    let result = env::var("MKT_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ MKT_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool. Foreign keys are enforced, and writers wait on a locked database rather than failing
/// immediately, so that concurrent checkouts serialize instead of erroring out.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
