//! Reference district loader backed by Postgres.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::info;

use crate::error::{EnrichError, Result};
use crate::models::ReferenceRecord;

#[derive(Clone)]
pub struct ReferenceLoader {
    pool: PgPool,
}

impl ReferenceLoader {
    /// Open a pool and make sure the server answers.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(EnrichError::Connection)?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(EnrichError::Connection)?;

        info!("Connected to reference database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run `query` and scan every row as `(id, name)`.
    pub async fn load_all(&self, query: &str) -> Result<Vec<ReferenceRecord>> {
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(EnrichError::Query)?;

        let records = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| scan_row(idx, row))
            .collect::<Result<Vec<_>>>()?;

        info!("Loaded {} reference districts", records.len());
        Ok(records)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn scan_row(idx: usize, row: &PgRow) -> Result<ReferenceRecord> {
    // Accept both INT4 and INT8 id columns
    let id = match row.try_get::<i64, _>(0) {
        Ok(id) => id,
        Err(_) => row
            .try_get::<i32, _>(0)
            .map(i64::from)
            .map_err(|source| EnrichError::Scan { row: idx, source })?,
    };
    let name: String = row
        .try_get(1)
        .map_err(|source| EnrichError::Scan { row: idx, source })?;

    Ok(ReferenceRecord { id, name })
}
