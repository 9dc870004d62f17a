//! Append-only relay audit log backed by `SQLite`.

use std::future::Future;

use sqlx::SqlitePool;

use relayhub_app::ports::RelayLog;
use relayhub_domain::error::HubError;
use relayhub_domain::relay::RelayLogEntry;

use crate::error::StorageError;
use crate::rows::encode_relay_id;

const INSERT: &str = "INSERT INTO relay_logs (relay_id, state, created_at) VALUES (?, ?, ?)";

pub struct SqliteRelayLog {
    pool: SqlitePool,
}

impl SqliteRelayLog {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RelayLog for SqliteRelayLog {
    fn append(&self, entry: RelayLogEntry) -> impl Future<Output = Result<(), HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(encode_relay_id(entry.relay_id))
                .bind(entry.state)
                .bind(entry.at.to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
