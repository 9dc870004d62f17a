//! `SQLite` implementation of [`RelayStore`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use relayhub_app::ports::RelayStore;
use relayhub_domain::error::{HubError, NotFoundError};
use relayhub_domain::id::RelayId;
use relayhub_domain::relay::RelayObservation;

use crate::error::StorageError;
use crate::rows::{decode_relay_id, encode_relay_id};

struct Wrapper(RelayObservation);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let relay_id: i64 = row.try_get("relay_id")?;
        let current_state: bool = row.try_get("state")?;
        Ok(Self(RelayObservation {
            relay_id: decode_relay_id(relay_id)?,
            current_state,
        }))
    }
}

const SELECT_STATE: &str = "SELECT state FROM relays WHERE relay_id = ?";
const SELECT_ALL: &str = "SELECT relay_id, state FROM relays ORDER BY relay_id";
const UPDATE_STATE: &str = "UPDATE relays SET state = ?, updated_at = ? WHERE relay_id = ?";
const REGISTER: &str =
    "INSERT OR IGNORE INTO relays (relay_id, state, updated_at) VALUES (?, ?, ?)";

fn not_found(relay_id: RelayId) -> HubError {
    NotFoundError {
        entity: "Relay",
        id: relay_id.to_string(),
    }
    .into()
}

/// `SQLite`-backed relay state table.
pub struct SqliteRelayStore {
    pool: SqlitePool,
}

impl SqliteRelayStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a relay channel with an initial state; no-op when it exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the insert fails.
    pub async fn register(&self, relay_id: RelayId, state: bool) -> Result<(), HubError> {
        sqlx::query(REGISTER)
            .bind(encode_relay_id(relay_id))
            .bind(state)
            .bind(relayhub_domain::time::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl RelayStore for SqliteRelayStore {
    fn get_state(&self, relay_id: RelayId) -> impl Future<Output = Result<bool, HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let state: Option<(bool,)> = sqlx::query_as(SELECT_STATE)
                .bind(encode_relay_id(relay_id))
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            state.map(|(state,)| state).ok_or_else(|| not_found(relay_id))
        }
    }

    fn set_state(
        &self,
        relay_id: RelayId,
        state: bool,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(UPDATE_STATE)
                .bind(state)
                .bind(relayhub_domain::time::now().to_rfc3339())
                .bind(encode_relay_id(relay_id))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(not_found(relay_id));
            }
            Ok(())
        }
    }

    fn list(&self) -> impl Future<Output = Result<Vec<RelayObservation>, HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }
}
