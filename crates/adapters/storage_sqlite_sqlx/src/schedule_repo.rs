//! `SQLite` implementation of [`ScheduleStore`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use relayhub_app::ports::ScheduleStore;
use relayhub_domain::error::{HubError, NotFoundError};
use relayhub_domain::id::{RelayId, ScheduleId};
use relayhub_domain::schedule::Schedule;
use relayhub_domain::time::TimeOfDay;

use crate::error::StorageError;
use crate::rows::{decode_relay_id, decode_timestamp, encode_relay_id};

/// Wrapper for converting database rows into domain [`Schedule`].
struct Wrapper(Schedule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let relay_id: i64 = row.try_get("relay_id")?;
        let start_time: String = row.try_get("start_time")?;
        let end_time: String = row.try_get("end_time")?;
        let is_active: bool = row.try_get("is_active")?;
        let updated_at: String = row.try_get("updated_at")?;

        let id = ScheduleId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let start_time =
            TimeOfDay::from_str(&start_time).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let end_time =
            TimeOfDay::from_str(&end_time).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Schedule {
            id,
            relay_id: decode_relay_id(relay_id)?,
            start_time,
            end_time,
            is_active,
            updated_at: decode_timestamp(&updated_at)?,
        }))
    }
}

const SELECT_ACTIVE: &str = "SELECT * FROM relay_schedules WHERE is_active = 1 ORDER BY relay_id";
const SELECT_ALL: &str = "SELECT * FROM relay_schedules ORDER BY relay_id";
const ENSURE_RELAY: &str =
    "INSERT OR IGNORE INTO relays (relay_id, state, updated_at) VALUES (?, 0, ?)";
const UPSERT: &str = "INSERT INTO relay_schedules (id, relay_id, start_time, end_time, is_active, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?) \
     ON CONFLICT (relay_id) DO UPDATE SET \
         start_time = excluded.start_time, \
         end_time = excluded.end_time, \
         is_active = excluded.is_active, \
         updated_at = excluded.updated_at \
     RETURNING *";
const DELETE_BY_RELAY: &str = "DELETE FROM relay_schedules WHERE relay_id = ?";

/// `SQLite`-backed schedule store. At most one schedule per relay.
pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn list_active(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ACTIVE)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Schedule>, HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    /// Registers the relay channel too when it is not known yet.
    fn upsert(&self, schedule: Schedule) -> impl Future<Output = Result<Schedule, HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let relay_id = encode_relay_id(schedule.relay_id);
            let updated_at = schedule.updated_at.to_rfc3339();

            sqlx::query(ENSURE_RELAY)
                .bind(relay_id)
                .bind(&updated_at)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            let stored: Wrapper = sqlx::query_as(UPSERT)
                .bind(schedule.id.to_string())
                .bind(relay_id)
                .bind(schedule.start_time.to_string())
                .bind(schedule.end_time.to_string())
                .bind(schedule.is_active)
                .bind(&updated_at)
                .fetch_one(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(stored.0)
        }
    }

    fn delete(&self, relay_id: RelayId) -> impl Future<Output = Result<(), HubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_BY_RELAY)
                .bind(encode_relay_id(relay_id))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(NotFoundError {
                    entity: "Schedule",
                    id: relay_id.to_string(),
                }
                .into());
            }
            Ok(())
        }
    }
}
