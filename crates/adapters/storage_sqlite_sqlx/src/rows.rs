//! Column codecs shared by the repositories.

use relayhub_domain::id::RelayId;
use relayhub_domain::time::Timestamp;

fn decode_error(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn decode_relay_id(value: i64) -> Result<RelayId, sqlx::Error> {
    let channel = u16::try_from(value).map_err(decode_error)?;
    RelayId::new(channel).map_err(decode_error)
}

pub(crate) fn decode_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&chrono::Utc))
        .map_err(decode_error)
}

pub(crate) fn encode_relay_id(relay_id: RelayId) -> i64 {
    i64::from(relay_id.get())
}
