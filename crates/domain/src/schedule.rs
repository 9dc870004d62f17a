//! Schedule — a daily on-window attached to one relay.
//!
//! At most one schedule exists per relay; stores upsert by `relay_id`.

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::{RelayId, ScheduleId};
use crate::time::{Timestamp, TimeOfDay};
use crate::window::TimeWindow;

/// A recurring daily interval during which a relay should be powered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub relay_id: RelayId,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub is_active: bool,
    pub updated_at: Timestamp,
}

impl Schedule {
    /// Create a builder for constructing a [`Schedule`].
    #[must_use]
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// The window this schedule describes.
    #[must_use]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// Step-by-step builder for [`Schedule`].
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    id: Option<ScheduleId>,
    relay_id: Option<RelayId>,
    start_time: Option<TimeOfDay>,
    end_time: Option<TimeOfDay>,
    is_active: Option<bool>,
    updated_at: Option<Timestamp>,
}

impl ScheduleBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn relay_id(mut self, relay_id: RelayId) -> Self {
        self.relay_id = Some(relay_id);
        self
    }

    #[must_use]
    pub fn start_time(mut self, start: TimeOfDay) -> Self {
        self.start_time = Some(start);
        self
    }

    #[must_use]
    pub fn end_time(mut self, end: TimeOfDay) -> Self {
        self.end_time = Some(end);
        self
    }

    #[must_use]
    pub fn is_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    #[must_use]
    pub fn updated_at(mut self, ts: Timestamp) -> Self {
        self.updated_at = Some(ts);
        self
    }

    /// Consume the builder and return a [`Schedule`].
    ///
    /// `is_active` defaults to `true`, `updated_at` to now.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when the relay or either
    /// bound is missing.
    pub fn build(self) -> Result<Schedule, HubError> {
        Ok(Schedule {
            id: self.id.unwrap_or_default(),
            relay_id: self
                .relay_id
                .ok_or(ValidationError::MissingField("relay_id"))?,
            start_time: self
                .start_time
                .ok_or(ValidationError::MissingField("start_time"))?,
            end_time: self
                .end_time
                .ok_or(ValidationError::MissingField("end_time"))?,
            is_active: self.is_active.unwrap_or(true),
            updated_at: self.updated_at.unwrap_or_else(crate::time::now),
        })
    }
}
