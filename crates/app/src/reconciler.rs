//! Relay reconciliation: desired state from the schedule window versus the
//! observed relay state.

use relayhub_domain::relay::{RelayObservation, ToggleCommand};
use relayhub_domain::schedule::Schedule;
use relayhub_domain::time::{TimeOfDay, Timestamp};

/// Decide whether the relay of `schedule` must be switched at `now`.
///
/// Returns `None` when the relay is already in the desired state, so
/// repeated calls with unchanged inputs never produce a command. The
/// command is an intent only; nothing is written here.
#[must_use]
pub fn reconcile(
    schedule: &Schedule,
    observation: RelayObservation,
    now: TimeOfDay,
    decided_at: Timestamp,
) -> Option<ToggleCommand> {
    let desired = schedule.window().contains(now);
    if desired == observation.current_state {
        return None;
    }
    Some(ToggleCommand {
        relay_id: schedule.relay_id,
        previous: observation.current_state,
        target: desired,
        decided_at,
    })
}
