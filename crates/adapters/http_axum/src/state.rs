//! Shared application state for axum handlers.

use std::sync::Arc;

use relayhub_app::event_bus::InProcessEventBus;
use relayhub_app::ports::AutomationControl;

/// Application state shared across all axum handlers.
///
/// Generic over the control port to avoid dynamic dispatch. `Clone` is
/// implemented manually so the control type itself does not need to be
/// `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<S> {
    /// Engine operations.
    pub control: Arc<S>,
    /// Realtime broadcast channel surfaced over SSE.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<S> AppState<S>
where
    S: AutomationControl + Send + Sync + 'static,
{
    /// Create the state from pre-wrapped `Arc`s.
    ///
    /// The control service is usually shared with the background tasks
    /// before the HTTP state is built.
    pub fn new(control: Arc<S>, event_bus: Arc<InProcessEventBus>) -> Self {
        Self { control, event_bus }
    }
}
