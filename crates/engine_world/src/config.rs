//! World configuration.

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Human-readable world name, attached to log lines.
    pub name: String,
    /// Log every emitted world event at `trace` level.
    pub trace_events: bool,
}

impl WorldConfig {
    /// Create a new config with the given world name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trace_events: false,
        }
    }

    /// Enable or disable per-event trace logging.
    #[must_use]
    pub fn with_trace_events(mut self, enabled: bool) -> Self {
        self.trace_events = enabled;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new("world")
    }
}
