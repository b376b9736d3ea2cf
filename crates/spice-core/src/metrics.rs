//! Counters and last-error surface for a per-window stream.

/// Observability counters for one [`crate::stream::Stream`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetrics {
    /// Frames successfully emitted to the observer.
    pub frames_received: u64,
    /// Metadata updates successfully emitted to the observer.
    pub metadata_updates: u64,
    /// Total reconnect attempts issued since the stream was created.
    pub reconnect_attempts: u64,
    /// Human-readable description of the most recent error, if any.
    pub last_error_description: Option<String>,
}

impl StreamMetrics {
    pub(crate) fn record_error(&mut self, description: impl Into<String>) {
        let description = description.into();
        tracing::warn!(%description, "stream recorded error");
        self.last_error_description = Some(description);
    }
}
