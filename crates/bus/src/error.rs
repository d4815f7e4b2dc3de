use thiserror::Error;

/// Errors that can occur when interacting with the event bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// Publishing a message to a topic failed.
    #[error("Failed to publish to topic '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    /// Subscribing to a topic failed.
    #[error("Failed to subscribe to topic '{topic}': {reason}")]
    Subscribe { topic: String, reason: String },
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
