use thiserror::Error;

/// Errors raised by a [`crate::sensor::SensorSource`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    /// Peripheral never answered during setup. Fatal for the module.
    #[error("sensor not found: {0}")]
    NotFound(String),

    /// The driver returned a NaN or infinite sample.
    #[error("sensor returned not-a-number")]
    NotANumber,

    /// Transient read failure (bus busy, peripheral glitch).
    #[error("sensor unavailable: {0}")]
    Unavailable(String),
}

impl SensorError {
    /// Only a missing peripheral disables the module; everything else is retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SensorError::NotFound(_))
    }
}

/// Errors raised while encoding an outbound reading.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Encoded message would not fit the payload bound. Nothing is sent.
    #[error("encoded message is {len} bytes, limit is {max}")]
    Overflow { len: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reasons an inbound message is not applied to the peer cache.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// Payload is at or above the local parse capacity.
    #[error("inbound payload of {len} bytes exceeds parse buffer of {max} bytes")]
    Oversized { len: usize, max: usize },

    /// No usable `[id]` / `"id"` field.
    #[error("missing or malformed node identifier")]
    MissingIdentifier,

    /// Identifier parsed but the primary measurement is absent.
    #[error("missing primary measurement")]
    MissingPrimary,
}

/// Errors raised by a [`crate::meshtastic::Transport`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("mesh transport closed")]
    Closed,

    #[error("payload of {len} bytes exceeds radio limit of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
}
