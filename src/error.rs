//! Error types for the scheduling core.
//!
//! Scheduling failures (`InvalidTarget`, `TimeOverflow`) are reported
//! synchronously and leave the queue untouched. A failing handler aborts
//! the current `run` call; the event it was handling has already been
//! removed, so the simulation stays consistent for a later `run`.

use thiserror::Error;

use crate::entity::EntityId;
use crate::event::{EventId, Operation};
use crate::time::VirtualTime;

/// Error returned by an entity's handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a single handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors raised by the simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// The destination is not registered, or does not accept the operation.
    #[error("entity {destination} cannot handle operation `{operation}`")]
    InvalidTarget {
        destination: EntityId,
        operation: Operation,
    },

    /// `now + delay` does not fit in virtual time.
    #[error("scheduling {delay} ticks after {now} overflows virtual time")]
    TimeOverflow { now: VirtualTime, delay: u64 },

    /// An entity's handler failed while dispatching an event.
    #[error("entity {destination} failed handling `{operation}` for {event}")]
    Handler {
        event: EventId,
        destination: EntityId,
        operation: Operation,
        #[source]
        source: HandlerError,
    },

    /// An entity is already registered under this ID.
    #[error("entity {0} is already registered")]
    DuplicateEntity(EntityId),

    /// A payload is already retained for this event.
    #[error("a payload is already retained for {0}")]
    DuplicatePayload(EventId),

    /// A queued event had no retained payload when it came up for dispatch.
    #[error("no retained payload for {0}")]
    PayloadMissing(EventId),
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_invalid_target() {
        let e = SimError::InvalidTarget {
            destination: EntityId::new(5),
            operation: Operation::from_static("deliver"),
        };
        assert_eq!(e.to_string(), "entity N5 cannot handle operation `deliver`");
    }

    #[test]
    fn test_display_time_overflow() {
        let e = SimError::TimeOverflow {
            now: VirtualTime::new(10),
            delay: u64::MAX,
        };
        assert!(e.to_string().contains("T=10"));
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let e = SimError::Handler {
            event: EventId::new(1),
            destination: EntityId::new(2),
            operation: Operation::from_static("boom"),
            source: "disk on fire".into(),
        };
        assert_eq!(e.source().map(|s| s.to_string()), Some("disk on fire".into()));
        assert!(e.to_string().contains("E#1"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SimError>();
    }
}
