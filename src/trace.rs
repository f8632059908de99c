//! Dispatch trace records.

use crate::entity::EntityId;
use crate::event::{Event, EventId, Operation};
use crate::time::VirtualTime;

/// A record of a single dispatch.
///
/// Appended by the simulation before each handler runs when
/// `SimulationConfig::record_trace` is set, so a failing dispatch is
/// still traced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    pub time: VirtualTime,
    pub event_id: EventId,
    pub destination: EntityId,
    pub operation: Operation,
}

impl From<&Event> for TraceEntry {
    fn from(event: &Event) -> Self {
        TraceEntry {
            time: event.time(),
            event_id: event.id(),
            destination: event.destination(),
            operation: event.operation().clone(),
        }
    }
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[T={} E=#{} {}] {}",
            self.time.ticks(),
            self.event_id.raw(),
            self.destination,
            self.operation,
        )
    }
}
