//! `Relay`: forwards every payload to a fixed neighbour.

use std::any::Any;

use crate::error::HandlerResult;
use crate::event::Operation;
use crate::simulation::SimulationContext;

use crate::entity::id::EntityId;
use crate::entity::traits::Entity;

use super::DELIVER;

/// Forwards each [`DELIVER`] it receives to `next`, `delay` ticks later.
///
/// Chains of relays ending in a `Recorder` model producer/consumer
/// pipelines.
#[derive(Debug, Clone)]
pub struct Relay {
    pub next: EntityId,
    pub delay: u64,
    pub forwarded: u64,
}

impl Relay {
    pub fn new(next: EntityId, delay: u64) -> Self {
        Relay {
            next,
            delay,
            forwarded: 0,
        }
    }
}

impl<P: Clone + 'static> Entity<P> for Relay {
    fn operations(&self) -> Vec<Operation> {
        vec![DELIVER]
    }

    fn handle(
        &mut self,
        ctx: &mut SimulationContext<'_, P>,
        operation: &Operation,
        payload: &P,
    ) -> HandlerResult {
        ctx.schedule(operation.clone(), self.next, self.delay, payload.clone())?;
        self.forwarded += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
