//! `Recorder`: a sink that keeps every payload it receives.

use std::any::Any;

use crate::error::HandlerResult;
use crate::event::Operation;
use crate::simulation::SimulationContext;
use crate::time::VirtualTime;

use crate::entity::traits::Entity;

use super::DELIVER;

/// A sink entity that records each delivery.
///
/// `Recorder` has no active behavior. It is the consumer end in tests
/// that check delivery counts, times and payloads.
#[derive(Debug, Clone)]
pub struct Recorder<P> {
    operations: Vec<Operation>,
    /// Everything received, in dispatch order: `(time, operation, payload)`.
    pub received: Vec<(VirtualTime, Operation, P)>,
}

impl<P> Recorder<P> {
    /// A recorder accepting [`DELIVER`].
    pub fn new() -> Self {
        Self::accepting([DELIVER])
    }

    /// A recorder accepting the given operations.
    pub fn accepting<I, O>(operations: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Operation>,
    {
        Recorder {
            operations: operations.into_iter().map(Into::into).collect(),
            received: Vec::new(),
        }
    }

    /// Payloads received so far, without times.
    pub fn payloads(&self) -> impl Iterator<Item = &P> + '_ {
        self.received.iter().map(|(_, _, payload)| payload)
    }

    /// Dispatch times of everything received so far.
    pub fn times(&self) -> Vec<VirtualTime> {
        self.received.iter().map(|(time, _, _)| *time).collect()
    }
}

impl<P> Default for Recorder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + 'static> Entity<P> for Recorder<P> {
    fn operations(&self) -> Vec<Operation> {
        self.operations.clone()
    }

    fn handle(
        &mut self,
        ctx: &mut SimulationContext<'_, P>,
        operation: &Operation,
        payload: &P,
    ) -> HandlerResult {
        self.received
            .push((ctx.now(), operation.clone(), payload.clone()));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
