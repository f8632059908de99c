//! `Entity` capability trait and a closure-backed implementation.

use std::any::Any;
use std::marker::PhantomData;

use crate::error::HandlerResult;
use crate::event::Operation;
use crate::simulation::SimulationContext;
use crate::timer::TimeoutId;

// ── Entity ────────────────────────────────────────────────────────────

/// Capability implemented by every destination of scheduled events.
///
/// `operations` is queried once, at registration, and fixes the set of
/// operations the entity can be sent. `handle` is then invoked for each
/// due event; it may schedule further events, arm timeouts or stop the
/// current run through `ctx`, and may fail, which aborts the run.
///
/// # Example
///
/// ```rust
/// use kairos::{Entity, HandlerResult, Operation, SimulationContext};
///
/// struct Counter { hits: u32 }
///
/// impl Entity<u32> for Counter {
///     fn operations(&self) -> Vec<Operation> {
///         vec![Operation::from_static("hit")]
///     }
///     fn handle(
///         &mut self,
///         _ctx: &mut SimulationContext<'_, u32>,
///         _op: &Operation,
///         amount: &u32,
///     ) -> HandlerResult {
///         self.hits += amount;
///         Ok(())
///     }
///     fn as_any(&self) -> &dyn std::any::Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
/// }
/// ```
pub trait Entity<P> {
    /// Operations this entity accepts.
    fn operations(&self) -> Vec<Operation>;

    /// React to a dispatched event.
    fn handle(
        &mut self,
        ctx: &mut SimulationContext<'_, P>,
        operation: &Operation,
        payload: &P,
    ) -> HandlerResult;

    /// React to one of this entity's timeouts firing.
    ///
    /// Only active timeouts reach this hook. A periodic one is re-armed
    /// after it returns `Ok`, unless it was cancelled meanwhile.
    fn on_timeout(
        &mut self,
        ctx: &mut SimulationContext<'_, P>,
        timeout: TimeoutId,
    ) -> HandlerResult {
        let _ = (ctx, timeout);
        Ok(())
    }

    /// Downcast support for `Simulation::entity::<T>()`.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ── FnEntity ──────────────────────────────────────────────────────────

/// An entity backed by a closure. Handy for tests and one-off wiring.
pub struct FnEntity<P, F> {
    operations: Vec<Operation>,
    handler: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> FnEntity<P, F>
where
    F: FnMut(&mut SimulationContext<'_, P>, &Operation, &P) -> HandlerResult,
{
    pub fn new<I, O>(operations: I, handler: F) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Operation>,
    {
        FnEntity {
            operations: operations.into_iter().map(Into::into).collect(),
            handler,
            _payload: PhantomData,
        }
    }
}

impl<P, F> Entity<P> for FnEntity<P, F>
where
    P: 'static,
    F: FnMut(&mut SimulationContext<'_, P>, &Operation, &P) -> HandlerResult + 'static,
{
    fn operations(&self) -> Vec<Operation> {
        self.operations.clone()
    }

    fn handle(
        &mut self,
        ctx: &mut SimulationContext<'_, P>,
        operation: &Operation,
        payload: &P,
    ) -> HandlerResult {
        (self.handler)(ctx, operation, payload)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
