/// Simulation driver loop.
///
/// `Simulation` owns the event queue, payload retainer, clock and entity
/// registry of one simulation. `run` extracts due events in time order,
/// advances the clock to each one and dispatches it synchronously to its
/// destination entity. Handlers get a `SimulationContext` that can
/// schedule further events, arm timeouts or stop the run; all take effect
/// before the loop's next check.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use crate::clock::Clock;
use crate::config::{SimulationConfig, ValidationPolicy};
use crate::entity::{Entity, EntityId, EntityRegistry};
use crate::error::{HandlerError, HandlerResult, SimError, SimResult};
use crate::event::{Event, EventId, EventIdGen, Operation};
use crate::queue::EventQueue;
use crate::retainer::PayloadRetainer;
use crate::time::VirtualTime;
use crate::timer::{TimeoutId, TimerTable, TIMEOUT};
use crate::trace::TraceEntry;

// ── Kernel ────────────────────────────────────────────────────────────

/// The state a handler may mutate during dispatch.
struct Kernel<P> {
    queue: EventQueue,
    payloads: PayloadRetainer<P>,
    clock: Clock,
    ids: EventIdGen,
    timers: TimerTable,
    validation: ValidationPolicy,
}

impl<P> Kernel<P> {
    fn new(validation: ValidationPolicy) -> Self {
        Kernel {
            queue: EventQueue::new(),
            payloads: PayloadRetainer::new(),
            clock: Clock::new(),
            ids: EventIdGen::new(),
            timers: TimerTable::default(),
            validation,
        }
    }

    fn schedule(
        &mut self,
        registry: &EntityRegistry<P>,
        operation: Operation,
        destination: EntityId,
        delay: u64,
        payload: P,
    ) -> SimResult<EventId> {
        if self.validation == ValidationPolicy::Eager {
            registry.resolve(destination, &operation)?;
        }
        let now = self.clock.now();
        let time = now.plus(delay).ok_or(SimError::TimeOverflow { now, delay })?;

        let id = self.ids.next_id();
        self.payloads.retain(id, payload)?;
        trace!(%id, %time, %operation, %destination, "scheduled");
        self.queue.insert(Event::new(id, time, operation, destination));
        Ok(id)
    }

    fn set_timeout(&mut self, owner: EntityId, delay: u64, periodic: bool) -> SimResult<TimeoutId> {
        let now = self.clock.now();
        if now.plus(delay).is_none() {
            return Err(SimError::TimeOverflow { now, delay });
        }
        let timeout = self.timers.create(owner, delay, periodic);
        self.arm(timeout, owner, delay)?;
        Ok(timeout)
    }

    /// Queue the next firing of `timeout`.
    fn arm(&mut self, timeout: TimeoutId, owner: EntityId, delay: u64) -> SimResult<EventId> {
        let now = self.clock.now();
        let time = now.plus(delay).ok_or(SimError::TimeOverflow { now, delay })?;

        let id = self.ids.next_id();
        self.timers.bind(id, timeout);
        trace!(%id, %time, %timeout, %owner, "timeout armed");
        self.queue.insert(Event::new(id, time, TIMEOUT, owner));
        Ok(id)
    }

    fn reset(&mut self) {
        self.queue.reset();
        self.payloads.clear();
        self.timers.clear();
        self.clock.reset();
        self.ids = EventIdGen::new();
    }
}

// ── Simulation Context ───────────────────────────────────────────────

/// Handle given to an entity while it handles an event.
///
/// Everything done through the context is visible to the driver loop as
/// soon as the handler returns.
pub struct SimulationContext<'a, P> {
    kernel: &'a mut Kernel<P>,
    registry: &'a EntityRegistry<P>,
    entity: EntityId,
    event: EventId,
}

impl<P> SimulationContext<'_, P> {
    /// Current virtual time (the due time of the event being handled).
    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.kernel.clock.now()
    }

    /// The entity handling the current event.
    #[inline]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The event being handled.
    #[inline]
    pub fn event(&self) -> EventId {
        self.event
    }

    /// Schedule `operation` on `destination`, `delay` ticks from now.
    pub fn schedule(
        &mut self,
        operation: impl Into<Operation>,
        destination: EntityId,
        delay: u64,
        payload: P,
    ) -> SimResult<EventId> {
        self.kernel
            .schedule(self.registry, operation.into(), destination, delay, payload)
    }

    /// Schedule `operation` on the entity handling the current event.
    pub fn schedule_self(
        &mut self,
        operation: impl Into<Operation>,
        delay: u64,
        payload: P,
    ) -> SimResult<EventId> {
        let destination = self.entity;
        self.schedule(operation, destination, delay, payload)
    }

    /// Arm a timeout on the entity handling the current event.
    ///
    /// It fires `delay` ticks from now through [`Entity::on_timeout`]. A
    /// periodic timeout re-arms itself with the same delay after each
    /// successful firing until cancelled.
    pub fn set_timeout(&mut self, delay: u64, periodic: bool) -> SimResult<TimeoutId> {
        self.kernel.set_timeout(self.entity, delay, periodic)
    }

    /// Mark a timeout inactive. Its pending firing is discarded when it
    /// comes due. `false` if it had already fired for good or was
    /// cancelled before.
    pub fn cancel_timeout(&mut self, timeout: TimeoutId) -> bool {
        self.kernel.timers.cancel(timeout)
    }

    pub fn is_timeout_active(&self, timeout: TimeoutId) -> bool {
        self.kernel.timers.is_active(timeout)
    }

    /// Stop the current run. No further event is dispatched by it.
    pub fn stop(&mut self) {
        debug!(now = %self.now(), entity = %self.entity, "stop requested");
        self.kernel.clock.stop();
    }

    pub fn is_running(&self) -> bool {
        self.kernel.clock.is_running()
    }

    /// Number of pending events.
    pub fn pending(&self) -> usize {
        self.kernel.queue.len()
    }
}

// ── Run outcome ───────────────────────────────────────────────────────

/// Why a `run` call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue is empty.
    Drained,
    /// The next event is due after the requested end time.
    EndTimeReached,
    /// A handler called [`SimulationContext::stop`].
    Stopped,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Drained => f.write_str("drained"),
            RunOutcome::EndTimeReached => f.write_str("end time reached"),
            RunOutcome::Stopped => f.write_str("stopped"),
        }
    }
}

// ── Simulation ────────────────────────────────────────────────────────

/// One self-contained simulation.
///
/// Independent simulations share nothing and can coexist in one process.
pub struct Simulation<P> {
    kernel: Kernel<P>,
    registry: EntityRegistry<P>,
    config: SimulationConfig,
    trace: Vec<TraceEntry>,
    events_processed: u64,
}

impl<P> Simulation<P> {
    /// A simulation at time zero with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Simulation {
            kernel: Kernel::new(config.validation),
            registry: EntityRegistry::new(),
            config,
            trace: Vec::new(),
            events_processed: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ── Entities ──────────────────────────────────────────────

    /// Register an entity under the next free sequential ID.
    pub fn register<E>(&mut self, entity: E) -> EntityId
    where
        E: Entity<P> + 'static,
    {
        self.registry.register(entity)
    }

    /// Register an entity under a caller-chosen ID.
    pub fn register_as<E>(&mut self, id: EntityId, entity: E) -> SimResult<()>
    where
        E: Entity<P> + 'static,
    {
        self.registry.register_as(id, entity)
    }

    pub fn register_boxed(&mut self, id: EntityId, entity: Box<dyn Entity<P>>) -> SimResult<()> {
        self.registry.register_boxed(id, entity)
    }

    pub fn registry(&self) -> &EntityRegistry<P> {
        &self.registry
    }

    /// Downcast a registered entity for inspection.
    pub fn entity<T: 'static>(&self, id: EntityId) -> Option<&T> {
        self.registry.entity::<T>(id)
    }

    pub fn entity_mut<T: 'static>(&mut self, id: EntityId) -> Option<&mut T> {
        self.registry.entity_mut::<T>(id)
    }

    // ── Scheduling ────────────────────────────────────────────

    /// Schedule `operation` on `destination`, `delay` ticks after the
    /// current time.
    ///
    /// Under [`ValidationPolicy::Eager`] an unknown destination or an
    /// operation it does not accept fails with `InvalidTarget`. A due time
    /// past `VirtualTime::MAX` fails with `TimeOverflow`. Nothing is
    /// queued on failure.
    pub fn schedule(
        &mut self,
        operation: impl Into<Operation>,
        destination: EntityId,
        delay: u64,
        payload: P,
    ) -> SimResult<EventId> {
        self.kernel
            .schedule(&self.registry, operation.into(), destination, delay, payload)
    }

    /// Arm a timeout on `owner` from outside any handler.
    ///
    /// Under [`ValidationPolicy::Eager`] an unregistered owner fails with
    /// `InvalidTarget`.
    pub fn set_timeout(&mut self, owner: EntityId, delay: u64, periodic: bool) -> SimResult<TimeoutId> {
        if self.config.validation == ValidationPolicy::Eager && !self.registry.contains(owner) {
            return Err(SimError::InvalidTarget {
                destination: owner,
                operation: TIMEOUT,
            });
        }
        self.kernel.set_timeout(owner, delay, periodic)
    }

    pub fn cancel_timeout(&mut self, timeout: TimeoutId) -> bool {
        self.kernel.timers.cancel(timeout)
    }

    pub fn is_timeout_active(&self, timeout: TimeoutId) -> bool {
        self.kernel.timers.is_active(timeout)
    }

    // ── Execution ─────────────────────────────────────────────

    /// Dispatch events in time order until the queue is empty, the next
    /// event is due after `end_time`, or a handler stops the run.
    ///
    /// A handler error aborts the run and is returned. The failed event
    /// has already been removed and the clock shows its time; remaining
    /// events stay queued for a later call.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn run(&mut self, end_time: VirtualTime) -> SimResult<RunOutcome> {
        self.kernel.clock.start();
        debug!(now = %self.now(), pending = self.len(), "run started");

        let outcome = loop {
            if !self.kernel.clock.is_running() {
                break RunOutcome::Stopped;
            }
            match self.kernel.queue.peek_min() {
                None => break RunOutcome::Drained,
                Some(next) if next.time() > end_time => break RunOutcome::EndTimeReached,
                Some(_) => {}
            }
            if let Err(err) = self.dispatch_next() {
                self.kernel.clock.stop();
                return Err(err);
            }
        };

        self.kernel.clock.stop();
        debug!(%outcome, now = %self.now(), pending = self.len(), "run finished");
        Ok(outcome)
    }

    /// Run with no end time.
    pub fn run_to_completion(&mut self) -> SimResult<RunOutcome> {
        self.run(VirtualTime::MAX)
    }

    /// Dispatch exactly one event, whatever its time.
    ///
    /// Returns the dispatched event, or `None` if the queue was empty.
    pub fn step(&mut self) -> SimResult<Option<Event>> {
        self.dispatch_next()
    }

    fn dispatch_next(&mut self) -> SimResult<Option<Event>> {
        let Some(event) = self.kernel.queue.extract_min() else {
            return Ok(None);
        };
        self.kernel.clock.advance_to(event.time());
        self.events_processed += 1;

        trace!(
            id = %event.id(),
            time = %event.time(),
            operation = %event.operation(),
            destination = %event.destination(),
            "dispatching"
        );
        if self.config.record_trace {
            self.trace.push(TraceEntry::from(&event));
        }

        match self.kernel.timers.take_firing(event.id()) {
            Some(timeout) => self.fire_timeout(&event, timeout)?,
            None => self.deliver(&event)?,
        }
        Ok(Some(event))
    }

    fn deliver(&mut self, event: &Event) -> SimResult<()> {
        // Owned by this scope from here on; dropped on every exit path.
        let payload = self
            .kernel
            .payloads
            .release(event.id())
            .ok_or(SimError::PayloadMissing(event.id()))?;

        let entity = self.registry.checkout(event.destination(), event.operation())?;
        self.invoke(event, entity, |entity, ctx| {
            entity.handle(ctx, event.operation(), &payload)
        })
        .map_err(|source| self.handler_failed(event, source))
    }

    fn fire_timeout(&mut self, event: &Event, timeout: TimeoutId) -> SimResult<()> {
        let Some(timer) = self.kernel.timers.get(timeout).cloned() else {
            return Ok(());
        };
        if !timer.active {
            trace!(%timeout, "cancelled timeout discarded");
            self.kernel.timers.remove(timeout);
            return Ok(());
        }

        let Some(entity) = self.registry.take(timer.owner) else {
            self.kernel.timers.remove(timeout);
            return Err(SimError::InvalidTarget {
                destination: timer.owner,
                operation: TIMEOUT,
            });
        };
        if let Err(source) = self.invoke(event, entity, |entity, ctx| entity.on_timeout(ctx, timeout)) {
            self.kernel.timers.remove(timeout);
            return Err(self.handler_failed(event, source));
        }

        // The handler may have cancelled it.
        let rearm = self
            .kernel
            .timers
            .get(timeout)
            .filter(|timer| timer.active && timer.periodic)
            .map(|timer| timer.delay);
        match rearm {
            Some(delay) => {
                if let Err(err) = self.kernel.arm(timeout, timer.owner, delay) {
                    self.kernel.timers.remove(timeout);
                    return Err(err);
                }
            }
            None => {
                self.kernel.timers.remove(timeout);
            }
        }
        Ok(())
    }

    /// Run `f` against a checked-out entity, then put the entity back.
    ///
    /// A panic in `f` still returns the entity to its slot and clears the
    /// running flag before it resumes unwinding.
    fn invoke<F>(&mut self, event: &Event, mut entity: Box<dyn Entity<P>>, f: F) -> HandlerResult
    where
        F: FnOnce(&mut Box<dyn Entity<P>>, &mut SimulationContext<'_, P>) -> HandlerResult,
    {
        let destination = event.destination();
        let mut ctx = SimulationContext {
            kernel: &mut self.kernel,
            registry: &self.registry,
            entity: destination,
            event: event.id(),
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut entity, &mut ctx)));
        self.registry.checkin(destination, entity);

        match outcome {
            Ok(result) => result,
            Err(panic) => {
                self.kernel.clock.stop();
                warn!(id = %event.id(), %destination, "handler panicked");
                panic::resume_unwind(panic)
            }
        }
    }

    fn handler_failed(&self, event: &Event, source: HandlerError) -> SimError {
        warn!(
            id = %event.id(),
            operation = %event.operation(),
            destination = %event.destination(),
            error = %source,
            "handler failed"
        );
        SimError::Handler {
            event: event.id(),
            destination: event.destination(),
            operation: event.operation().clone(),
            source,
        }
    }

    /// Discard all pending events and their payloads, and rewind the clock
    /// to zero. Registered entities are kept.
    pub fn reset(&mut self) {
        debug!(discarded = self.len(), "reset");
        self.kernel.reset();
        self.trace.clear();
        self.events_processed = 0;
    }

    // ── Inspection ────────────────────────────────────────────

    /// Current virtual time.
    pub fn now(&self) -> VirtualTime {
        self.kernel.clock.now()
    }

    /// `true` only while `run` is dispatching.
    pub fn is_running(&self) -> bool {
        self.kernel.clock.is_running()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.kernel.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernel.queue.is_empty()
    }

    /// The next event due, if any.
    pub fn peek_next(&self) -> Option<&Event> {
        self.kernel.queue.peek_min()
    }

    pub fn queue(&self) -> &EventQueue {
        &self.kernel.queue
    }

    pub fn payloads(&self) -> &PayloadRetainer<P> {
        &self.kernel.payloads
    }

    /// Events dispatched since creation or the last reset, failures
    /// included.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Dispatch trace; empty unless `record_trace` is configured.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }
}

impl<P> Default for Simulation<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for Simulation<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("now", &self.now())
            .field("pending", &self.len())
            .field("entities", &self.registry)
            .field("config", &self.config)
            .field("events_processed", &self.events_processed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FnEntity, Recorder, DELIVER};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_basic_execution_loop() {
        init_tracing();
        let mut sim: Simulation<&'static str> = Simulation::new();
        let sink = sim.register(Recorder::new());

        sim.schedule(DELIVER, sink, 30, "c").unwrap();
        sim.schedule(DELIVER, sink, 10, "a").unwrap();
        sim.schedule(DELIVER, sink, 20, "b").unwrap();

        assert_eq!(sim.run_to_completion().unwrap(), RunOutcome::Drained);

        let recorder = sim.entity::<Recorder<&str>>(sink).unwrap();
        assert_eq!(recorder.payloads().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(sim.now(), VirtualTime::new(30));
        assert_eq!(sim.events_processed(), 3);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_schedule_time_is_now_plus_delay() {
        let mut sim: Simulation<()> = Simulation::new();
        let sink = sim.register(Recorder::new());
        sim.schedule(DELIVER, sink, 7, ()).unwrap();
        sim.run_to_completion().unwrap();
        assert_eq!(sim.now(), VirtualTime::new(7));

        sim.schedule(DELIVER, sink, 5, ()).unwrap();
        assert_eq!(sim.peek_next().map(Event::time), Some(VirtualTime::new(12)));
    }

    #[test]
    fn test_time_overflow_inserts_nothing() {
        let mut sim: Simulation<()> = Simulation::new();
        let sink = sim.register(Recorder::new());
        sim.schedule(DELIVER, sink, 10, ()).unwrap();
        sim.run_to_completion().unwrap();

        let err = sim.schedule(DELIVER, sink, u64::MAX, ()).unwrap_err();
        assert!(matches!(
            err,
            SimError::TimeOverflow { now, delay } if now == VirtualTime::new(10) && delay == u64::MAX
        ));
        assert_eq!(sim.len(), 0);
        assert!(sim.payloads().is_empty());
    }

    #[test]
    fn test_max_time_is_schedulable() {
        let mut sim: Simulation<()> = Simulation::new();
        let sink = sim.register(Recorder::new());
        sim.schedule(DELIVER, sink, u64::MAX, ()).unwrap();
        assert_eq!(sim.run_to_completion().unwrap(), RunOutcome::Drained);
        assert_eq!(sim.now(), VirtualTime::MAX);
    }

    #[test]
    fn test_step_by_step() {
        let mut sim: Simulation<()> = Simulation::new();
        let sink = sim.register(Recorder::new());
        sim.schedule(DELIVER, sink, 15, ()).unwrap();
        sim.schedule(DELIVER, sink, 5, ()).unwrap();

        let first = sim.step().unwrap().unwrap();
        assert_eq!(first.time(), VirtualTime::new(5));
        assert_eq!(sim.now(), VirtualTime::new(5));

        let second = sim.step().unwrap().unwrap();
        assert_eq!(second.time(), VirtualTime::new(15));
        assert!(sim.step().unwrap().is_none());
    }

    #[test]
    fn test_handler_schedules_followup() {
        let mut sim: Simulation<u64> = Simulation::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&log);
        let pinger = sim.register(FnEntity::new(
            ["ping"],
            move |ctx: &mut SimulationContext<'_, u64>, _op: &Operation, n: &u64| {
                seen.borrow_mut().push((ctx.now().ticks(), *n));
                if *n < 3 {
                    ctx.schedule_self("ping", 10, n + 1)?;
                }
                Ok(())
            },
        ));

        sim.schedule("ping", pinger, 0, 0).unwrap();
        sim.run_to_completion().unwrap();

        assert_eq!(*log.borrow(), vec![(0, 0), (10, 1), (20, 2), (30, 3)]);
    }

    #[test]
    fn test_empty_simulation() {
        let mut sim: Simulation<()> = Simulation::new();
        assert_eq!(sim.run(VirtualTime::new(100)).unwrap(), RunOutcome::Drained);
        assert_eq!(sim.now(), VirtualTime::ZERO);
        assert!(sim.is_empty());
    }

    #[test]
    fn test_debug_lists_entities() {
        let mut sim: Simulation<()> = Simulation::new();
        sim.register(Recorder::new());
        let rendered = format!("{:?}", sim);
        assert!(rendered.contains("deliver"));
        assert!(rendered.contains("pending: 0"));
    }
}
