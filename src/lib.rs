//! # Kairos: discrete-event scheduling core
//!
//! A deterministic kernel for discrete-event simulations. Work is
//! expressed as events addressed to entities and due at a virtual time;
//! the driver dispatches them one at a time in `(time, id)` order. No
//! async, no threads, no wall-clock time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────┐
//! │         Simulation          │ ← run / step / stop / reset
//! │  ┌───────────────────────┐  │
//! │  │    EntityRegistry     │  │ ← destinations + accepted operations
//! │  └───────────────────────┘  │
//! │  ┌───────────────────────┐  │
//! │  │      EventQueue       │  │ ← pairing heap, FIFO on equal times
//! │  └───────────────────────┘  │
//! │  ┌───────────────────────┐  │
//! │  │   PayloadRetainer     │  │ ← owns payloads of pending events
//! │  └───────────────────────┘  │
//! │  ┌───────────────────────┐  │
//! │  │        Clock          │  │ ← virtual time + running flag
//! │  └───────────────────────┘  │
//! │  ┌───────────────────────┐  │
//! │  │      TimerTable       │  │ ← one-shot and periodic timeouts
//! │  └───────────────────────┘  │
//! └─────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use kairos::{Recorder, Simulation, VirtualTime, DELIVER};
//!
//! let mut sim: Simulation<u32> = Simulation::new();
//! let sink = sim.register(Recorder::new());
//! sim.schedule(DELIVER, sink, 10, 7).unwrap();
//! sim.run(VirtualTime::new(100)).unwrap();
//!
//! let recorder = sim.entity::<Recorder<u32>>(sink).unwrap();
//! assert_eq!(recorder.times(), vec![VirtualTime::new(10)]);
//! ```

pub mod builder;
pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod queue;
pub mod retainer;
pub mod simulation;
pub mod time;
pub mod timer;
pub mod trace;

// Re-exports for convenience.
pub use builder::SimulationBuilder;
pub use clock::Clock;
pub use config::{SimulationConfig, ValidationPolicy};
pub use entity::{Entity, EntityId, EntityRegistry, FnEntity, Recorder, Relay, DELIVER};
pub use error::{HandlerError, HandlerResult, SimError, SimResult};
pub use event::{Event, EventId, EventIdGen, Operation};
pub use queue::{EventQueue, QueueHandle};
pub use retainer::PayloadRetainer;
pub use simulation::{RunOutcome, Simulation, SimulationContext};
pub use time::VirtualTime;
pub use timer::{TimeoutId, TIMEOUT};
pub use trace::TraceEntry;
