//! Built-in entities: `Recorder` and `Relay`.
//!
//! Small reference entities used by tests and the demo binary.

pub mod recorder;
pub mod relay;

pub use recorder::Recorder;
pub use relay::Relay;

use crate::event::Operation;

/// The operation both built-ins accept by default.
pub const DELIVER: Operation = Operation::from_static("deliver");
