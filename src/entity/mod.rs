//! Entities: the addressable destinations of scheduled events.
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`EntityId`] newtype |
//! | [`traits`] | [`Entity`] capability trait, [`FnEntity`] |
//! | [`registry`] | [`EntityRegistry`] |
//! | [`builtin`] | [`Recorder`], [`Relay`] |

pub mod builtin;
pub mod id;
pub mod registry;
pub mod traits;

pub use builtin::{Recorder, Relay, DELIVER};
pub use id::EntityId;
pub use registry::EntityRegistry;
pub use traits::{Entity, FnEntity};
