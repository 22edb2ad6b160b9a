//! # Stick Core
//!
//! The debug stick engine: point at a block, inspect its full state and edit,
//! move or replace it through generated forms.
//!
//! # Architecture
//!
//! - [`ticks`] throttles input handlers and runs world work on later ticks
//! - [`target`] finds the aimed-at block by marching a ray through the grid
//! - [`state`] classifies state domains into toggles, sliders and dropdowns
//! - [`form`] builds the state editor and applies submitted edits
//! - [`relocate`] moves blocks through scratch structures without losing them
//! - [`stick`] ties it together as a session driven by host events
//!
//! The engine never owns a world. Hosts implement [`world::World`]; the
//! in-memory host in [`world::memory`] backs the console host and the tests.

pub mod config;
pub mod error;
pub mod form;
pub mod ops;
pub mod relocate;
pub mod state;
pub mod stick;
pub mod target;
pub mod ticks;
pub mod world;

pub use stick::{DebugStick, InteractionEvent, InteractionKind, Prompt, PromptId};
