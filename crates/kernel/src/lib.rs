//! Scene kernel: a headless host that owns entity transforms and applies
//! waypoint-walker commands once per tick.
//!
//! # Invariants
//! - Each agent's walker is advanced at most once per step.
//! - All state mutations flow through explicit operations and are logged.
//! - Replaying the log reproduces every transform and the tick exactly.

pub mod world;

pub use world::{Agent, EntityData, World, WorldError, WorldEvent, YieldZone};
