//! Waypoint Walker: decides, once per tick, how far an agent moves and when it
//! turns, following a closed loop of scripted legs.
//!
//! The walker never touches scene state. Each call to [`Walker::advance`]
//! returns a [`WalkerCommand`] which the host applies through its own
//! transform primitives ([`PoseTarget`]).
//!
//! # Invariants
//! - The current leg index is always in `[0, leg_count)`.
//! - Accumulated distance resets to zero exactly when the index wraps to 0,
//!   and the same tick carries a pose reset back to the base pose.
//! - A leg's threshold must be strictly exceeded before its turn fires.

pub mod config;
pub mod leg;
pub mod presets;
pub mod walker;

pub use config::{AngleUnit, ConfigError, LegConfig, Scenario, ScenarioConfig, ZoneConfig};
pub use leg::{Track, TrackError, WaypointLeg};
pub use presets::{Preset, UnknownPreset};
pub use walker::{PoseReset, PoseTarget, Walker, WalkerCommand, WalkerState};
