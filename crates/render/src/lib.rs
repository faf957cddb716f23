//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderer cannot mutate the scene directly.
//! - Render output derives from world state and view.
//!
//! Only a debug text renderer ships here; a real backend implements the same
//! trait and applies walker commands to its own scene-graph nodes.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    concat!("waywalk-render v", env!("CARGO_PKG_VERSION"))
}
