//! Shared types: entity identity, transforms with the local-frame motion
//! primitives a scene host offers, and axis-aligned bounding boxes.
//!
//! # Conventions
//! - Right-handed, Y up. A fresh transform faces local -Z.
//! - Positive turns about local +Y swing -Z towards -X.

mod bounds;
mod types;

pub use bounds::Aabb;
pub use types::{EntityId, Transform};
