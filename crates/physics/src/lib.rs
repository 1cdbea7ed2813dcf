//! Collision queries for the station hub, backed by Rapier3D.
//!
//! Only static colliders live here: walkable ground surfaces and portal
//! trigger discs. Player movement is kinematic and resolved by raycasts.

pub mod collision;
pub mod ground;
pub mod physics_world;
pub mod raycast;

pub use collision::*;
pub use ground::*;
pub use physics_world::*;
pub use raycast::*;

// Re-export Rapier for downstream crates
pub use rapier3d;

// Re-export common Rapier types
pub use rapier3d::prelude::ColliderHandle;
