//! Core engine types and utilities for the station hub.
//!
//! This crate provides the foundational types used across all systems:
//! - Transform and first-person camera orientation
//! - Frame timing with a wall or virtual clock
//! - Common component types for ECS

pub mod camera;
pub mod components;
pub mod time;
pub mod transform;

pub use camera::*;
pub use components::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
pub use hecs::{Entity, World};
