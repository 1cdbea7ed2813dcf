//! Portals and portal detection.
//!
//! Each frame the detector updates the hovered portal (Enter prompt) and
//! reports at most one triggered portal, using either a forward ray from the
//! eye against the portal trigger discs or a plane-crossing test against the
//! nearest portal's plane.

use engine_core::{Entity, Vec3};
use physics::CollisionGroup;
use serde::{Deserialize, Serialize};

use crate::assets::ModelRef;
use crate::config::PortalConfig;
use crate::state::SharedState;

/// What entering a portal does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalTarget {
    /// Switch to another scene.
    Scene(String),
    /// Open a content overlay inside the current scene.
    Section(String),
    /// Return to the scene the player came from.
    Exit,
}

/// Declarative portal placement, as produced by a station layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSpec {
    pub name: String,
    pub position: Vec3,
    /// Unit normal of the portal plane.
    pub facing: Vec3,
    pub target: PortalTarget,
    #[serde(default)]
    pub model: Option<ModelRef>,
}

impl PortalSpec {
    pub fn new(name: impl Into<String>, position: Vec3, facing: Vec3, target: PortalTarget) -> Self {
        Self {
            name: name.into(),
            position,
            facing: facing.try_normalize().unwrap_or(Vec3::Z),
            target,
            model: None,
        }
    }

    pub fn with_model(mut self, model: ModelRef) -> Self {
        self.model = Some(model);
        self
    }

    pub fn is_exit(&self) -> bool {
        self.target == PortalTarget::Exit
    }
}

/// Registered portal component.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalEntity {
    pub name: String,
    pub position: Vec3,
    pub facing: Vec3,
    pub target: PortalTarget,
}

impl PortalEntity {
    pub fn from_spec(spec: &PortalSpec) -> Self {
        Self {
            name: spec.name.clone(),
            position: spec.position,
            facing: spec.facing,
            target: spec.target.clone(),
        }
    }

    pub fn is_exit(&self) -> bool {
        self.target == PortalTarget::Exit
    }

    /// `facing · (point - position)`: positive on the side the portal faces.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.facing.dot(point - self.position)
    }
}

/// How portal entry is detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMode {
    /// Sign change of the plane distance, or touching the plane, near the portal.
    PlaneCrossing,
    /// Short ray along the view direction hits a portal disc.
    #[default]
    ForwardRay,
}

pub struct PortalDetector {
    config: PortalConfig,
    /// Last plane distance sample of the nearest portal.
    last_sample: Option<(Entity, f32)>,
}

impl PortalDetector {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config,
            last_sample: None,
        }
    }

    pub fn mode(&self) -> DetectionMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: DetectionMode) {
        self.config.mode = mode;
        self.last_sample = None;
    }

    /// Forget the previous plane sample. Called after a teleport.
    pub fn reset(&mut self) {
        self.last_sample = None;
    }

    /// Update the hovered portal and return the portal the player entered this
    /// frame, if any. Nothing triggers while detection is suppressed.
    pub fn update(&mut self, state: &mut SharedState) -> Option<Entity> {
        if state.detection_suppressed() {
            self.last_sample = None;
            return None;
        }

        let hovered = state
            .nearest_portal(state.player.position, self.config.hover_radius)
            .map(|(e, _)| e);
        state.set_hovered_portal(hovered);

        match self.config.mode {
            DetectionMode::PlaneCrossing => self.plane_crossing(state),
            DetectionMode::ForwardRay => self.forward_ray(state),
        }
    }

    fn plane_crossing(&mut self, state: &SharedState) -> Option<Entity> {
        let eye = state.player.position;
        let Some((entity, portal)) = state.nearest_portal_horizontal(eye, self.config.activation_radius) else {
            self.last_sample = None;
            return None;
        };

        let distance = portal.signed_distance(eye);
        let crossed = match self.last_sample {
            Some((prev_entity, prev)) if prev_entity == entity => {
                (prev > 0.0 && distance <= 0.0) || (prev < 0.0 && distance >= 0.0)
            }
            _ => false,
        };
        let touching = distance.abs() < self.config.near_plane;
        self.last_sample = Some((entity, distance));

        if crossed || touching {
            log::debug!(
                "Portal '{}' plane hit (distance {:.3}, crossed {})",
                portal.name,
                distance,
                crossed
            );
            Some(entity)
        } else {
            None
        }
    }

    fn forward_ray(&self, state: &SharedState) -> Option<Entity> {
        let hit = state.physics().raycast_group(
            state.player.position,
            state.camera().look_direction(),
            self.config.forward_ray_distance,
            CollisionGroup::Portal,
        )?;
        let entity = hit.owner?;
        let portal = state.portal(entity)?;
        log::debug!("Forward ray hit portal '{}' at {:.2}", portal.name, hit.distance);
        Some(entity)
    }
}
