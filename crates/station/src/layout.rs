//! Declarative station layouts.
//!
//! A station is a hub deck at the center with module platforms on a ring.
//! Every module gets a catwalk from the deck edge out to its portal, a few
//! jumping pads along the catwalk and a landing pad in front of the portal.
//! [`build_station`] turns a [`StationConfig`] into the ground shapes,
//! portals and obstacles a scene registers.

use engine_core::Vec3;
use physics::GroundShape;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::assets::ModelRef;
use crate::portal::{PortalSpec, PortalTarget};
use crate::scene::{HubInfo, SceneData};
use crate::state::{Obstacle, ZoneMode};

const DECK_RADIUS: f32 = 6.8;
const DECK_TOP_Y: f32 = 0.66;
const DECK_HALF_HEIGHT: f32 = 0.03;
const MAST_RADIUS: f32 = 0.3;
/// Portals sit this far inward from their module center.
const PORTAL_INSET: f32 = 4.2;
const PORTAL_HEIGHT: f32 = 1.6;
const CATWALK_HALF_WIDTH: f32 = 0.18;
/// Catwalk continues this far past the portal.
const CATWALK_EXTENSION: f32 = 2.2;
const PAD_FRACTIONS: [f32; 3] = [0.33, 0.62, 0.78];
const PAD_HALF_EXTENTS: Vec3 = Vec3::new(1.12, 0.05, 0.98);
const LANDING_HALF_EXTENTS: Vec3 = Vec3::new(4.55, 0.05, 2.66);
/// Landing pad center distance in front of the portal.
const LANDING_OFFSET: f32 = 2.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Packed 0xRRGGBB accent.
    #[serde(default)]
    pub color: u32,
    pub target: PortalTarget,
    #[serde(default)]
    pub model: Option<ModelRef>,
}

impl ModuleDefinition {
    pub fn new(name: &str, description: &str, color: u32, target: PortalTarget) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            color,
            target,
            model: None,
        }
    }

    pub fn with_model(mut self, model: ModelRef) -> Self {
        self.model = Some(model);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Scene name the station registers under.
    pub name: String,
    pub hub_name: String,
    #[serde(default)]
    pub hub_position: Vec3,
    /// Distance from the hub center to each module.
    pub ring_radius: f32,
    /// Modules evenly spaced around the ring, starting at +X.
    pub modules: Vec<ModuleDefinition>,
    /// Extra module placed at `exit_angle` (radians).
    #[serde(default)]
    pub exit: Option<ModuleDefinition>,
    #[serde(default = "default_exit_angle")]
    pub exit_angle: f32,
    #[serde(default)]
    pub zone_mode: ZoneMode,
}

fn default_exit_angle() -> f32 {
    PI
}

/// Everything a station registers.
#[derive(Debug, Clone, PartialEq)]
pub struct StationBlueprint {
    pub hub: HubInfo,
    pub grounds: Vec<GroundShape>,
    pub portals: Vec<PortalSpec>,
    pub obstacles: Vec<Obstacle>,
}

impl StationBlueprint {
    pub fn scene_data(&self) -> SceneData {
        SceneData {
            hub_info: Some(self.hub),
            portals: self.portals.clone(),
        }
    }
}

pub fn build_station(config: &StationConfig) -> StationBlueprint {
    let center = config.hub_position;
    let hub = HubInfo {
        position: center,
        deck_top_y: center.y + DECK_TOP_Y,
        deck_radius: DECK_RADIUS,
    };

    let mut blueprint = StationBlueprint {
        hub,
        grounds: vec![GroundShape::Cylinder {
            center: Vec3::new(center.x, hub.deck_top_y - DECK_HALF_HEIGHT, center.z),
            half_height: DECK_HALF_HEIGHT,
            radius: DECK_RADIUS,
        }],
        portals: Vec::new(),
        obstacles: vec![Obstacle {
            center,
            radius: MAST_RADIUS,
        }],
    };

    let count = config.modules.len().max(1) as f32;
    let placed = config
        .modules
        .iter()
        .enumerate()
        .map(|(i, m)| (m, i as f32 / count * TAU))
        .chain(config.exit.iter().map(|m| (m, config.exit_angle)));

    for (module, angle) in placed {
        add_module(&mut blueprint, config, module, angle);
    }
    blueprint
}

fn add_module(bp: &mut StationBlueprint, config: &StationConfig, module: &ModuleDefinition, angle: f32) {
    let center = config.hub_position;
    let top = bp.hub.deck_top_y;
    let radial = Vec3::new(angle.cos(), 0.0, angle.sin());
    // Portals face the hub.
    let facing = -radial;
    let module_pos = center + radial * config.ring_radius;
    let portal_pos = Vec3::new(0.0, center.y + PORTAL_HEIGHT, 0.0) + module_pos + facing * PORTAL_INSET;

    let mut portal = PortalSpec::new(module.name.clone(), portal_pos, facing, module.target.clone());
    if let Some(model) = &module.model {
        portal = portal.with_model(model.clone());
    }
    bp.portals.push(portal);

    let start = center + radial * DECK_RADIUS;
    let end = Vec3::new(portal_pos.x, center.y, portal_pos.z) - facing * CATWALK_EXTENSION;
    bp.grounds.push(walkway(start, end, CATWALK_HALF_WIDTH, top));

    let walk_end = Vec3::new(portal_pos.x, center.y, portal_pos.z);
    for fraction in PAD_FRACTIONS {
        let at = start.lerp(walk_end, fraction);
        bp.grounds.push(GroundShape::Cuboid {
            center: Vec3::new(at.x, top - PAD_HALF_EXTENTS.y, at.z),
            half_extents: PAD_HALF_EXTENTS,
            yaw: yaw_of(radial),
        });
    }

    let landing = walk_end + facing * LANDING_OFFSET;
    bp.grounds.push(GroundShape::Cuboid {
        center: Vec3::new(landing.x, top - LANDING_HALF_EXTENTS.y, landing.z),
        half_extents: LANDING_HALF_EXTENTS,
        yaw: yaw_of(facing),
    });
}

/// Box from `a` to `b` (XZ), top face at `top_y`.
fn walkway(a: Vec3, b: Vec3, half_width: f32, top_y: f32) -> GroundShape {
    let delta = Vec3::new(b.x - a.x, 0.0, b.z - a.z);
    let mid = (a + b) * 0.5;
    GroundShape::Cuboid {
        center: Vec3::new(mid.x, top_y - DECK_HALF_HEIGHT, mid.z),
        half_extents: Vec3::new(half_width, DECK_HALF_HEIGHT, delta.length() * 0.5),
        yaw: yaw_of(delta),
    }
}

/// Yaw that maps a box's local +Z onto `dir`.
fn yaw_of(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

// ── Stations ───────────────────────────────────────────────────────────────

pub const MAIN_STATION: &str = "main";
pub const GAME_STATION: &str = "game";

pub fn main_station() -> StationConfig {
    StationConfig {
        name: MAIN_STATION.to_string(),
        hub_name: "Núcleo".to_string(),
        hub_position: Vec3::ZERO,
        ring_radius: 36.0,
        modules: vec![
            ModuleDefinition::new("Inicio", "Welcome deck", 0x4cc9f0, PortalTarget::Section("Inicio".into()))
                .with_model(ModelRef::new("models/portal_inicio.glb").with_fallback("models/portal_ring.glb")),
            ModuleDefinition::new("Juego", "Game station", 0xf72585, PortalTarget::Scene(GAME_STATION.into()))
                .with_model(
                    ModelRef::new("models/portal_juego.glb")
                        .with_fallback("models/portal_ring.glb")
                        .animated(),
                ),
            ModuleDefinition::new("Proyecto", "Project archive", 0x7209b7, PortalTarget::Section("Proyecto".into()))
                .with_model(ModelRef::new("models/portal_proyecto.glb").with_fallback("models/portal_ring.glb")),
        ],
        exit: None,
        exit_angle: PI,
        zone_mode: ZoneMode::Space,
    }
}

pub fn game_station() -> StationConfig {
    StationConfig {
        name: GAME_STATION.to_string(),
        hub_name: "Arcade".to_string(),
        hub_position: Vec3::ZERO,
        ring_radius: 30.0,
        modules: vec![
            ModuleDefinition::new("Jugabilidad", "How it plays", 0x06d6a0, PortalTarget::Section("Jugabilidad".into())),
            ModuleDefinition::new("Progreso", "Progress log", 0xffd166, PortalTarget::Section("Progreso".into())),
            ModuleDefinition::new("Comunidad", "Community", 0x118ab2, PortalTarget::Section("Comunidad".into())),
        ],
        exit: Some(
            ModuleDefinition::new("Salir", "Back to the main station", 0xef476f, PortalTarget::Exit)
                .with_model(ModelRef::new("models/portal_exit.glb").animated()),
        ),
        exit_angle: PI,
        zone_mode: ZoneMode::Space,
    }
}
