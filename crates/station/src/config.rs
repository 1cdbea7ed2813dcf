//! Runtime tunables (player, camera, ground, portals, transitions). Loaded from config.ron at startup.

use engine_core::Vec3;
use physics::GroundTolerances;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::portal::DetectionMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Kinematic constants of the first-person player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub radius: f32,
    pub eye_height: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    /// Maximum downward speed.
    pub terminal_speed: f32,
    /// Below this Y the player is teleported back to the respawn point.
    pub fall_threshold: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 0.4,
            eye_height: 1.6,
            gravity: 18.0,
            jump_speed: 7.5,
            base_speed: 6.0,
            sprint_multiplier: 1.8,
            terminal_speed: 50.0,
            fall_threshold: -50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Radians per pixel of pointer movement.
    pub sensitivity: f32,
    pub max_pitch: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.0025,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub step_height: f32,
    pub probe_tolerance: f32,
    pub commit_tolerance: f32,
    pub sticky_tolerance: f32,
    pub radial_probes: usize,
}

impl Default for GroundConfig {
    fn default() -> Self {
        let t = GroundTolerances::default();
        Self {
            step_height: t.step_height,
            probe_tolerance: t.probe,
            commit_tolerance: t.commit,
            sticky_tolerance: t.sticky,
            radial_probes: t.radial_probes,
        }
    }
}

impl GroundConfig {
    pub fn tolerances(&self) -> GroundTolerances {
        GroundTolerances {
            step_height: self.step_height,
            probe: self.probe_tolerance,
            commit: self.commit_tolerance,
            sticky: self.sticky_tolerance,
            radial_probes: self.radial_probes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub mode: DetectionMode,
    /// Nearest portal within this distance is "hovered" (Enter prompt).
    pub hover_radius: f32,
    /// Horizontal radius inside which the plane tests run.
    pub activation_radius: f32,
    /// Unsigned plane distance that counts as touching.
    pub near_plane: f32,
    pub forward_ray_distance: f32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            mode: DetectionMode::default(),
            hover_radius: 3.5,
            activation_radius: 2.4,
            near_plane: 0.3,
            forward_ray_distance: 2.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Seconds between the flash appearing and the switch.
    pub flash_delay: f32,
    /// Cooldown after a full scene switch.
    pub scene_cooldown: f32,
    /// Cooldown after opening a same-scene overlay.
    pub overlay_cooldown: f32,
    /// Distance in front of the originating portal when returning through an exit.
    pub return_offset: f32,
    /// Scene used by exit portals when there is nothing to return to.
    pub home_scene: String,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            flash_delay: 0.325,
            scene_cooldown: 1.0,
            overlay_cooldown: 0.5,
            return_offset: 3.0,
            home_scene: "main".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub snap_attempts: u32,
    /// Seconds between snap attempts.
    pub snap_interval: f32,
    /// Used when no ground ever shows up under the spawn.
    pub safe_spawn: [f32; 3],
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            snap_attempts: 12,
            snap_interval: 0.12,
            safe_spawn: [0.0, 0.66 + 1.6, 0.8],
        }
    }
}

impl SpawnConfig {
    pub fn safe_spawn(&self) -> Vec3 {
        Vec3::from_array(self.safe_spawn)
    }
}

/// Persistent settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub camera: CameraConfig,
    pub ground: GroundConfig,
    pub portal: PortalConfig,
    pub transition: TransitionConfig,
    pub spawn: SpawnConfig,
    /// Simulation rate in Hz.
    pub tick_rate: f64,
}

fn default_tick_rate() -> f64 {
    60.0
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            camera: CameraConfig::default(),
            ground: GroundConfig::default(),
            portal: PortalConfig::default(),
            transition: TransitionConfig::default(),
            spawn: SpawnConfig::default(),
            tick_rate: default_tick_rate(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&data)
    }

    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(data)?)
    }

    pub fn fixed_dt(&self) -> f32 {
        (1.0 / self.tick_rate.max(1.0)) as f32
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults_for_missing_fields() {
        let cfg = GameConfig::from_ron_str("(player: (jump_speed: 9.0), portal: (mode: PlaneCrossing))")
            .expect("valid ron");
        assert_eq!(cfg.player.jump_speed, 9.0);
        assert_eq!(cfg.player.gravity, 18.0);
        assert_eq!(cfg.portal.mode, DetectionMode::PlaneCrossing);
        assert_eq!(cfg.transition.scene_cooldown, 1.0);
        assert_eq!(cfg.tick_rate, 60.0);
    }

    #[test]
    fn default_config_ticks_at_sixty_hertz() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.tick_rate, 60.0);
        assert!((cfg.fixed_dt() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_ron_is_a_parse_error() {
        let err = GameConfig::from_ron_str("(player: (gravity: \"heavy\"))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::load_from(Path::new("/nonexistent/station/config.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
