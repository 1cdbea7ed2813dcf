//! Station hub: first-person navigation between space-station scenes.
//!
//! A player walks around a hub deck and catwalks, looks at or walks through
//! portals, and is taken either to another station scene or to a content
//! overlay. Rendering and the overlay UI are outside this crate; they observe
//! [`events::UiEvent`]s and feed input in.

pub mod app;
pub mod assets;
pub mod config;
pub mod events;
pub mod layout;
pub mod player;
pub mod portal;
pub mod scene;
pub mod state;
pub mod station_scene;
pub mod transition;

pub use app::{register_station, FrameReport, StationApp};
pub use config::{ConfigError, GameConfig};
pub use events::{EventBus, UiEvent, UiListener};
pub use layout::{build_station, game_station, main_station, ModuleDefinition, StationConfig};
pub use player::{InitialGroundSnap, PlayerPhysics, SnapStatus, StepOutcome};
pub use portal::{DetectionMode, PortalDetector, PortalEntity, PortalSpec, PortalTarget};
pub use scene::{HubInfo, SceneData, SceneError, SceneLifecycle, SceneManager};
pub use state::{Obstacle, Player, SharedState, ZoneMode};
pub use station_scene::StationScene;
pub use transition::{SceneTransitionController, TickOutcome, TransitionStage};
