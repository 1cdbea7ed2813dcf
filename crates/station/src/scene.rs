//! Scene registry and lifecycle.
//!
//! Scenes are registered by name with a factory and instantiated lazily on
//! first load. Exactly one scene is active at a time. Switching away from a
//! scene hides it and clears its registrations from [`SharedState`]; the
//! instance stays cached and is re-activated on its next load.

use engine_core::Vec3;
use std::collections::HashMap;

use crate::portal::PortalSpec;
use crate::state::SharedState;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene '{0}' is not registered")]
    NotRegistered(String),
    #[error("scene '{name}' failed to load: {reason}")]
    LoadFailed { name: String, reason: String },
    #[error("scene '{0}' is active and cannot be torn down")]
    Active(String),
}

/// Spawn anchor of a station: the central hub deck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HubInfo {
    pub position: Vec3,
    pub deck_top_y: f32,
    pub deck_radius: f32,
}

/// What a scene exposes after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneData {
    pub hub_info: Option<HubInfo>,
    pub portals: Vec<PortalSpec>,
}

pub trait SceneLifecycle {
    fn name(&self) -> &str;

    /// First-time setup. Registers the scene's ground, portals and obstacles.
    fn load(&mut self, state: &mut SharedState) -> Result<SceneData, SceneError>;

    /// Hide the scene. Its registrations are cleared by the manager afterwards.
    fn unload(&mut self, state: &mut SharedState);

    /// Make a cached instance current again. Must re-register everything.
    fn activate(&mut self, state: &mut SharedState) -> Result<(), SceneError>;

    fn update(&mut self, _state: &mut SharedState, _delta: f32, _elapsed: f32) {}

    fn scene_data(&self) -> SceneData;

    /// Release everything the instance holds.
    fn dispose(&mut self) {}
}

pub type SceneFactory = Box<dyn Fn() -> Box<dyn SceneLifecycle>>;

#[derive(Default)]
pub struct SceneManager {
    factories: HashMap<String, SceneFactory>,
    instances: HashMap<String, Box<dyn SceneLifecycle>>,
    active: Option<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_scene(&mut self, name: &str, factory: impl Fn() -> Box<dyn SceneLifecycle> + 'static) {
        log::debug!("Registered scene '{}'", name);
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Make `name` the active scene, creating it on first use.
    ///
    /// On failure the previously active scene is restored.
    pub fn load_scene(&mut self, name: &str, state: &mut SharedState) -> Result<SceneData, SceneError> {
        if self.active.as_deref() == Some(name) {
            if let Some(scene) = self.instances.get(name) {
                return Ok(scene.scene_data());
            }
        }
        if !self.factories.contains_key(name) && !self.instances.contains_key(name) {
            return Err(SceneError::NotRegistered(name.to_string()));
        }

        let previous = self.active.take();
        if let Some(prev) = &previous {
            self.deactivate(prev, state);
        }

        match self.enter(name, state) {
            Ok(data) => {
                self.active = Some(name.to_string());
                state.current_scene = Some(name.to_string());
                state.emit(crate::events::UiEvent::SceneChanged {
                    scene: name.to_string(),
                });
                Ok(data)
            }
            Err(e) => {
                log::error!("{}", e);
                state.clear_scene(name);
                if let Some(prev) = previous {
                    self.restore(&prev, state);
                }
                Err(e)
            }
        }
    }

    fn enter(&mut self, name: &str, state: &mut SharedState) -> Result<SceneData, SceneError> {
        if let Some(scene) = self.instances.get_mut(name) {
            log::info!("Re-activating cached scene '{}'", name);
            scene.activate(state)?;
            return Ok(scene.scene_data());
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SceneError::NotRegistered(name.to_string()))?;
        let mut scene = factory();
        log::info!("Loading scene '{}'", name);
        let data = scene.load(state)?;
        self.instances.insert(name.to_string(), scene);
        Ok(data)
    }

    fn deactivate(&mut self, name: &str, state: &mut SharedState) {
        if let Some(scene) = self.instances.get_mut(name) {
            scene.unload(state);
        }
        state.clear_scene(name);
        if state.current_scene.as_deref() == Some(name) {
            state.current_scene = None;
        }
        log::info!("Unloaded scene '{}'", name);
    }

    fn restore(&mut self, name: &str, state: &mut SharedState) {
        let Some(scene) = self.instances.get_mut(name) else {
            return;
        };
        match scene.activate(state) {
            Ok(()) => {
                self.active = Some(name.to_string());
                state.current_scene = Some(name.to_string());
                log::warn!("Restored scene '{}'", name);
            }
            Err(e) => log::error!("Could not restore scene '{}': {}", name, e),
        }
    }

    /// Data of the active scene.
    pub fn scene_data(&self) -> Option<SceneData> {
        let name = self.active.as_deref()?;
        self.instances.get(name).map(|s| s.scene_data())
    }

    /// Per-frame update of the active scene only.
    pub fn update(&mut self, state: &mut SharedState, delta: f32, elapsed: f32) {
        let Some(name) = self.active.as_deref() else {
            return;
        };
        if let Some(scene) = self.instances.get_mut(name) {
            scene.update(state, delta, elapsed);
        }
    }

    /// Drop a cached, inactive scene instance.
    pub fn teardown(&mut self, name: &str, state: &mut SharedState) -> Result<(), SceneError> {
        if self.active.as_deref() == Some(name) {
            return Err(SceneError::Active(name.to_string()));
        }
        if let Some(mut scene) = self.instances.remove(name) {
            scene.dispose();
            state.clear_scene(name);
            log::info!("Tore down scene '{}'", name);
        }
        Ok(())
    }
}
