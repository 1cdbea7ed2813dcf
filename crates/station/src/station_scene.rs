//! Space station scene built from a [`StationConfig`].

use engine_core::AnimationMixer;
use std::collections::VecDeque;

use crate::assets::{ModelSource, ResolvedModel};
use crate::layout::{build_station, StationBlueprint, StationConfig};
use crate::portal::PortalSpec;
use crate::scene::{SceneData, SceneError, SceneLifecycle};
use crate::state::SharedState;

/// A portal's model once the fallback chain has run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalModel {
    pub portal: String,
    pub resolved: ResolvedModel,
    pub animated: bool,
}

impl PortalModel {
    fn needs_mixer(&self) -> bool {
        self.animated && self.resolved.source != ModelSource::Placeholder
    }
}

pub struct StationScene {
    config: StationConfig,
    blueprint: Option<StationBlueprint>,
    visible: bool,
    /// Portal models still to resolve. One is resolved per update.
    pending_models: VecDeque<PortalSpec>,
    resolved: Vec<PortalModel>,
}

impl StationScene {
    pub fn new(config: StationConfig) -> Self {
        Self {
            config,
            blueprint: None,
            visible: false,
            pending_models: VecDeque::new(),
            resolved: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn resolved_models(&self) -> &[PortalModel] {
        &self.resolved
    }

    pub fn pending_model_count(&self) -> usize {
        self.pending_models.len()
    }

    /// Register everything the blueprint describes under this scene's name.
    fn register(&self, state: &mut SharedState) {
        let Some(bp) = &self.blueprint else {
            return;
        };
        let scene = self.config.name.as_str();
        state.clear_scene(scene);
        for ground in &bp.grounds {
            state.add_space_ground(scene, *ground);
        }
        state.register_portals(scene, &bp.portals);
        for obstacle in &bp.obstacles {
            state.add_obstacle(scene, *obstacle);
        }
        for _ in self.resolved.iter().filter(|m| m.needs_mixer()) {
            state.add_mixer(scene, AnimationMixer::default());
        }
        state.ui.zone_mode = self.config.zone_mode;
        log::debug!(
            "Station '{}' registered {} grounds, {} portals",
            scene,
            bp.grounds.len(),
            bp.portals.len()
        );
    }

    fn resolve_next_model(&mut self, state: &mut SharedState) {
        let Some(portal) = self.pending_models.pop_front() else {
            return;
        };
        let Some(model) = &portal.model else {
            return;
        };
        let loaded = PortalModel {
            portal: portal.name.clone(),
            resolved: state.models.resolve(&portal.name, model),
            animated: model.animated,
        };
        if loaded.needs_mixer() {
            state.add_mixer(&self.config.name, AnimationMixer::default());
        }
        self.resolved.push(loaded);
    }
}

impl SceneLifecycle for StationScene {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn load(&mut self, state: &mut SharedState) -> Result<SceneData, SceneError> {
        if self.config.modules.is_empty() && self.config.exit.is_none() {
            return Err(SceneError::LoadFailed {
                name: self.config.name.clone(),
                reason: "station has no modules".to_string(),
            });
        }
        let blueprint = build_station(&self.config);
        self.pending_models = blueprint.portals.iter().filter(|p| p.model.is_some()).cloned().collect();
        self.blueprint = Some(blueprint);
        self.register(state);
        self.visible = true;
        log::info!("Station '{}' ({}) loaded", self.config.name, self.config.hub_name);
        Ok(self.scene_data())
    }

    fn unload(&mut self, _state: &mut SharedState) {
        self.visible = false;
    }

    fn activate(&mut self, state: &mut SharedState) -> Result<(), SceneError> {
        if self.blueprint.is_none() {
            return Err(SceneError::LoadFailed {
                name: self.config.name.clone(),
                reason: "activated before load".to_string(),
            });
        }
        self.register(state);
        self.visible = true;
        Ok(())
    }

    fn update(&mut self, state: &mut SharedState, _delta: f32, _elapsed: f32) {
        if !self.visible {
            return;
        }
        self.resolve_next_model(state);
    }

    fn scene_data(&self) -> SceneData {
        self.blueprint.as_ref().map(|bp| bp.scene_data()).unwrap_or_default()
    }

    fn dispose(&mut self) {
        self.blueprint = None;
        self.pending_models.clear();
        self.resolved.clear();
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::layout::{game_station, main_station};

    #[test]
    fn load_registers_blueprint() {
        let mut state = SharedState::new(&GameConfig::default());
        let mut scene = StationScene::new(main_station());
        let data = scene.load(&mut state).expect("loads");
        assert_eq!(data.portals.len(), 3);
        assert!(data.hub_info.is_some());
        assert_eq!(state.portal_count("main"), 3);
        assert_eq!(state.obstacles().len(), 1);
        assert!(scene.is_visible());
    }

    #[test]
    fn activate_does_not_duplicate_registrations() {
        let mut state = SharedState::new(&GameConfig::default());
        let mut scene = StationScene::new(game_station());
        scene.load(&mut state).expect("loads");
        let count = state.registration_count("game");
        scene.activate(&mut state).expect("activates");
        scene.activate(&mut state).expect("activates");
        assert_eq!(state.registration_count("game"), count);
    }

    #[test]
    fn models_resolve_one_per_update_and_fall_back_to_placeholder() {
        let mut state = SharedState::new(&GameConfig::default());
        let mut scene = StationScene::new(main_station());
        scene.load(&mut state).expect("loads");
        assert_eq!(scene.pending_model_count(), 3);
        scene.update(&mut state, 0.016, 0.016);
        assert_eq!(scene.pending_model_count(), 2);
        for _ in 0..4 {
            scene.update(&mut state, 0.016, 0.016);
        }
        assert_eq!(scene.resolved_models().len(), 3);
        // No asset directory in tests: every portal keeps its placeholder.
        assert!(scene
            .resolved_models()
            .iter()
            .all(|m| m.resolved.source == ModelSource::Placeholder));
        assert_eq!(state.mixer_count(), 0);
    }

    #[test]
    fn hidden_scene_does_not_update() {
        let mut state = SharedState::new(&GameConfig::default());
        let mut scene = StationScene::new(main_station());
        scene.load(&mut state).expect("loads");
        scene.unload(&mut state);
        scene.update(&mut state, 0.016, 0.016);
        assert_eq!(scene.pending_model_count(), 3);
    }

    #[test]
    fn empty_station_fails_to_load() {
        let mut state = SharedState::new(&GameConfig::default());
        let mut config = main_station();
        config.modules.clear();
        let mut scene = StationScene::new(config);
        assert!(matches!(scene.load(&mut state), Err(SceneError::LoadFailed { .. })));
    }
}
