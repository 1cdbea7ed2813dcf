//! Fixed-step tick loop tying input, player physics, portal detection,
//! transitions and scenes together.

use std::time::Duration;

use engine_core::{Time, Vec3};
use input::{ElementState, KeyCode, MouseButton};
use winit::event::DeviceEvent;

use crate::config::GameConfig;
use crate::layout::{game_station, main_station, StationConfig};
use crate::player::{InitialGroundSnap, PlayerPhysics, SnapStatus, StepOutcome};
use crate::portal::PortalDetector;
use crate::scene::{SceneData, SceneError, SceneLifecycle, SceneManager};
use crate::state::SharedState;
use crate::station_scene::StationScene;
use crate::transition::{SceneTransitionController, TickOutcome, TransitionStage, HUB_SPAWN_OFFSET};

/// What happened during one fixed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub step: Option<StepOutcome>,
    pub snap: Option<SnapStatus>,
    pub transition: TickOutcome,
}

pub struct StationApp {
    pub state: SharedState,
    pub scenes: SceneManager,
    physics: PlayerPhysics,
    detector: PortalDetector,
    transitions: SceneTransitionController,
    snap: Option<InitialGroundSnap>,
    time: Time,
    config: GameConfig,
}

impl StationApp {
    pub fn new(config: GameConfig, scenes: SceneManager) -> Self {
        let mut time = Time::manual();
        time.set_fixed_rate(config.tick_rate);
        Self {
            state: SharedState::new(&config),
            scenes,
            physics: PlayerPhysics::new(config.ground.tolerances()),
            detector: PortalDetector::new(config.portal.clone()),
            transitions: SceneTransitionController::new(config.transition.clone()),
            snap: None,
            time,
            config,
        }
    }

    /// App with the main and game stations registered.
    pub fn with_default_stations(config: GameConfig) -> Self {
        let mut scenes = SceneManager::new();
        register_station(&mut scenes, main_station);
        register_station(&mut scenes, game_station);
        Self::new(config, scenes)
    }

    /// Load the first scene and start snapping the player onto its hub deck.
    pub fn start(&mut self, scene: &str) -> Result<SceneData, SceneError> {
        let data = self.scenes.load_scene(scene, &mut self.state)?;
        let spawn = match data.hub_info {
            Some(hub) => Vec3::new(
                hub.position.x,
                hub.deck_top_y + self.state.player.eye_height,
                hub.position.z + HUB_SPAWN_OFFSET,
            ),
            None => self.config.spawn.safe_spawn(),
        };
        self.state.respawn_point = spawn;
        self.state.player.place(spawn, false);
        self.state.sync_view();
        self.state.set_pointer_lock(true);
        self.snap = Some(InitialGroundSnap::new(spawn, &self.config.spawn));
        Ok(data)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn detector_mut(&mut self) -> &mut PortalDetector {
        &mut self.detector
    }

    pub fn transition_stage(&self) -> TransitionStage {
        self.transitions.stage()
    }

    pub fn transitions_completed(&self) -> u32 {
        self.transitions.completed()
    }

    pub fn is_snapping(&self) -> bool {
        self.snap.as_ref().is_some_and(|s| s.is_pending())
    }

    pub fn elapsed(&self) -> f64 {
        self.state.now
    }

    /// Feed a keyboard event. Escape closes the open module overlay.
    pub fn handle_key(&mut self, key: KeyCode, element: ElementState) {
        if key == KeyCode::Escape && element == ElementState::Pressed {
            if !self.state.close_game_module() {
                self.state.set_pointer_lock(false);
            }
            return;
        }
        if self.state.ui.active_section.is_some() {
            return;
        }
        self.state.input.process_keyboard(key, element);
    }

    /// Feed a mouse button event. A primary click re-acquires pointer lock
    /// unless a module overlay is open.
    pub fn handle_mouse_button(&mut self, button: MouseButton, element: ElementState) {
        if self.state.ui.active_section.is_some() {
            return;
        }
        self.state.input.process_mouse_button(button, element);
        if button == MouseButton::Left && element == ElementState::Pressed {
            self.state.set_pointer_lock(true);
        }
    }

    /// Feed raw pointer motion.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.input.process_mouse_motion(*delta);
        }
    }

    /// Advance wall-clock style: run as many fixed ticks as `delta` covers.
    pub fn advance(&mut self, delta: Duration) -> Vec<FrameReport> {
        self.time.advance(delta);
        let dt = self.time.fixed_timestep_seconds();
        let mut reports = Vec::new();
        while self.time.should_fixed_update() {
            reports.push(self.tick(dt));
        }
        reports
    }

    /// One fixed simulation tick.
    pub fn tick(&mut self, dt: f32) -> FrameReport {
        self.state.now += dt as f64;
        let state = &mut self.state;

        state.input.begin_frame();
        if !state.physics_frozen() {
            let delta = state.input.mouse_delta();
            state.apply_pointer_delta(delta.x, delta.y);
        }
        if state.input.consume_enter_portal() && !state.detection_suppressed() {
            if let Some(portal) = state.ui.hovered_portal {
                self.transitions.request(portal, state);
            }
        }

        let mut report = FrameReport {
            step: None,
            snap: None,
            transition: TickOutcome::Idle,
        };

        match self.snap.as_mut().filter(|s| s.is_pending()) {
            Some(snap) => {
                // Physics waits until the player has been placed on the ground.
                state.consume_jump();
                report.snap = Some(snap.tick(state, &self.physics.resolver, dt));
            }
            None => report.step = Some(self.physics.step(state, dt)),
        }

        if let Some(portal) = self.detector.update(state) {
            self.transitions.request(portal, state);
        }

        report.transition = self.transitions.tick(state, &mut self.scenes, dt);
        if report.transition == TickOutcome::Repositioned {
            self.detector.reset();
        }

        let elapsed = state.now as f32;
        self.scenes.update(state, dt, elapsed);
        state.update_mixers(dt);
        report
    }

    /// Tick until `done` returns true or `max_ticks` pass. Returns whether `done` was reached.
    pub fn run_until(&mut self, max_ticks: usize, mut done: impl FnMut(&StationApp) -> bool) -> bool {
        let dt = self.config.fixed_dt();
        for _ in 0..max_ticks {
            if done(self) {
                return true;
            }
            self.tick(dt);
        }
        done(self)
    }
}

/// Register a station config under its own scene name.
pub fn register_station(scenes: &mut SceneManager, config: fn() -> StationConfig) {
    let name = config().name;
    scenes.register_scene(&name, move || -> Box<dyn SceneLifecycle> { Box::new(StationScene::new(config())) });
}
