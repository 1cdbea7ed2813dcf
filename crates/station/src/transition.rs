//! Portal transition state machine.
//!
//! ```text
//! Idle -> Locking -> Flashing -> Switching -> Repositioning -> CooldownWait -> Idle
//! ```
//!
//! Only one transition runs at a time; requests outside `Idle` are ignored.
//! Locking, Switching and Repositioning complete within the tick they are
//! entered. Flashing and CooldownWait count down on the simulation clock.

use engine_core::Vec3;

use crate::config::TransitionConfig;
use crate::events::UiEvent;
use crate::portal::{PortalEntity, PortalTarget};
use crate::scene::{SceneData, SceneManager};
use crate::state::{ReturnPoint, SharedState};

/// Coarse phase, for callers that only need to know where the machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStage {
    Idle,
    Locking,
    Flashing,
    Switching,
    Repositioning,
    CooldownWait,
}

#[derive(Debug, Clone)]
struct Pending {
    portal: PortalEntity,
    origin_scene: Option<String>,
}

/// Where to put the player once the switch is done.
#[derive(Debug, Clone, Copy)]
struct Placement {
    spawn: Option<Vec3>,
    /// Horizontal direction to face after the teleport.
    face: Option<Vec3>,
    cooldown: f32,
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Locking(Pending),
    Flashing {
        pending: Pending,
        remaining: f32,
    },
    Switching(Pending),
    Repositioning(Placement),
    CooldownWait {
        remaining: f32,
    },
}

/// Result of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    InProgress,
    /// The player was teleported this tick.
    Repositioned,
    Finished,
}

pub struct SceneTransitionController {
    config: TransitionConfig,
    phase: Phase,
    completed: u32,
}

impl SceneTransitionController {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            completed: 0,
        }
    }

    pub fn stage(&self) -> TransitionStage {
        match self.phase {
            Phase::Idle => TransitionStage::Idle,
            Phase::Locking(_) => TransitionStage::Locking,
            Phase::Flashing { .. } => TransitionStage::Flashing,
            Phase::Switching(_) => TransitionStage::Switching,
            Phase::Repositioning(_) => TransitionStage::Repositioning,
            Phase::CooldownWait { .. } => TransitionStage::CooldownWait,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Number of transitions that ran to completion.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Start a transition through `portal`. Returns false when one is already
    /// running, an overlay is open or the entity is not a portal.
    pub fn request(&mut self, portal: engine_core::Entity, state: &mut SharedState) -> bool {
        if !self.is_idle() || state.transition.is_transitioning {
            log::debug!("Transition already running, request ignored");
            return false;
        }
        if state.ui.active_section.is_some() {
            return false;
        }
        let Some(portal) = state.portal(portal) else {
            log::warn!("Transition requested for an unknown portal");
            return false;
        };

        log::info!("Entering portal '{}' -> {:?}", portal.name, portal.target);
        state.transition.is_transitioning = true;
        state.input.clear_movement();
        state.consume_jump();
        state.set_hovered_portal(None);
        state.player.vel_y = 0.0;
        self.phase = Phase::Locking(Pending {
            portal,
            origin_scene: state.current_scene.clone(),
        });
        true
    }

    pub fn tick(&mut self, state: &mut SharedState, scenes: &mut SceneManager, dt: f32) -> TickOutcome {
        let mut outcome = if self.is_idle() {
            TickOutcome::Idle
        } else {
            TickOutcome::InProgress
        };

        loop {
            match std::mem::take(&mut self.phase) {
                Phase::Idle => break,
                Phase::Locking(pending) => {
                    state.emit(UiEvent::FlashShown);
                    self.phase = Phase::Flashing {
                        pending,
                        remaining: self.config.flash_delay,
                    };
                    break;
                }
                Phase::Flashing { pending, remaining } => {
                    let remaining = remaining - dt;
                    if remaining > 0.0 {
                        self.phase = Phase::Flashing { pending, remaining };
                        break;
                    }
                    self.phase = Phase::Switching(pending);
                }
                Phase::Switching(pending) => {
                    self.phase = Phase::Repositioning(self.switch(pending, state, scenes));
                }
                Phase::Repositioning(placement) => {
                    if let Some(spawn) = placement.spawn {
                        state.player.place(spawn, false);
                        if let Some(face) = placement.face {
                            state.look_at(spawn + face);
                        }
                        state.sync_view();
                        outcome = TickOutcome::Repositioned;
                    }
                    state.emit(UiEvent::FlashHidden);
                    state.transition.cooldown_until = Some(state.now + placement.cooldown as f64);
                    self.phase = Phase::CooldownWait {
                        remaining: placement.cooldown,
                    };
                    break;
                }
                Phase::CooldownWait { remaining } => {
                    let remaining = remaining - dt;
                    if remaining > 0.0 {
                        self.phase = Phase::CooldownWait { remaining };
                        break;
                    }
                    state.transition.is_transitioning = false;
                    state.transition.cooldown_until = None;
                    self.completed += 1;
                    log::debug!("Transition finished");
                    outcome = TickOutcome::Finished;
                    break;
                }
            }
        }
        outcome
    }

    fn switch(&self, pending: Pending, state: &mut SharedState, scenes: &mut SceneManager) -> Placement {
        let no_move = |cooldown| Placement {
            spawn: None,
            face: None,
            cooldown,
        };
        match &pending.portal.target {
            PortalTarget::Section(section) => {
                state.open_game_module(section);
                no_move(self.config.overlay_cooldown)
            }
            PortalTarget::Scene(scene) => match scenes.load_scene(scene, state) {
                Ok(data) => {
                    if let Some(origin) = pending.origin_scene.clone() {
                        state.return_point = Some(ReturnPoint {
                            scene: origin,
                            portal: pending.portal.clone(),
                        });
                    }
                    self.hub_placement(&data, state)
                }
                Err(e) => {
                    log::error!("Portal '{}' failed: {}", pending.portal.name, e);
                    no_move(self.config.scene_cooldown)
                }
            },
            PortalTarget::Exit => {
                let return_point = state.return_point.take();
                let scene = return_point
                    .as_ref()
                    .map(|r| r.scene.clone())
                    .unwrap_or_else(|| self.config.home_scene.clone());
                match scenes.load_scene(&scene, state) {
                    Ok(data) => match return_point {
                        Some(ret) => self.return_placement(&ret.portal, &data, state),
                        None => self.hub_placement(&data, state),
                    },
                    Err(e) => {
                        log::error!("Exit to '{}' failed: {}", scene, e);
                        state.return_point = return_point;
                        no_move(self.config.scene_cooldown)
                    }
                }
            }
        }
    }

    /// Hub deck spawn, slightly off-center to clear the mast.
    fn hub_placement(&self, data: &SceneData, state: &mut SharedState) -> Placement {
        let eye = state.player.eye_height;
        let spawn = match data.hub_info {
            Some(hub) => Vec3::new(hub.position.x, hub.deck_top_y + eye, hub.position.z + HUB_SPAWN_OFFSET),
            None => state.respawn_point,
        };
        state.respawn_point = spawn;
        Placement {
            spawn: Some(spawn),
            face: None,
            cooldown: self.config.scene_cooldown,
        }
    }

    /// In front of the portal the player left through, facing away from it.
    fn return_placement(&self, portal: &PortalEntity, data: &SceneData, state: &mut SharedState) -> Placement {
        let eye = state.player.eye_height;
        let facing = Vec3::new(portal.facing.x, 0.0, portal.facing.z).normalize_or_zero();
        let mut spawn = portal.position + facing * self.config.return_offset;
        spawn.y = match data.hub_info {
            Some(hub) => hub.deck_top_y + eye,
            None => portal.position.y,
        };
        if let Some(hub) = data.hub_info {
            state.respawn_point = Vec3::new(hub.position.x, hub.deck_top_y + eye, hub.position.z + HUB_SPAWN_OFFSET);
        }
        Placement {
            spawn: Some(spawn),
            face: (facing != Vec3::ZERO).then_some(facing),
            cooldown: self.config.scene_cooldown,
        }
    }
}

/// Spawn sits this far from the hub center along +Z.
pub const HUB_SPAWN_OFFSET: f32 = 0.8;
