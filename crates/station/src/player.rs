//! Kinematic first-person movement with raycast ground support.
//!
//! One [`PlayerPhysics::step`] per fixed tick: camera-relative horizontal
//! movement, gravity, jump (with a probe-mode buffer in space zones),
//! obstacle push-out, commit-mode ground resolution, fall respawn and view
//! sync. [`InitialGroundSnap`] places the player on the first ground that
//! shows up under the spawn point after a scene loads.

use engine_core::{CameraOrientation, Vec3};
use input::MovementKeys;
use physics::{GroundMode, GroundQuery, GroundResolver, GroundTolerances};

use crate::config::SpawnConfig;
use crate::state::{Obstacle, Player, SharedState, ZoneMode};

/// Result of one physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A transition or cooldown was active; nothing moved.
    Frozen,
    Moved {
        jumped: bool,
        landed: bool,
        respawned: bool,
    },
}

pub struct PlayerPhysics {
    pub resolver: GroundResolver,
}

impl PlayerPhysics {
    pub fn new(tolerances: GroundTolerances) -> Self {
        Self {
            resolver: GroundResolver::new(tolerances),
        }
    }

    /// Camera-relative horizontal displacement for this frame.
    pub fn horizontal_move(keys: MovementKeys, camera: &CameraOrientation, player: &Player, dt: f32) -> Vec3 {
        let forward = camera.flat_forward();
        let right = camera.flat_right();
        let mut dir = Vec3::ZERO;
        if keys.w {
            dir += forward;
        }
        if keys.s {
            dir -= forward;
        }
        if keys.d {
            dir += right;
        }
        if keys.a {
            dir -= right;
        }
        let Some(dir) = dir.try_normalize() else {
            return Vec3::ZERO;
        };
        let speed = if keys.shift {
            player.base_speed * player.sprint_multiplier
        } else {
            player.base_speed
        };
        dir * speed * dt
    }

    /// Integrate gravity into vertical velocity, capped at terminal speed.
    pub fn apply_gravity(player: &mut Player, dt: f32) {
        player.vel_y = (player.vel_y - player.gravity * dt).max(-player.terminal_speed);
    }

    /// Push `position` horizontally out of every obstacle cylinder.
    pub fn push_out_of_obstacles(mut position: Vec3, radius: f32, obstacles: &[Obstacle]) -> Vec3 {
        for obstacle in obstacles {
            let offset = Vec3::new(position.x - obstacle.center.x, 0.0, position.z - obstacle.center.z);
            let min_dist = obstacle.radius + radius;
            let dist = offset.length();
            if dist >= min_dist {
                continue;
            }
            let dir = if dist > 1e-5 { offset / dist } else { Vec3::Z };
            position.x = obstacle.center.x + dir.x * min_dist;
            position.z = obstacle.center.z + dir.z * min_dist;
        }
        position
    }

    pub fn step(&self, state: &mut SharedState, dt: f32) -> StepOutcome {
        if state.physics_frozen() {
            return StepOutcome::Frozen;
        }

        let previous = state.player.position;
        let keys = state.input.movement_keys();
        let horizontal = Self::horizontal_move(keys, state.camera(), &state.player, dt);

        Self::apply_gravity(&mut state.player, dt);

        // The queued jump is consumed every frame whether or not it fires.
        let mut jumped = false;
        if state.consume_jump() {
            let buffered = !state.player.on_ground
                && state.ui.zone_mode == ZoneMode::Space
                && self.would_land(state, previous, previous + horizontal + Vec3::Y * state.player.vel_y * dt);
            if state.player.on_ground || buffered {
                state.player.vel_y = state.player.jump_speed;
                state.player.on_ground = false;
                jumped = true;
                log::trace!("jump (buffered: {})", buffered);
            }
        }

        let mut next = previous + horizontal;
        next.y += state.player.vel_y * dt;
        next = Self::push_out_of_obstacles(next, state.player.radius, &state.obstacles());

        let was_grounded = state.player.on_ground;
        let result = self.resolver.resolve(
            state.physics(),
            &GroundQuery {
                previous,
                next,
                vel_y: state.player.vel_y,
                was_grounded,
                radius: state.player.radius,
                eye_height: state.player.eye_height,
            },
            GroundMode::Commit,
        );

        state.player.position = result.position;
        state.player.on_ground = result.on_ground;
        let landed = result.on_ground && !was_grounded;
        if result.on_ground {
            state.player.vel_y = 0.0;
        }

        let mut respawned = false;
        if state.player.position.y < state.player.fall_threshold {
            log::info!("Fell below {:.1}, respawning", state.player.fall_threshold);
            let respawn = state.respawn_point;
            state.player.place(respawn, false);
            respawned = true;
        }

        state.sync_view();
        StepOutcome::Moved {
            jumped,
            landed,
            respawned,
        }
    }

    fn would_land(&self, state: &SharedState, previous: Vec3, predicted: Vec3) -> bool {
        self.resolver
            .resolve(
                state.physics(),
                &GroundQuery {
                    previous,
                    next: predicted,
                    vel_y: state.player.vel_y,
                    was_grounded: false,
                    radius: state.player.radius,
                    eye_height: state.player.eye_height,
                },
                GroundMode::Probe,
            )
            .on_ground
    }
}

/// Outcome of one snap tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapStatus {
    Pending,
    Snapped(Vec3),
    FellBack(Vec3),
}

/// Retries placing the player on the ground under the spawn point while
/// scene colliders are still being registered.
#[derive(Debug, Clone)]
pub struct InitialGroundSnap {
    spawn: Vec3,
    fallback: Vec3,
    attempts_left: u32,
    interval: f32,
    until_next: f32,
    done: bool,
}

/// Ground search starts this far above the spawn point.
const SNAP_SEARCH_HEIGHT: f32 = 50.0;
const SNAP_SEARCH_DEPTH: f32 = 200.0;

impl InitialGroundSnap {
    pub fn new(spawn: Vec3, config: &SpawnConfig) -> Self {
        Self {
            spawn,
            fallback: config.safe_spawn(),
            attempts_left: config.snap_attempts.max(1),
            interval: config.snap_interval,
            until_next: 0.0,
            done: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.done
    }

    pub fn tick(&mut self, state: &mut SharedState, resolver: &GroundResolver, dt: f32) -> SnapStatus {
        if self.done {
            return SnapStatus::Pending;
        }
        self.until_next -= dt;
        if self.until_next > 0.0 {
            return SnapStatus::Pending;
        }

        if let Some(ground_y) = resolver.ground_below(
            state.physics(),
            self.spawn.x,
            self.spawn.z,
            self.spawn.y + SNAP_SEARCH_HEIGHT,
            SNAP_SEARCH_DEPTH,
        ) {
            let position = Vec3::new(self.spawn.x, ground_y + state.player.eye_height, self.spawn.z);
            state.player.place(position, true);
            state.sync_view();
            self.done = true;
            log::info!("Snapped to ground at y={:.2}", ground_y);
            return SnapStatus::Snapped(position);
        }

        self.attempts_left = self.attempts_left.saturating_sub(1);
        if self.attempts_left == 0 {
            log::warn!("No ground under spawn, using safe spawn {:?}", self.fallback);
            state.player.place(self.fallback, false);
            state.sync_view();
            self.done = true;
            return SnapStatus::FellBack(self.fallback);
        }
        self.until_next = self.interval;
        SnapStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use input::KeyCode;
    use physics::GroundShape;

    const DT: f32 = 1.0 / 60.0;

    fn floor_state() -> (SharedState, PlayerPhysics) {
        let config = GameConfig::default();
        let mut state = SharedState::new(&config);
        state.add_space_ground("test", GroundShape::slab(Vec3::ZERO, 0.0, Vec3::new(20.0, 0.05, 20.0)));
        state.player.place(Vec3::new(0.0, 1.6, 0.0), true);
        (state, PlayerPhysics::new(config.ground.tolerances()))
    }

    #[test]
    fn gravity_then_sticky_landing_keeps_rest_height() {
        let (mut state, physics) = floor_state();
        let mut probe = state.player.clone();
        PlayerPhysics::apply_gravity(&mut probe, DT);
        assert!((probe.vel_y + 0.3).abs() < 1e-4);

        physics.step(&mut state, DT);
        assert!((state.player.position.y - 1.6).abs() < 1e-4);
        assert_eq!(state.player.vel_y, 0.0);
        assert!(state.player.on_ground);
    }

    #[test]
    fn velocity_is_capped_at_terminal_speed() {
        let (mut state, _) = floor_state();
        state.player.vel_y = -49.9;
        PlayerPhysics::apply_gravity(&mut state.player, 1.0);
        assert_eq!(state.player.vel_y, -50.0);
    }

    #[test]
    fn grounded_jump_leaves_floor() {
        let (mut state, physics) = floor_state();
        state.queue_jump();
        let outcome = physics.step(&mut state, DT);
        assert!(matches!(outcome, StepOutcome::Moved { jumped: true, .. }));
        assert!(state.player.vel_y > 0.0);
        assert!(!state.player.on_ground);
        assert!(state.player.position.y > 1.6);
        assert!(!state.consume_jump());
    }

    #[test]
    fn buffered_jump_fires_just_before_landing() {
        let (mut state, physics) = floor_state();
        state.player.place(Vec3::new(0.0, 1.6 + 0.3, 0.0), false);
        state.player.vel_y = -2.0;
        state.queue_jump();
        physics.step(&mut state, DT);
        assert!(state.player.vel_y > 0.0);
    }

    #[test]
    fn airborne_jump_far_above_ground_is_dropped() {
        let (mut state, physics) = floor_state();
        state.player.place(Vec3::new(0.0, 1.6 + 5.0, 0.0), false);
        state.queue_jump();
        physics.step(&mut state, DT);
        assert!(state.player.vel_y < 0.0);
        // Consumed even though it did not fire.
        assert!(!state.consume_jump());
    }

    #[test]
    fn buffer_disabled_on_surface_zones() {
        let (mut state, physics) = floor_state();
        state.ui.zone_mode = ZoneMode::Surface;
        state.player.place(Vec3::new(0.0, 1.6 + 0.3, 0.0), false);
        state.player.vel_y = -2.0;
        state.queue_jump();
        physics.step(&mut state, DT);
        assert!(state.player.vel_y <= 0.0);
    }

    #[test]
    fn walking_follows_camera_yaw_and_sprint() {
        let (mut state, physics) = floor_state();
        state.update_camera_rotation(std::f32::consts::FRAC_PI_2, 0.0);
        state.input.press(KeyCode::KeyW);
        physics.step(&mut state, DT);
        // Yaw of +90 degrees faces -X.
        assert!((state.player.position.x + 6.0 * DT).abs() < 1e-4);

        state.input.press(KeyCode::ShiftLeft);
        let before = state.player.position.x;
        physics.step(&mut state, DT);
        assert!((state.player.position.x - before + 6.0 * 1.8 * DT).abs() < 1e-4);
    }

    #[test]
    fn frozen_during_transition_and_cooldown() {
        let (mut state, physics) = floor_state();
        state.input.press(KeyCode::KeyW);
        state.transition.is_transitioning = true;
        assert_eq!(physics.step(&mut state, DT), StepOutcome::Frozen);
        state.transition.is_transitioning = false;
        state.transition.cooldown_until = Some(0.5);
        assert_eq!(physics.step(&mut state, DT), StepOutcome::Frozen);
        assert_eq!(state.player.position, Vec3::new(0.0, 1.6, 0.0));
    }

    #[test]
    fn obstacle_pushes_player_out() {
        let pushed = PlayerPhysics::push_out_of_obstacles(
            Vec3::new(0.2, 2.26, 0.0),
            0.4,
            &[Obstacle { center: Vec3::ZERO, radius: 0.3 }],
        );
        assert!((pushed.x - 0.7).abs() < 1e-5);
        assert_eq!(pushed.y, 2.26);
    }

    #[test]
    fn falling_below_threshold_respawns() {
        let config = GameConfig::default();
        let mut state = SharedState::new(&config);
        let physics = PlayerPhysics::new(config.ground.tolerances());
        state.respawn_point = Vec3::new(1.0, 2.26, 1.0);
        state.player.place(Vec3::new(0.0, -49.99, 0.0), false);
        state.player.vel_y = -50.0;
        let outcome = physics.step(&mut state, DT);
        assert!(matches!(outcome, StepOutcome::Moved { respawned: true, .. }));
        assert_eq!(state.player.position, Vec3::new(1.0, 2.26, 1.0));
        assert_eq!(state.player.vel_y, 0.0);
    }

    #[test]
    fn snap_retries_until_ground_appears() {
        let config = GameConfig::default();
        let mut state = SharedState::new(&config);
        let resolver = GroundResolver::default();
        let mut snap = InitialGroundSnap::new(Vec3::new(0.0, 2.26, 0.8), &config.spawn);

        assert_eq!(snap.tick(&mut state, &resolver, DT), SnapStatus::Pending);
        state.add_space_ground("test", GroundShape::slab(Vec3::ZERO, 0.66, Vec3::new(6.0, 0.03, 6.0)));
        let mut status = SnapStatus::Pending;
        for _ in 0..20 {
            status = snap.tick(&mut state, &resolver, DT);
            if status != SnapStatus::Pending {
                break;
            }
        }
        match status {
            SnapStatus::Snapped(pos) => assert!((pos.y - 2.26).abs() < 1e-4),
            other => panic!("expected snap, got {:?}", other),
        }
        assert!(state.player.on_ground);
        assert!(!snap.is_pending());
    }

    #[test]
    fn snap_falls_back_after_attempts_run_out() {
        let config = GameConfig::default();
        let mut state = SharedState::new(&config);
        let resolver = GroundResolver::default();
        let mut snap = InitialGroundSnap::new(Vec3::new(40.0, 2.26, 40.0), &config.spawn);
        let mut status = SnapStatus::Pending;
        // 12 attempts 0.12 s apart fit in well under 2 s.
        for _ in 0..120 {
            status = snap.tick(&mut state, &resolver, DT);
            if status != SnapStatus::Pending {
                break;
            }
        }
        assert_eq!(status, SnapStatus::FellBack(config.spawn.safe_spawn()));
        assert_eq!(state.player.position, config.spawn.safe_spawn());
    }
}
