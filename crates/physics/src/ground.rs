//! Vertical support detection for a capsule-like kinematic actor.
//!
//! The resolver casts a small fan of downward probes (center plus radial
//! offsets at the actor radius) against the `Ground` collision group and
//! picks the highest surface that supports the actor. Two modes share the
//! probes:
//!
//! - [`GroundMode::Probe`]: generous tolerance, used to ask "would I be
//!   supported there?" before committing (jump buffering).
//! - [`GroundMode::Commit`]: tight tolerance, only snaps when the feet
//!   crossed or touched the surface this frame while descending.
//!
//! Neither mode mutates anything; callers apply the returned result.

use crate::{CollisionGroup, PhysicsWorld};
use engine_core::Vec3;

/// Feet may sit this far below a surface at frame start and still count as "above it".
const CROSS_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundMode {
    Probe,
    Commit,
}

/// Tolerances for ground resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTolerances {
    /// Probes start this far above the highest feet position of the frame.
    pub step_height: f32,
    /// Reach below the feet in probe mode.
    pub probe: f32,
    /// Reach below the feet in commit mode.
    pub commit: f32,
    /// Reach below the feet when the actor was grounded last frame.
    pub sticky: f32,
    /// Number of radial probes around the center probe.
    pub radial_probes: usize,
}

impl Default for GroundTolerances {
    fn default() -> Self {
        Self {
            step_height: 0.35,
            probe: 0.6,
            commit: 0.05,
            sticky: 0.3,
            radial_probes: 4,
        }
    }
}

/// One ground-resolution request. Positions are eye points.
#[derive(Debug, Clone, Copy)]
pub struct GroundQuery {
    /// Eye position at the start of the frame.
    pub previous: Vec3,
    /// Candidate eye position at the end of the frame.
    pub next: Vec3,
    pub vel_y: f32,
    pub was_grounded: bool,
    pub radius: f32,
    pub eye_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundResult {
    /// Snapped position when supported, `next` otherwise.
    pub position: Vec3,
    pub on_ground: bool,
    /// Highest surface under the probes, supported or not.
    pub ground_y: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct GroundResolver {
    pub tolerances: GroundTolerances,
}

impl GroundResolver {
    pub fn new(tolerances: GroundTolerances) -> Self {
        Self { tolerances }
    }

    /// Resolve vertical support for `query`.
    pub fn resolve(&self, world: &PhysicsWorld, query: &GroundQuery, mode: GroundMode) -> GroundResult {
        let airborne = GroundResult {
            position: query.next,
            on_ground: false,
            ground_y: None,
        };

        let prev_feet = query.previous.y - query.eye_height;
        let next_feet = query.next.y - query.eye_height;
        let t = &self.tolerances;
        let reach = match mode {
            GroundMode::Probe => t.probe,
            GroundMode::Commit if query.was_grounded => t.sticky.max(t.commit),
            GroundMode::Commit => t.commit,
        };
        let top = prev_feet.max(next_feet) + t.step_height;
        let bottom = next_feet - reach;

        let hits = self.probe_hits(world, query.next, query.radius, top, bottom);
        let supports = |ground_y: f32| {
            let gap = next_feet - ground_y;
            match mode {
                GroundMode::Probe => gap <= t.probe,
                // Never snap while still rising through a platform.
                GroundMode::Commit if query.vel_y > 0.0 => false,
                GroundMode::Commit if query.was_grounded && gap <= t.sticky => true,
                GroundMode::Commit => prev_feet >= ground_y - CROSS_EPSILON && gap <= t.commit,
            }
        };

        // A higher surface the feet never reached must not hide a lower one they crossed.
        match hits.iter().copied().filter(|&y| supports(y)).reduce(f32::max) {
            Some(ground_y) => GroundResult {
                position: Vec3::new(query.next.x, ground_y + query.eye_height, query.next.z),
                on_ground: true,
                ground_y: Some(ground_y),
            },
            None => GroundResult {
                ground_y: hits.into_iter().reduce(f32::max),
                ..airborne
            },
        }
    }

    /// Highest ground surface directly below `(x, z)` within `[from_y - max_drop, from_y]`.
    pub fn ground_below(&self, world: &PhysicsWorld, x: f32, z: f32, from_y: f32, max_drop: f32) -> Option<f32> {
        world
            .raycast_group(Vec3::new(x, from_y, z), Vec3::NEG_Y, max_drop, CollisionGroup::Ground)
            .filter(|hit| hit.distance > 0.0)
            .map(|hit| hit.point.y)
    }

    /// First ground hit of every probe, top down.
    fn probe_hits(&self, world: &PhysicsWorld, at: Vec3, radius: f32, top: f32, bottom: f32) -> Vec<f32> {
        let span = top - bottom;
        if span <= 0.0 {
            return Vec::new();
        }
        self.probe_offsets(radius)
            .filter_map(|offset| {
                world
                    .raycast_group(
                        Vec3::new(at.x + offset.x, top, at.z + offset.z),
                        Vec3::NEG_Y,
                        span,
                        CollisionGroup::Ground,
                    )
                    // Zero distance means the probe started inside a collider.
                    .filter(|hit| hit.distance > 0.0)
                    .map(|hit| hit.point.y)
            })
            .collect()
    }

    fn probe_offsets(&self, radius: f32) -> impl Iterator<Item = Vec3> {
        let n = self.tolerances.radial_probes;
        std::iter::once(Vec3::ZERO).chain((0..n).map(move |i| {
            let angle = i as f32 / n as f32 * std::f32::consts::TAU;
            Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GroundShape;
    use engine_core::World;

    const EYE: f32 = 1.6;
    const RADIUS: f32 = 0.4;

    fn floor_world(top_y: f32, thickness: f32) -> PhysicsWorld {
        let mut ecs = World::new();
        let mut physics = PhysicsWorld::new();
        physics.add_ground(
            GroundShape::slab(Vec3::ZERO, top_y, Vec3::new(20.0, thickness * 0.5, 20.0)),
            ecs.spawn(()),
        );
        physics
    }

    fn query(previous: Vec3, next: Vec3, vel_y: f32, was_grounded: bool) -> GroundQuery {
        GroundQuery {
            previous,
            next,
            vel_y,
            was_grounded,
            radius: RADIUS,
            eye_height: EYE,
        }
    }

    /// At rest on the floor, repeated resolution returns the same height.
    #[test]
    fn resting_player_does_not_jitter() {
        let world = floor_world(0.0, 0.1);
        let resolver = GroundResolver::default();
        let mut pos = Vec3::new(1.0, EYE, 2.0);
        for _ in 0..100 {
            let r = resolver.resolve(&world, &query(pos, pos, 0.0, true), GroundMode::Commit);
            assert!(r.on_ground);
            assert!((r.position.y - EYE).abs() < 1e-4);
            pos = r.position;
        }
        let a = resolver.resolve(&world, &query(pos, pos, 0.0, true), GroundMode::Commit);
        let b = resolver.resolve(&world, &query(pos, pos, 0.0, true), GroundMode::Commit);
        assert_eq!(a, b);
    }

    /// Fast descent onto a thin surface is caught within a single 1/60 s step.
    #[test]
    fn fast_fall_does_not_tunnel_through_thin_surface() {
        let world = floor_world(0.0, 0.02);
        let resolver = GroundResolver::default();
        let dt = 1.0 / 60.0;
        for vel in [-1.0_f32, -10.0, -25.0, -50.0] {
            // Start just above the surface so the step ends below the slab entirely.
            let previous = Vec3::new(0.0, EYE + 0.01, 0.0);
            let next = previous + Vec3::new(0.0, vel * dt, 0.0);
            let r = resolver.resolve(&world, &query(previous, next, vel, false), GroundMode::Commit);
            assert!(r.on_ground, "tunnelled at vel {}", vel);
            assert!((r.position.y - EYE).abs() < 1e-4);
        }
    }

    #[test]
    fn commit_never_snaps_while_ascending() {
        let world = floor_world(0.0, 0.1);
        let resolver = GroundResolver::default();
        let previous = Vec3::new(0.0, EYE - 0.2, 0.0);
        let next = Vec3::new(0.0, EYE - 0.02, 0.0);
        let r = resolver.resolve(&world, &query(previous, next, 7.5, false), GroundMode::Commit);
        assert!(!r.on_ground);
        assert_eq!(r.position, next);
    }

    #[test]
    fn probe_mode_is_more_generous_than_commit() {
        let world = floor_world(0.0, 0.1);
        let resolver = GroundResolver::default();
        let hovering = Vec3::new(0.0, EYE + 0.4, 0.0);
        let q = query(hovering, hovering, -1.0, false);
        assert!(resolver.resolve(&world, &q, GroundMode::Probe).on_ground);
        assert!(!resolver.resolve(&world, &q, GroundMode::Commit).on_ground);
    }

    #[test]
    fn sticky_tolerance_applies_only_when_previously_grounded() {
        let world = floor_world(0.0, 0.1);
        let resolver = GroundResolver::default();
        let above = Vec3::new(0.0, EYE + 0.2, 0.0);
        let grounded = resolver.resolve(&world, &query(above, above, 0.0, true), GroundMode::Commit);
        let airborne = resolver.resolve(&world, &query(above, above, 0.0, false), GroundMode::Commit);
        assert!(grounded.on_ground);
        assert!(!airborne.on_ground);
    }

    #[test]
    fn radial_probes_catch_narrow_walkway_off_center() {
        let mut ecs = World::new();
        let mut physics = PhysicsWorld::new();
        // 0.36 wide catwalk along Z, centred on x = 0.
        physics.add_ground(
            GroundShape::slab(Vec3::ZERO, 0.66, Vec3::new(0.18, 0.03, 10.0)),
            ecs.spawn(()),
        );
        let resolver = GroundResolver::default();
        // Center probe misses (x = 0.3), the -X radial probe lands on the walkway.
        let pos = Vec3::new(0.3, 0.66 + EYE, 0.0);
        let r = resolver.resolve(&physics, &query(pos, pos, 0.0, true), GroundMode::Commit);
        assert!(r.on_ground);
        assert!((r.position.y - (0.66 + EYE)).abs() < 1e-4);
    }

    #[test]
    fn highest_surface_wins() {
        let mut ecs = World::new();
        let mut physics = PhysicsWorld::new();
        physics.add_ground(GroundShape::slab(Vec3::ZERO, 0.0, Vec3::new(5.0, 0.05, 5.0)), ecs.spawn(()));
        physics.add_ground(
            GroundShape::slab(Vec3::new(0.35, 0.0, 0.0), 0.1, Vec3::new(0.1, 0.05, 0.1)),
            ecs.spawn(()),
        );
        let resolver = GroundResolver::default();
        let pos = Vec3::new(0.0, 0.1 + EYE, 0.0);
        let r = resolver.resolve(&physics, &query(pos, pos, 0.0, true), GroundMode::Commit);
        assert_eq!(r.ground_y.map(|y| (y * 1000.0).round()), Some(100.0));
    }

    #[test]
    fn no_candidates_means_airborne() {
        let physics = PhysicsWorld::new();
        let resolver = GroundResolver::default();
        let pos = Vec3::new(0.0, EYE, 0.0);
        let r = resolver.resolve(&physics, &query(pos, pos, 0.0, true), GroundMode::Commit);
        assert!(!r.on_ground);
        assert_eq!(r.ground_y, None);
        assert_eq!(r.position, pos);
    }

    /// Falling beside a low step: the radial probe over the step must not
    /// hide the floor the center probe crosses.
    #[test]
    fn low_step_beside_player_does_not_hide_the_floor() {
        let mut ecs = World::new();
        let mut physics = PhysicsWorld::new();
        physics.add_ground(GroundShape::slab(Vec3::ZERO, 0.0, Vec3::new(10.0, 0.05, 10.0)), ecs.spawn(()));
        // Step top at 0.25, its near edge 0.3 from the player axis.
        physics.add_ground(
            GroundShape::slab(Vec3::new(1.3, 0.0, 0.0), 0.25, Vec3::new(1.0, 0.125, 10.0)),
            ecs.spawn(()),
        );
        let resolver = GroundResolver::default();
        let dt = 1.0 / 60.0;
        let mut pos = Vec3::new(0.0, 0.1 + EYE, 0.0);
        let mut vel = -9.0_f32;
        let mut landed = false;
        for _ in 0..10 {
            vel -= 18.0 * dt;
            let next = pos + Vec3::new(0.0, vel * dt, 0.0);
            let r = resolver.resolve(&physics, &query(pos, next, vel, false), GroundMode::Commit);
            pos = r.position;
            if r.on_ground {
                landed = true;
                break;
            }
        }
        assert!(landed, "fell through the floor to feet {}", pos.y - EYE);
        assert!((pos.y - EYE).abs() < 1e-4);
    }

    #[test]
    fn ground_below_finds_surface_from_far_above() {
        let world = floor_world(0.66, 0.06);
        let resolver = GroundResolver::default();
        let y = resolver.ground_below(&world, 0.0, 0.8, 50.0, 100.0).expect("deck below");
        assert!((y - 0.66).abs() < 1e-4);
    }
}
