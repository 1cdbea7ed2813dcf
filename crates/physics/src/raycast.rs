//! Raycasting for ground probes and portal hit-testing.

use crate::{CollisionGroup, PhysicsWorld};
use engine_core::{Entity, Vec3};
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Entity that registered the collider.
    pub owner: Option<Entity>,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

impl PhysicsWorld {
    /// Cast a ray against one collision group and return the first hit.
    ///
    /// Sensors are included, so portal discs are hit as well as solid ground.
    pub fn raycast_group(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        group: CollisionGroup,
    ) -> Option<RaycastHit> {
        let direction = direction.try_normalize()?;
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                group.query(),
            )
            .map(|(collider, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                RaycastHit {
                    collider,
                    owner: self.collider_owner(collider),
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                }
            })
    }
}
