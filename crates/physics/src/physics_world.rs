//! Static collider world for ground surfaces and portal triggers.

use crate::collision::CollisionGroup;
use engine_core::{Entity, Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::*;

/// Thickness of a portal trigger disc along its facing axis.
const PORTAL_DISC_HALF_DEPTH: f32 = 0.1;

/// Geometry of a surface that can support the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroundShape {
    /// Box rotated around Y by `yaw` (radians); local +Z maps to `(sin yaw, 0, cos yaw)`.
    Cuboid {
        center: Vec3,
        half_extents: Vec3,
        yaw: f32,
    },
    /// Upright cylinder (hub decks).
    Cylinder {
        center: Vec3,
        half_height: f32,
        radius: f32,
    },
}

impl GroundShape {
    /// Axis-aligned slab whose top face sits at `top_y`.
    pub fn slab(center_xz: Vec3, top_y: f32, half_extents: Vec3) -> Self {
        GroundShape::Cuboid {
            center: Vec3::new(center_xz.x, top_y - half_extents.y, center_xz.z),
            half_extents,
            yaw: 0.0,
        }
    }

    /// Y coordinate of the top face.
    pub fn top_y(&self) -> f32 {
        match *self {
            GroundShape::Cuboid {
                center,
                half_extents,
                ..
            } => center.y + half_extents.y,
            GroundShape::Cylinder {
                center,
                half_height,
                ..
            } => center.y + half_height,
        }
    }

    fn to_collider(self) -> Collider {
        match self {
            GroundShape::Cuboid {
                center,
                half_extents,
                yaw,
            } => ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                .position(Isometry3::new(
                    Vector3::new(center.x, center.y, center.z),
                    Vector3::y_axis().into_inner() * yaw,
                ))
                .collision_groups(CollisionGroup::ground())
                .build(),
            GroundShape::Cylinder {
                center,
                half_height,
                radius,
            } => ColliderBuilder::cylinder(half_height, radius)
                .translation(vector![center.x, center.y, center.z])
                .collision_groups(CollisionGroup::ground())
                .build(),
        }
    }
}

/// Pack an ECS entity into collider user data so ray hits can find their owner.
pub fn entity_to_user_data(entity: Entity) -> u128 {
    entity.to_bits().get() as u128
}

/// Inverse of [`entity_to_user_data`].
pub fn entity_from_user_data(data: u128) -> Option<Entity> {
    u64::try_from(data).ok().and_then(Entity::from_bits)
}

/// Collider world containing every registered static collider.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub island_manager: IslandManager,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            island_manager: IslandManager::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Update query pipeline for raycasting. Called after every insertion or removal.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Number of live colliders.
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Insert a ground collider owned by `owner`.
    pub fn add_ground(&mut self, shape: GroundShape, owner: Entity) -> ColliderHandle {
        let mut collider = shape.to_collider();
        collider.user_data = entity_to_user_data(owner);
        let handle = self.collider_set.insert(collider);
        self.update_query_pipeline();
        handle
    }

    /// Insert a portal trigger disc centred on `center`, its axis along `facing`.
    pub fn add_portal_disc(
        &mut self,
        center: Vec3,
        facing: Vec3,
        radius: f32,
        owner: Entity,
    ) -> ColliderHandle {
        let axis = facing.try_normalize().unwrap_or(Vec3::Z);
        let rot = Quat::from_rotation_arc(Vec3::Y, axis);
        let rotation =
            UnitQuaternion::from_quaternion(Quaternion::new(rot.w, rot.x, rot.y, rot.z));
        let position = Isometry3::from_parts(Translation3::new(center.x, center.y, center.z), rotation);
        let collider = ColliderBuilder::cylinder(PORTAL_DISC_HALF_DEPTH, radius)
            .position(position)
            .collision_groups(CollisionGroup::portal())
            .sensor(true)
            .user_data(entity_to_user_data(owner))
            .build();
        let handle = self.collider_set.insert(collider);
        self.update_query_pipeline();
        handle
    }

    /// Remove a collider by its handle.
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
        self.update_query_pipeline();
    }

    /// Remove several colliders, refreshing the query pipeline once.
    pub fn remove_colliders(&mut self, handles: impl IntoIterator<Item = ColliderHandle>) {
        let mut removed = 0usize;
        for handle in handles {
            if self
                .collider_set
                .remove(handle, &mut self.island_manager, &mut self.rigid_body_set, true)
                .is_some()
            {
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("Removed {} colliders", removed);
            self.update_query_pipeline();
        }
    }

    /// Owner entity of a collider, if any.
    pub fn collider_owner(&self, handle: ColliderHandle) -> Option<Entity> {
        self.collider_set
            .get(handle)
            .and_then(|c| entity_from_user_data(c.user_data))
    }
}
