//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for the static collider kinds.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Surfaces that can vertically support the player (decks, catwalks, pads).
    Ground = 1 << 0,
    /// Portal trigger discs, hit-tested by the forward ray.
    Portal = 1 << 1,
}

impl CollisionGroup {
    fn bits(self) -> Group {
        Group::from_bits_retain(self as u32)
    }

    /// Membership/filter pair for ground colliders.
    pub fn ground() -> InteractionGroups {
        InteractionGroups::new(Self::Ground.bits(), Group::ALL)
    }

    /// Membership/filter pair for portal colliders.
    pub fn portal() -> InteractionGroups {
        InteractionGroups::new(Self::Portal.bits(), Group::ALL)
    }

    /// Query filter that only accepts colliders of this group.
    pub fn query(self) -> QueryFilter<'static> {
        QueryFilter::default().groups(InteractionGroups::new(Group::ALL, self.bits()))
    }
}
