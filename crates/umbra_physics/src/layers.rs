//! Trace channels and collision filtering

use serde::{Deserialize, Serialize};

/// Object-category bits colliders are registered under.
pub mod object_bits {
    pub const WORLD_STATIC: u32 = 1 << 0;
    pub const WORLD_DYNAMIC: u32 = 1 << 1;
    pub const PAWN: u32 = 1 << 2;
    pub const CAMERA_BLOCKER: u32 = 1 << 3;
}

/// What a trace is asking about. Each channel expands to a filter over
/// the object-category bits above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceChannel {
    /// Line-of-sight checks: everything opaque
    Visibility,
    /// Camera probes: world geometry only, pawns don't block
    Camera,
    /// Character-sized queries
    Pawn,
    /// Static world geometry only
    WorldStatic,
    /// Movable world geometry
    WorldDynamic,
}

impl TraceChannel {
    /// Collision groups a query on this channel should use.
    pub fn query_groups(&self) -> CollisionGroups {
        use object_bits::*;
        let filter = match self {
            Self::Visibility => WORLD_STATIC | WORLD_DYNAMIC | PAWN,
            Self::Camera => WORLD_STATIC | WORLD_DYNAMIC | CAMERA_BLOCKER,
            Self::Pawn => WORLD_STATIC | WORLD_DYNAMIC | PAWN,
            Self::WorldStatic => WORLD_STATIC,
            Self::WorldDynamic => WORLD_DYNAMIC,
        };
        CollisionGroups {
            memberships: u32::MAX,
            filter,
        }
    }
}

impl Default for TraceChannel {
    fn default() -> Self {
        Self::Visibility
    }
}

/// Membership/filter bit pair for collision filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroups {
    /// Which groups this object belongs to
    pub memberships: u32,
    /// Which groups this object interacts with
    pub filter: u32,
}

impl CollisionGroups {
    /// Interact with everything
    pub const ALL: Self = Self {
        memberships: u32::MAX,
        filter: u32::MAX,
    };

    /// Membership for static world geometry
    pub fn world_static() -> Self {
        Self {
            memberships: object_bits::WORLD_STATIC,
            filter: u32::MAX,
        }
    }

    /// Membership for movable world geometry
    pub fn world_dynamic() -> Self {
        Self {
            memberships: object_bits::WORLD_DYNAMIC,
            filter: u32::MAX,
        }
    }

    /// Membership for pawns
    pub fn pawn() -> Self {
        Self {
            memberships: object_bits::PAWN,
            filter: u32::MAX,
        }
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_ignores_pawns() {
        let groups = TraceChannel::Camera.query_groups();
        assert_eq!(groups.filter & object_bits::PAWN, 0);
        assert_ne!(groups.filter & object_bits::WORLD_STATIC, 0);
    }

    #[test]
    fn visibility_sees_pawns() {
        let groups = TraceChannel::Visibility.query_groups();
        assert_ne!(groups.filter & object_bits::PAWN, 0);
    }
}
