//! Trace hit records and batch results

use umbra_math::Vec3;
use umbra_scene::ActorHandle;

/// Normalized record of one blocking hit
#[derive(Debug, Clone, Copy)]
pub struct TraceHit {
    /// Actor that owns the hit geometry; null for unowned world geometry
    pub actor: ActorHandle,
    /// Hit location in world space
    pub position: Vec3,
    /// Surface normal at the hit
    pub normal: Vec3,
    /// Distance from the ray start
    pub distance: f32,
}

/// Result of a single ray within a pattern
#[derive(Debug, Clone, Copy)]
pub struct RayRecord {
    /// Generation-order index
    pub index: u32,
    /// Ray start
    pub start: Vec3,
    /// Ray end (start + direction * distance)
    pub end: Vec3,
    /// Blocking hit, if any
    pub hit: Option<TraceHit>,
}

impl RayRecord {
    /// Whether this ray hit anything
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }
}

/// Aggregate result of one pattern run
#[derive(Debug, Clone, Default)]
pub struct TraceBatchResult {
    /// Per-ray results in generation order
    pub rays: Vec<RayRecord>,
    /// Number of rays executed
    pub total_rays: u32,
    /// Whether any ray hit
    pub any_hit: bool,
    /// The first hit encountered in generation order
    pub first_blocking_hit: Option<TraceHit>,
    /// The hit nearest to the pattern origin (squared distance)
    pub nearest_hit: Option<TraceHit>,
}

impl TraceBatchResult {
    /// An empty result for degenerate requests
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fold one ray's outcome into the aggregates.
    ///
    /// `origin` is the pattern origin used for nearest-hit ranking.
    pub(crate) fn push(&mut self, record: RayRecord, origin: Vec3) {
        if let Some(hit) = record.hit {
            self.any_hit = true;
            if self.first_blocking_hit.is_none() {
                self.first_blocking_hit = Some(hit);
            }
            let better = match self.nearest_hit {
                // Strictly closer hits replace; ties keep the earlier ray.
                Some(current) => {
                    hit.position.distance_squared(origin)
                        < current.position.distance_squared(origin)
                }
                None => true,
            };
            if better {
                self.nearest_hit = Some(hit);
            }
        }
        self.rays.push(record);
        self.total_rays = self.rays.len() as u32;
    }

    /// Number of rays that hit
    pub fn hit_count(&self) -> usize {
        self.rays.iter().filter(|r| r.is_hit()).count()
    }
}
