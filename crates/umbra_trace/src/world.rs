//! The collision-query abstraction traces run against

use crate::request::TraceShape;
use crate::result::TraceHit;
use umbra_math::Vec3;
use umbra_physics::TraceChannel;
use umbra_scene::ActorHandle;

/// A world that can answer one blocking-hit query.
///
/// `umbra_physics::QueryWorld` implements this through the adapter module;
/// tests substitute analytic mocks.
pub trait TraceWorld {
    /// Cast `shape` from `start` along `direction` for `distance` units.
    ///
    /// Returns the first blocking hit, skipping geometry owned by any
    /// actor in `ignore`.
    fn cast(
        &self,
        start: Vec3,
        direction: Vec3,
        distance: f32,
        shape: &TraceShape,
        channel: TraceChannel,
        ignore: &[ActorHandle],
    ) -> Option<TraceHit>;
}
