//! Ray direction generation for the pattern families

use crate::request::{ForwardVariant, PatternFamily, TraceRequest};
use umbra_math::{radians, Quat, Vec3};

/// One generated ray.
///
/// Most families fire every ray from the resolved request origin; the
/// Orbit family overrides the origin per ray with its ring point.
#[derive(Debug, Clone, Copy)]
pub struct PatternRay {
    /// Per-ray origin override (Orbit only)
    pub origin_override: Option<Vec3>,
    /// Unit direction
    pub direction: Vec3,
}

impl PatternRay {
    fn from_origin(direction: Vec3) -> Self {
        Self {
            origin_override: None,
            direction,
        }
    }
}

/// Generate the rays for a request.
///
/// `origin` and `forward` are the resolved pattern anchor; `target` is the
/// resolved target location when the request has one.
pub fn generate_rays(
    request: &TraceRequest,
    origin: Vec3,
    forward: Vec3,
    target: Option<Vec3>,
) -> Vec<PatternRay> {
    let count = request.ray_count.max(1) as usize;
    match request.family {
        PatternFamily::Forward => match request.forward_variant {
            ForwardVariant::SingleRay => vec![PatternRay::from_origin(forward)],
            ForwardVariant::MultiSpread => forward_spread(forward, count, request.spread_degrees),
        },
        PatternFamily::Target => {
            let to_target = target.map(|t| t - origin).unwrap_or(Vec3::ZERO);
            if to_target.is_near_zero() {
                // No usable target direction; behave like a single
                // forward ray.
                vec![PatternRay::from_origin(forward)]
            } else {
                target_arc(to_target.normalize(), count, request.arc_degrees)
            }
        }
        PatternFamily::Orbit => {
            let center = target.unwrap_or(origin);
            orbit_ring(center, count, request.orbit_radius)
        }
        PatternFamily::Radial3D => radial_sphere(count),
    }
}

/// Fan `count` rays across `[-spread/2, +spread/2]` degrees about the up
/// axis, centered on `forward`.
fn forward_spread(forward: Vec3, count: usize, spread_degrees: f32) -> Vec<PatternRay> {
    let half = spread_degrees * 0.5;
    (0..count)
        .map(|i| {
            // A single ray pins the fraction to the center.
            let t = if count == 1 {
                0.0
            } else {
                i as f32 / (count - 1) as f32
            };
            let angle = radians(umbra_math::lerp(-half, half, t));
            let rotation = Quat::from_axis_angle(Vec3::UP, angle);
            PatternRay::from_origin((rotation * forward).normalize())
        })
        .collect()
}

/// Fan `count` rays across `[-arc/2, +arc/2]` degrees in the basis built
/// from the origin-to-target direction.
fn target_arc(to_target: Vec3, count: usize, arc_degrees: f32) -> Vec<PatternRay> {
    let (_, up) = to_target.orthonormal_basis();
    let half = arc_degrees * 0.5;
    (0..count)
        .map(|i| {
            let t = if count == 1 {
                0.0
            } else {
                i as f32 / (count - 1) as f32
            };
            let angle = radians(umbra_math::lerp(-half, half, t));
            let rotation = Quat::from_axis_angle(up, angle);
            PatternRay::from_origin((rotation * to_target).normalize())
        })
        .collect()
}

/// `count` ring points around `center`, each firing outward along its
/// radial direction.
fn orbit_ring(center: Vec3, count: usize, radius: f32) -> Vec<PatternRay> {
    (0..count)
        .map(|i| {
            let angle = umbra_math::consts::TAU * i as f32 / count as f32;
            let radial = Vec3::new(angle.cos(), 0.0, angle.sin());
            PatternRay {
                origin_override: Some(center + radial * radius),
                direction: radial,
            }
        })
        .collect()
}

/// Near-uniform directions over the sphere via the golden-angle spiral.
fn radial_sphere(count: usize) -> Vec<PatternRay> {
    let golden_angle = umbra_math::consts::PI * (3.0 - 5.0f32.sqrt());
    (0..count)
        .map(|i| {
            // y spans [-1, 1]; a single ray sits at the pole.
            let y = if count == 1 {
                1.0
            } else {
                1.0 - 2.0 * i as f32 / (count - 1) as f32
            };
            let ring_radius = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f32;
            PatternRay::from_origin(Vec3::new(
                theta.cos() * ring_radius,
                y,
                theta.sin() * ring_radius,
            ))
        })
        .collect()
}
