//! World-space point generation for path patterns

use serde::{Deserialize, Serialize};
use umbra_math::{consts, Transform, Vec3};

/// Path pattern family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathPattern {
    /// Evenly spaced along local forward
    Line,
    /// Half circle in the local horizontal plane
    Arc,
    /// Full ring in the local horizontal plane
    Orbit,
    /// Centered square lattice, `ceil(sqrt(n))` per side
    Grid,
    /// Random walk with a uniform heading each step
    NoiseWalk,
    /// Evenly spaced burst directions at fixed radius
    Radial,
    /// Uniform-area disc sampling
    Scatter,
    /// Reserved for spline sampling; currently identical to Line
    Spline,
    /// Uniform random fill of a cube
    Volume,
}

impl Default for PathPattern {
    fn default() -> Self {
        Self::Line
    }
}

/// Path pattern configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Pattern family
    pub pattern: PathPattern,
    /// Seed for the random families; a fixed seed keeps traces
    /// reproducible
    pub seed: u64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            pattern: PathPattern::Line,
            seed: 0,
        }
    }
}

impl PathConfig {
    /// Config for a pattern with the default seed
    pub fn new(pattern: PathPattern) -> Self {
        Self { pattern, seed: 0 }
    }

    /// Set the seed (builder pattern)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Small deterministic generator for the random path families.
struct SplitMix(u64);

impl SplitMix {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_add(0x9e3779b97f4a7c15))
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Uniform float in [0, 1)
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform float in [-1, 1)
    fn next_signed(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }
}

/// Generate `num_points` world-space points for a path pattern.
///
/// Local offsets are mapped through `origin`; `scale` sets the pattern's
/// characteristic size (length, radius, or half-extent depending on the
/// family). A non-positive count yields a single point at the origin.
pub fn generate_world_points(
    origin: &Transform,
    config: &PathConfig,
    num_points: u32,
    scale: f32,
) -> Vec<Vec3> {
    if num_points == 0 {
        return vec![origin.position];
    }
    let n = num_points as usize;
    let mut rng = SplitMix::new(config.seed);

    let local_points: Vec<Vec3> = match config.pattern {
        PathPattern::Line | PathPattern::Spline => (0..n)
            .map(|i| {
                let t = (i + 1) as f32 / n as f32;
                Vec3::NEG_Z * (scale * t)
            })
            .collect(),
        PathPattern::Arc => (0..n)
            .map(|i| {
                let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
                let angle = consts::PI * t - consts::PI * 0.5;
                Vec3::new(angle.sin(), 0.0, -angle.cos()) * scale
            })
            .collect(),
        PathPattern::Orbit => (0..n)
            .map(|i| {
                let angle = consts::TAU * i as f32 / n as f32;
                Vec3::new(angle.cos(), 0.0, angle.sin()) * scale
            })
            .collect(),
        PathPattern::Grid => {
            let side = (n as f32).sqrt().ceil() as usize;
            let spacing = if side > 1 {
                scale / (side - 1) as f32
            } else {
                0.0
            };
            let half = scale * 0.5;
            (0..n)
                .map(|i| {
                    let row = i / side;
                    let col = i % side;
                    Vec3::new(
                        col as f32 * spacing - half,
                        0.0,
                        row as f32 * spacing - half,
                    )
                })
                .collect()
        }
        PathPattern::NoiseWalk => {
            let step = scale / n as f32;
            let mut position = Vec3::ZERO;
            (0..n)
                .map(|_| {
                    let heading = rng.next_f32() * consts::TAU;
                    position += Vec3::new(heading.cos(), 0.0, heading.sin()) * step;
                    position
                })
                .collect()
        }
        PathPattern::Radial => (0..n)
            .map(|i| {
                let angle = consts::TAU * i as f32 / n as f32;
                Vec3::new(angle.cos(), 0.0, angle.sin()) * scale
            })
            .collect(),
        PathPattern::Scatter => (0..n)
            .map(|_| {
                // sqrt keeps sampling uniform over the disc area.
                let r = scale * rng.next_f32().sqrt();
                let angle = rng.next_f32() * consts::TAU;
                Vec3::new(angle.cos() * r, 0.0, angle.sin() * r)
            })
            .collect(),
        PathPattern::Volume => (0..n)
            .map(|_| {
                Vec3::new(
                    rng.next_signed() * scale,
                    rng.next_signed() * scale,
                    rng.next_signed() * scale,
                )
            })
            .collect(),
    };

    local_points
        .into_iter()
        .map(|p| origin.transform_point(p))
        .collect()
}
