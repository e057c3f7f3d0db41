//! Debug draw recording
//!
//! The pattern runner records rays and hit points here when a request's
//! debug options ask for it. The recorder is a pure side channel: a
//! visualizer drains it once per frame, and nothing reads it back.

use parking_lot::Mutex;
use umbra_math::Vec3;

/// A recorded debug shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugShape {
    /// A ray segment
    Line {
        start: Vec3,
        end: Vec3,
        color: [f32; 4],
    },
    /// A hit point
    Point { position: Vec3, color: [f32; 4] },
}

/// Accumulates debug shapes across trace calls.
#[derive(Default)]
pub struct DebugRecorder {
    shapes: Mutex<Vec<DebugShape>>,
}

impl DebugRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ray segment
    pub fn line(&self, start: Vec3, end: Vec3, color: [f32; 4]) {
        self.shapes.lock().push(DebugShape::Line { start, end, color });
    }

    /// Record a hit point
    pub fn point(&self, position: Vec3, color: [f32; 4]) {
        self.shapes.lock().push(DebugShape::Point { position, color });
    }

    /// Number of recorded shapes
    pub fn len(&self) -> usize {
        self.shapes.lock().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.shapes.lock().is_empty()
    }

    /// Take all recorded shapes, leaving the recorder empty
    pub fn drain(&self) -> Vec<DebugShape> {
        std::mem::take(&mut *self.shapes.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_recorder() {
        let recorder = DebugRecorder::new();
        recorder.line(Vec3::ZERO, Vec3::X, [1.0; 4]);
        recorder.point(Vec3::X, [1.0; 4]);

        assert_eq!(recorder.len(), 2);
        let shapes = recorder.drain();
        assert_eq!(shapes.len(), 2);
        assert!(recorder.is_empty());
    }
}
