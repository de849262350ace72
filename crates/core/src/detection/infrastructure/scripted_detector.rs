use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Replays a scripted sequence of face counts, cycling when exhausted.
///
/// Stands in for a real detection model during demos and worker tests:
/// each scripted count is expanded into that many well-formed regions
/// (high confidence, mid-sized boxes) so the full filter → stability →
/// alert path is exercised. A count of `u32::MAX` is reserved to fail
/// the tick, for driving the degraded path.
pub struct ScriptedDetector {
    script: Vec<u32>,
    next_index: usize,
}

/// Scripted count that makes `detect` return an error.
pub const FAIL_TICK: u32 = u32::MAX;

impl ScriptedDetector {
    pub fn new(script: Vec<u32>) -> Self {
        Self {
            script,
            next_index: 0,
        }
    }
}

fn plausible_region(slot: u32, frame: &Frame) -> FaceRegion {
    // Tile small boxes across the upper frame; size picked to land
    // inside typical area-ratio bounds.
    let side = (frame.width().min(frame.height()) / 5).max(1) as i32;
    let x = (slot as i32) * (side + 2);
    FaceRegion::new(x, 0, side, side, 0.95)
}

impl FaceDetector for ScriptedDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
        if self.script.is_empty() {
            return Ok(Vec::new());
        }

        let count = self.script[self.next_index];
        self.next_index = (self.next_index + 1) % self.script.len();

        if count == FAIL_TICK {
            return Err("scripted detector failure".into());
        }

        Ok((0..count)
            .map(|slot| plausible_region(slot, frame))
            .collect())
    }
}
