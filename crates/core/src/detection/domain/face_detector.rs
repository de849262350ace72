use std::time::SystemTime;

use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations may be stateful (e.g., model sessions, frame
/// skipping), hence `&mut self`. The model itself is an external
/// capability; this crate only consumes its boxes-and-confidence
/// output.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>>;
}

/// Per-frame detection outcome after plausibility filtering.
///
/// Produced once per processed frame and handed to the stability
/// evaluator; never persisted.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    pub sequence: u64,
    pub captured_at: SystemTime,
    pub regions: Vec<FaceRegion>,
}

impl DetectionResult {
    pub fn face_count(&self) -> u32 {
        self.regions.len() as u32
    }
}
