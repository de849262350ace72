/// A detected face bounding box with the detector's confidence score.
///
/// Coordinates are pixels in the source frame. Geometry is only used
/// for plausibility filtering; the decision pipeline cares about
/// counts, not positions.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32, confidence: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    /// Fraction of the frame covered by this box, in [0, 1].
    ///
    /// Degenerate boxes and zero-sized frames report 0 so they fall
    /// below any sane minimum-area threshold.
    pub fn area_ratio(&self, frame_width: u32, frame_height: u32) -> f64 {
        let frame_area = frame_width as f64 * frame_height as f64;
        if frame_area == 0.0 {
            return 0.0;
        }
        let area = self.width.max(0) as f64 * self.height.max(0) as f64;
        area / frame_area
    }
}
