use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Drops implausible detections before they reach the face count.
///
/// Three rules:
/// - a mean frame brightness below `low_light_threshold` discards the
///   whole set, since detectors hallucinate faces in dark noise
///   (0 disables the gate);
/// - confidence below `min_confidence` is detector noise;
/// - area ratio outside `[min_area_ratio, max_area_ratio]` is either
///   background clutter (too small) or the legitimate user leaning
///   into the lens (too large).
#[derive(Clone, Debug)]
pub struct DetectionFilter {
    min_confidence: f32,
    min_area_ratio: f64,
    max_area_ratio: f64,
    low_light_threshold: f32,
}

impl DetectionFilter {
    pub fn new(
        min_confidence: f32,
        min_area_ratio: f64,
        max_area_ratio: f64,
        low_light_threshold: f32,
    ) -> Self {
        Self {
            min_confidence,
            min_area_ratio,
            max_area_ratio,
            low_light_threshold,
        }
    }

    pub fn filter(&self, regions: Vec<FaceRegion>, frame: &Frame) -> Vec<FaceRegion> {
        if self.low_light_threshold > 0.0 && !regions.is_empty() {
            let brightness = mean_brightness(frame);
            if brightness < self.low_light_threshold {
                log::debug!(
                    "frame brightness {brightness:.1} below {}, dropping {} detections",
                    self.low_light_threshold,
                    regions.len()
                );
                return Vec::new();
            }
        }

        regions
            .into_iter()
            .filter(|r| r.confidence >= self.min_confidence)
            .filter(|r| {
                let ratio = r.area_ratio(frame.width(), frame.height());
                (self.min_area_ratio..=self.max_area_ratio).contains(&ratio)
            })
            .collect()
    }
}

fn mean_brightness(frame: &Frame) -> f32 {
    let data = frame.data();
    if data.is_empty() {
        return 0.0;
    }
    let sum: u64 = data.iter().map(|&b| u64::from(b)).sum();
    (sum as f64 / data.len() as f64) as f32
}
