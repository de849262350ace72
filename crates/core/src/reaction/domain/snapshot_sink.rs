use std::path::PathBuf;
use std::time::SystemTime;

use crate::shared::frame::Frame;

/// Domain interface for persisting the frame that triggered an alert.
///
/// Called from fire-and-forget reaction threads; implementations must
/// be shareable and must not assume the detection thread waits for
/// them.
pub trait SnapshotSink: Send + Sync {
    fn save(&self, frame: &Frame, at: SystemTime) -> Result<PathBuf, Box<dyn std::error::Error>>;
}
