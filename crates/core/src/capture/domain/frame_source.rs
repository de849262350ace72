use std::time::Duration;

use crate::shared::frame::Frame;

/// Outcome of one bounded frame acquisition.
#[derive(Debug)]
pub enum FrameGrab {
    Frame(Frame),
    /// No frame arrived within the deadline. The detection loop treats
    /// this as "no detection result" and moves on; it must never hang.
    Timeout,
}

/// Domain interface for camera-like frame producers.
///
/// Implementations may hold device handles, hence `&mut self`;
/// dropping the source releases the device.
pub trait FrameSource: Send {
    fn next_frame(&mut self, timeout: Duration) -> Result<FrameGrab, Box<dyn std::error::Error>>;
}
