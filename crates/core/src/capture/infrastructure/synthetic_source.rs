use std::time::{Duration, SystemTime};

use crate::capture::domain::frame_source::{FrameGrab, FrameSource};
use crate::shared::frame::Frame;

/// Generates flat gray frames at a fixed size.
///
/// Stands in for a camera when none is attached (demo runs, detector
/// exercises, worker tests). Can be scripted to time out on selected
/// ticks to exercise the degraded path.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    sequence: u64,
    /// Ticks (by call index) that report a timeout instead of a frame.
    timeout_ticks: Vec<u64>,
    calls: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sequence: 0,
            timeout_ticks: Vec::new(),
            calls: 0,
        }
    }

    pub fn with_timeouts(mut self, ticks: Vec<u64>) -> Self {
        self.timeout_ticks = ticks;
        self
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self, _timeout: Duration) -> Result<FrameGrab, Box<dyn std::error::Error>> {
        let call = self.calls;
        self.calls += 1;

        if self.timeout_ticks.contains(&call) {
            return Ok(FrameGrab::Timeout);
        }

        let data = vec![128u8; (self.width * self.height * 3) as usize];
        let frame = Frame::new(
            data,
            self.width,
            self.height,
            3,
            self.sequence,
            SystemTime::now(),
        );
        self.sequence += 1;
        Ok(FrameGrab::Frame(frame))
    }
}
