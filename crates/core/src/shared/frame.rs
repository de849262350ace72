use std::time::SystemTime;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at the capture boundary only; the domain
/// layer treats pixel data as opaque. `sequence` increases
/// monotonically per source, `captured_at` is the wall-clock capture
/// time (used for snapshot naming and UI display).
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    sequence: u64,
    captured_at: SystemTime,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        sequence: u64,
        captured_at: SystemTime,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            sequence,
            captured_at,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }
}
