use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::capture::domain::frame_source::{FrameGrab, FrameSource};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Adapts a directory of image files to the [`FrameSource`] interface.
///
/// Files are replayed in lexicographic order, cycling back to the
/// start when exhausted, which mimics a continuously running camera
/// for demos and hardware-free testing. Decoding goes through the
/// `image` crate; frames are normalized to RGB.
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    next_index: usize,
    sequence: u64,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl ImageDirSource {
    pub fn open(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(format!("no image files found in {}", dir.display()).into());
        }

        Ok(Self {
            files,
            next_index: 0,
            sequence: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self, _timeout: Duration) -> Result<FrameGrab, Box<dyn std::error::Error>> {
        let path = &self.files[self.next_index];
        self.next_index = (self.next_index + 1) % self.files.len();

        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::new(
            rgb.into_raw(),
            width,
            height,
            3,
            self.sequence,
            SystemTime::now(),
        );
        self.sequence += 1;
        Ok(FrameGrab::Frame(frame))
    }
}
