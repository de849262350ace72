use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::config::SnapshotConfig;
use crate::reaction::domain::snapshot_sink::SnapshotSink;
use crate::shared::frame::Frame;

/// Writes alert frames as `people_YYYYMMDD_HHMMSS_mmm.jpg` under a
/// configured directory, creating it on demand.
///
/// The naming keeps snapshots sortable for after-the-fact review of
/// who was looking at the screen.
pub struct JpegSnapshotWriter {
    directory: PathBuf,
}

impl JpegSnapshotWriter {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    /// Builds a writer from config; None when snapshots are disabled
    /// or no directory is configured.
    pub fn from_config(config: &SnapshotConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        config.directory.clone().map(Self::new)
    }

    fn file_name(at: SystemTime) -> String {
        let local: DateTime<Local> = at.into();
        local.format("people_%Y%m%d_%H%M%S_%3f.jpg").to_string()
    }
}

impl SnapshotSink for JpegSnapshotWriter {
    fn save(&self, frame: &Frame, at: SystemTime) -> Result<PathBuf, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.directory)?;

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("failed to build image from frame data")?;

        let path = self.directory.join(Self::file_name(at));
        img.save(&path)?;
        Ok(path)
    }
}
