use std::sync::Arc;
use std::thread;
use std::time::SystemTime;

use crate::reaction::domain::app_switcher::AppSwitcher;
use crate::reaction::domain::snapshot_sink::SnapshotSink;
use crate::shared::frame::Frame;

/// Fans an alert out to its side effects, each on its own thread.
///
/// Snapshot save and app switch are independent and fire-and-forget: a
/// slow disk write or process launch never delays the next detection
/// tick, and a failure in one reaction never affects the other or a
/// later alert. Ordering between reactions is unspecified.
pub struct ReactionDispatcher {
    snapshot: Option<Arc<dyn SnapshotSink>>,
    switcher: Option<Arc<dyn AppSwitcher>>,
}

impl ReactionDispatcher {
    pub fn new(
        snapshot: Option<Arc<dyn SnapshotSink>>,
        switcher: Option<Arc<dyn AppSwitcher>>,
    ) -> Self {
        Self { snapshot, switcher }
    }

    /// No configured reactions; alerts still reach the UI through the
    /// worker's event channel.
    pub fn disabled() -> Self {
        Self {
            snapshot: None,
            switcher: None,
        }
    }

    pub fn dispatch(&self, frame: Frame, face_count: u32, at: SystemTime) {
        log::info!("alert: {face_count} faces detected, dispatching reactions");

        if let Some(sink) = self.snapshot.clone() {
            thread::spawn(move || match sink.save(&frame, at) {
                Ok(path) => log::info!("saved snapshot to {}", path.display()),
                Err(e) => log::warn!("snapshot save failed: {e}"),
            });
        }

        if let Some(switcher) = self.switcher.clone() {
            thread::spawn(move || {
                if let Err(e) = switcher.bring_to_front() {
                    log::warn!("work app switch failed: {e}");
                }
            });
        }
    }
}
