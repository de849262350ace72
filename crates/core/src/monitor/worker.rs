use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::capture::domain::frame_source::{FrameGrab, FrameSource};
use crate::config::MonitorConfig;
use crate::detection::domain::alert_engine::{AlertDecision, AlertEngine};
use crate::detection::domain::detection_filter::DetectionFilter;
use crate::detection::domain::face_detector::{DetectionResult, FaceDetector};
use crate::detection::domain::stability_evaluator::StabilityEvaluator;
use crate::monitor::mailbox::Mailbox;
use crate::monitor::status::{MonitorEvent, MonitorStatus};
use crate::reaction::dispatcher::ReactionDispatcher;
use crate::shared::frame::Frame;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Owner handle for a running detection worker.
///
/// The UI layer reads `status()` (latest-value mailbox, stale reads
/// fine) and drains `events()` (bounded channel); the worker never
/// waits on either. Dropping the handle requests a stop and joins the
/// thread; teardown is bounded by roughly one poll interval, after
/// which the frame source (camera handle) is released.
pub struct MonitorHandle {
    events: Receiver<MonitorEvent>,
    status: Arc<Mailbox<MonitorStatus>>,
    detection: Arc<Mailbox<Option<DetectionResult>>>,
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn events(&self) -> &Receiver<MonitorEvent> {
        &self.events
    }

    /// Most recent per-tick status.
    pub fn status(&self) -> MonitorStatus {
        self.status.load()
    }

    /// Most recent filtered detection result, for debug display.
    pub fn detection(&self) -> Option<DetectionResult> {
        self.detection.load()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Stops the worker and waits for it to exit.
    pub fn shutdown(mut self) {
        self.request_stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Spawns the detection worker thread.
///
/// The thread owns source → detector → filter → evaluator → engine and
/// runs the poll loop until stopped. Reactions go through `dispatcher`
/// on their own threads; the loop itself never blocks on them.
pub fn spawn(
    config: &MonitorConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    dispatcher: ReactionDispatcher,
) -> MonitorHandle {
    let (event_tx, event_rx) = crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY);
    let status = Arc::new(Mailbox::new(MonitorStatus::default()));
    let detection = Arc::new(Mailbox::new(None));
    let stop = Arc::new(AtomicBool::new(false));

    let worker = Worker {
        source,
        detector,
        dispatcher,
        filter: DetectionFilter::new(
            config.camera.min_confidence,
            config.camera.min_area_ratio,
            config.camera.max_area_ratio,
            config.camera.low_light_threshold,
        ),
        evaluator: StabilityEvaluator::new(
            config.stability.window,
            config.stability.required,
            config.min_faces_for_alert,
        ),
        engine: AlertEngine::new(config.min_faces_for_alert, config.cooldown()),
        poll_interval: config.poll_interval(),
        degraded_interval: config.degraded_interval(),
        frame_timeout: config.frame_timeout(),
        degraded_after: config.degraded.after_failures,
        event_tx,
        status: status.clone(),
        detection: detection.clone(),
        stop: stop.clone(),
        consecutive_failures: 0,
        degraded: false,
        last_frame: None,
        last_alert_at: None,
        tick: 0,
    };

    let thread = thread::spawn(move || worker.run());

    MonitorHandle {
        events: event_rx,
        status,
        detection,
        stop,
        thread: Some(thread),
    }
}

struct Worker {
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    dispatcher: ReactionDispatcher,
    filter: DetectionFilter,
    evaluator: StabilityEvaluator,
    engine: AlertEngine,
    poll_interval: Duration,
    degraded_interval: Duration,
    frame_timeout: Duration,
    degraded_after: u32,
    event_tx: Sender<MonitorEvent>,
    status: Arc<Mailbox<MonitorStatus>>,
    detection: Arc<Mailbox<Option<DetectionResult>>>,
    stop: Arc<AtomicBool>,
    consecutive_failures: u32,
    degraded: bool,
    /// Most recent successfully captured frame, kept for snapshots on
    /// alerts whose own tick failed.
    last_frame: Option<Frame>,
    last_alert_at: Option<SystemTime>,
    tick: u64,
}

impl Worker {
    fn run(mut self) {
        log::info!("detection worker started");
        while !self.stop.load(Ordering::Relaxed) {
            let tick_started = Instant::now();
            self.run_tick();
            self.tick += 1;

            let interval = if self.degraded {
                self.degraded_interval
            } else {
                self.poll_interval
            };
            self.sleep_remaining(tick_started, interval);
        }
        log::info!("detection worker stopped after {} ticks", self.tick);
        // Dropping self releases the frame source (camera handle).
    }

    fn run_tick(&mut self) {
        let raw_count = match self.acquire_and_detect() {
            Some(result) => {
                let count = result.face_count();
                self.detection.store(Some(result));
                self.tick_succeeded();
                count
            }
            None => {
                self.tick_failed();
                0
            }
        };

        let stable_count = self.evaluator.observe(raw_count);
        match self.engine.tick(stable_count, Instant::now()) {
            AlertDecision::Alert => {
                let at = SystemTime::now();
                self.last_alert_at = Some(at);
                if let Some(frame) = self.last_frame.clone() {
                    self.dispatcher.dispatch(frame, stable_count, at);
                } else {
                    log::warn!("alert with no captured frame, skipping reactions");
                }
                self.send_event(MonitorEvent::Alert {
                    face_count: stable_count,
                    at,
                });
            }
            AlertDecision::Clear => self.send_event(MonitorEvent::Clear),
            AlertDecision::None => {}
        }

        self.status.store(MonitorStatus {
            tick: self.tick + 1,
            stable_count,
            is_alerting: self.engine.is_alerting(),
            last_alert_at: self.last_alert_at,
            degraded: self.degraded,
        });
    }

    /// One bounded acquisition and detection pass. None means the tick
    /// failed (timeout or error) and counts as zero faces.
    fn acquire_and_detect(&mut self) -> Option<DetectionResult> {
        let frame = match self.source.next_frame(self.frame_timeout) {
            Ok(FrameGrab::Frame(frame)) => frame,
            Ok(FrameGrab::Timeout) => {
                log::debug!("frame acquisition timed out");
                return None;
            }
            Err(e) => {
                log::warn!("frame acquisition failed: {e}");
                return None;
            }
        };

        let regions = match self.detector.detect(&frame) {
            Ok(regions) => regions,
            Err(e) => {
                log::warn!("detection failed: {e}");
                return None;
            }
        };

        let regions = self.filter.filter(regions, &frame);
        let result = DetectionResult {
            sequence: frame.sequence(),
            captured_at: frame.captured_at(),
            regions,
        };
        self.last_frame = Some(frame);
        Some(result)
    }

    fn tick_succeeded(&mut self) {
        self.consecutive_failures = 0;
        if self.degraded {
            self.degraded = false;
            log::info!("capture recovered, resuming normal poll rate");
            self.send_event(MonitorEvent::Recovered);
        }
    }

    fn tick_failed(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures == self.degraded_after {
            self.degraded = true;
            log::warn!(
                "{} consecutive failed ticks, entering degraded retry",
                self.consecutive_failures
            );
            self.send_event(MonitorEvent::Degraded {
                consecutive_failures: self.consecutive_failures,
            });
        }
    }

    fn send_event(&self, event: MonitorEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::debug!("event channel full, dropping {event:?}");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Sleeps out the rest of the tick interval in stop-aware slices
    /// so teardown stays bounded even at the degraded rate.
    fn sleep_remaining(&self, tick_started: Instant, interval: Duration) {
        let deadline = tick_started + interval;
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(self.poll_interval));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::infrastructure::synthetic_source::SyntheticSource;
    use crate::detection::infrastructure::scripted_detector::ScriptedDetector;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_config() -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.camera.poll_interval_ms = 5;
        config.camera.frame_timeout_ms = 20;
        config.degraded.retry_interval_ms = 10;
        config.stability.window = 3;
        config.stability.required = 2;
        config
    }

    fn spawn_with(config: &MonitorConfig, script: Vec<u32>, timeouts: Vec<u64>) -> MonitorHandle {
        let source = SyntheticSource::new(100, 100).with_timeouts(timeouts);
        let detector = ScriptedDetector::new(script);
        spawn(
            config,
            Box::new(source),
            Box::new(detector),
            ReactionDispatcher::disabled(),
        )
    }

    #[test]
    fn test_two_faces_raise_one_alert_within_cooldown() {
        let mut config = fast_config();
        config.alert_cooldown_seconds = 3600.0;
        let handle = spawn_with(&config, vec![2], Vec::new());

        match handle.events().recv_timeout(RECV_TIMEOUT).unwrap() {
            MonitorEvent::Alert { face_count, .. } => assert_eq!(face_count, 2),
            other => panic!("expected Alert, got {other:?}"),
        }

        // Trigger condition persists but the cooldown gates further alerts.
        assert!(handle
            .events()
            .recv_timeout(Duration::from_millis(200))
            .is_err());

        let status = handle.status();
        assert!(status.is_alerting);
        assert_eq!(status.stable_count, 2);
        assert!(status.last_alert_at.is_some());

        handle.shutdown();
    }

    #[test]
    fn test_no_alert_during_warmup_or_single_face() {
        let mut config = fast_config();
        config.stability.window = 5;
        config.stability.required = 3;
        let handle = spawn_with(&config, vec![1], Vec::new());

        // A sustained single-face feed never produces an event.
        assert!(handle
            .events()
            .recv_timeout(Duration::from_millis(300))
            .is_err());
        let status = handle.status();
        assert_eq!(status.stable_count, 0);
        assert!(!status.is_alerting);

        handle.shutdown();
    }

    #[test]
    fn test_clear_follows_alert_when_faces_leave() {
        let mut config = fast_config();
        config.alert_cooldown_seconds = 3600.0;
        // Two faces long enough to alert, then nobody.
        let script = vec![2, 2, 2, 2, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let source = SyntheticSource::new(100, 100);
        // Non-cycling effect: after the script cycles it repeats, but
        // the trailing zeros dominate the window between cycles.
        let handle = spawn(
            &config,
            Box::new(source),
            Box::new(ScriptedDetector::new(script)),
            ReactionDispatcher::disabled(),
        );

        assert!(matches!(
            handle.events().recv_timeout(RECV_TIMEOUT).unwrap(),
            MonitorEvent::Alert { .. }
        ));
        assert_eq!(
            handle.events().recv_timeout(RECV_TIMEOUT).unwrap(),
            MonitorEvent::Clear
        );

        handle.shutdown();
    }

    #[test]
    fn test_persistent_timeouts_degrade_once_then_recover() {
        let mut config = fast_config();
        config.degraded.after_failures = 5;
        // Source times out on the first five ticks, then delivers.
        let handle = spawn_with(&config, vec![0], (0..5).collect());

        assert_eq!(
            handle.events().recv_timeout(RECV_TIMEOUT).unwrap(),
            MonitorEvent::Degraded {
                consecutive_failures: 5
            }
        );
        assert_eq!(
            handle.events().recv_timeout(RECV_TIMEOUT).unwrap(),
            MonitorEvent::Recovered
        );

        // Exactly one degraded notification, and the loop kept going.
        let tick_before = handle.status().tick;
        thread::sleep(Duration::from_millis(100));
        assert!(handle.status().tick > tick_before);
        assert!(!handle.status().degraded);

        handle.shutdown();
    }

    #[test]
    fn test_detector_errors_count_as_zero_faces() {
        use crate::detection::infrastructure::scripted_detector::FAIL_TICK;

        let config = fast_config();
        let handle = spawn_with(&config, vec![FAIL_TICK], Vec::new());

        thread::sleep(Duration::from_millis(100));
        let status = handle.status();
        assert_eq!(status.stable_count, 0);
        assert!(!status.is_alerting);
        // Still ticking despite every detect call failing.
        assert!(status.tick > 0);

        handle.shutdown();
    }

    #[test]
    fn test_shutdown_joins_promptly() {
        let config = fast_config();
        let handle = spawn_with(&config, vec![0], Vec::new());
        thread::sleep(Duration::from_millis(30));

        let started = Instant::now();
        handle.shutdown();
        // Teardown bounded by roughly one interval (generous margin).
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_alert_dispatches_snapshot_with_frame() {
        use crate::reaction::domain::snapshot_sink::SnapshotSink;
        use std::path::PathBuf;

        struct NotifyingSink {
            tx: crossbeam_channel::Sender<u64>,
        }

        impl SnapshotSink for NotifyingSink {
            fn save(
                &self,
                frame: &Frame,
                _at: SystemTime,
            ) -> Result<PathBuf, Box<dyn std::error::Error>> {
                let _ = self.tx.send(frame.sequence());
                Ok(PathBuf::from("x.jpg"))
            }
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let dispatcher =
            ReactionDispatcher::new(Some(Arc::new(NotifyingSink { tx })), None);

        let mut config = fast_config();
        config.alert_cooldown_seconds = 3600.0;
        let handle = spawn(
            &config,
            Box::new(SyntheticSource::new(100, 100)),
            Box::new(ScriptedDetector::new(vec![2])),
            dispatcher,
        );

        // The snapshot sink received a real frame.
        rx.recv_timeout(RECV_TIMEOUT).unwrap();

        handle.shutdown();
    }
}
