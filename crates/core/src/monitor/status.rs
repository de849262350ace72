use std::time::SystemTime;

/// Latest-value view of the detection worker, published to the
/// mailbox once per tick for the UI layer.
#[derive(Clone, Debug, Default)]
pub struct MonitorStatus {
    /// Loop iterations completed so far.
    pub tick: u64,
    /// Debounced face count from the stability evaluator.
    pub stable_count: u32,
    /// Whether the trigger condition currently holds (independent of
    /// cooldown gating).
    pub is_alerting: bool,
    pub last_alert_at: Option<SystemTime>,
    /// Capture/detection has failed persistently; the loop is
    /// retrying at a reduced rate.
    pub degraded: bool,
}

/// Discrete notifications sent from the worker to the UI layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Cooldown-gated alert; reactions have been dispatched.
    Alert { face_count: u32, at: SystemTime },
    /// The multi-face condition ended.
    Clear,
    /// Capture/detection failed for the configured number of
    /// consecutive ticks.
    Degraded { consecutive_failures: u32 },
    /// A tick succeeded again after a degraded stretch.
    Recovered,
}
