use std::time::{Duration, Instant};

/// Discrete outcome of one engine tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertDecision {
    /// No state change worth reporting.
    None,
    /// The trigger condition holds and the cooldown has elapsed.
    Alert,
    /// The stable count dropped below threshold after being above.
    Clear,
}

/// Cooldown-gated alert state machine.
///
/// Two states, Idle and Cooldown, encoded by `last_alert`:
/// - Idle (`last_alert` unset or cooldown elapsed): a triggering
///   stable count emits `Alert` and starts the cooldown.
/// - Cooldown: triggering ticks emit nothing; once the cooldown
///   elapses the next triggering tick alerts again, so a continuously
///   triggering signal fires exactly once per cooldown interval.
///
/// `Clear` fires on the triggering→non-triggering transition for UI
/// feedback; it is independent of the cooldown and does not reset it.
/// `is_alerting` likewise tracks the raw trigger condition so the UI
/// can show "multiple faces present" even while alerts are gated.
///
/// Elapsed time uses saturating subtraction: a clock that jumps
/// backward reads as zero elapsed and stays conservatively inside the
/// cooldown instead of firing a spurious alert.
pub struct AlertEngine {
    min_faces: u32,
    cooldown: Duration,
    last_alert: Option<Instant>,
    is_alerting: bool,
}

impl AlertEngine {
    pub fn new(min_faces: u32, cooldown: Duration) -> Self {
        Self {
            min_faces,
            cooldown,
            last_alert: None,
            is_alerting: false,
        }
    }

    pub fn tick(&mut self, stable_count: u32, now: Instant) -> AlertDecision {
        let triggering = stable_count >= self.min_faces;
        let was_alerting = self.is_alerting;
        self.is_alerting = triggering;

        if triggering {
            if self.cooldown_elapsed(now) {
                self.last_alert = Some(now);
                return AlertDecision::Alert;
            }
            AlertDecision::None
        } else if was_alerting {
            AlertDecision::Clear
        } else {
            AlertDecision::None
        }
    }

    /// Whether the trigger condition held on the last tick,
    /// independent of cooldown gating.
    pub fn is_alerting(&self) -> bool {
        self.is_alerting
    }

    pub fn last_alert(&self) -> Option<Instant> {
        self.last_alert
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_alert {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.cooldown,
        }
    }
}
