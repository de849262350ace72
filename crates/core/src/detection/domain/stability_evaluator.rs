use std::collections::VecDeque;

/// Majority-of-N debouncer for raw per-frame face counts.
///
/// Keeps a ring buffer of the last `window` raw counts and reports a
/// triggering stable count only when at least `required` of them meet
/// the `min_faces` threshold. Single-frame detector misses (one face
/// briefly occluded) are absorbed without letting a sustained
/// single-face state accumulate into a false multi-face trigger.
///
/// Until the buffer holds a full window the evaluator reports 0, so
/// partial warm-up data can never cause a spurious alert.
pub struct StabilityEvaluator {
    window: usize,
    required: usize,
    min_faces: u32,
    history: VecDeque<u32>,
}

impl StabilityEvaluator {
    /// `required` is clamped into `1..=window`; invalid combinations
    /// are rejected earlier by config validation.
    pub fn new(window: usize, required: usize, min_faces: u32) -> Self {
        let window = window.max(1);
        Self {
            window,
            required: required.clamp(1, window),
            min_faces,
            history: VecDeque::with_capacity(window),
        }
    }

    /// Feeds one raw observation and returns the stable count.
    ///
    /// The stable count is the most recent qualifying raw count when
    /// the majority rule holds, 0 otherwise.
    pub fn observe(&mut self, raw_count: u32) -> u32 {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(raw_count);

        if self.history.len() < self.window {
            return 0;
        }

        let qualifying = self
            .history
            .iter()
            .filter(|&&count| count >= self.min_faces)
            .count();
        if qualifying >= self.required {
            self.history
                .iter()
                .rev()
                .find(|&&count| count >= self.min_faces)
                .copied()
                .unwrap_or(0)
        } else {
            0
        }
    }
}
