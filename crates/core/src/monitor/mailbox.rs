use std::sync::Mutex;

/// Single-slot, overwrite-on-write hand-off between the detection
/// worker and its observers.
///
/// The worker stores the latest value once per tick; readers always
/// see the most recent store. Stale reads are fine and there is no
/// queueing: only the latest state matters across this boundary.
pub struct Mailbox<T> {
    slot: Mutex<T>,
}

impl<T: Clone> Mailbox<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slot: Mutex::new(initial),
        }
    }

    pub fn store(&self, value: T) {
        *self.slot.lock().expect("mailbox lock poisoned") = value;
    }

    pub fn load(&self) -> T {
        self.slot.lock().expect("mailbox lock poisoned").clone()
    }
}
