use std::time::Instant;

/// Scoped timing guard. Logs the elapsed time at `debug` level when dropped.
pub(crate) struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!("{}: {:?}", self.label, self.start.elapsed());
    }
}
