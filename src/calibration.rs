use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Signals whose zero point can be recalibrated at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwaySignal {
    HipSway,
}

impl SwaySignal {
    pub fn name(&self) -> &'static str {
        match self {
            SwaySignal::HipSway => "hip_sway",
        }
    }
}

/// Zero points for sway-type signals.
///
/// Owned by the vision worker: it is the only writer and the only reader, so
/// the store needs no locking.
#[derive(Clone, Debug, Default)]
pub struct CalibrationStore {
    offsets: HashMap<SwaySignal, f32>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self, signal: SwaySignal) -> f32 {
        self.offsets.get(&signal).copied().unwrap_or(0.0)
    }

    pub fn set_zero(&mut self, signal: SwaySignal, raw: f32) {
        self.offsets.insert(signal, raw);
    }

    /// Raw value relative to the stored zero point.
    pub fn relative(&self, signal: SwaySignal, raw: f32) -> f32 {
        raw - self.offset(signal)
    }
}

/// One-shot request to re-zero the sway signals.
///
/// The UI fires it, the vision worker consumes it with [`RecalibrateTrigger::take`].
/// Firing twice before it is consumed still yields a single recalibration.
#[derive(Clone, Debug, Default)]
pub struct RecalibrateTrigger {
    pending: Arc<AtomicBool>,
}

impl RecalibrateTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Test-and-clear: returns `true` exactly once per firing.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}
