use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU8, Ordering},
};

/// Process-wide shutdown signal. Once set it is never cleared.
#[derive(Clone, Debug, Default)]
pub struct StopFlag {
    stop: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Running = 0,
    Stopping = 1,
    Stopped = 2,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Running,
            1 => WorkerState::Stopping,
            _ => WorkerState::Stopped,
        }
    }
}

/// Observable lifecycle of one worker thread. Transitions only move forward:
/// Running -> Stopping -> Stopped.
#[derive(Clone, Debug)]
pub struct WorkerStatus {
    name: &'static str,
    state: Arc<AtomicU8>,
}

impl WorkerStatus {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(AtomicU8::new(WorkerState::Running as u8)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn advance(&self, next: WorkerState) {
        let previous = self.state.fetch_max(next as u8, Ordering::SeqCst);
        if previous < next as u8 {
            log::debug!("{} worker: {:?} -> {:?}", self.name, WorkerState::from_u8(previous), next);
        }
    }
}
