/// Cross-thread engine control
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable stop/pause handle
///
/// The engine checks it once per iteration boundary; hooks already running
/// are never interrupted.
#[derive(Debug, Clone)]
pub struct EngineControl {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl EngineControl {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the engine to return from `run` at the next boundary
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl Default for EngineControl {
    fn default() -> Self {
        Self::new()
    }
}
