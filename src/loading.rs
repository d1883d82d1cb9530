use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// External progress overlay shown while suggestions are generated and applied.
pub trait LoadingIndicator: Send + Sync {
    fn update_message(&self, title: &str, subtitle: &str);
    fn complete_progress(&self);
}

/// Optional indicator plus the page-local "a loading sequence is active" flag.
///
/// Every call is a no-op when no indicator is present or no sequence is
/// active.
#[derive(Clone, Default)]
pub struct LoadingGate {
    indicator: Option<Arc<dyn LoadingIndicator>>,
    active: Arc<AtomicBool>,
}

impl LoadingGate {
    pub fn new(indicator: Arc<dyn LoadingIndicator>, active: bool) -> Self {
        Self {
            indicator: Some(indicator),
            active: Arc::new(AtomicBool::new(active)),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.indicator.is_some() && self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn update_message(&self, title: &str, subtitle: &str) {
        if let Some(indicator) = self.indicator.as_ref().filter(|_| self.is_active()) {
            indicator.update_message(title, subtitle);
        }
    }

    /// Completes the overlay and ends the loading sequence; later calls are
    /// silent until it is reactivated.
    pub fn complete(&self) {
        if let Some(indicator) = self.indicator.as_ref().filter(|_| self.is_active()) {
            tracing::debug!(target: "loading", "completing progress overlay");
            indicator.complete_progress();
            self.set_active(false);
        }
    }

    /// Starts a scope that completes the indicator when it ends, whatever
    /// path the caller leaves through.
    pub fn session(&self) -> LoadingSession {
        LoadingSession {
            gate: self.clone(),
            finished: false,
        }
    }
}

pub struct LoadingSession {
    gate: LoadingGate,
    finished: bool,
}

impl LoadingSession {
    pub fn update_message(&self, title: &str, subtitle: &str) {
        self.gate.update_message(title, subtitle);
    }

    pub fn finish(mut self) {
        self.complete_once();
    }

    fn complete_once(&mut self) {
        if !self.finished {
            self.finished = true;
            self.gate.complete();
        }
    }
}

impl Drop for LoadingSession {
    fn drop(&mut self) {
        self.complete_once();
    }
}
