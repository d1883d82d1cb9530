use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Page routines that rebuild the option list of the next field down the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EntryPoint {
    /// Rebuilds the segment options for the chosen area.
    FilterSegments,
    /// Rebuilds the domain and other-domain options for the chosen segment.
    RefreshDomains,
}

impl EntryPoint {
    pub fn name(self) -> &'static str {
        match self {
            EntryPoint::FilterSegments => "filtrarSegmentos",
            EntryPoint::RefreshDomains => "atualizarDominios",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum PopulatorError {
    #[error("function {0} not found")]
    Missing(EntryPoint),
}

/// Kicks off an option refresh. Completion is not observable by the caller.
pub trait DependentOptionPopulator: Send + Sync {
    fn refresh(&self, entry: EntryPoint) -> Result<(), PopulatorError>;
}

type RefreshFn = Arc<dyn Fn() + Send + Sync>;

/// Entry points registered by name, mirroring globals defined by other page
/// scripts. Unregistered names fail softly.
#[derive(Clone, Default)]
pub struct RefreshRegistry {
    entries: HashMap<EntryPoint, RefreshFn>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, entry: EntryPoint, refresh: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.entries.insert(entry, Arc::new(refresh));
    }

    pub fn with(mut self, entry: EntryPoint, refresh: impl Fn() + Send + Sync + 'static) -> Self {
        self.register(entry, refresh);
        self
    }

    pub fn remove(&mut self, entry: EntryPoint) {
        self.entries.remove(&entry);
    }

    pub fn contains(&self, entry: EntryPoint) -> bool {
        self.entries.contains_key(&entry)
    }
}

impl DependentOptionPopulator for RefreshRegistry {
    fn refresh(&self, entry: EntryPoint) -> Result<(), PopulatorError> {
        let refresh = self
            .entries
            .get(&entry)
            .ok_or(PopulatorError::Missing(entry))?;
        tracing::debug!(target: "cascade", entry = %entry, "calling refresh entry point");
        refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn calls_registered_entry_point() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = RefreshRegistry::new().with(EntryPoint::FilterSegments, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.refresh(EntryPoint::FilterSegments).unwrap();
        registry.refresh(EntryPoint::FilterSegments).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_entry_point_is_reported_by_name() {
        let mut registry = RefreshRegistry::new().with(EntryPoint::RefreshDomains, || {});
        assert!(registry.contains(EntryPoint::RefreshDomains));
        registry.remove(EntryPoint::RefreshDomains);
        assert!(!registry.contains(EntryPoint::RefreshDomains));

        let err = registry.refresh(EntryPoint::RefreshDomains).unwrap_err();
        assert_eq!(err, PopulatorError::Missing(EntryPoint::RefreshDomains));
        assert_eq!(err.to_string(), "function atualizarDominios not found");
    }
}
