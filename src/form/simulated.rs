use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use super::{FieldId, FieldState, FormError, FormFields};
use crate::cascade::{ApplyingFlag, EditTracker};
use crate::populator::{EntryPoint, RefreshRegistry};

const DEFAULT_POPULATE_LATENCY: Duration = Duration::from_millis(300);

/// Option lists the page would render, keyed by the parent field's value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionCatalog {
    pub areas: Vec<String>,
    /// area → segments
    pub segments: BTreeMap<String, Vec<String>>,
    /// segment → domains
    pub domains: BTreeMap<String, Vec<String>>,
    /// segment → other domains
    pub other_domains: BTreeMap<String, Vec<String>>,
}

impl OptionCatalog {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn lookup(map: &BTreeMap<String, Vec<String>>, key: Option<&String>) -> Vec<String> {
        key.and_then(|key| map.get(key)).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct Field {
    values: Vec<String>,
    options: Vec<String>,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    changes: usize,
    widget_refreshes: usize,
    frozen: bool,
}

#[derive(Debug, Default)]
struct PageState {
    fields: HashMap<FieldId, Field>,
}

impl PageState {
    fn field(&self, field: FieldId) -> Result<&Field, FormError> {
        self.fields
            .get(&field)
            .ok_or(FormError::MissingElement(field.element_id()))
    }

    fn field_mut(&mut self, field: FieldId) -> Result<&mut Field, FormError> {
        self.fields
            .get_mut(&field)
            .ok_or(FormError::MissingElement(field.element_id()))
    }
}

/// In-memory categorisation form whose dependent option lists fill in
/// asynchronously, the way the real page's refresh routines do.
#[derive(Clone)]
pub struct SimulatedPage {
    state: Arc<Mutex<PageState>>,
    catalog: Arc<OptionCatalog>,
    tracker: EditTracker,
    latency: Duration,
    strict_selects: bool,
}

impl SimulatedPage {
    pub fn new(catalog: OptionCatalog, flag: ApplyingFlag) -> Self {
        let mut state = PageState::default();
        for field in FieldId::ALL {
            state.fields.insert(field, Field::default());
        }
        if let Some(area) = state.fields.get_mut(&FieldId::Area) {
            area.options = catalog.areas.clone();
        }

        Self {
            state: Arc::new(Mutex::new(state)),
            catalog: Arc::new(catalog),
            tracker: EditTracker::new(flag),
            latency: DEFAULT_POPULATE_LATENCY,
            strict_selects: false,
        }
    }

    /// Delay between a refresh call and its options appearing.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Writes keep only values present among the field's options, as a
    /// real `<select>` does.
    pub fn with_strict_selects(mut self) -> Self {
        self.strict_selects = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tracker(&self) -> &EditTracker {
        &self.tracker
    }

    pub fn remove_field(&self, field: FieldId) {
        self.lock().fields.remove(&field);
    }

    pub fn add_class(&self, field: FieldId, class: &str) {
        if let Ok(entry) = self.lock().field_mut(field) {
            entry.classes.insert(class.to_string());
        }
    }

    /// Writes to `field` are dropped from now on, like a widget that restores
    /// its previous selection.
    pub fn freeze(&self, field: FieldId) {
        if let Ok(entry) = self.lock().field_mut(field) {
            entry.frozen = true;
        }
    }

    pub fn set_options(&self, field: FieldId, options: Vec<String>) {
        if let Ok(entry) = self.lock().field_mut(field) {
            entry.options = options;
        }
    }

    /// A user picking values by hand: write plus change event.
    pub fn user_select(&self, field: FieldId, values: &[&str]) {
        let values: Vec<String> = values.iter().map(|value| value.to_string()).collect();
        if self.set_values(field, &values).is_ok() {
            self.dispatch_change(field);
        }
    }

    pub fn values(&self, field: FieldId) -> Vec<String> {
        self.lock()
            .field(field)
            .map(|entry| entry.values.clone())
            .unwrap_or_default()
    }

    pub fn attribute(&self, field: FieldId, name: &str) -> Option<String> {
        self.lock()
            .field(field)
            .ok()
            .and_then(|entry| entry.attributes.get(name).cloned())
    }

    pub fn change_count(&self, field: FieldId) -> usize {
        self.lock()
            .field(field)
            .map(|entry| entry.changes)
            .unwrap_or_default()
    }

    pub fn widget_refresh_count(&self, field: FieldId) -> usize {
        self.lock()
            .field(field)
            .map(|entry| entry.widget_refreshes)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<FieldId, FieldState> {
        let state = self.lock();
        let snapshot = state
            .fields
            .iter()
            .map(|(field, entry)| {
                (
                    *field,
                    FieldState {
                        values: entry.values.clone(),
                    },
                )
            })
            .collect();
        snapshot
    }

    /// Refresh entry points bound to this page.
    pub fn registry(&self) -> RefreshRegistry {
        let segments_page = self.clone();
        let domains_page = self.clone();
        RefreshRegistry::new()
            .with(EntryPoint::FilterSegments, move || {
                segments_page.filter_segments()
            })
            .with(EntryPoint::RefreshDomains, move || {
                domains_page.refresh_domains()
            })
    }

    fn filter_segments(&self) {
        let area = self.values(FieldId::Area).into_iter().next();
        let segments = OptionCatalog::lookup(&self.catalog.segments, area.as_ref());
        self.set_options(FieldId::Segment, Vec::new());
        self.populate_later(vec![(FieldId::Segment, segments)]);
    }

    fn refresh_domains(&self) {
        let segment = self.values(FieldId::Segment).into_iter().next();
        let domains = OptionCatalog::lookup(&self.catalog.domains, segment.as_ref());
        let others = OptionCatalog::lookup(&self.catalog.other_domains, segment.as_ref());
        self.set_options(FieldId::Domain, Vec::new());
        self.set_options(FieldId::OtherDomain, Vec::new());
        self.populate_later(vec![(FieldId::Domain, domains), (FieldId::OtherDomain, others)]);
    }

    fn populate_later(&self, updates: Vec<(FieldId, Vec<String>)>) {
        let page = self.clone();
        tokio::spawn(async move {
            sleep(page.latency).await;
            for (field, options) in updates {
                tracing::debug!(target: "simulated_page", %field, count = options.len(), "options populated");
                page.set_options(field, options);
            }
        });
    }
}

impl FormFields for SimulatedPage {
    fn state(&self, field: FieldId) -> Result<FieldState, FormError> {
        let state = self.lock();
        let entry = state.field(field)?;
        Ok(FieldState {
            values: entry.values.clone(),
        })
    }

    fn set_values(&self, field: FieldId, values: &[String]) -> Result<(), FormError> {
        let mut state = self.lock();
        let entry = state.field_mut(field)?;
        if entry.frozen {
            tracing::debug!(target: "simulated_page", %field, "write ignored by frozen field");
            return Ok(());
        }

        let strict = self.strict_selects;
        let accepted: Vec<String> = values
            .iter()
            .filter(|value| !strict || entry.options.contains(*value))
            .cloned()
            .collect();
        entry.values = if field.is_multi() {
            accepted
        } else {
            accepted.into_iter().take(1).collect()
        };
        Ok(())
    }

    fn options(&self, field: FieldId) -> Result<Vec<String>, FormError> {
        Ok(self.lock().field(field)?.options.clone())
    }

    fn has_class(&self, field: FieldId, class: &str) -> bool {
        self.lock()
            .field(field)
            .map(|entry| entry.classes.contains(class))
            .unwrap_or(false)
    }

    fn set_attribute(&self, field: FieldId, name: &str, value: &str) -> Result<(), FormError> {
        self.lock()
            .field_mut(field)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn dispatch_change(&self, field: FieldId) {
        if let Ok(entry) = self.lock().field_mut(field) {
            entry.changes += 1;
        }
        self.tracker.record_change(field);
    }

    fn refresh_widget(&self, field: FieldId) {
        if let Ok(entry) = self.lock().field_mut(field) {
            entry.widget_refreshes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populator::DependentOptionPopulator;

    fn catalog() -> OptionCatalog {
        serde_json::from_str(
            r#"{
                "areas": ["Saúde"],
                "segments": {"Saúde": ["Atenção Básica"]},
                "domains": {"Atenção Básica": ["Vacinação"]},
                "other_domains": {"Atenção Básica": ["Tecnologia"]}
            }"#,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_populates_after_latency() {
        let page = SimulatedPage::new(catalog(), ApplyingFlag::new())
            .with_latency(Duration::from_millis(500));
        let registry = page.registry();

        page.user_select(FieldId::Area, &["Saúde"]);
        registry.refresh(EntryPoint::FilterSegments).unwrap();
        assert!(page.options(FieldId::Segment).unwrap().is_empty());

        sleep(Duration::from_millis(600)).await;
        assert_eq!(page.options(FieldId::Segment).unwrap(), vec!["Atenção Básica"]);

        page.user_select(FieldId::Segment, &["Atenção Básica"]);
        registry.refresh(EntryPoint::RefreshDomains).unwrap();
        sleep(Duration::from_millis(600)).await;
        assert_eq!(page.options(FieldId::Domain).unwrap(), vec!["Vacinação"]);
        assert_eq!(page.options(FieldId::OtherDomain).unwrap(), vec!["Tecnologia"]);
    }

    #[test]
    fn removed_field_reports_missing_element() {
        let page = SimulatedPage::new(catalog(), ApplyingFlag::new());
        page.remove_field(FieldId::OtherDomain);
        let err = page.state(FieldId::OtherDomain).unwrap_err();
        assert_eq!(err, FormError::MissingElement("dominio_outros"));
        assert_eq!(err.to_string(), "form element 'dominio_outros' not found");
    }

    #[test]
    fn single_value_fields_keep_first_value() {
        let page = SimulatedPage::new(catalog(), ApplyingFlag::new());
        page.set_values(FieldId::Area, &["A".to_string(), "B".to_string()])
            .unwrap();
        assert_eq!(page.values(FieldId::Area), vec!["A"]);
    }

    #[test]
    fn strict_selects_drop_unknown_values() {
        let page = SimulatedPage::new(catalog(), ApplyingFlag::new()).with_strict_selects();
        page.set_options(FieldId::OtherDomain, vec!["Tecnologia".to_string()]);
        page.set_values(
            FieldId::OtherDomain,
            &["tecnologia".to_string(), "Tecnologia".to_string()],
        )
        .unwrap();
        assert_eq!(page.values(FieldId::OtherDomain), vec!["Tecnologia"]);

        page.set_values(FieldId::Area, &["Educação".to_string()]).unwrap();
        assert!(page.values(FieldId::Area).is_empty());
    }

    #[test]
    fn frozen_field_keeps_previous_values() {
        let page = SimulatedPage::new(catalog(), ApplyingFlag::new());
        page.user_select(FieldId::Domain, &["Vacinação"]);
        page.freeze(FieldId::Domain);
        page.set_values(FieldId::Domain, &["Outro".to_string()]).unwrap();
        assert_eq!(page.values(FieldId::Domain), vec!["Vacinação"]);
    }

    #[test]
    fn user_changes_are_tracked() {
        let page = SimulatedPage::new(catalog(), ApplyingFlag::new());
        page.user_select(FieldId::Domain, &["Vacinação"]);
        assert_eq!(page.tracker().user_modified(), vec![FieldId::Domain]);
        assert_eq!(page.change_count(FieldId::Domain), 1);
    }
}
