//! Cascades a suggestion into the dependent area → segment → domain →
//! other-domain selects.
//!
//! Each downstream select is repopulated by page code the cascade cannot
//! observe, so every step writes its value, pokes the matching refresh entry
//! point and then waits a fixed settling delay before moving on. Only the
//! last field is matched against its live options, with bounded retries.

mod flag;
mod matching;
mod other_domain;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::time::sleep;

use crate::config::CascadeConfig;
use crate::form::{FieldId, FormError, FormFields};
use crate::loading::LoadingGate;
use crate::populator::{DependentOptionPopulator, EntryPoint, PopulatorError};
use crate::suggestion::SuggestionRecord;

pub use flag::{ApplyGuard, ApplyingFlag, EditTracker};
pub use matching::{find_option, match_options, MatchReport};
pub use other_domain::OtherDomainResolution;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeState {
    Idle,
    AreaSet,
    SegmentSet,
    DomainSet,
    OtherDomainSet,
    Aborted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum CascadeError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Populator(#[from] PopulatorError),
}

/// Why a cascade stopped before setting the other-domain field.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    #[error("fields already filled: {fields:?}")]
    FieldsPrefilled { fields: Vec<FieldId> },
    #[error("another suggestion apply is in flight")]
    AlreadyApplying,
    #[error("no area to apply")]
    EmptyArea,
    #[error("no segment to apply")]
    EmptySegment,
    #[error("{error}")]
    Failed { error: CascadeError },
}

impl From<CascadeError> for HaltReason {
    fn from(error: CascadeError) -> Self {
        HaltReason::Failed { error }
    }
}

impl From<FormError> for HaltReason {
    fn from(error: FormError) -> Self {
        CascadeError::from(error).into()
    }
}

impl From<PopulatorError> for HaltReason {
    fn from(error: PopulatorError) -> Self {
        CascadeError::from(error).into()
    }
}

/// Result of one cascade run. The in-flight flag is always released by the
/// time a report exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub final_state: CascadeState,
    pub halt: Option<HaltReason>,
    pub other_domain: Option<OtherDomainResolution>,
}

impl CascadeReport {
    fn halted(final_state: CascadeState, reason: HaltReason) -> Self {
        Self {
            final_state,
            halt: Some(reason),
            other_domain: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.final_state == CascadeState::OtherDomainSet
    }
}

pub struct SuggestionCascadeApplier {
    fields: Arc<dyn FormFields>,
    populator: Arc<dyn DependentOptionPopulator>,
    loading: LoadingGate,
    flag: ApplyingFlag,
    config: CascadeConfig,
}

impl SuggestionCascadeApplier {
    pub fn new(
        fields: Arc<dyn FormFields>,
        populator: Arc<dyn DependentOptionPopulator>,
        config: CascadeConfig,
    ) -> Self {
        Self {
            fields,
            populator,
            loading: LoadingGate::disabled(),
            flag: ApplyingFlag::new(),
            config,
        }
    }

    pub fn with_loading(mut self, loading: LoadingGate) -> Self {
        self.loading = loading;
        self
    }

    /// Shares the in-flight flag with edit detection on the page.
    pub fn with_flag(mut self, flag: ApplyingFlag) -> Self {
        self.flag = flag;
        self
    }

    pub fn flag(&self) -> &ApplyingFlag {
        &self.flag
    }

    pub fn loading(&self) -> &LoadingGate {
        &self.loading
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Runs the whole cascade. Never fails: problems end up as a
    /// [`HaltReason`] on the report and in the log, and the loading
    /// indicator is completed on every path.
    pub async fn apply(&self, record: &SuggestionRecord) -> CascadeReport {
        let session = self.loading.session();
        let report = self.run(record).await;
        session.finish();
        report
    }

    async fn run(&self, record: &SuggestionRecord) -> CascadeReport {
        match self.prefilled_fields() {
            Ok(fields) if !fields.is_empty() => {
                tracing::info!(target: "cascade", ?fields, "fields already filled, not applying suggestion");
                return CascadeReport::halted(
                    CascadeState::Aborted,
                    HaltReason::FieldsPrefilled { fields },
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(target: "cascade", error = %err, "cannot read form fields");
                return CascadeReport::halted(CascadeState::Aborted, err.into());
            }
        }

        let Some(_guard) = self.flag.acquire() else {
            tracing::warn!(target: "cascade", "suggestion apply already in flight");
            return CascadeReport::halted(CascadeState::Aborted, HaltReason::AlreadyApplying);
        };

        let mut state = CascadeState::Idle;
        match self.cascade(record, &mut state).await {
            Ok(resolution) => CascadeReport {
                final_state: state,
                halt: None,
                other_domain: Some(resolution),
            },
            Err(reason) => {
                match &reason {
                    HaltReason::Failed { error } => {
                        tracing::error!(target: "cascade", ?state, %error, "cascade halted");
                    }
                    other => tracing::info!(target: "cascade", ?state, reason = %other, "cascade stopped"),
                }
                CascadeReport::halted(state, reason)
            }
        }
    }

    fn prefilled_fields(&self) -> Result<Vec<FieldId>, FormError> {
        let mut filled = Vec::new();
        for field in FieldId::ALL {
            let current = self.fields.state(field)?;
            if current.is_populated() {
                filled.push(field);
            }
        }
        Ok(filled)
    }

    async fn cascade(
        &self,
        record: &SuggestionRecord,
        state: &mut CascadeState,
    ) -> Result<OtherDomainResolution, HaltReason> {
        sleep(self.config.start_delay()).await;

        if record.area.is_empty() {
            return Err(HaltReason::EmptyArea);
        }
        self.write(FieldId::Area, std::slice::from_ref(&record.area))?;
        *state = CascadeState::AreaSet;
        self.populator.refresh(EntryPoint::FilterSegments)?;
        sleep(self.config.segment_settle()).await;

        if record.segment.is_empty() {
            return Err(HaltReason::EmptySegment);
        }
        self.write(FieldId::Segment, std::slice::from_ref(&record.segment))?;
        *state = CascadeState::SegmentSet;
        self.populator.refresh(EntryPoint::RefreshDomains)?;
        sleep(self.config.domain_settle()).await;

        if record.domain.is_empty() {
            tracing::info!(target: "cascade", "no domain suggested, leaving field untouched");
        } else {
            self.write(FieldId::Domain, record.domain.as_slice())?;
        }
        *state = CascadeState::DomainSet;

        let resolution = self.resolve_other_domain(&record.other_domain).await?;
        *state = CascadeState::OtherDomainSet;
        Ok(resolution)
    }

    fn write(&self, field: FieldId, values: &[String]) -> Result<(), FormError> {
        self.fields.set_values(field, values)?;
        self.fields.dispatch_change(field);
        if self
            .fields
            .has_class(field, &self.config.enhanced_select_class)
        {
            self.fields.refresh_widget(field);
        }
        highlight(field, values);
        Ok(())
    }
}

/// Hook for visual feedback on fields filled from a suggestion.
fn highlight(field: FieldId, values: &[String]) {
    tracing::debug!(target: "cascade", %field, ?values, "field filled from suggestion");
}
