mod display;
mod models;

use serde::Serialize;

use crate::cascade::{CascadeReport, SuggestionCascadeApplier};

pub use display::{ConfidenceBadge, SuggestionSummary, EMPTY_LABEL, NO_CATEGORIES};
pub use models::{
    Confidence, OtherDomainSuggestion, SuggestedValues, SuggestionError, SuggestionRecord,
    NONE_SENTINEL,
};

#[derive(Debug, Default, Serialize)]
pub struct HandlerOutcome {
    pub summary: Option<SuggestionSummary>,
    pub report: Option<CascadeReport>,
}

/// Page entry point: shows the suggestion panel and fills the form from it.
pub struct SuggestionHandler {
    applier: SuggestionCascadeApplier,
}

impl SuggestionHandler {
    pub fn new(applier: SuggestionCascadeApplier) -> Self {
        Self { applier }
    }

    pub fn applier(&self) -> &SuggestionCascadeApplier {
        &self.applier
    }

    /// Same as [`SuggestionHandler::run`] for a raw JSON payload; a payload
    /// that fails to parse is logged and treated as absent.
    pub async fn run_json(&self, payload: Option<&str>) -> HandlerOutcome {
        let record = match payload.map(SuggestionRecord::from_json).transpose() {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(target: "suggestion", error = %err, "invalid suggestion payload");
                None
            }
        };
        self.run(record).await
    }

    pub async fn run(&self, payload: Option<SuggestionRecord>) -> HandlerOutcome {
        let loading = self.applier.loading();
        loading.update_message(
            "Processando sugestões da IA...",
            "Analisando o projeto e gerando recomendações inteligentes",
        );

        let Some(record) = payload else {
            tracing::info!(target: "suggestion", "no suggestion available");
            loading.complete();
            return HandlerOutcome::default();
        };

        tracing::info!(target: "suggestion", ?record, "suggestion loaded");
        loading.update_message(
            "Aplicando sugestões...",
            "Preparando a interface com as recomendações da IA",
        );

        let summary = SuggestionSummary::from_record(&record);
        let report = self.applier.apply(&record).await;
        HandlerOutcome {
            summary: Some(summary),
            report: Some(report),
        }
    }
}
