use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use form_cascade::form::OptionCatalog;
use form_cascade::suggestion::OtherDomainSuggestion;
use form_cascade::{
    ApplyingFlag, CascadeConfig, FieldId, LoadingGate, LoadingIndicator, SimulatedPage,
    SuggestionCascadeApplier, SuggestionHandler, SuggestionRecord,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

struct LogIndicator;

impl LoadingIndicator for LogIndicator {
    fn update_message(&self, title: &str, subtitle: &str) {
        tracing::info!(target: "loading", %title, %subtitle, "overlay message");
    }

    fn complete_progress(&self) {
        tracing::info!(target: "loading", "overlay complete");
    }
}

/// Catalog that offers exactly the suggested values, for runs without one.
fn catalog_from(record: &SuggestionRecord) -> OptionCatalog {
    let mut catalog = OptionCatalog {
        areas: vec![record.area.clone()],
        segments: BTreeMap::from([(record.area.clone(), vec![record.segment.clone()])]),
        domains: BTreeMap::from([(record.segment.clone(), record.domain.as_slice().to_vec())]),
        other_domains: BTreeMap::new(),
    };
    if let OtherDomainSuggestion::Values(values) = &record.other_domain {
        catalog
            .other_domains
            .insert(record.segment.clone(), values.as_slice().to_vec());
    }
    catalog
}

async fn run(suggestion_path: PathBuf, catalog_path: Option<PathBuf>) -> Result<()> {
    let config_path = std::env::var("FORM_CASCADE_CONFIG").ok().map(PathBuf::from);
    let config = CascadeConfig::load(config_path).context("load cascade config")?;

    let payload = std::fs::read_to_string(&suggestion_path)
        .with_context(|| format!("read suggestion {}", suggestion_path.display()))?;
    let record = SuggestionRecord::from_json(&payload).context("parse suggestion")?;

    let catalog = match catalog_path {
        Some(path) => OptionCatalog::load(&path)
            .with_context(|| format!("load option catalog {}", path.display()))?,
        None => catalog_from(&record),
    };

    let flag = ApplyingFlag::new();
    let page = SimulatedPage::new(catalog, flag.clone());
    page.add_class(FieldId::Domain, &config.enhanced_select_class);
    page.add_class(FieldId::OtherDomain, &config.enhanced_select_class);

    let applier = SuggestionCascadeApplier::new(
        Arc::new(page.clone()),
        Arc::new(page.registry()),
        config,
    )
    .with_flag(flag)
    .with_loading(LoadingGate::new(Arc::new(LogIndicator), true));
    let handler = SuggestionHandler::new(applier);

    let outcome = handler.run(Some(record)).await;
    let output = json!({
        "outcome": outcome,
        "fields": page.snapshot(),
        "data_na": page.attribute(FieldId::OtherDomain, "data-na"),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(suggestion_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: form_cascade <suggestion.json> [catalog.json]");
        std::process::exit(2);
    };
    let catalog_path = args.next().map(PathBuf::from);

    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("Failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = rt.block_on(run(suggestion_path, catalog_path)) {
        eprintln!("Failed to apply suggestion: {err:#}");
        std::process::exit(1);
    }
}
