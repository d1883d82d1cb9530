use serde::Serialize;
use tokio::time::sleep;

use super::matching::match_options;
use super::{HaltReason, SuggestionCascadeApplier};
use crate::form::{FieldId, EXPLICIT_NONE_ATTRIBUTE};
use crate::suggestion::OtherDomainSuggestion;

/// How the other-domain field ended up being set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OtherDomainResolution {
    /// The suggestion said "none": field cleared and flagged.
    ExplicitNone,
    /// The eager raw write already left the field non-empty.
    DirectWrite { values: Vec<String> },
    /// At least one suggested value matched a live option.
    Matched {
        values: Vec<String>,
        unmatched: Vec<String>,
        attempts: u32,
    },
    /// Nothing matched within the attempt budget; raw values were written.
    RawFallback { values: Vec<String>, attempts: u32 },
}

impl SuggestionCascadeApplier {
    pub(super) async fn resolve_other_domain(
        &self,
        suggestion: &OtherDomainSuggestion,
    ) -> Result<OtherDomainResolution, HaltReason> {
        let values = match suggestion {
            OtherDomainSuggestion::ExplicitNone => {
                tracing::info!(target: "cascade", "other domains marked as none, clearing field");
                self.write(FieldId::OtherDomain, &[])?;
                self.fields
                    .set_attribute(FieldId::OtherDomain, EXPLICIT_NONE_ATTRIBUTE, "true")?;
                return Ok(OtherDomainResolution::ExplicitNone);
            }
            OtherDomainSuggestion::Values(values) => values.as_slice(),
        };

        sleep(self.config.other_domain_initial_delay()).await;

        if self.config.eager_direct_write {
            self.write(FieldId::OtherDomain, values)?;
            sleep(self.config.direct_write_check()).await;
            if self.fields.state(FieldId::OtherDomain)?.is_populated() {
                return Ok(OtherDomainResolution::DirectWrite {
                    values: values.to_vec(),
                });
            }
            tracing::info!(target: "cascade", "direct write left field empty, matching against options");
        }

        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let options = self.fields.options(FieldId::OtherDomain)?;
            if options.is_empty() {
                tracing::debug!(target: "cascade", attempt, "other-domain select has no options yet");
            } else {
                let report = match_options(values, &options);
                if report.matched.is_empty() {
                    tracing::debug!(target: "cascade", attempt, "no matching option yet");
                } else {
                    self.write(FieldId::OtherDomain, &report.matched)?;
                    if self.fields.state(FieldId::OtherDomain)?.is_populated() {
                        return Ok(OtherDomainResolution::Matched {
                            values: report.matched,
                            unmatched: report.unmatched,
                            attempts: attempt,
                        });
                    }
                    tracing::warn!(target: "cascade", attempt, "selection did not stick");
                }
            }

            if attempt < max_attempts {
                sleep(self.config.retry_delay()).await;
            }
        }

        tracing::warn!(
            target: "cascade",
            attempts = max_attempts,
            ?values,
            "no option matched, applying suggested values as-is"
        );
        self.write(FieldId::OtherDomain, values)?;
        Ok(OtherDomainResolution::RawFallback {
            values: values.to_vec(),
            attempts: max_attempts,
        })
    }
}
