use serde::Serialize;

use super::models::{Confidence, OtherDomainSuggestion, SuggestedValues, SuggestionRecord};

pub const EMPTY_LABEL: &str = "-";
pub const NO_CATEGORIES: &str = "Nenhuma categoria";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ConfidenceBadge {
    pub text: String,
    pub class: &'static str,
    pub border_color: &'static str,
}

impl ConfidenceBadge {
    /// Anything that is neither high nor low shows as an info badge with
    /// the label as received.
    pub fn for_confidence(confidence: &Confidence) -> Self {
        let (class, border_color) = match confidence {
            Confidence::High => ("accent-badge-success", "#198754"),
            Confidence::Low => ("accent-badge-warning", "#ffc107"),
            Confidence::Medium | Confidence::Other(_) => ("accent-badge-info", "#17a2b8"),
        };
        Self {
            text: confidence.label().to_string(),
            class,
            border_color,
        }
    }
}

/// What the suggestion panel shows next to the form.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SuggestionSummary {
    pub badge: Option<ConfidenceBadge>,
    pub justification: Option<String>,
    pub area: String,
    pub segment: String,
    pub domain_bubbles: Vec<String>,
    pub other_domain_bubbles: Vec<String>,
    pub other_domain_visible: bool,
}

impl SuggestionSummary {
    pub fn from_record(record: &SuggestionRecord) -> Self {
        let other_domain_bubbles = match &record.other_domain {
            OtherDomainSuggestion::ExplicitNone => bubbles(&SuggestedValues::default()),
            OtherDomainSuggestion::Values(values) => bubbles(values),
        };
        let other_domain_visible = match &record.other_domain {
            OtherDomainSuggestion::ExplicitNone => false,
            OtherDomainSuggestion::Values(values) => values
                .as_slice()
                .iter()
                .any(|value| value != EMPTY_LABEL),
        };

        Self {
            badge: record.confidence.as_ref().map(ConfidenceBadge::for_confidence),
            justification: Some(record.justification.clone()).filter(|text| !text.is_empty()),
            area: label(&record.area),
            segment: label(&record.segment),
            domain_bubbles: bubbles(&record.domain),
            other_domain_bubbles,
            other_domain_visible,
        }
    }
}

fn label(value: &str) -> String {
    if value.is_empty() {
        EMPTY_LABEL.to_string()
    } else {
        value.to_string()
    }
}

fn bubbles(values: &SuggestedValues) -> Vec<String> {
    let items: Vec<String> = values
        .as_slice()
        .iter()
        .filter(|value| value.as_str() != EMPTY_LABEL)
        .cloned()
        .collect();
    if items.is_empty() {
        vec![NO_CATEGORIES.to_string()]
    } else {
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payload: &str) -> SuggestionRecord {
        SuggestionRecord::from_json(payload).unwrap()
    }

    #[test]
    fn badge_follows_confidence() {
        let high = SuggestionSummary::from_record(&record(r#"{"confianca":"ALTA"}"#));
        let badge = high.badge.unwrap();
        assert_eq!(badge.class, "accent-badge-success");
        assert_eq!(badge.border_color, "#198754");
        assert_eq!(badge.text, "ALTA");

        let low = SuggestionSummary::from_record(&record(r#"{"confianca":"BAIXA"}"#));
        assert_eq!(low.badge.unwrap().class, "accent-badge-warning");

        let none = SuggestionSummary::from_record(&record("{}"));
        assert!(none.badge.is_none());
    }

    #[test]
    fn unrecognised_confidence_gets_info_badge() {
        let summary = SuggestionSummary::from_record(&record(r#"{"confianca":"MODERADA"}"#));
        assert_eq!(
            summary.badge,
            Some(ConfidenceBadge {
                text: "MODERADA".to_string(),
                class: "accent-badge-info",
                border_color: "#17a2b8",
            })
        );

        let medium = SuggestionSummary::from_record(&record(r#"{"confidence":"MEDIUM"}"#));
        assert_eq!(medium.badge.unwrap().class, "accent-badge-info");
    }

    #[test]
    fn empty_fields_render_placeholders() {
        let summary = SuggestionSummary::from_record(&record(r#"{"dominio_outro":"-"}"#));
        assert_eq!(summary.area, "-");
        assert_eq!(summary.segment, "-");
        assert_eq!(summary.domain_bubbles, vec![NO_CATEGORIES.to_string()]);
        assert!(!summary.other_domain_visible);
        assert!(summary.justification.is_none());
    }

    #[test]
    fn splits_domains_into_bubbles() {
        let summary = SuggestionSummary::from_record(&record(
            r#"{"_aia_n3_dominio_afeito":"Vacinação;Vigilância","_aia_n3_dominio_outro":"Tecnologia"}"#,
        ));
        assert_eq!(summary.domain_bubbles, vec!["Vacinação", "Vigilância"]);
        assert_eq!(summary.other_domain_bubbles, vec!["Tecnologia"]);
        assert!(summary.other_domain_visible);
    }
}
