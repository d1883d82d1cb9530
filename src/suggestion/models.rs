use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker the server writes when no secondary domain applies.
pub const NONE_SENTINEL: &str = "N/A";

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("failed to parse suggestion payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// Any other non-empty label, kept verbatim.
    Other(String),
}

impl Confidence {
    /// Accepts both the Portuguese labels the server emits and the English
    /// ones. Blank input has no confidence at all.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match trimmed.to_uppercase().as_str() {
            "" => None,
            "ALTA" | "HIGH" => Some(Confidence::High),
            "MÉDIA" | "MEDIA" | "MEDIUM" => Some(Confidence::Medium),
            "BAIXA" | "LOW" => Some(Confidence::Low),
            _ => Some(Confidence::Other(trimmed.to_string())),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Confidence::High => "ALTA",
            Confidence::Medium => "MÉDIA",
            Confidence::Low => "BAIXA",
            Confidence::Other(label) => label,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Confidence {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One or more values, received either as a `;`-joined string or a list.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SuggestedValues(Vec<String>);

impl SuggestedValues {
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(';')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            items
                .into_iter()
                .map(|item| item.as_ref().trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// The other-domain suggestion distinguishes "explicitly none" from a list
/// that still has to be matched against live options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OtherDomainSuggestion {
    ExplicitNone,
    Values(SuggestedValues),
}

impl OtherDomainSuggestion {
    fn from_raw(raw: Option<RawValues>) -> Self {
        let values = match raw {
            None => return OtherDomainSuggestion::ExplicitNone,
            Some(RawValues::One(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NONE_SENTINEL) {
                    return OtherDomainSuggestion::ExplicitNone;
                }
                SuggestedValues::parse(trimmed)
            }
            Some(RawValues::Many(items)) => SuggestedValues::from_list(items),
        };

        let only_sentinel = values
            .as_slice()
            .iter()
            .all(|value| value.eq_ignore_ascii_case(NONE_SENTINEL));
        if only_sentinel {
            OtherDomainSuggestion::ExplicitNone
        } else {
            OtherDomainSuggestion::Values(values)
        }
    }

    pub fn is_explicit_none(&self) -> bool {
        matches!(self, OtherDomainSuggestion::ExplicitNone)
    }
}

impl Serialize for OtherDomainSuggestion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OtherDomainSuggestion::ExplicitNone => serializer.serialize_str(NONE_SENTINEL),
            OtherDomainSuggestion::Values(values) => values.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawValues {
    One(String),
    Many(Vec<String>),
}

impl RawValues {
    fn is_blank(&self) -> bool {
        match self {
            RawValues::One(text) => text.trim().is_empty(),
            RawValues::Many(items) => items.iter().all(|item| item.trim().is_empty()),
        }
    }

    fn into_values(self) -> SuggestedValues {
        match self {
            RawValues::One(text) => SuggestedValues::parse(&text),
            RawValues::Many(items) => SuggestedValues::from_list(items),
        }
    }
}

/// Wire shape: current `_aia_*` keys, the legacy Portuguese keys and the
/// English spellings, in that order of precedence.
#[derive(Debug, Deserialize)]
struct RawSuggestion {
    #[serde(rename = "_aia_n1_macroarea")]
    aia_area: Option<String>,
    microarea: Option<String>,
    area: Option<String>,
    #[serde(rename = "_aia_n2_segmento")]
    aia_segment: Option<String>,
    segmento: Option<String>,
    segment: Option<String>,
    #[serde(rename = "_aia_n3_dominio_afeito")]
    aia_domain: Option<RawValues>,
    dominio: Option<RawValues>,
    domain: Option<RawValues>,
    #[serde(rename = "_aia_n3_dominio_outro")]
    aia_other_domain: Option<RawValues>,
    dominio_outro: Option<RawValues>,
    #[serde(rename = "otherDomain")]
    other_domain: Option<RawValues>,
    confianca: Option<String>,
    confidence: Option<String>,
    justificativa: Option<String>,
    justification: Option<String>,
}

/// First non-blank candidate, trimmed.
fn first_text<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// First non-blank candidate; a present but blank value still beats an
/// absent one so an empty other-domain reads as the sentinel.
fn first_values<const N: usize>(candidates: [Option<RawValues>; N]) -> Option<RawValues> {
    let mut fallback = None;
    for values in candidates.into_iter().flatten() {
        if !values.is_blank() {
            return Some(values);
        }
        fallback.get_or_insert(values);
    }
    fallback
}

/// A suggestion as received by the page. Immutable once parsed.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub area: String,
    pub segment: String,
    pub domain: SuggestedValues,
    pub other_domain: OtherDomainSuggestion,
    pub confidence: Option<Confidence>,
    pub justification: String,
}

impl<'de> Deserialize<'de> for SuggestionRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawSuggestion::deserialize(deserializer).map(SuggestionRecord::from)
    }
}

impl From<RawSuggestion> for SuggestionRecord {
    fn from(raw: RawSuggestion) -> Self {
        let domain = first_values([raw.aia_domain, raw.dominio, raw.domain])
            .map(RawValues::into_values)
            .unwrap_or_default();
        let other_domain = OtherDomainSuggestion::from_raw(first_values([
            raw.aia_other_domain,
            raw.dominio_outro,
            raw.other_domain,
        ]));
        let confidence = first_text([raw.confianca, raw.confidence]);

        Self {
            area: first_text([raw.aia_area, raw.microarea, raw.area]),
            segment: first_text([raw.aia_segment, raw.segmento, raw.segment]),
            domain,
            other_domain,
            confidence: Confidence::parse(&confidence),
            justification: first_text([raw.justificativa, raw.justification]),
        }
    }
}

impl SuggestionRecord {
    pub fn from_json(payload: &str) -> Result<Self, SuggestionError> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_current_keys() {
        let record: SuggestionRecord = serde_json::from_value(json!({
            "_aia_n1_macroarea": " Saúde ",
            "_aia_n2_segmento": "Atenção Básica",
            "_aia_n3_dominio_afeito": "A; B ;C",
            "_aia_n3_dominio_outro": "N/A",
            "confianca": "ALTA",
            "justificativa": "Projeto de vacinação."
        }))
        .unwrap();

        assert_eq!(record.area, "Saúde");
        assert_eq!(record.segment, "Atenção Básica");
        assert_eq!(record.domain.as_slice(), ["A", "B", "C"]);
        assert!(record.other_domain.is_explicit_none());
        assert_eq!(record.confidence, Some(Confidence::High));
        assert_eq!(record.justification, "Projeto de vacinação.");
    }

    #[test]
    fn accepts_legacy_and_english_keys() {
        let legacy: SuggestionRecord = serde_json::from_value(json!({
            "microarea": "Educação",
            "segmento": "Ensino Médio",
            "dominio": ["Currículo", ""],
            "dominio_outro": "Tecnologia",
            "confianca": "BAIXA"
        }))
        .unwrap();
        assert_eq!(legacy.area, "Educação");
        assert_eq!(legacy.domain.as_slice(), ["Currículo"]);
        assert_eq!(
            legacy.other_domain,
            OtherDomainSuggestion::Values(SuggestedValues::parse("Tecnologia"))
        );
        assert_eq!(legacy.confidence, Some(Confidence::Low));

        let english = SuggestionRecord::from_json(
            r#"{"area":"Saúde","segment":"Atenção Básica","domain":"Vacinação","otherDomain":"","confidence":"MEDIUM"}"#,
        )
        .unwrap();
        assert_eq!(english.domain.as_slice(), ["Vacinação"]);
        assert!(english.other_domain.is_explicit_none());
        assert_eq!(english.confidence, Some(Confidence::Medium));
    }

    #[test]
    fn empty_primary_falls_through_to_legacy() {
        let record: SuggestionRecord = serde_json::from_value(json!({
            "_aia_n1_macroarea": "",
            "microarea": "Cultura",
            "_aia_n3_dominio_afeito": "",
            "dominio": "Patrimônio"
        }))
        .unwrap();
        assert_eq!(record.area, "Cultura");
        assert_eq!(record.domain.as_slice(), ["Patrimônio"]);
    }

    #[test]
    fn missing_other_domain_is_explicit_none() {
        let record = SuggestionRecord::from_json(r#"{"area":"Saúde"}"#).unwrap();
        assert!(record.other_domain.is_explicit_none());
        assert!(record.domain.is_empty());
        assert_eq!(record.confidence, None);
    }

    #[test]
    fn unknown_confidence_keeps_its_label() {
        assert_eq!(
            Confidence::parse(" moderada "),
            Some(Confidence::Other("moderada".to_string()))
        );
        assert_eq!(Confidence::parse("média"), Some(Confidence::Medium));
        assert_eq!(Confidence::parse("  "), None);

        let record = SuggestionRecord::from_json(r#"{"confianca":"MODERADA"}"#).unwrap();
        assert_eq!(record.confidence.as_ref().map(Confidence::label), Some("MODERADA"));
        assert_eq!(serde_json::to_value(&record).unwrap()["confidence"], "MODERADA");
    }

    #[test]
    fn legacy_and_english_spellings_coexist() {
        let record = SuggestionRecord::from_json(
            r#"{"microarea":"","area":"Saúde","segmento":"Atenção Básica","segment":"Hospitalar","dominio_outro":"Tecnologia","otherDomain":"Educação","confianca":"ALTA","confidence":"LOW"}"#,
        )
        .unwrap();
        assert_eq!(record.area, "Saúde");
        assert_eq!(record.segment, "Atenção Básica");
        assert_eq!(
            record.other_domain,
            OtherDomainSuggestion::Values(SuggestedValues::parse("Tecnologia"))
        );
        assert_eq!(record.confidence, Some(Confidence::High));
    }

    #[test]
    fn blank_other_domain_falls_through_to_next_spelling() {
        let record =
            SuggestionRecord::from_json(r#"{"dominio_outro":" ","otherDomain":"Educação"}"#).unwrap();
        assert_eq!(
            record.other_domain,
            OtherDomainSuggestion::Values(SuggestedValues::parse("Educação"))
        );

        let blank_only = SuggestionRecord::from_json(r#"{"dominio_outro":""}"#).unwrap();
        assert!(blank_only.other_domain.is_explicit_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = SuggestionRecord::from_json("{not json").unwrap_err();
        assert!(matches!(err, SuggestionError::Json(_)));
    }
}
