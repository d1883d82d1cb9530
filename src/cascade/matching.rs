use serde::Serialize;

/// Outcome of matching suggested free text against a live option list.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct MatchReport {
    /// Canonical option text, in the order of the suggested values.
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
}

impl MatchReport {
    pub fn all_found(&self) -> bool {
        self.unmatched.is_empty()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Finds the option for one suggested value: exact (case-insensitive) first,
/// then containment in either direction, first option wins.
pub fn find_option<'a>(suggested: &str, options: &'a [String]) -> Option<&'a String> {
    let wanted = normalize(suggested);
    if wanted.is_empty() {
        return None;
    }
    let normalized: Vec<String> = options.iter().map(|option| normalize(option)).collect();

    normalized
        .iter()
        .position(|option| *option == wanted)
        .or_else(|| {
            normalized.iter().position(|option| {
                !option.is_empty() && (option.contains(&wanted) || wanted.contains(option.as_str()))
            })
        })
        .map(|index| &options[index])
}

pub fn match_options(suggested: &[String], options: &[String]) -> MatchReport {
    let mut report = MatchReport::default();
    for value in suggested {
        match find_option(value, options) {
            Some(option) => {
                tracing::debug!(target: "cascade", %value, %option, "suggested value matched option");
                if !report.matched.contains(option) {
                    report.matched.push(option.clone());
                }
            }
            None => report.unmatched.push(value.clone()),
        }
    }
    if !report.unmatched.is_empty() {
        tracing::warn!(target: "cascade", unmatched = ?report.unmatched, "values not found among options");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn substring_match_uses_canonical_option() {
        let opts = options(&["Educação", "saúde pública"]);
        let report = match_options(&["Saúde".to_string()], &opts);
        assert_eq!(report.matched, vec!["saúde pública"]);
        assert!(report.all_found());
    }

    #[test]
    fn exact_match_beats_earlier_substring() {
        let opts = options(&["Saúde Pública", "saúde"]);
        assert_eq!(find_option(" SAÚDE ", &opts).unwrap(), "saúde");
    }

    #[test]
    fn option_contained_in_suggestion_matches() {
        let opts = options(&["Tecnologia"]);
        assert_eq!(
            find_option("Tecnologia da Informação", &opts).unwrap(),
            "Tecnologia"
        );
    }

    #[test]
    fn records_unmatched_without_blocking_matched() {
        let opts = options(&["Meio Ambiente", "Cultura"]);
        let report = match_options(
            &["cultura".to_string(), "Esporte".to_string()],
            &opts,
        );
        assert_eq!(report.matched, vec!["Cultura"]);
        assert_eq!(report.unmatched, vec!["Esporte"]);
        assert!(!report.all_found());
    }

    #[test]
    fn blank_options_never_match() {
        let opts = options(&["", "Cultura"]);
        assert_eq!(find_option("Esporte", &opts), None);
        assert_eq!(find_option("  ", &opts), None);
    }
}
