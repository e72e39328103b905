//! Search-term matching for herbs and diseases.
//!
//! `exact_match` only governs how configured search terms are compared with
//! source-side names. Compound and target identity never depends on it.

use autonp_core::{HerbNames, SearchConfig};

/// CJK Unified Ideographs block.
pub fn is_chinese_char(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Matches configured search terms against names found in source records.
#[derive(Debug, Clone, Copy)]
pub struct SearchMatcher {
    exact: bool,
}

impl SearchMatcher {
    pub fn new(exact: bool) -> Self {
        Self { exact }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.exact_match)
    }

    /// Whether a herb term matches a record's herb names.
    ///
    /// Exact mode compares a Chinese term with the primary name and any other
    /// term case-insensitively with the English name or pinyin. Fuzzy mode
    /// accepts a name containing the term or contained in it, ignoring case.
    pub fn herb_matches(&self, term: &str, names: &HerbNames) -> bool {
        let term = term.trim();
        let Some(first) = term.chars().next() else {
            return false;
        };

        if self.exact {
            if is_chinese_char(first) {
                names.name.trim() == term
            } else {
                let term_lower = term.to_lowercase();
                [&names.en_name, &names.pinyin]
                    .into_iter()
                    .flatten()
                    .any(|n| n.trim().to_lowercase() == term_lower)
            }
        } else {
            let term_lower = term.to_lowercase();
            std::iter::once(&names.name)
                .chain(names.en_name.iter())
                .chain(names.pinyin.iter())
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .any(|n| n.contains(&term_lower) || term_lower.contains(&n))
        }
    }

    /// First configured herb term (in configured order) matching the names.
    pub fn resolve_herb<'a>(&self, terms: &'a [String], names: &HerbNames) -> Option<&'a str> {
        terms
            .iter()
            .find(|t| self.herb_matches(t, names))
            .map(|t| t.as_str())
    }

    /// Whether a disease term matches an evidence text.
    pub fn disease_matches(&self, term: &str, evidence: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return false;
        }
        let evidence = evidence.trim().to_lowercase();
        if self.exact {
            evidence == term
        } else {
            evidence.contains(&term)
        }
    }

    /// Configured disease terms matched by any of the evidence texts.
    pub fn resolve_diseases<'a>(&self, terms: &'a [String], evidence: &[String]) -> Vec<&'a str> {
        terms
            .iter()
            .filter(|t| evidence.iter().any(|e| self.disease_matches(t, e)))
            .map(|t| t.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn astragalus() -> HerbNames {
        HerbNames {
            name: "黄芪".into(),
            en_name: Some("Astragali Radix".into()),
            pinyin: Some("Huangqi".into()),
        }
    }

    #[test]
    fn test_exact_chinese_term() {
        let m = SearchMatcher::new(true);
        assert!(m.herb_matches("黄芪", &astragalus()));
        assert!(!m.herb_matches("黄", &astragalus()));
    }

    #[test]
    fn test_exact_latin_term_uses_en_or_pinyin() {
        let m = SearchMatcher::new(true);
        assert!(m.herb_matches("huangqi", &astragalus()));
        assert!(m.herb_matches("ASTRAGALI RADIX", &astragalus()));
        assert!(!m.herb_matches("astragali", &astragalus()));
    }

    #[test]
    fn test_fuzzy_substring() {
        let m = SearchMatcher::new(false);
        assert!(m.herb_matches("黄", &astragalus()));
        assert!(m.herb_matches("astragali", &astragalus()));
        assert!(!m.herb_matches("人参", &astragalus()));
        // Either direction: a longer configured term still finds the herb.
        assert!(m.herb_matches("黄芪片", &astragalus()));
    }

    #[test]
    fn test_resolve_herb_in_configured_order() {
        let m = SearchMatcher::new(false);
        let terms = vec!["人参".to_string(), "黄".to_string(), "黄芪".to_string()];
        assert_eq!(m.resolve_herb(&terms, &astragalus()), Some("黄"));
    }

    #[test]
    fn test_disease_matching() {
        let fuzzy = SearchMatcher::new(false);
        let exact = SearchMatcher::new(true);
        let evidence = "DISEASE: Diabetes mellitus, non-insulin-dependent (NIDDM)";
        assert!(fuzzy.disease_matches("diabetes", evidence));
        assert!(!exact.disease_matches("diabetes", evidence));
        assert!(exact.disease_matches("Diabetes", " diabetes "));

        let terms = vec!["diabetes".to_string(), "asthma".to_string()];
        assert_eq!(
            fuzzy.resolve_diseases(&terms, &[evidence.to_string()]),
            vec!["diabetes"]
        );
    }
}
