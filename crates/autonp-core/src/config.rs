//! Configuration loading and output directory management.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::SourceTag;

/// Search terms driving the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Herb search terms, in priority order.
    pub herbs: Vec<String>,
    #[serde(default)]
    pub diseases: Vec<String>,
    /// Exact vs. fuzzy matching of search terms against source names.
    #[serde(default)]
    pub exact_match: bool,
}

/// TCMSP thresholds: OB and DL must exceed these values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcmspFilterConfig {
    #[serde(default)]
    pub ob: Option<f64>,
    #[serde(default)]
    pub dl: Option<f64>,
}

/// HERBac thresholds: molecular weight at most this value (Lipinski).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HerbacFilterConfig {
    #[serde(default)]
    pub weight: Option<f64>,
}

/// PubChem thresholds: each property at most this value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PubchemFilterConfig {
    #[serde(default)]
    pub xlogp: Option<f64>,
    #[serde(default)]
    pub hbonddonor: Option<f64>,
    #[serde(default)]
    pub hbondacc: Option<f64>,
}

/// Swiss thresholds for target prediction and ADME screening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwissFilterConfig {
    /// Prediction probability must exceed this value.
    #[serde(default = "default_swiss_prob")]
    pub prob: Option<f64>,
    /// Minimum number of druglikeness rules (Lipinski, Ghose, Veber, Egan,
    /// Muegge) with zero violations.
    #[serde(default)]
    pub adme_rules: Option<f64>,
    /// Require high gastrointestinal absorption.
    #[serde(default)]
    pub gi_absorption_high: bool,
}

fn default_swiss_prob() -> Option<f64> {
    Some(0.0)
}

impl Default for SwissFilterConfig {
    fn default() -> Self {
        Self {
            prob: default_swiss_prob(),
            adme_rules: None,
            gi_absorption_high: false,
        }
    }
}

/// Per-source admission thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub tcmsp: TcmspFilterConfig,
    #[serde(default)]
    pub herbac: HerbacFilterConfig,
    #[serde(default)]
    pub pubchem: PubchemFilterConfig,
    #[serde(default)]
    pub swiss: SwissFilterConfig,
}

impl FilterConfig {
    fn configured_values(&self) -> Vec<(&'static str, f64)> {
        let mut values = Vec::new();
        let mut push = |name: &'static str, v: Option<f64>| {
            if let Some(v) = v {
                values.push((name, v));
            }
        };
        push("filter.tcmsp.ob", self.tcmsp.ob);
        push("filter.tcmsp.dl", self.tcmsp.dl);
        push("filter.herbac.weight", self.herbac.weight);
        push("filter.pubchem.xlogp", self.pubchem.xlogp);
        push("filter.pubchem.hbonddonor", self.pubchem.hbonddonor);
        push("filter.pubchem.hbondacc", self.pubchem.hbondacc);
        push("filter.swiss.prob", self.swiss.prob);
        push("filter.swiss.adme_rules", self.swiss.adme_rules);
        values
    }
}

/// Top-level AutoNP configuration. Loaded once, then passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutonpConfig {
    pub search: SearchConfig,
    /// Output directory per source; `autonp` holds the merged results.
    #[serde(default)]
    pub save_dir: BTreeMap<SourceTag, PathBuf>,
    #[serde(default)]
    pub filter: FilterConfig,
    /// Source endpoints, used by the fetch layer only.
    #[serde(default)]
    pub url: BTreeMap<SourceTag, String>,
}

impl AutonpConfig {
    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check search terms and thresholds.
    pub fn validate(&self) -> Result<()> {
        check_terms("search.herbs", &self.search.herbs)?;
        check_terms("search.diseases", &self.search.diseases)?;

        for (name, value) in self.filter.configured_values() {
            if !value.is_finite() {
                return Err(Error::Config(format!("{} must be a finite number", name)));
            }
        }
        Ok(())
    }

    pub fn save_dir_for(&self, source: SourceTag) -> Option<&Path> {
        self.save_dir.get(&source).map(|p| p.as_path())
    }

    /// Create every configured save directory.
    pub fn ensure_save_dirs(&self) -> std::io::Result<()> {
        for dir in self.save_dir.values() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

fn check_terms(name: &str, terms: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for term in terms {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(Error::Config(format!("{} contains a blank term", name)));
        }
        if !seen.insert(trimmed) {
            return Err(Error::Config(format!("{} lists {:?} twice", name, trimmed)));
        }
    }
    Ok(())
}
