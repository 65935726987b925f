//! Configuration for a mining run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{MiningError, Result};

/// Frequent-itemset discovery algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Level-wise join over the whole transaction set
    Apriori,
    /// Level-wise join over per-context buckets
    HashedApriori,
    /// Prefix-tree growth per context
    #[default]
    FpGrowth,
}

impl Algorithm {
    /// Every algorithm, in a stable order.
    pub const ALL: [Algorithm; 3] = [
        Algorithm::Apriori,
        Algorithm::HashedApriori,
        Algorithm::FpGrowth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Apriori => "apriori",
            Algorithm::HashedApriori => "hashed-apriori",
            Algorithm::FpGrowth => "fp-growth",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = MiningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apriori" => Ok(Algorithm::Apriori),
            "hashed-apriori" | "hbst" | "hashed" => Ok(Algorithm::HashedApriori),
            "fp-growth" | "fpgrowth" | "fptree" => Ok(Algorithm::FpGrowth),
            other => Err(MiningError::InvalidConfig(format!(
                "unknown algorithm {other:?} (expected apriori, hashed-apriori or fp-growth)"
            ))),
        }
    }
}

/// Parameters threaded through every mining and counting call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Minimum number of supporting transactions within a context
    pub min_support: u64,
    /// Discovery algorithm
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Confidence threshold for association rules; no rules when unset
    #[serde(default)]
    pub min_confidence: Option<f64>,
    /// Deepest conditional-tree recursion FP-Growth may reach
    #[serde(default = "default_max_recursion_depth")]
    pub max_recursion_depth: usize,
}

fn default_max_recursion_depth() -> usize { 256 }

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 2,
            algorithm: Algorithm::default(),
            min_confidence: None,
            max_recursion_depth: default_max_recursion_depth(),
        }
    }
}

impl MiningConfig {
    /// Create a config with the given support threshold.
    pub fn new(min_support: u64) -> Self {
        Self {
            min_support,
            ..Default::default()
        }
    }

    /// Builder: set the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: enable association rules.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    /// Builder: set the recursion guard.
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Reject parameters the miners cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.min_support == 0 {
            return Err(MiningError::InvalidConfig(
                "min_support must be a positive integer".to_string(),
            ));
        }
        if let Some(confidence) = self.min_confidence {
            if !(confidence > 0.0 && confidence <= 1.0) {
                return Err(MiningError::InvalidConfig(format!(
                    "min_confidence must be in (0, 1], got {confidence}"
                )));
            }
        }
        if self.max_recursion_depth == 0 {
            return Err(MiningError::InvalidConfig(
                "max_recursion_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load config from TOML.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MiningError::ConfigFormat(e.to_string()))
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| MiningError::ConfigFormat(e.to_string()))
    }
}
