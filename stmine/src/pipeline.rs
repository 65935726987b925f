//! End-to-end mining run.
//!
//! A [`MiningPipeline`] indexes contexts, runs the configured miner,
//! optionally derives association rules, and generalizes the concrete
//! results into star layers.

use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};
use tracing::info;

use crate::apriori::{AprioriMiner, HashedAprioriMiner};
use crate::config::{Algorithm, MiningConfig};
use crate::context::ContextIndex;
use crate::fpgrowth::FpGrowthMiner;
use crate::rules::{AssociationRule, RuleGenerator};
use crate::star::{StarGeneralizer, StarPatterns};
use crate::types::{MinedPatterns, Result, Transaction};

/// Discovers frequent itemsets (size two and up) per concrete context.
///
/// Implementations must agree on the triples they return for the same input
/// and threshold.
pub trait FrequentItemsetMiner: Send + Sync {
    /// Short algorithm name for logs and reports.
    fn name(&self) -> &str;

    /// Mine every concrete context of `transactions`.
    fn mine(&self, transactions: &[Transaction]) -> Result<MinedPatterns>;

    /// Mine with an index already built over `transactions`.
    ///
    /// Miners that partition by context id override this to skip rebuilding
    /// the index.
    fn mine_with_index(&self, _index: &ContextIndex, transactions: &[Transaction]) -> Result<MinedPatterns> {
        self.mine(transactions)
    }
}

/// Construct the miner selected by `config`.
pub fn miner_for(config: &MiningConfig) -> Box<dyn FrequentItemsetMiner> {
    match config.algorithm {
        Algorithm::Apriori => Box::new(AprioriMiner::new(config.min_support)),
        Algorithm::HashedApriori => Box::new(HashedAprioriMiner::new(config.min_support)),
        Algorithm::FpGrowth => Box::new(
            FpGrowthMiner::new(config.min_support).with_max_depth(config.max_recursion_depth),
        ),
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct MiningReport {
    pub algorithm: Algorithm,
    pub min_support: u64,
    /// Context ids used by the run
    #[serde(skip)]
    pub index: ContextIndex,
    pub patterns: StarPatterns,
    /// Empty unless a confidence threshold was configured
    pub rules: Vec<AssociationRule>,
    /// Wall time of mining, rules and generalization
    #[serde(rename = "elapsed_us", serialize_with = "serialize_micros")]
    pub elapsed: Duration,
}

impl MiningReport {
    pub fn elapsed_micros(&self) -> u128 {
        self.elapsed.as_micros()
    }
}

fn serialize_micros<S: Serializer>(elapsed: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX))
}

/// Runs one configured mining pass.
#[derive(Debug, Clone)]
pub struct MiningPipeline {
    config: MiningConfig,
}

impl MiningPipeline {
    /// Create a pipeline, rejecting invalid parameters up front.
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    pub fn run(&self, transactions: &[Transaction]) -> Result<MiningReport> {
        let started = Instant::now();
        let index = ContextIndex::build(transactions);
        let miner = miner_for(&self.config);

        info!(
            algorithm = miner.name(),
            min_support = self.config.min_support,
            transactions = transactions.len(),
            "Mining started"
        );

        let mined = miner.mine_with_index(&index, transactions)?;

        let rules = match self.config.min_confidence {
            Some(min_confidence) => {
                let buckets = index.bucket(transactions)?;
                RuleGenerator::new(min_confidence).generate(&mined, &index, &buckets)?
            }
            None => Vec::new(),
        };

        let patterns = StarGeneralizer::new(&index).generalize(mined);
        let elapsed = started.elapsed();

        info!(
            algorithm = miner.name(),
            contexts = patterns.zero_star.len(),
            patterns = patterns.zero_star.pattern_count(),
            one_star = patterns.one_star.pattern_count(),
            global = patterns.two_star.pattern_count(),
            rules = rules.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Mining finished"
        );

        Ok(MiningReport {
            algorithm: self.config.algorithm,
            min_support: self.config.min_support,
            index,
            patterns,
            rules,
            elapsed,
        })
    }
}
