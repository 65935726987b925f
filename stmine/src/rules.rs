//! Association rules derived from concrete-context patterns.
//!
//! Every frequent itemset `I` of size two or more splits into rules
//! `A → I − A` for each non-empty proper subset `A`. A rule is kept when
//! `support(I) / support(A)` reaches the confidence threshold, both supports
//! counted inside the pattern's own context.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::context::{Context, ContextBuckets, ContextIndex};
use crate::item::Itemset;
use crate::support::support_in_bucket;
use crate::types::{MinedPatterns, MiningError, Result};

/// `antecedent → consequent` inside one context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationRule {
    pub context: Context,
    pub antecedent: Itemset,
    pub consequent: Itemset,
    /// Support of `antecedent ∪ consequent`
    pub support: u64,
    pub confidence: f64,
}

/// Generates confidence-filtered rules.
#[derive(Debug, Clone)]
pub struct RuleGenerator {
    min_confidence: f64,
}

impl RuleGenerator {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Rules for every pattern of every concrete context in `mined`.
    pub fn generate(
        &self,
        mined: &MinedPatterns,
        index: &ContextIndex,
        buckets: &ContextBuckets<'_>,
    ) -> Result<Vec<AssociationRule>> {
        let mut rules = Vec::new();

        for (context, patterns) in mined.iter() {
            let bucket = index
                .id_of(context)
                .and_then(|id| buckets.get(id))
                .ok_or_else(|| MiningError::UnknownContext(context.to_string()))?;

            let mut antecedent_support: HashMap<Itemset, u64> = HashMap::new();
            for pattern in patterns {
                for antecedent in pattern.items.proper_subsets() {
                    let support = *antecedent_support
                        .entry(antecedent.clone())
                        .or_insert_with(|| support_in_bucket(&antecedent, bucket));
                    if support == 0 {
                        continue;
                    }

                    let confidence = pattern.support as f64 / support as f64;
                    if confidence >= self.min_confidence {
                        rules.push(AssociationRule {
                            context: context.clone(),
                            consequent: pattern.items.difference(&antecedent),
                            antecedent,
                            support: pattern.support,
                            confidence,
                        });
                    }
                }
            }
        }

        debug!(rules = rules.len(), min_confidence = self.min_confidence, "Rules generated");
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apriori::AprioriMiner;
    use crate::pipeline::FrequentItemsetMiner;
    use crate::types::Transaction;

    fn tx(labels: &[&str], location: &str, time: &str) -> Transaction {
        Transaction::parse(labels.iter().copied(), location, time).unwrap()
    }

    fn set(labels: &[&str]) -> Itemset {
        Itemset::parse(labels.iter().copied()).unwrap()
    }

    fn rules_for(transactions: &[Transaction], min_confidence: f64) -> Vec<AssociationRule> {
        let index = ContextIndex::build(transactions);
        let buckets = index.bucket(transactions).unwrap();
        let mined = AprioriMiner::new(2).mine(transactions).unwrap();
        RuleGenerator::new(min_confidence)
            .generate(&mined, &index, &buckets)
            .unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(&["A1", "B2"], "Loc1", "Jan"),
            tx(&["A1", "B2"], "Loc1", "Jan"),
            tx(&["A1", "C3"], "Loc1", "Jan"),
            tx(&["A1"], "Loc1", "Jan"),
        ]
    }

    #[test]
    fn test_confidence_values() {
        let rules = rules_for(&sample(), 0.1);
        let b_to_a = rules
            .iter()
            .find(|r| r.antecedent == set(&["B2"]))
            .unwrap();
        assert_eq!(b_to_a.consequent, set(&["A1"]));
        assert_eq!(b_to_a.support, 2);
        assert!((b_to_a.confidence - 1.0).abs() < f64::EPSILON);

        let a_to_b = rules
            .iter()
            .find(|r| r.antecedent == set(&["A1"]))
            .unwrap();
        assert!((a_to_b.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_filters_rules() {
        let rules = rules_for(&sample(), 0.9);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].antecedent, set(&["B2"]));
        assert_eq!(rules[0].context, Context::concrete("Loc1", "Jan"));
    }

    #[test]
    fn test_no_patterns_no_rules() {
        assert!(rules_for(&[], 0.5).is_empty());
    }
}
