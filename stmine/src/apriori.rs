//! Level-wise Apriori mining.
//!
//! Both miners start from frequent 2-itemsets and grow them one item per
//! round: every pair of same-context survivors whose union has exactly
//! `k + 1` items becomes a candidate, and candidates are kept when their
//! recounted support meets the threshold. Mining stops at the first round
//! that keeps nothing.
//!
//! [`AprioriMiner`] counts against the full transaction set, filtering by
//! context on every call. [`HashedAprioriMiner`] partitions the transactions
//! by context id first and runs the same rounds inside each bucket. Both
//! return identical triples.
//!
//! Candidates are not pruned by checking their k-subsets before counting.
//! Recounting covers it and keeps the output independent of pruning order.

use indexmap::IndexSet;
use std::collections::HashSet;
use tracing::debug;

use crate::context::{Context, ContextIndex};
use crate::item::Itemset;
use crate::pipeline::FrequentItemsetMiner;
use crate::support::{support_in_bucket, support_in_context};
use crate::types::{MinedPatterns, MiningError, Pattern, Result, Transaction};

/// A surviving itemset with the context it was counted in.
#[derive(Debug, Clone)]
struct Candidate {
    context: Context,
    items: Itemset,
    support: u64,
}

/// Apriori over the whole transaction set.
#[derive(Debug, Clone)]
pub struct AprioriMiner {
    min_support: u64,
}

impl AprioriMiner {
    pub fn new(min_support: u64) -> Self {
        Self { min_support }
    }

    /// Frequent 2-itemsets of every context, deduplicated by `(context, items)`.
    fn seed(&self, transactions: &[Transaction]) -> Vec<Candidate> {
        let mut evaluated: HashSet<(Context, Itemset)> = HashSet::new();
        let mut seeds = Vec::new();

        for tx in transactions {
            let context = tx.context();
            for pair in tx.items.pairs() {
                if !evaluated.insert((context.clone(), pair.clone())) {
                    continue;
                }
                let support = support_in_context(&pair, transactions, &context);
                if support >= self.min_support {
                    seeds.push(Candidate {
                        context: context.clone(),
                        items: pair,
                        support,
                    });
                }
            }
        }
        seeds
    }

    /// Join same-context survivors into `target`-sized candidates and verify them.
    fn join(&self, level: &[Candidate], target: usize, transactions: &[Transaction]) -> Vec<Candidate> {
        let mut evaluated: HashSet<(Context, Itemset)> = HashSet::new();
        let mut next = Vec::new();

        for (i, left) in level.iter().enumerate() {
            for right in &level[i + 1..] {
                if left.context != right.context {
                    continue;
                }
                let union = left.items.union(&right.items);
                if union.len() != target {
                    continue;
                }
                if !evaluated.insert((left.context.clone(), union.clone())) {
                    continue;
                }
                let support = support_in_context(&union, transactions, &left.context);
                if support >= self.min_support {
                    next.push(Candidate {
                        context: left.context.clone(),
                        items: union,
                        support,
                    });
                }
            }
        }
        next
    }
}

impl FrequentItemsetMiner for AprioriMiner {
    fn name(&self) -> &str {
        "apriori"
    }

    fn mine(&self, transactions: &[Transaction]) -> Result<MinedPatterns> {
        let mut result = MinedPatterns::new();
        let mut level = self.seed(transactions);
        let mut size = 2;

        while !level.is_empty() {
            debug!(size, survivors = level.len(), "Apriori level kept");
            let next = self.join(&level, size + 1, transactions);
            for candidate in level {
                result.push(
                    candidate.context,
                    Pattern::new(candidate.items, candidate.support),
                );
            }
            level = next;
            size += 1;
        }

        result.sort_patterns();
        Ok(result)
    }
}

/// Apriori run independently inside each context-id bucket.
#[derive(Debug, Clone)]
pub struct HashedAprioriMiner {
    min_support: u64,
}

impl HashedAprioriMiner {
    pub fn new(min_support: u64) -> Self {
        Self { min_support }
    }

    /// Mine with a prebuilt index; every transaction's context must be indexed.
    pub fn mine_indexed(&self, index: &ContextIndex, transactions: &[Transaction]) -> Result<MinedPatterns> {
        let buckets = index.bucket(transactions)?;
        let mut result = MinedPatterns::new();

        for (id, bucket) in buckets.iter() {
            let context = index
                .context_of(id)
                .ok_or_else(|| MiningError::UnknownContext(id.to_string()))?;
            let patterns = self.mine_bucket(bucket);
            debug!(context_id = %id, patterns = patterns.len(), "Bucket mined");
            result.extend(context.clone(), patterns);
        }

        result.sort_patterns();
        Ok(result)
    }

    fn mine_bucket(&self, bucket: &[&Itemset]) -> Vec<Pattern> {
        let mut seen: IndexSet<Itemset> = IndexSet::new();
        let mut level = Vec::new();
        for itemset in bucket {
            for pair in itemset.pairs() {
                if !seen.insert(pair.clone()) {
                    continue;
                }
                let support = support_in_bucket(&pair, bucket);
                if support >= self.min_support {
                    level.push(Pattern::new(pair, support));
                }
            }
        }

        let mut kept = Vec::new();
        let mut target = 3;
        while !level.is_empty() {
            let mut evaluated: HashSet<Itemset> = HashSet::new();
            let mut next = Vec::new();
            for (i, left) in level.iter().enumerate() {
                for right in &level[i + 1..] {
                    let union = left.items.union(&right.items);
                    if union.len() != target || !evaluated.insert(union.clone()) {
                        continue;
                    }
                    let support = support_in_bucket(&union, bucket);
                    if support >= self.min_support {
                        next.push(Pattern::new(union, support));
                    }
                }
            }
            kept.append(&mut level);
            level = next;
            target += 1;
        }
        kept
    }
}

impl FrequentItemsetMiner for HashedAprioriMiner {
    fn name(&self) -> &str {
        "hashed-apriori"
    }

    fn mine(&self, transactions: &[Transaction]) -> Result<MinedPatterns> {
        let index = ContextIndex::build(transactions);
        self.mine_indexed(&index, transactions)
    }

    fn mine_with_index(&self, index: &ContextIndex, transactions: &[Transaction]) -> Result<MinedPatterns> {
        self.mine_indexed(index, transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(labels: &[&str], location: &str, time: &str) -> Transaction {
        Transaction::parse(labels.iter().copied(), location, time).unwrap()
    }

    fn set(labels: &[&str]) -> Itemset {
        Itemset::parse(labels.iter().copied()).unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(&["A1", "B2", "C3"], "Loc1", "Jan"),
            tx(&["A1", "B2", "C3"], "Loc1", "Jan"),
            tx(&["A1", "B2", "D4"], "Loc1", "Jan"),
            tx(&["A1", "B2"], "Loc1", "Feb"),
            tx(&["A1", "B2"], "Loc2", "Feb"),
            tx(&["A1", "B2"], "Loc2", "Feb"),
        ]
    }

    #[test]
    fn test_two_readings_in_january() {
        let transactions = vec![
            tx(&["A1", "B2"], "Loc1", "Jan"),
            tx(&["A1", "B2"], "Loc1", "Jan"),
            tx(&["A1", "B2"], "Loc1", "Feb"),
        ];
        let result = AprioriMiner::new(2).mine(&transactions).unwrap();
        let jan = Context::concrete("Loc1", "Jan");
        assert_eq!(result.support_of(&jan, &set(&["A1", "B2"])), Some(2));
        assert!(result.get(&Context::concrete("Loc1", "Feb")).is_none());
    }

    #[test]
    fn test_grows_to_triples() {
        let result = AprioriMiner::new(2).mine(&sample()).unwrap();
        let jan = Context::concrete("Loc1", "Jan");
        assert_eq!(result.support_of(&jan, &set(&["A1", "B2"])), Some(3));
        assert_eq!(result.support_of(&jan, &set(&["A1", "B2", "C3"])), Some(2));
        assert_eq!(result.support_of(&jan, &set(&["A1", "D4"])), None);
        assert_eq!(result.get(&jan).unwrap().len(), 4);
    }

    #[test]
    fn test_no_cross_context_joins() {
        // {A1,B2} frequent only in Jan, {A1,C3} only in Feb: no {A1,B2,C3}.
        let transactions = vec![
            tx(&["A1", "B2", "C3"], "Loc1", "Jan"),
            tx(&["A1", "B2"], "Loc1", "Jan"),
            tx(&["A1", "B2", "C3"], "Loc1", "Feb"),
            tx(&["A1", "C3"], "Loc1", "Feb"),
        ];
        let result = AprioriMiner::new(2).mine(&transactions).unwrap();
        assert!(result
            .triples()
            .iter()
            .all(|t| t.items.len() == 2));
    }

    #[test]
    fn test_hashed_matches_plain() {
        for min_support in 1..=4 {
            let plain = AprioriMiner::new(min_support).mine(&sample()).unwrap();
            let hashed = HashedAprioriMiner::new(min_support).mine(&sample()).unwrap();
            assert_eq!(plain.triples(), hashed.triples(), "min_support = {min_support}");
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert!(AprioriMiner::new(2).mine(&[]).unwrap().is_empty());
        assert!(HashedAprioriMiner::new(2).mine(&[]).unwrap().is_empty());
        assert!(AprioriMiner::new(100).mine(&sample()).unwrap().is_empty());
        assert!(HashedAprioriMiner::new(100).mine(&sample()).unwrap().is_empty());
    }
}
