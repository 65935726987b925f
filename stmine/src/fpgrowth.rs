//! FP-Growth mining over an arena-backed prefix tree.
//!
//! Nodes live in a `Vec` and refer to each other by index: every node keeps
//! its parent, its children and the next node carrying the same item. The
//! header table holds, per frequent item, its support and the head and tail
//! of that same-item chain, in rank order (descending support, ties in
//! first-seen order). The same rank orders every inserted path, so all
//! occurrences of an item sit below the items ranked before it.
//!
//! Mining walks items in ascending support order, collects each item's
//! prefix paths weighted by node count, builds the conditional tree and
//! recurses with the item appended to the suffix. A tree that is a single
//! path yields every subset of the path directly.

use indexmap::IndexMap;
use tracing::debug;

use crate::context::Context;
use crate::item::{Item, Itemset};
use crate::pipeline::FrequentItemsetMiner;
use crate::types::{MinedPatterns, MiningError, Pattern, Result, Transaction};

const ROOT: usize = 0;

// Single paths longer than this are mined recursively instead of by subset
// enumeration, which uses a u64 mask.
const MAX_SINGLE_PATH: usize = 63;

#[derive(Debug, Clone)]
struct FpNode {
    /// `None` only for the root sentinel
    item: Option<Item>,
    count: u64,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Next node in this item's chain
    next: Option<usize>,
}

#[derive(Debug, Clone)]
struct HeaderEntry {
    support: u64,
    head: Option<usize>,
    tail: Option<usize>,
}

/// Prefix-sharing tree of one context partition (or one conditional base).
#[derive(Debug, Clone)]
pub struct FpTree {
    nodes: Vec<FpNode>,
    headers: IndexMap<Item, HeaderEntry>,
}

impl FpTree {
    /// Build a tree from weighted paths, keeping only items whose weighted
    /// frequency reaches `min_support`.
    pub fn build<P: AsRef<[Item]>>(paths: &[(P, u64)], min_support: u64) -> Self {
        let mut frequency: IndexMap<&Item, u64> = IndexMap::new();
        for (path, weight) in paths {
            for item in path.as_ref() {
                *frequency.entry(item).or_insert(0) += weight;
            }
        }

        let mut ranked: Vec<(&Item, u64)> = frequency
            .into_iter()
            .filter(|(_, count)| *count >= min_support)
            .collect();
        // Stable: equal supports keep first-seen order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let headers = ranked
            .into_iter()
            .map(|(item, support)| {
                (
                    item.clone(),
                    HeaderEntry {
                        support,
                        head: None,
                        tail: None,
                    },
                )
            })
            .collect();

        let mut tree = Self {
            nodes: vec![FpNode {
                item: None,
                count: 0,
                parent: None,
                children: Vec::new(),
                next: None,
            }],
            headers,
        };

        for (path, weight) in paths {
            let mut ranked_path: Vec<(usize, &Item)> = path
                .as_ref()
                .iter()
                .filter_map(|item| tree.headers.get_index_of(item).map(|rank| (rank, item)))
                .collect();
            ranked_path.sort_by_key(|(rank, _)| *rank);
            tree.insert(ranked_path.into_iter().map(|(_, item)| item), *weight);
        }
        tree
    }

    /// Build the tree of one context partition.
    pub fn from_itemsets(itemsets: &[&Itemset], min_support: u64) -> Self {
        let paths: Vec<(&[Item], u64)> = itemsets.iter().map(|set| (set.items(), 1)).collect();
        Self::build(&paths, min_support)
    }

    fn insert<'i>(&mut self, items: impl Iterator<Item = &'i Item>, weight: u64) {
        let mut current = ROOT;
        for item in items {
            let existing = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].item.as_ref() == Some(item));

            current = match existing {
                Some(child) => {
                    self.nodes[child].count += weight;
                    child
                }
                None => self.add_child(current, item.clone(), weight),
            };
        }
    }

    fn add_child(&mut self, parent: usize, item: Item, weight: u64) -> usize {
        let index = self.nodes.len();
        self.nodes.push(FpNode {
            item: Some(item.clone()),
            count: weight,
            parent: Some(parent),
            children: Vec::new(),
            next: None,
        });
        self.nodes[parent].children.push(index);

        if let Some(header) = self.headers.get_mut(&item) {
            match header.tail {
                Some(tail) => self.nodes[tail].next = Some(index),
                None => header.head = Some(index),
            }
            header.tail = Some(index);
        }
        index
    }

    /// Whether the tree holds no frequent item.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of item nodes, excluding the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Frequent items in rank order with their supports.
    pub fn frequent_items(&self) -> impl Iterator<Item = (&Item, u64)> {
        self.headers.iter().map(|(item, h)| (item, h.support))
    }

    /// Whether every node has at most one child.
    pub fn is_single_path(&self) -> bool {
        self.nodes.iter().all(|node| node.children.len() <= 1)
    }

    /// Nodes of one item, following its chain from the header.
    fn chain(&self, item: &Item) -> Vec<usize> {
        let mut nodes = Vec::new();
        let mut cursor = self.headers.get(item).and_then(|h| h.head);
        while let Some(index) = cursor {
            nodes.push(index);
            cursor = self.nodes[index].next;
        }
        nodes
    }

    /// Sum of the counts along an item's chain.
    pub fn chain_count(&self, item: &Item) -> u64 {
        self.chain(item).iter().map(|&i| self.nodes[i].count).sum()
    }

    /// `(item, count)` from the top of the single path down.
    fn single_path(&self) -> Option<Vec<(Item, u64)>> {
        if !self.is_single_path() {
            return None;
        }
        let mut path = Vec::new();
        let mut cursor = self.nodes[ROOT].children.first().copied();
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            path.push((node.item.clone()?, node.count));
            cursor = node.children.first().copied();
        }
        (path.len() <= MAX_SINGLE_PATH).then_some(path)
    }

    /// Ancestors of every node of `item`, each weighted by that node's count.
    fn conditional_base(&self, item: &Item) -> Vec<(Vec<Item>, u64)> {
        self.chain(item)
            .into_iter()
            .filter_map(|index| {
                let mut prefix = Vec::new();
                let mut cursor = self.nodes[index].parent;
                while let Some(parent) = cursor {
                    if let Some(item) = &self.nodes[parent].item {
                        prefix.push(item.clone());
                    }
                    cursor = self.nodes[parent].parent;
                }
                if prefix.is_empty() {
                    return None;
                }
                prefix.reverse();
                Some((prefix, self.nodes[index].count))
            })
            .collect()
    }

    /// Every frequent itemset in the tree, singletons included.
    pub fn mine(&self, min_support: u64, max_depth: usize) -> Result<IndexMap<Itemset, u64>> {
        let mut patterns = IndexMap::new();
        self.mine_into(&Itemset::default(), min_support, 0, max_depth, &mut patterns)?;
        Ok(patterns)
    }

    fn mine_into(
        &self,
        suffix: &Itemset,
        min_support: u64,
        depth: usize,
        max_depth: usize,
        patterns: &mut IndexMap<Itemset, u64>,
    ) -> Result<()> {
        if depth > max_depth {
            return Err(MiningError::RecursionLimit { limit: max_depth });
        }
        if self.is_empty() {
            return Ok(());
        }

        if let Some(path) = self.single_path() {
            // Counts only shrink going down, so a subset's support is the
            // count of its deepest member.
            let full: u64 = (1u64 << path.len()) - 1;
            for mask in 1..=full {
                let mut pattern = suffix.clone();
                let mut support = u64::MAX;
                for (bit, (item, count)) in path.iter().enumerate() {
                    if mask & (1u64 << bit) != 0 {
                        pattern = pattern.with_item(item.clone());
                        support = support.min(*count);
                    }
                }
                *patterns.entry(pattern).or_insert(0) += support;
            }
            return Ok(());
        }

        for (item, header) in self.headers.iter().rev() {
            let pattern = suffix.with_item(item.clone());
            *patterns.entry(pattern.clone()).or_insert(0) += header.support;

            let conditional = FpTree::build(&self.conditional_base(item), min_support);
            if !conditional.is_empty() {
                conditional.mine_into(&pattern, min_support, depth + 1, max_depth, patterns)?;
            }
        }
        Ok(())
    }
}

/// FP-Growth run once per concrete context.
#[derive(Debug, Clone)]
pub struct FpGrowthMiner {
    min_support: u64,
    max_depth: usize,
}

impl FpGrowthMiner {
    pub fn new(min_support: u64) -> Self {
        Self {
            min_support,
            max_depth: 256,
        }
    }

    /// Set the conditional-tree recursion guard.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl FrequentItemsetMiner for FpGrowthMiner {
    fn name(&self) -> &str {
        "fp-growth"
    }

    fn mine(&self, transactions: &[Transaction]) -> Result<MinedPatterns> {
        let mut partitions: IndexMap<Context, Vec<&Itemset>> = IndexMap::new();
        for tx in transactions {
            partitions.entry(tx.context()).or_default().push(&tx.items);
        }

        let mut result = MinedPatterns::new();
        for (context, itemsets) in partitions {
            let tree = FpTree::from_itemsets(&itemsets, self.min_support);
            let patterns: Vec<Pattern> = tree
                .mine(self.min_support, self.max_depth)?
                .into_iter()
                .filter(|(items, _)| items.len() >= 2)
                .map(|(items, support)| Pattern::new(items, support))
                .collect();
            debug!(
                context = %context,
                nodes = tree.node_count(),
                patterns = patterns.len(),
                "Partition mined"
            );
            result.extend(context, patterns);
        }

        result.sort_patterns();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::support_in_bucket;

    fn set(labels: &[&str]) -> Itemset {
        Itemset::parse(labels.iter().copied()).unwrap()
    }

    fn item(label: &str) -> Item {
        Item::parse(label).unwrap()
    }

    /// Every itemset reaching `min_support`, by exhaustive counting.
    fn brute_force(itemsets: &[&Itemset], min_support: u64) -> IndexMap<Itemset, u64> {
        let universe = Itemset::new(itemsets.iter().flat_map(|s| s.iter().cloned()));
        let n = universe.len();
        let mut expected = IndexMap::new();
        for mask in 1u64..(1 << n) {
            let candidate: Itemset = universe
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, item)| item.clone())
                .collect();
            let support = support_in_bucket(&candidate, itemsets);
            if support >= min_support {
                expected.insert(candidate, support);
            }
        }
        expected
    }

    fn triples_twice() -> Vec<Itemset> {
        let full = set(&["A1", "B2", "C3", "D4"]);
        let mut out = Vec::new();
        for skip in full.iter() {
            let triple: Itemset = full.iter().filter(|i| *i != skip).cloned().collect();
            out.push(triple.clone());
            out.push(triple);
        }
        out
    }

    #[test]
    fn test_shared_prefixes() {
        let a = set(&["A1", "B2", "C3"]);
        let b = set(&["A1", "B2"]);
        let c = set(&["A1", "D4"]);
        let tree = FpTree::from_itemsets(&[&a, &b, &c], 1);
        // A1 -> B2 -> C3 and A1 -> D4
        assert_eq!(tree.node_count(), 4);
        assert!(!tree.is_single_path());
        assert_eq!(tree.chain_count(&item("A1")), 3);
        let first: Vec<(&Item, u64)> = tree.frequent_items().take(1).collect();
        assert_eq!(first, vec![(&item("A1"), 3)]);
    }

    #[test]
    fn test_infrequent_items_dropped() {
        let a = set(&["A1", "B2"]);
        let b = set(&["A1", "C3"]);
        let tree = FpTree::from_itemsets(&[&a, &b], 2);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.is_single_path());
        assert_eq!(tree.chain_count(&item("B2")), 0);
    }

    #[test]
    fn test_chain_counts_match_support() {
        let owned = triples_twice();
        let itemsets: Vec<&Itemset> = owned.iter().collect();
        let tree = FpTree::from_itemsets(&itemsets, 1);
        for (item, support) in tree.frequent_items() {
            assert_eq!(tree.chain_count(item), support);
        }
    }

    #[test]
    fn test_single_path_enumeration() {
        let a = set(&["A1", "B2", "C3"]);
        let b = set(&["A1", "B2"]);
        let tree = FpTree::from_itemsets(&[&a, &b], 1);
        assert!(tree.is_single_path());
        let patterns = tree.mine(1, 8).unwrap();
        assert_eq!(patterns.len(), 7);
        assert_eq!(patterns.get(&set(&["A1", "B2"])), Some(&2));
        assert_eq!(patterns.get(&set(&["A1", "C3"])), Some(&1));
    }

    #[test]
    fn test_matches_brute_force() {
        let owned = triples_twice();
        let itemsets: Vec<&Itemset> = owned.iter().collect();
        for min_support in 1..=5 {
            let tree = FpTree::from_itemsets(&itemsets, min_support);
            let mut mined: Vec<(Itemset, u64)> =
                tree.mine(min_support, 16).unwrap().into_iter().collect();
            let mut expected: Vec<(Itemset, u64)> =
                brute_force(&itemsets, min_support).into_iter().collect();
            mined.sort();
            expected.sort();
            assert_eq!(mined, expected, "min_support = {min_support}");
        }
    }

    #[test]
    fn test_recursion_guard() {
        let owned = triples_twice();
        let itemsets: Vec<&Itemset> = owned.iter().collect();
        let tree = FpTree::from_itemsets(&itemsets, 1);
        assert!(matches!(
            tree.mine(1, 1),
            Err(MiningError::RecursionLimit { limit: 1 })
        ));
        assert!(tree.mine(1, 2).is_ok());
    }

    #[test]
    fn test_miner_per_context() {
        let transactions = vec![
            Transaction::parse(["A1", "B2"], "Loc1", "Jan").unwrap(),
            Transaction::parse(["A1", "B2"], "Loc1", "Jan").unwrap(),
            Transaction::parse(["A1", "B2"], "Loc1", "Feb").unwrap(),
        ];
        let result = FpGrowthMiner::new(2).mine(&transactions).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.support_of(&Context::concrete("Loc1", "Jan"), &set(&["A1", "B2"])),
            Some(2)
        );
        // Singletons are mined but not reported.
        assert!(result.triples().iter().all(|t| t.items.len() >= 2));
    }
}
