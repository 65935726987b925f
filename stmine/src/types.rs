//! Core types shared by the miners, the generalizer and the pipeline.

use indexmap::IndexMap;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::context::Context;
use crate::item::Itemset;

/// One discretized observation: an itemset tagged with where and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Discretized categories observed together
    pub items: Itemset,
    /// Spatial tag
    pub location: String,
    /// Temporal tag
    pub time: String,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(items: Itemset, location: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            items,
            location: location.into(),
            time: time.into(),
        }
    }

    /// Create a transaction from raw item labels.
    pub fn parse<'a>(
        labels: impl IntoIterator<Item = &'a str>,
        location: impl Into<String>,
        time: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(Itemset::parse(labels)?, location, time))
    }

    /// The concrete context this transaction belongs to.
    pub fn context(&self) -> Context {
        Context::concrete(&self.location, &self.time)
    }

    /// Whether this transaction falls in the given concrete context.
    pub fn is_in(&self, context: &Context) -> bool {
        context.matches(&self.location, &self.time)
    }
}

/// An itemset with its support count inside some context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pattern {
    /// Canonically ordered items
    pub items: Itemset,
    /// Number of supporting transactions
    pub support: u64,
}

impl Pattern {
    pub fn new(items: Itemset, support: u64) -> Self {
        Self { items, support }
    }
}

/// The flattened `(context, items, support)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FrequentItemset {
    /// Context the support was counted in
    pub context: Context,
    /// Canonically ordered items
    pub items: Itemset,
    /// Number of supporting transactions
    pub support: u64,
}

/// Patterns grouped by context, in first-seen context order.
///
/// Contexts without any pattern are never stored, so an empty result is an
/// empty mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinedPatterns {
    by_context: IndexMap<Context, Vec<Pattern>>,
}

impl MinedPatterns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pattern under a context.
    pub fn push(&mut self, context: Context, pattern: Pattern) {
        self.by_context.entry(context).or_default().push(pattern);
    }

    /// Append patterns under a context. Nothing is stored for an empty list.
    pub fn extend(&mut self, context: Context, patterns: Vec<Pattern>) {
        if patterns.is_empty() {
            return;
        }
        self.by_context.entry(context).or_default().extend(patterns);
    }

    pub fn get(&self, context: &Context) -> Option<&[Pattern]> {
        self.by_context.get(context).map(Vec::as_slice)
    }

    /// Support of an itemset in a context, if it was found frequent there.
    pub fn support_of(&self, context: &Context, items: &Itemset) -> Option<u64> {
        self.get(context)?
            .iter()
            .find(|p| &p.items == items)
            .map(|p| p.support)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Context, &[Pattern])> {
        self.by_context.iter().map(|(c, p)| (c, p.as_slice()))
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.by_context.keys()
    }

    /// Number of contexts with at least one pattern.
    pub fn len(&self) -> usize {
        self.by_context.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_context.is_empty()
    }

    /// Total number of patterns across all contexts.
    pub fn pattern_count(&self) -> usize {
        self.by_context.values().map(Vec::len).sum()
    }

    /// All `(context, items, support)` triples, sorted.
    pub fn triples(&self) -> Vec<FrequentItemset> {
        let mut triples: Vec<FrequentItemset> = self
            .by_context
            .iter()
            .flat_map(|(context, patterns)| {
                patterns.iter().map(move |p| FrequentItemset {
                    context: context.clone(),
                    items: p.items.clone(),
                    support: p.support,
                })
            })
            .collect();
        triples.sort();
        triples
    }

    /// Order each context's patterns by size, then canonically.
    pub fn sort_patterns(&mut self) {
        for patterns in self.by_context.values_mut() {
            patterns.sort_by(|a, b| {
                a.items
                    .len()
                    .cmp(&b.items.len())
                    .then_with(|| a.items.cmp(&b.items))
            });
        }
    }
}

impl Serialize for MinedPatterns {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            context: &'a Context,
            patterns: &'a [Pattern],
        }

        let mut seq = serializer.serialize_seq(Some(self.by_context.len()))?;
        for (context, patterns) in &self.by_context {
            seq.serialize_element(&Entry { context, patterns })?;
        }
        seq.end()
    }
}

/// Error types for mining.
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
    /// Item label without a derivable canonical-order key
    #[error("Malformed item label: {0:?}")]
    MalformedItem(String),

    /// Invalid mining parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Context that was never indexed
    #[error("Unknown context: {0}")]
    UnknownContext(String),

    /// Conditional tree recursion went deeper than allowed
    #[error("Recursion limit of {limit} exceeded while mining conditional trees")]
    RecursionLimit { limit: usize },

    /// Config (de)serialization failure
    #[error("Config format error: {0}")]
    ConfigFormat(String),
}

pub type Result<T> = std::result::Result<T, MiningError>;
