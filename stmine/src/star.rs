//! Star generalization of concrete-context patterns.
//!
//! Concrete results are merged into one group per eligible location
//! `(location, *)`, one per eligible time `(*, time)`, and one global group
//! `(*, *)`. Inside every generalized group, patterns with the same itemset
//! are collapsed into one record whose support is the sum over the merged
//! contexts.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::context::{Context, ContextIndex};
use crate::item::Itemset;
use crate::types::{MinedPatterns, Pattern};

/// The three generalization layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StarPatterns {
    /// Per concrete context, untouched
    pub zero_star: MinedPatterns,
    /// Per eligible location, then per eligible time, re-aggregated
    pub one_star: MinedPatterns,
    /// The global group, re-aggregated
    pub two_star: MinedPatterns,
}

impl StarPatterns {
    /// Whether no layer holds any pattern.
    pub fn is_empty(&self) -> bool {
        self.zero_star.is_empty() && self.one_star.is_empty() && self.two_star.is_empty()
    }
}

/// Builds [`StarPatterns`] from concrete mining output.
pub struct StarGeneralizer<'a> {
    index: &'a ContextIndex,
}

impl<'a> StarGeneralizer<'a> {
    pub fn new(index: &'a ContextIndex) -> Self {
        Self { index }
    }

    /// Generalize concrete-context patterns into the three layers.
    ///
    /// Groups with no contributing pattern are not emitted.
    pub fn generalize(&self, concrete: MinedPatterns) -> StarPatterns {
        let mut one_star = MinedPatterns::new();

        for location in self.index.eligible_locations() {
            let merged = Self::reaggregate(
                concrete
                    .iter()
                    .filter(|(context, _)| context.location.value() == Some(location))
                    .flat_map(|(_, patterns)| patterns),
            );
            one_star.extend(Context::location_star(location), merged);
        }

        for time in self.index.eligible_times() {
            let merged = Self::reaggregate(
                concrete
                    .iter()
                    .filter(|(context, _)| context.time.value() == Some(time))
                    .flat_map(|(_, patterns)| patterns),
            );
            one_star.extend(Context::time_star(time), merged);
        }

        let mut two_star = MinedPatterns::new();
        two_star.extend(
            Context::global(),
            Self::reaggregate(concrete.iter().flat_map(|(_, patterns)| patterns)),
        );

        debug!(
            zero_star = concrete.len(),
            one_star = one_star.len(),
            two_star = two_star.pattern_count(),
            "Star layers built"
        );

        StarPatterns {
            zero_star: concrete,
            one_star,
            two_star,
        }
    }

    /// Sum supports of equal itemsets, keeping first-seen order.
    pub fn reaggregate<'p>(patterns: impl IntoIterator<Item = &'p Pattern>) -> Vec<Pattern> {
        let mut totals: IndexMap<&Itemset, u64> = IndexMap::new();
        for pattern in patterns {
            *totals.entry(&pattern.items).or_insert(0) += pattern.support;
        }
        totals
            .into_iter()
            .map(|(items, support)| Pattern::new(items.clone(), support))
            .collect()
    }
}
