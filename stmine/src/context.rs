//! Spatio-temporal contexts and their compact ids.
//!
//! A context is a `(location, time)` pair where either side may be the
//! wildcard `*`. Concrete contexts partition the transactions; one-star and
//! two-star contexts name the generalized pattern groups.
//!
//! Ids are decimal concatenations of a shape tier and a sequence number:
//! `1<seq>` for concrete contexts, `2<seq>` for one-star contexts and the
//! fixed `31` for the global context. Sequence numbers follow first-seen
//! order so identical input always yields identical ids.

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::item::Itemset;
use crate::types::{MiningError, Result, Transaction};

/// One side of a context: a real value or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// A concrete location or time period
    Value(String),
    /// Any value (`*`)
    Star,
}

impl Slot {
    pub fn value(&self) -> Option<&str> {
        match self {
            Slot::Value(v) => Some(v),
            Slot::Star => None,
        }
    }

    pub fn is_star(&self) -> bool {
        matches!(self, Slot::Star)
    }

    fn accepts(&self, candidate: &str) -> bool {
        match self {
            Slot::Value(v) => v == candidate,
            Slot::Star => true,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Value(v) => write!(f, "{v}"),
            Slot::Star => write!(f, "*"),
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How many wildcards a context carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextShape {
    /// Both sides concrete
    Concrete,
    /// Exactly one wildcard
    OneStar,
    /// Both sides wildcard
    TwoStar,
}

impl ContextShape {
    /// Leading digit of ids for this shape.
    pub fn tier(&self) -> u64 {
        match self {
            ContextShape::Concrete => 1,
            ContextShape::OneStar => 2,
            ContextShape::TwoStar => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextShape::Concrete => "zero-star",
            ContextShape::OneStar => "one-star",
            ContextShape::TwoStar => "two-star",
        }
    }
}

/// A `(location, time)` partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Context {
    pub location: Slot,
    pub time: Slot,
}

impl Context {
    /// A concrete (zero-star) context.
    pub fn concrete(location: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            location: Slot::Value(location.into()),
            time: Slot::Value(time.into()),
        }
    }

    /// `(location, *)`: one location across all times.
    pub fn location_star(location: impl Into<String>) -> Self {
        Self {
            location: Slot::Value(location.into()),
            time: Slot::Star,
        }
    }

    /// `(*, time)`: one time period across all locations.
    pub fn time_star(time: impl Into<String>) -> Self {
        Self {
            location: Slot::Star,
            time: Slot::Value(time.into()),
        }
    }

    /// `(*, *)`: the global context.
    pub fn global() -> Self {
        Self {
            location: Slot::Star,
            time: Slot::Star,
        }
    }

    pub fn shape(&self) -> ContextShape {
        match (self.location.is_star(), self.time.is_star()) {
            (false, false) => ContextShape::Concrete,
            (true, true) => ContextShape::TwoStar,
            _ => ContextShape::OneStar,
        }
    }

    /// Whether an observation at `(location, time)` falls inside this context.
    pub fn matches(&self, location: &str, time: &str) -> bool {
        self.location.accepts(location) && self.time.accepts(time)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.location, self.time)
    }
}

/// Compact, collision-free context identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContextId(u64);

impl ContextId {
    /// Id of the global `(*, *)` context.
    pub const GLOBAL: ContextId = ContextId(31);

    /// Id formed by appending `seq` to the shape's tier digit.
    pub fn new(shape: ContextShape, seq: u64) -> Self {
        if shape == ContextShape::TwoStar {
            return Self::GLOBAL;
        }
        let mut scale = 10u64;
        while scale <= seq {
            scale *= 10;
        }
        ContextId(shape.tier() * scale + seq)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Shape encoded in the leading digit.
    pub fn shape(&self) -> ContextShape {
        let mut lead = self.0;
        while lead >= 10 {
            lead /= 10;
        }
        match lead {
            1 => ContextShape::Concrete,
            2 => ContextShape::OneStar,
            _ => ContextShape::TwoStar,
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context universe of one transaction set: generalization-eligible
/// populations, observed concrete contexts, and the id lookup table.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ContextIndex {
    eligible_locations: IndexSet<String>,
    eligible_times: IndexSet<String>,
    concrete: IndexSet<Context>,
    ids: IndexMap<Context, ContextId>,
    contexts: HashMap<ContextId, Context>,
}

impl ContextIndex {
    /// Index every context observed in (or derivable from) the transactions.
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut times_by_location: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
        let mut locations_by_time: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
        let mut concrete: IndexSet<Context> = IndexSet::new();

        for tx in transactions {
            times_by_location
                .entry(tx.location.as_str())
                .or_default()
                .insert(tx.time.as_str());
            locations_by_time
                .entry(tx.time.as_str())
                .or_default()
                .insert(tx.location.as_str());
            concrete.insert(tx.context());
        }

        // A value seen with a single partner generalizes to itself, so it is
        // left out of the one-star populations.
        let eligible_locations: IndexSet<String> = times_by_location
            .iter()
            .filter(|(_, times)| times.len() > 1)
            .map(|(location, _)| location.to_string())
            .collect();
        let eligible_times: IndexSet<String> = locations_by_time
            .iter()
            .filter(|(_, locations)| locations.len() > 1)
            .map(|(time, _)| time.to_string())
            .collect();

        let mut ids: IndexMap<Context, ContextId> = IndexMap::new();
        for (seq, context) in concrete.iter().enumerate() {
            ids.insert(
                context.clone(),
                ContextId::new(ContextShape::Concrete, seq as u64 + 1),
            );
        }

        // Location and time groups share one sequence so their ids stay distinct.
        let one_star = eligible_locations
            .iter()
            .map(Context::location_star)
            .chain(eligible_times.iter().map(Context::time_star));
        for (seq, context) in one_star.enumerate() {
            ids.insert(context, ContextId::new(ContextShape::OneStar, seq as u64 + 1));
        }
        ids.insert(Context::global(), ContextId::GLOBAL);

        let contexts = ids.iter().map(|(c, id)| (*id, c.clone())).collect();

        debug!(
            concrete = concrete.len(),
            eligible_locations = eligible_locations.len(),
            eligible_times = eligible_times.len(),
            "Context index built"
        );

        Self {
            eligible_locations,
            eligible_times,
            concrete,
            ids,
            contexts,
        }
    }

    pub fn id_of(&self, context: &Context) -> Option<ContextId> {
        self.ids.get(context).copied()
    }

    pub fn context_of(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(&id)
    }

    /// Locations observed with more than one time period.
    pub fn eligible_locations(&self) -> impl Iterator<Item = &str> {
        self.eligible_locations.iter().map(String::as_str)
    }

    /// Time periods observed with more than one location.
    pub fn eligible_times(&self) -> impl Iterator<Item = &str> {
        self.eligible_times.iter().map(String::as_str)
    }

    pub fn is_eligible_location(&self, location: &str) -> bool {
        self.eligible_locations.contains(location)
    }

    pub fn is_eligible_time(&self, time: &str) -> bool {
        self.eligible_times.contains(time)
    }

    /// Distinct concrete contexts in first-seen order.
    pub fn concrete_contexts(&self) -> impl Iterator<Item = &Context> {
        self.concrete.iter()
    }

    /// Every `(context, id)` pair: concrete, then one-star, then global.
    pub fn ids(&self) -> impl Iterator<Item = (&Context, ContextId)> {
        self.ids.iter().map(|(c, id)| (c, *id))
    }

    /// Partition transaction itemsets by concrete context id.
    pub fn bucket<'a>(&self, transactions: &'a [Transaction]) -> Result<ContextBuckets<'a>> {
        let mut buckets: IndexMap<ContextId, Vec<&'a Itemset>> = IndexMap::new();
        for tx in transactions {
            let context = tx.context();
            let id = self
                .id_of(&context)
                .ok_or_else(|| MiningError::UnknownContext(context.to_string()))?;
            buckets.entry(id).or_default().push(&tx.items);
        }
        Ok(ContextBuckets { buckets })
    }
}

/// Transaction itemsets grouped by concrete context id, first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ContextBuckets<'a> {
    buckets: IndexMap<ContextId, Vec<&'a Itemset>>,
}

impl<'a> ContextBuckets<'a> {
    pub fn get(&self, id: ContextId) -> Option<&[&'a Itemset]> {
        self.buckets.get(&id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContextId, &[&'a Itemset])> {
        self.buckets.iter().map(|(id, b)| (*id, b.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
