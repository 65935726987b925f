//! Items and canonical itemsets.
//!
//! An item is a discretized category token such as `so21` (pollutant `so2`,
//! band 1). Items order by their numeric band first and category second;
//! that order is the canonical one used whenever an itemset is compared,
//! hashed, serialized or deduplicated.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::types::{MiningError, Result};

/// A discretized category token with a canonical total order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    // Field order matters: derived `Ord` compares band first.
    band: u32,
    category: String,
}

impl Item {
    /// Create an item from its category and band.
    pub fn new(category: impl Into<String>, band: u32) -> Self {
        Self {
            band,
            category: category.into(),
        }
    }

    /// Parse a label written by [`Display`](fmt::Display).
    ///
    /// Two forms are accepted:
    ///
    /// - `<category><digit>`: the last character is a single-digit band, so
    ///   `so21` is category `so2`, band 1.
    /// - `<category>:<band>`: explicit form for bands of 10 and up, or for
    ///   categories that contain `:` themselves.
    ///
    /// The category must not be empty or purely numeric. Anything else fails
    /// fast, since the canonical order cannot be derived.
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        let malformed = || MiningError::MalformedItem(label.to_string());

        let (category, band) = match label.rsplit_once(':') {
            Some((category, band)) if is_digits(band) => (category, band),
            _ => {
                let last = label.chars().last().ok_or_else(malformed)?;
                if !last.is_ascii_digit() {
                    return Err(malformed());
                }
                label.split_at(label.len() - 1)
            }
        };

        if category.is_empty() || is_digits(category) {
            return Err(malformed());
        }
        let band = band.parse::<u32>().map_err(|_| malformed())?;

        Ok(Self::new(category, band))
    }

    /// Category part of the label.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Numeric band, the primary canonical-order key.
    pub fn band(&self) -> u32 {
        self.band
    }

    /// Full label as written by `Display`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.band < 10 && !self.category.contains(':') {
            write!(f, "{}{}", self.category, self.band)
        } else {
            write!(f, "{}:{}", self.category, self.band)
        }
    }
}

impl FromStr for Item {
    type Err = MiningError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A set of distinct items held in canonical order.
///
/// Two itemsets built from the same members in any order are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Itemset(Vec<Item>);

impl Itemset {
    /// Build a canonical itemset from items in any order, dropping duplicates.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut items: Vec<Item> = items.into_iter().collect();
        items.sort();
        items.dedup();
        Self(items)
    }

    /// Parse every label with [`Item::parse`].
    pub fn parse<'a>(labels: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let items = labels
            .into_iter()
            .map(Item::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(items))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Items in canonical order.
    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.0.iter()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.0.binary_search(item).is_ok()
    }

    /// Whether every member of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &Itemset) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.0.iter().all(|item| other.contains(item))
    }

    /// Union of two itemsets.
    pub fn union(&self, other: &Itemset) -> Itemset {
        Itemset::new(self.0.iter().chain(other.0.iter()).cloned())
    }

    /// Copy of this itemset with one more member.
    pub fn with_item(&self, item: Item) -> Itemset {
        let mut items = self.0.clone();
        if let Err(pos) = items.binary_search(&item) {
            items.insert(pos, item);
        }
        Itemset(items)
    }

    /// Every 2-item subset, in canonical order.
    pub fn pairs(&self) -> impl Iterator<Item = Itemset> + '_ {
        self.0.iter().enumerate().flat_map(move |(i, a)| {
            self.0[i + 1..]
                .iter()
                .map(move |b| Itemset(vec![a.clone(), b.clone()]))
        })
    }

    /// Every non-empty proper subset.
    ///
    /// Itemsets wider than 63 members yield nothing.
    pub fn proper_subsets(&self) -> Vec<Itemset> {
        let n = self.len();
        if n < 2 || n > 63 {
            return Vec::new();
        }
        let full: u64 = (1 << n) - 1;
        (1..full)
            .map(|mask| {
                Itemset(
                    self.0
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| mask & (1 << i) != 0)
                        .map(|(_, item)| item.clone())
                        .collect(),
                )
            })
            .collect()
    }

    /// Members of `self` that are not in `other`.
    pub fn difference(&self, other: &Itemset) -> Itemset {
        Itemset(
            self.0
                .iter()
                .filter(|item| !other.contains(item))
                .cloned()
                .collect(),
        )
    }
}

impl FromIterator<Item> for Itemset {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a Itemset {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, "}}")
    }
}
