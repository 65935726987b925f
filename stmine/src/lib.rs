//! Spatio-Temporal Frequent Pattern Mining
//!
//! Discovers frequent co-occurrence patterns of discretized categories in
//! transactions tagged with a location and a time period, then generalizes
//! them across space and time:
//!
//! - **Context indexing**: concrete `(location, time)` partitions, one-star
//!   and two-star generalizations, and their compact ids
//! - **Support counting**: superset counts within one partition
//! - **Apriori**: level-wise join/verify, plain and hash-bucketed
//! - **FP-Growth**: arena-backed prefix tree with conditional mining
//! - **Star generalization**: re-aggregated location-only, time-only and
//!   global pattern layers
//! - **Association rules**: confidence-filtered rules per concrete context
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MiningPipeline                         │
//! │                                                             │
//! │  ┌──────────────┐   ┌───────────────────┐   ┌────────────┐  │
//! │  │ ContextIndex │──▶│ FrequentItemset-  │──▶│    Star    │  │
//! │  │  (ids, stars)│   │ Miner (Apriori /  │   │ Generalizer│  │
//! │  └──────────────┘   │ Hashed / FPGrowth)│   └────────────┘  │
//! │                     └─────────┬─────────┘          │        │
//! │                        ┌──────▼──────┐      ┌──────▼─────┐  │
//! │                        │   support   │      │   rules    │  │
//! │                        └─────────────┘      └────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use stmine::{MiningConfig, MiningPipeline, Algorithm};
//!
//! let config = MiningConfig::new(2).with_algorithm(Algorithm::FpGrowth);
//! let report = MiningPipeline::new(config)?.run(&transactions)?;
//! for (context, patterns) in report.patterns.one_star.iter() {
//!     println!("{context}: {} patterns", patterns.len());
//! }
//! ```

pub mod apriori;
pub mod config;
pub mod context;
pub mod fpgrowth;
pub mod item;
pub mod pipeline;
pub mod rules;
pub mod star;
pub mod support;
pub mod types;

// Re-export main types
pub use apriori::{AprioriMiner, HashedAprioriMiner};
pub use config::{Algorithm, MiningConfig};
pub use context::{Context, ContextBuckets, ContextId, ContextIndex, ContextShape, Slot};
pub use fpgrowth::{FpGrowthMiner, FpTree};
pub use item::{Item, Itemset};
pub use pipeline::{miner_for, FrequentItemsetMiner, MiningPipeline, MiningReport};
pub use rules::{AssociationRule, RuleGenerator};
pub use star::{StarGeneralizer, StarPatterns};
pub use types::*;
