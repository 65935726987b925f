//! Support counting.
//!
//! Support is the number of transactions inside a context whose itemset is a
//! superset of the candidate. Counting over the whole transaction set costs a
//! context match per transaction; counting over a pre-built bucket only
//! touches that context's transactions.

use crate::context::Context;
use crate::item::Itemset;
use crate::types::Transaction;

/// Count transactions in `context` that contain every item of `items`.
pub fn support_in_context(items: &Itemset, transactions: &[Transaction], context: &Context) -> u64 {
    transactions
        .iter()
        .filter(|tx| tx.is_in(context) && items.is_subset_of(&tx.items))
        .count() as u64
}

/// Count itemsets in a single-context bucket that contain every item of `items`.
pub fn support_in_bucket(items: &Itemset, bucket: &[&Itemset]) -> u64 {
    bucket
        .iter()
        .filter(|itemset| items.is_subset_of(itemset))
        .count() as u64
}
