//! Property-based tests for the miners and the star generalizer.
//!
//! Random transaction sets over a small item pool and a 3x3 context grid
//! keep every context populated enough to produce patterns of size three
//! and up.

use proptest::prelude::*;
use stmine::support::support_in_context;
use stmine::{
    Algorithm, Context, ContextIndex, FrequentItemsetMiner, Itemset, MiningConfig, MiningPipeline,
    StarGeneralizer, Transaction,
};

const ITEMS: [&str; 5] = ["A1", "B2", "C3", "D1", "E2"];
const LOCATIONS: [&str; 3] = ["Delhi", "Pune", "Agra"];
const TIMES: [&str; 3] = ["January", "February", "March"];

fn transaction() -> impl Strategy<Value = Transaction> {
    (
        prop::sample::subsequence(ITEMS.to_vec(), 0..=ITEMS.len()),
        0..LOCATIONS.len(),
        0..TIMES.len(),
    )
        .prop_map(|(labels, location, time)| {
            Transaction::parse(labels, LOCATIONS[location], TIMES[time]).unwrap()
        })
}

fn transactions() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(transaction(), 0..40)
}

fn mine(algorithm: Algorithm, transactions: &[Transaction], min_support: u64) -> stmine::MinedPatterns {
    stmine::miner_for(&MiningConfig::new(min_support).with_algorithm(algorithm))
        .mine(transactions)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// All algorithms return the same triples.
    #[test]
    fn miners_agree(txs in transactions(), min_support in 1u64..4) {
        let apriori = mine(Algorithm::Apriori, &txs, min_support).triples();
        let hashed = mine(Algorithm::HashedApriori, &txs, min_support).triples();
        let fp = mine(Algorithm::FpGrowth, &txs, min_support).triples();
        prop_assert_eq!(&apriori, &hashed);
        prop_assert_eq!(&apriori, &fp);
    }

    /// Reported supports match a direct count and meet the threshold.
    #[test]
    fn supports_are_exact(txs in transactions(), min_support in 1u64..4) {
        for triple in mine(Algorithm::FpGrowth, &txs, min_support).triples() {
            prop_assert!(triple.support >= min_support);
            prop_assert!(triple.items.len() >= 2);
            prop_assert_eq!(
                triple.support,
                support_in_context(&triple.items, &txs, &triple.context)
            );
        }
    }

    /// Every subset (size two or more) of a frequent itemset is frequent in
    /// the same context, with at least the same support.
    #[test]
    fn downward_closure(txs in transactions(), min_support in 1u64..4) {
        let mined = mine(Algorithm::Apriori, &txs, min_support);
        for (context, patterns) in mined.iter() {
            for pattern in patterns {
                for subset in pattern.items.proper_subsets().into_iter().filter(|s| s.len() >= 2) {
                    let support = mined.support_of(context, &subset);
                    prop_assert!(support.is_some(), "{} missing from {}", subset, context);
                    prop_assert!(support.unwrap_or(0) >= pattern.support);
                }
            }
        }
    }

    /// Generalized layers conserve the total support of what they merge.
    #[test]
    fn reaggregation_conserves_support(txs in transactions(), min_support in 1u64..4) {
        let index = ContextIndex::build(&txs);
        let stars = StarGeneralizer::new(&index).generalize(mine(Algorithm::FpGrowth, &txs, min_support));

        let total = |patterns: &[stmine::Pattern]| patterns.iter().map(|p| p.support).sum::<u64>();
        let concrete_total: u64 = stars.zero_star.iter().map(|(_, p)| total(p)).sum();
        let global_total = stars.two_star.get(&Context::global()).map(total).unwrap_or(0);
        prop_assert_eq!(concrete_total, global_total);

        for location in index.eligible_locations() {
            let expected: u64 = stars
                .zero_star
                .iter()
                .filter(|(c, _)| c.location.value() == Some(location))
                .map(|(_, p)| total(p))
                .sum();
            let merged = stars
                .one_star
                .get(&Context::location_star(location))
                .map(total)
                .unwrap_or(0);
            prop_assert_eq!(expected, merged);
        }

        for time in index.eligible_times() {
            let expected: u64 = stars
                .zero_star
                .iter()
                .filter(|(c, _)| c.time.value() == Some(time))
                .map(|(_, p)| total(p))
                .sum();
            let merged = stars
                .one_star
                .get(&Context::time_star(time))
                .map(total)
                .unwrap_or(0);
            prop_assert_eq!(expected, merged);
        }
    }

    /// Adding an item never raises support within a context.
    #[test]
    fn support_is_monotonic(
        txs in transactions(),
        labels in prop::sample::subsequence(ITEMS.to_vec(), 0..=ITEMS.len()),
        extra in prop::sample::select(ITEMS.to_vec()),
        location in prop::sample::select(LOCATIONS.to_vec()),
        time in prop::sample::select(TIMES.to_vec()),
    ) {
        let context = Context::concrete(location, time);
        let base = Itemset::parse(labels).unwrap();
        let extended = base.with_item(extra.parse().unwrap());

        let base_support = support_in_context(&base, &txs, &context);
        let extended_support = support_in_context(&extended, &txs, &context);
        prop_assert!(
            extended_support <= base_support,
            "{} has support {} but {} has {}",
            extended, extended_support, base, base_support
        );
    }

    /// Canonical ordering ignores input order and is stable.
    #[test]
    fn canonicalization_is_idempotent(labels in prop::sample::subsequence(ITEMS.to_vec(), 0..=ITEMS.len())) {
        let forward = Itemset::parse(labels.iter().copied()).unwrap();
        let reversed = Itemset::parse(labels.iter().rev().copied()).unwrap();
        prop_assert_eq!(&forward, &reversed);
        prop_assert_eq!(&forward, &forward.iter().cloned().collect::<Itemset>());
    }

    /// Every item label parses back to the item that wrote it.
    #[test]
    fn item_labels_roundtrip(category in "[a-z][a-z0-9:]{0,5}", band in 0u32..500) {
        let item = stmine::Item::new(category, band);
        prop_assert_eq!(item.label().parse::<stmine::Item>().unwrap(), item);
    }
}

#[test]
fn test_pipeline_scenario_from_readings() {
    let txs = vec![
        Transaction::parse(["A1", "B2"], "Loc1", "Jan").unwrap(),
        Transaction::parse(["A1", "B2"], "Loc1", "Jan").unwrap(),
        Transaction::parse(["A1", "B2"], "Loc1", "Feb").unwrap(),
    ];
    let ab = Itemset::parse(["A1", "B2"]).unwrap();

    for algorithm in Algorithm::ALL {
        let report = MiningPipeline::new(MiningConfig::new(2).with_algorithm(algorithm))
            .unwrap()
            .run(&txs)
            .unwrap();
        let stars = &report.patterns;
        assert_eq!(
            stars.zero_star.triples().len(),
            1,
            "{algorithm}: only (Loc1, Jan) reaches the threshold"
        );
        assert_eq!(stars.one_star.support_of(&Context::location_star("Loc1"), &ab), Some(2));
        assert_eq!(stars.two_star.support_of(&Context::global(), &ab), Some(2));
    }
}

#[test]
fn test_context_ids_are_unique() {
    let txs: Vec<Transaction> = LOCATIONS
        .iter()
        .flat_map(|l| TIMES.iter().map(move |t| Transaction::parse(["A1", "B2"], *l, *t).unwrap()))
        .collect();
    let index = ContextIndex::build(&txs);
    let mut ids: Vec<u64> = index.ids().map(|(_, id)| id.value()).collect();
    let count = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), count);
    // 9 concrete, 3 + 3 one-star, 1 global
    assert_eq!(count, 16);
}
