//! Statistical check of the presentation-order shuffle
//!
//! 6000 draws of three items: every item should lead about a third of the
//! time and every one of the six orders about a sixth. Bounds sit more than
//! six standard deviations out, so a fair shuffle does not flake.

use bitquiz_core::track_set::shuffle;
use bitquiz_core::Quality;
use std::collections::HashMap;

const RUNS: usize = 6000;

#[test]
fn test_each_quality_leads_uniformly() {
    let mut rng = rand::thread_rng();
    let mut leads: HashMap<Quality, usize> = HashMap::new();

    for _ in 0..RUNS {
        let order = shuffle(Quality::ALL.to_vec(), &mut rng);
        *leads.entry(order[0]).or_default() += 1;
    }

    for quality in Quality::ALL {
        let count = leads.get(&quality).copied().unwrap_or(0);
        assert!(
            (1600..=2400).contains(&count),
            "{} led {} of {} runs",
            quality,
            count,
            RUNS
        );
    }
}

#[test]
fn test_all_orders_appear_uniformly() {
    let mut rng = rand::thread_rng();
    let mut orders: HashMap<Vec<Quality>, usize> = HashMap::new();

    for _ in 0..RUNS {
        *orders
            .entry(shuffle(Quality::ALL.to_vec(), &mut rng))
            .or_default() += 1;
    }

    assert_eq!(orders.len(), 6);
    for (order, count) in &orders {
        assert!(
            (800..=1200).contains(count),
            "order {:?} seen {} times",
            order,
            count
        );
    }
}

#[test]
fn test_identity_order_is_possible() {
    let mut rng = rand::thread_rng();
    let identity = Quality::ALL.to_vec();
    let seen = (0..RUNS).any(|_| shuffle(Quality::ALL.to_vec(), &mut rng) == identity);
    assert!(seen);
}
