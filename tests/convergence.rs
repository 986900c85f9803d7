//! Integration tests verifying LWW-Element-Set convergence scenarios.
//!
//! Whatever order replicas exchange state in, they must end up equal.

use lww_element_set::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Replica<'c> = LWWElementSet<&'static str, &'c ManualClock<u64>>;

#[test]
fn apple_scenario_add_postdates_remove() {
    let clock = ManualClock::new(0u64);
    let mut r1: Replica<'_> = LWWElementSet::new("replica-1", &clock);
    let mut r2: Replica<'_> = LWWElementSet::new("replica-2", &clock);

    clock.set(100);
    r1.add("apple").unwrap();

    clock.set(50);
    r2.add("apple").unwrap();
    clock.set(80);
    r2.remove("apple").unwrap();
    assert!(!r2.contains(&"apple"));

    r1.sync(&mut r2);

    for replica in [&r1, &r2] {
        assert_eq!(replica.adds().get(&"apple"), Some(&100));
        assert_eq!(replica.removes().get(&"apple"), Some(&80));
        assert!(replica.contains(&"apple"));
    }
    assert_eq!(r1, r2);
}

#[test]
fn remove_wins_on_tie_across_replicas() {
    let mut a = LWWElementSet::new("a", ManualClock::new(7u64));
    let mut b = LWWElementSet::new("b", ManualClock::new(7u64));

    a.add("x").unwrap();
    b.remove("x").unwrap();

    a.sync(&mut b);
    assert!(!a.contains(&"x"), "equal timestamps must resolve to removed");
    assert!(!b.contains(&"x"));
}

#[test]
fn hybrid_clock_breaks_cross_replica_ties_by_node() {
    fn fixed_ms() -> lww_element_set::Result<u64> {
        Ok(1_000)
    }

    let clock_1 = HybridClock::with_time_source(1, fixed_ms);
    let clock_2 = HybridClock::with_time_source(2, fixed_ms);

    let mut a = LWWElementSet::new("a", &clock_1);
    let mut b = LWWElementSet::new("b", &clock_2);

    // Same physical and logical time; node 2 stamps higher.
    a.remove("x").unwrap();
    b.add("x").unwrap();

    let add = *b.adds().get(&"x").unwrap();
    let remove = *a.removes().get(&"x").unwrap();
    assert_eq!(add.physical, remove.physical);
    assert_eq!(add.logical, remove.logical);

    a.sync(&mut b);
    assert!(a.contains(&"x"));
    assert!(b.contains(&"x"));
}

#[test]
fn merge_into_unseen_replica() {
    let clock = ManualClock::new(1u64);
    let mut a = LWWElementSet::new("a", &clock);
    a.add("x").unwrap();

    let mut b = LWWElementSet::new("b", &clock);
    assert!(!b.contains(&"x"));

    b.sync(&mut a);
    assert!(b.contains(&"x"));
    assert_eq!(b, a);
}

#[test]
fn three_way_convergence_any_order() {
    let mut a: LWWElementSet<u32, ManualClock<u64>> = LWWElementSet::new("a", ManualClock::new(0));
    let mut b = LWWElementSet::new("b", ManualClock::new(0));
    let mut c = LWWElementSet::new("c", ManualClock::new(0));

    a.add_at(1, 10);
    a.remove_at(2, 12);
    b.add_at(2, 11);
    b.add_at(3, 5);
    c.remove_at(3, 6);
    c.add_at(1, 9);

    let mut order1 = a.clone();
    order1.merge(&b);
    order1.merge(&c);

    let mut order2 = c.clone();
    order2.merge(&a);
    order2.merge(&b);

    let mut order3 = b.clone();
    order3.merge(&c);
    order3.merge(&a);

    assert_eq!(order1, order2);
    assert_eq!(order2, order3);
    assert_eq!(order1.value().copied().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn repeated_sync_is_idempotent() {
    let clock = ManualClock::new(1u64);
    let mut a = LWWElementSet::new("a", &clock);
    let mut b = LWWElementSet::new("b", &clock);
    a.add(1).unwrap();
    clock.set(2);
    b.add(2).unwrap();
    b.remove(1).unwrap();

    assert!(a.sync(&mut b));
    let snapshot = a.state().clone();

    assert!(!a.sync(&mut b));
    assert_eq!(a.state(), &snapshot, "sync should be idempotent");

    assert!(!b.sync(&mut a));
    assert_eq!(b.state(), &snapshot, "sync should be idempotent (reversed)");
}

#[test]
fn random_gossip_converges() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let elements = ["a", "b", "c", "d", "e"];

    let mut replicas: Vec<LWWElementSet<&str, ManualClock<u64>>> = (0..4)
        .map(|i| LWWElementSet::new(format!("r{i}"), ManualClock::new(0)))
        .collect();

    for step in 0..400u64 {
        let i = rng.gen_range(0..replicas.len());
        let element = elements[rng.gen_range(0..elements.len())];
        // coarse timestamps so ties actually happen
        let ts = step / 3;
        match rng.gen_range(0..3) {
            0 => replicas[i].add_at(element, ts),
            1 => replicas[i].remove_at(element, ts),
            _ => {
                let j = rng.gen_range(0..replicas.len());
                if i != j {
                    let (lo, hi) = (i.min(j), i.max(j));
                    let (left, right) = replicas.split_at_mut(hi);
                    left[lo].sync(&mut right[0]);
                    assert_eq!(left[lo], right[0]);
                }
            }
        }
    }

    // full round of gossip
    let mut merged = replicas[0].clone();
    for r in &replicas[1..] {
        merged.merge(r);
    }
    for r in &mut replicas {
        r.merge_state(merged.state());
        assert_eq!(*r, merged);
    }
}

#[test]
fn gcounter_three_way_convergence() {
    let mut a = GCounter::new("a");
    let mut b = GCounter::new("b");
    let mut c = GCounter::new("c");

    a.increment_by("a", 10);
    b.increment_by("b", 20);
    c.increment_by("c", 30);

    let mut order1 = a.clone();
    order1.merge(&b);
    order1.merge(&c);

    let mut order2 = c.clone();
    order2.merge(&a);
    order2.merge(&b);

    a.sync(&mut b);
    b.sync(&mut c);
    a.sync(&mut b);

    assert_eq!(order1.value(), 60);
    assert_eq!(order2.value(), 60);
    assert_eq!(a.value(), 60);
    assert_eq!(c.value(), 60);
}
