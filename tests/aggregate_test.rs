/*!
 * Aggregate Signal Tests
 *
 * `of_all` fan-in: completion timing, outcome and settlement order
 */

use completion_signal::{CompletionSignal, Outcome};
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::thread;
use std::time::Duration;

#[test]
fn test_of_all_completes_after_last_member() {
    let result1 = CompletionSignal::new();
    let result2 = CompletionSignal::new();
    let result3 = CompletionSignal::new();

    let all = CompletionSignal::of_all(vec![result1.clone(), result2.clone(), result3.clone()]);
    assert!(!all.is_done());
    result1.succeed();
    assert!(!all.is_done());
    result2.succeed();
    assert!(!all.is_done());
    result3.succeed();
    assert!(all.is_done());
    assert!(all.is_success());
}

#[test]
fn test_of_all_with_failure() {
    let all = CompletionSignal::of_all(vec![
        CompletionSignal::of_success(),
        CompletionSignal::of_failure(),
        CompletionSignal::of_success(),
    ]);
    assert!(all.is_done());
    assert!(!all.is_success());
}

#[test]
fn test_of_all_empty_is_success() {
    let all = CompletionSignal::of_all(Vec::<CompletionSignal>::new());
    assert!(all.is_success());
}

#[test]
fn test_early_failure_still_waits_for_others() {
    let members: Vec<_> = (0..3).map(|_| CompletionSignal::new()).collect();
    let all = CompletionSignal::of_all(&members);

    members[1].fail();
    assert!(!all.is_done());
    members[0].succeed();
    assert!(!all.is_done());
    members[2].succeed();

    assert!(all.is_done());
    assert!(!all.is_success());
}

#[test]
fn test_aggregate_supports_callbacks_and_join() {
    let members: Vec<_> = (0..4).map(|_| CompletionSignal::new()).collect();
    let all = CompletionSignal::of_all(&members);

    let (tx, rx) = std::sync::mpsc::channel();
    all.when_complete_with(move |outcome| {
        tx.send(outcome).ok();
    });

    let producers: Vec<_> = members
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, member)| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5 * i as u64));
                member.succeed();
            })
        })
        .collect();

    assert!(all.join(Duration::from_secs(10)).is_success());
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(3)).unwrap(),
        Outcome::Succeeded
    );

    for handle in producers {
        handle.join().unwrap();
    }
}

#[test]
fn test_members_settled_concurrently() {
    let members: Vec<_> = (0..16).map(|_| CompletionSignal::new()).collect();
    let all = CompletionSignal::of_all(&members);

    let handles: Vec<_> = members
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, member)| {
            thread::spawn(move || {
                if i == 11 {
                    member.fail();
                } else {
                    member.succeed();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(all.is_done());
    assert!(!all.is_success());
}

#[test]
fn test_timed_out_member_fails_aggregate() {
    let fast = CompletionSignal::new();
    let stuck = CompletionSignal::new();
    let all = CompletionSignal::of_all([&fast, &stuck]);

    fast.succeed();
    stuck.join(Duration::from_millis(5));

    assert!(all.is_done());
    assert!(!all.is_success());
}

proptest! {
    #[test]
    fn prop_aggregate_done_only_after_every_member(
        outcomes in prop::collection::vec(any::<bool>(), 1..12),
        seed in any::<u64>(),
    ) {
        let members: Vec<_> = outcomes.iter().map(|_| CompletionSignal::new()).collect();
        let all = CompletionSignal::of_all(&members);

        let mut order: Vec<usize> = (0..members.len()).collect();
        order.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));

        for (settled, &i) in order.iter().enumerate() {
            prop_assert!(!all.is_done());
            if outcomes[i] {
                members[i].succeed();
            } else {
                members[i].fail();
            }
            prop_assert_eq!(all.is_done(), settled + 1 == members.len());
        }

        prop_assert_eq!(all.is_success(), outcomes.iter().all(|&ok| ok));
    }
}
