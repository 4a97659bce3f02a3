use contention_core::{SafetyVerdict, check_safety, check_state, replay_sequence, search_state};
use proptest::prelude::*;

use generators::*;

fn exceeds(lhs: &[u64], rhs: &[u64]) -> bool {
    lhs.iter().zip(rhs).any(|(a, b)| a > b)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    #[test]
    fn check_safety_is_deterministic(snapshot in arb_snapshot()) {
        let first = check_safety(&snapshot);
        let second = check_safety(&snapshot);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn request_above_available_is_always_denied(
        mut snapshot in arb_snapshot(),
        pick in any::<prop::sample::Index>(),
        extra in 1u64..=3,
    ) {
        let resource = pick.index(snapshot.state.resource_count());
        snapshot.request[resource] = snapshot.state.available[resource] + extra;
        let verdict = check_safety(&snapshot).expect("well-formed snapshot");
        prop_assert_eq!(verdict.status(), "Denied");
    }

    #[test]
    fn request_above_max_claim_is_always_denied(
        mut snapshot in arb_snapshot(),
        pick in any::<prop::sample::Index>(),
        extra in 1u64..=3,
    ) {
        let resource = pick.index(snapshot.state.resource_count());
        snapshot.request[resource] = snapshot.state.max[snapshot.process][resource] + extra;
        let verdict = check_safety(&snapshot).expect("well-formed snapshot");
        prop_assert_eq!(verdict.status(), "Denied");
    }

    #[test]
    fn in_bounds_requests_are_never_denied(mut snapshot in arb_snapshot()) {
        let claims = snapshot.state.max[snapshot.process].clone();
        for (resource, units) in snapshot.request.iter_mut().enumerate() {
            *units = (*units).min(snapshot.state.available[resource]).min(claims[resource]);
        }
        prop_assert!(!exceeds(&snapshot.request, &snapshot.state.available));
        let verdict = check_safety(&snapshot).expect("well-formed snapshot");
        prop_assert_ne!(verdict.status(), "Denied");
    }

    #[test]
    fn safe_sequences_replay_from_the_submitted_available(snapshot in arb_snapshot()) {
        let verdict = check_safety(&snapshot).expect("well-formed snapshot");
        if let SafetyVerdict::Safe { sequence } = &verdict {
            let granted = search_state(&snapshot).expect("grant");
            prop_assert_eq!(&granted.available, &snapshot.state.available);
            prop_assert_eq!(sequence.len(), snapshot.state.process_count());
            prop_assert_eq!(replay_sequence(&granted, sequence), Ok(()));

            let mut sorted = sequence.clone();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (0..snapshot.state.process_count()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn deadlock_prefix_replays_and_is_incomplete(snapshot in arb_snapshot()) {
        let verdict = check_safety(&snapshot).expect("well-formed snapshot");
        if let SafetyVerdict::Deadlock { sequence } = &verdict {
            let granted = search_state(&snapshot).expect("grant");
            prop_assert!(sequence.len() < snapshot.state.process_count());
            prop_assert_eq!(replay_sequence(&granted, sequence), Ok(()));
        }
    }

    #[test]
    fn caller_snapshot_is_never_mutated(snapshot in arb_snapshot()) {
        let before = snapshot.clone();
        let _ = check_safety(&snapshot);
        prop_assert_eq!(snapshot, before);
    }

    #[test]
    fn check_state_agrees_with_zero_request(snapshot in arb_snapshot()) {
        let mut zero = snapshot.clone();
        zero.request = vec![0; zero.state.resource_count()];
        let via_request = check_safety(&zero).expect("well-formed snapshot");
        let via_state = check_state(&snapshot.state).expect("well-formed state");
        prop_assert_eq!(via_request, via_state);
    }
}
