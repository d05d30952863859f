//! Committee and leader-schedule unit tests.

use hotstuff_core::consensus::{select_leader, LeaderSchedule, ViewState, ViewStateError};
use hotstuff_core::types::{Committee, Identity, ReplicaId, Role};

fn make_id(seed: u8) -> ReplicaId {
    let mut id = [0u8; 32];
    id[0] = seed;
    ReplicaId(id)
}

fn make_committee(weights: &[(u8, u64)]) -> Committee {
    let members: Vec<Identity> = weights
        .iter()
        .map(|(seed, weight)| Identity {
            id: make_id(*seed),
            public_key: [*seed; 32],
            weight: *weight,
            role: Role::Consensus,
        })
        .collect();
    Committee::new(members)
}

#[test]
fn test_basic_committee() {
    let committee = make_committee(&[(1, 100), (2, 200), (3, 50)]);
    assert_eq!(committee.total_weight(), 350);
    assert_eq!(committee.len(), 3);
    assert!(committee.contains(&make_id(1)));
    assert!(!committee.contains(&make_id(99)));
    assert_eq!(committee.weight_of(&make_id(2)), 200);
    assert_eq!(committee.weight_of(&make_id(99)), 0);
}

#[test]
fn test_quorum_threshold() {
    // 2/3 * 4 + 1 = 3
    assert_eq!(make_committee(&[(1, 1), (2, 1), (3, 1), (4, 1)]).quorum_threshold(), 3);
    // 2/3 * 3 + 1 = 3
    assert_eq!(make_committee(&[(1, 1), (2, 1), (3, 1)]).quorum_threshold(), 3);
    // 2/3 * 100 + 1 = 67
    assert_eq!(make_committee(&[(1, 100)]).quorum_threshold(), 67);
}

#[test]
fn test_duplicate_identity_counts_once() {
    let committee = make_committee(&[(1, 100), (1, 100), (2, 50)]);
    assert_eq!(committee.len(), 2);
    assert_eq!(committee.total_weight(), 150);
}

#[test]
fn test_index_order_deterministic() {
    let committee = make_committee(&[(3, 1), (1, 1), (2, 1)]);
    // BTreeMap order: sorted by id regardless of insertion order.
    let ids: Vec<ReplicaId> = committee.ids_in_order().copied().collect();
    assert_eq!(ids, vec![make_id(1), make_id(2), make_id(3)]);
    assert_eq!(committee.index_of(&make_id(2)), Some(1));
    assert_eq!(committee.index_of(&make_id(99)), None);
}

/// Property: for any committee and any view, the selected leader is a member.
#[test]
fn test_leader_always_in_committee() {
    let committee = make_committee(&[(1, 100), (2, 200), (3, 50)]);
    for view in 0..60 {
        let leader = select_leader(&committee, view);
        assert!(committee.contains(&leader), "leader at view {} must be a member", view);
    }
}

/// Property: same inputs, same output (determinism across replicas).
#[test]
fn test_leader_deterministic() {
    let committee = make_committee(&[(1, 100), (2, 200), (3, 50)]);
    for view in 0..30 {
        assert_eq!(
            select_leader(&committee, view),
            select_leader(&committee, view),
            "leader must be deterministic at view {}",
            view
        );
    }
}

#[test]
fn test_leader_rotates_across_views() {
    let committee = make_committee(&[(1, 1), (2, 1), (3, 1)]);
    let mut leaders = std::collections::BTreeSet::new();
    for view in 0..30 {
        leaders.insert(select_leader(&committee, view));
    }
    assert!(leaders.len() > 1, "leader should rotate across views");
}

/// Higher weight should lead more often.
#[test]
fn test_leader_weighted() {
    let committee = make_committee(&[(1, 1), (2, 9)]);
    let heavy = make_id(2);
    let total = 100;
    let mut count_heavy = 0;
    for view in 0..total {
        if select_leader(&committee, view) == heavy {
            count_heavy += 1;
        }
    }
    // 9/10 of the weight should lead roughly 90% of views.
    assert!(count_heavy > 70, "9x-weight member should lead frequently, got {}", count_heavy);
}

/// LeaderSchedule incremental API produces the same result as the stateless fn.
#[test]
fn test_schedule_matches_stateless() {
    let committee = make_committee(&[(1, 100), (2, 200), (3, 50)]);
    let mut schedule = LeaderSchedule::new(&committee);
    for view in 0..20 {
        let incremental = schedule.next_leader(&committee);
        assert_eq!(
            incremental,
            select_leader(&committee, view),
            "stateless and stateful must agree at view {}",
            view
        );
    }
}

#[test]
fn test_view_state_self_index() {
    let committee = make_committee(&[(1, 1), (2, 1), (3, 1)]);

    let vs = ViewState::new(committee.clone(), make_id(2));
    assert_eq!(vs.self_index(7).unwrap(), 1);

    let outsider = ViewState::new(committee, make_id(99));
    let err = outsider.self_index(7).unwrap_err();
    assert_eq!(err, ViewStateError::NotInCommittee { view: 7 });
}

#[test]
fn test_view_state_ensure_leader() {
    let committee = make_committee(&[(1, 1), (2, 1), (3, 1)]);
    let leader = select_leader(&committee, 4);
    let follower = *committee.ids_in_order().find(|id| **id != leader).unwrap();

    assert!(ViewState::new(committee.clone(), leader).ensure_leader(4).is_ok());
    let err = ViewState::new(committee, follower).ensure_leader(4).unwrap_err();
    assert_eq!(err, ViewStateError::NotLeader { view: 4 });
}

#[test]
fn test_view_state_leader_agrees_across_replicas() {
    let committee = make_committee(&[(1, 1), (2, 1), (3, 1), (4, 1)]);
    let a = ViewState::new(committee.clone(), make_id(1));
    let b = ViewState::new(committee, make_id(3));
    for view in 0..20 {
        assert_eq!(a.leader(view), b.leader(view));
    }
}
