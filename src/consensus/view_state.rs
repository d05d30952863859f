use crate::types::{Committee, ReplicaId};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ViewStateError {
    #[error("replica is not in the committee for view {view}")]
    NotInCommittee { view: u64 },
    #[error("replica is not the leader for view {view}")]
    NotLeader { view: u64 },
}

/// Deterministic weighted round-robin leader selection.
///
/// Uses an incremental priority accumulator that is O(n) per selection step.
/// The `LeaderSchedule` should be cached across views while the committee is
/// unchanged and rebuilt when it changes.
#[derive(Clone, Debug)]
pub struct LeaderSchedule {
    priorities: BTreeMap<ReplicaId, i128>,
    total_weight: i128,
}

impl LeaderSchedule {
    /// Initialize schedule state from a committee (all priorities = 0).
    pub fn new(committee: &Committee) -> Self {
        let mut priorities = BTreeMap::new();
        for m in committee.members_in_order() {
            priorities.insert(m.id, 0);
        }
        Self {
            priorities,
            total_weight: committee.total_weight() as i128,
        }
    }

    /// Perform one selection step: add weight, pick best, subtract total.
    /// Returns the selected leader for this step.
    pub fn next_leader(&mut self, committee: &Committee) -> ReplicaId {
        // 1. Add weight to each member's priority
        for m in committee.members_in_order() {
            if let Some(p) = self.priorities.get_mut(&m.id) {
                *p += m.weight as i128;
            }
        }

        // 2. Pick member with highest priority (deterministic tie-break by ReplicaId)
        let mut best: Option<(ReplicaId, i128)> = None;
        for (id, p) in self.priorities.iter() {
            match best {
                None => best = Some((*id, *p)),
                Some((best_id, best_p)) => {
                    let ord = p.cmp(&best_p).then_with(|| id.cmp(&best_id));
                    if ord == Ordering::Greater {
                        best = Some((*id, *p));
                    }
                }
            }
        }

        let (best_id, _) = best.expect("non-empty committee");

        // 3. Subtract total weight from the selected leader
        if let Some(p) = self.priorities.get_mut(&best_id) {
            *p -= self.total_weight;
        }

        best_id
    }
}

/// Stateless leader selection: O(n * view) per call. Computes the leader for
/// a given view by running the round-robin from scratch. Every replica that
/// shares the committee derives the same leader for the same view.
pub fn select_leader(committee: &Committee, view: u64) -> ReplicaId {
    let mut schedule = LeaderSchedule::new(committee);
    let mut last = committee
        .ids_in_order()
        .next()
        .copied()
        .expect("non-empty committee");
    for _ in 0..=view {
        last = schedule.next_leader(committee);
    }
    last
}

/// Maps a view to the active committee, its leader, and this replica's
/// position. The committee is fixed for the life of this instance; the view
/// parameter stays on every accessor so an epoch switch can land without
/// changing callers.
#[derive(Clone, Debug)]
pub struct ViewState {
    committee: Committee,
    self_id: ReplicaId,
}

impl ViewState {
    pub fn new(committee: Committee, self_id: ReplicaId) -> Self {
        Self { committee, self_id }
    }

    pub fn self_id(&self) -> ReplicaId {
        self.self_id
    }

    pub fn committee(&self, _view: u64) -> &Committee {
        &self.committee
    }

    pub fn leader(&self, view: u64) -> ReplicaId {
        select_leader(&self.committee, view)
    }

    pub fn is_self_leader(&self, view: u64) -> bool {
        self.leader(view) == self.self_id
    }

    /// This replica's index in the committee order for `view`.
    pub fn self_index(&self, view: u64) -> Result<usize, ViewStateError> {
        self.committee
            .index_of(&self.self_id)
            .ok_or(ViewStateError::NotInCommittee { view })
    }

    /// Typed check for the leader precondition, for callers that must not
    /// silently skip a view.
    pub fn ensure_leader(&self, view: u64) -> Result<(), ViewStateError> {
        if self.leader(view) != self.self_id {
            return Err(ViewStateError::NotLeader { view });
        }
        Ok(())
    }
}
