use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaId(pub [u8; 32]);

impl ReplicaId {
    /// First 8 bytes as hex, for log lines.
    pub fn short(&self) -> String {
        self.0[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Node role a committee is drawn from. Signatures from different roles use
/// different domain tags, so a collection-cluster vote can never certify a
/// consensus block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Consensus,
    Collection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: ReplicaId,
    /// Ed25519 staking public key bytes. Parsed (and possibly rejected as
    /// malformed) at verification time, not here.
    pub public_key: [u8; 32],
    pub weight: u64,
    pub role: Role,
}

/// The weighted set of replicas eligible to vote and lead.
///
/// Iteration order is the BTreeMap key order, so every replica that holds the
/// same membership derives the same indices and the same leader schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Committee {
    members: BTreeMap<ReplicaId, Identity>,
    total_weight: u64,
}

impl Committee {
    pub fn new(members: Vec<Identity>) -> Self {
        let mut map = BTreeMap::new();
        for m in members {
            map.insert(m.id, m);
        }
        // Sum over the map, not the input, so a duplicated id counts once.
        let total_weight = map.values().fold(0u64, |acc, m| acc.saturating_add(m.weight));
        Self { members: map, total_weight }
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// (2/3)*total + 1 using integer math
    pub fn quorum_threshold(&self) -> u64 {
        (self.total_weight.saturating_mul(2) / 3).saturating_add(1)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &ReplicaId) -> bool {
        self.members.contains_key(id)
    }

    pub fn member(&self, id: &ReplicaId) -> Option<&Identity> {
        self.members.get(id)
    }

    pub fn weight_of(&self, id: &ReplicaId) -> u64 {
        self.members.get(id).map(|m| m.weight).unwrap_or(0)
    }

    /// Position of `id` in the deterministic member order.
    pub fn index_of(&self, id: &ReplicaId) -> Option<usize> {
        self.members.keys().position(|k| k == id)
    }

    pub fn ids_in_order(&self) -> impl Iterator<Item = &ReplicaId> {
        self.members.keys()
    }

    pub fn members_in_order(&self) -> impl Iterator<Item = &Identity> {
        self.members.values()
    }
}
