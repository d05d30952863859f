use crate::types::{Block, ReplicaId, Signature};
use serde::{Deserialize, Serialize};

/// A candidate block plus the consensus-only metadata the payload does not
/// carry (today: the proposer's identity). This is what the leader signs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedProposal {
    pub block: Block,
    pub proposer: ReplicaId,
}

/// An unsigned proposal plus the leader's signature over it. Exactly one
/// signature: tampering with any field invalidates the proposal even if the
/// payload's votes would still verify.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProposal {
    pub block: Block,
    pub proposer: ReplicaId,
    pub signature: Signature,
}

impl BlockProposal {
    pub fn unsigned(&self) -> UnsignedProposal {
        UnsignedProposal {
            block: self.block.clone(),
            proposer: self.proposer,
        }
    }
}
