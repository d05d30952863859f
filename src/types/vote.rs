use crate::types::{Hash, ReplicaId};
use serde::{Deserialize, Serialize};

/// Ed25519 signature bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "serde_bytes")] pub [u8; 64]);

/// A replica's partial signature over a candidate block at a view.
///
/// Carries only the block id, not the block: a verifier is expected to hold
/// the candidate block already and recompute the signed message from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub view: u64,
    pub block_id: Hash,
    pub signer: ReplicaId,
    pub signature: Signature,
}
