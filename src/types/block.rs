use crate::types::{Hash, ReplicaId, Signature};
use serde::{Deserialize, Serialize};

/// The list-of-signatures stand-in for a real aggregate signature scheme.
/// Entries are parallel to the QC's signer list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSignature(pub Vec<Signature>);

impl AggregateSignature {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Proof that committee weight >= quorum voted for `block_id` at `view`.
///
/// `signers` and `signatures` are parallel, ordered lists: `signatures.0[i]`
/// was produced by `signers[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCertificate {
    pub view: u64,
    pub block_id: Hash,
    pub signers: Vec<ReplicaId>,
    pub signatures: AggregateSignature,
}

impl QuorumCertificate {
    /// Root certificate bootstrapping the chain: no signers, view 0.
    pub fn root(block_id: Hash) -> Self {
        Self {
            view: 0,
            block_id,
            signers: Vec::new(),
            signatures: AggregateSignature::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub chain_id: String,
    pub view: u64,
    pub height: u64,
    pub parent_id: Hash,
    /// The QC for the parent block. Embedding it lets any verifier confirm
    /// height/view monotonicity from the proposal alone.
    pub parent_qc: QuorumCertificate,
    /// Opaque payload commitment supplied by the builder.
    pub payload_hash: Hash,
}

impl Block {
    /// Canonical block identifier: hash of the signing encoding.
    pub fn id(&self) -> Hash {
        crate::crypto::hash::sha256(&crate::types::serialization::block_signing_bytes(self))
    }
}

/// A block paired with the QC that certifies it. The pair is what a new
/// proposal builds on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifiedBlock {
    pub block: Block,
    pub qc: QuorumCertificate,
}

impl CertifiedBlock {
    /// Genesis pair: view 0, height 0, zero parent. The root QC carries no
    /// signatures; quorum rules start at view 1.
    pub fn genesis(chain_id: &str) -> Self {
        let block = Block {
            chain_id: chain_id.to_string(),
            view: 0,
            height: 0,
            parent_id: Hash::ZERO,
            parent_qc: QuorumCertificate::root(Hash::ZERO),
            payload_hash: Hash::ZERO,
        };
        let qc = QuorumCertificate::root(block.id());
        Self { block, qc }
    }
}
