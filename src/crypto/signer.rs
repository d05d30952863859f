use crate::types::serialization::{block_signing_bytes, proposal_signing_bytes};
use crate::types::{Block, ReplicaId, Signature, UnsignedProposal, Vote};
use ed25519_dalek::Signer as _;
use ed25519_dalek::SigningKey;

const MAX_TAG_LEN: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("empty domain tag")]
    EmptyDomainTag,
    #[error("domain tag exceeds {MAX_TAG_LEN} bytes")]
    DomainTagTooLong,
    #[error("proposal and vote domain tags must differ")]
    IdenticalDomainTags,
}

/// Fixed per-role domain tags, one pair per committee. Set once at
/// construction; a signer never switches tags at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainTags {
    proposal: String,
    vote: String,
}

impl DomainTags {
    pub fn new(proposal: &str, vote: &str) -> Result<Self, ConfigError> {
        for tag in [proposal, vote] {
            if tag.is_empty() {
                return Err(ConfigError::EmptyDomainTag);
            }
            if tag.len() > MAX_TAG_LEN {
                return Err(ConfigError::DomainTagTooLong);
            }
        }
        if proposal == vote {
            return Err(ConfigError::IdenticalDomainTags);
        }
        Ok(Self {
            proposal: proposal.to_string(),
            vote: vote.to_string(),
        })
    }

    pub fn proposal(&self) -> &str {
        &self.proposal
    }

    pub fn vote(&self) -> &str {
        &self.vote
    }
}

/// Length-prefixed tag followed by the canonical payload, so no tag can be
/// a prefix of another tag+payload combination.
pub(crate) fn domain_message(tag: &str, payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(4 + tag.len() + payload.len());
    msg.extend_from_slice(&(tag.len() as u32).to_be_bytes());
    msg.extend_from_slice(tag.as_bytes());
    msg.extend_from_slice(payload);
    msg
}

/// The two signing roles a consensus participant needs. Concrete
/// implementations are backed by a staking key; a future threshold-key
/// signer slots in behind the same trait.
pub trait ConsensusSigner {
    fn sign_proposal(&self, proposal: &UnsignedProposal) -> Signature;
    fn sign_vote(&self, block: &Block) -> Signature;
}

/// Produces partial signatures with the staking key, domain-separated by
/// role. Ed25519 is deterministic: same key and message, same signature.
#[derive(Clone)]
pub struct StakingSigner {
    key: SigningKey,
    tags: DomainTags,
}

impl StakingSigner {
    pub fn new(key: SigningKey, tags: DomainTags) -> Self {
        Self { key, tags }
    }

    pub fn replica_id(&self) -> ReplicaId {
        ReplicaId(self.key.verifying_key().to_bytes())
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Convenience: a full vote for `block` at its view, signed by this key.
    pub fn vote_for(&self, block: &Block) -> Vote {
        Vote {
            view: block.view,
            block_id: block.id(),
            signer: self.replica_id(),
            signature: self.sign_vote(block),
        }
    }
}

impl ConsensusSigner for StakingSigner {
    /// Sign the canonical encoding of an unsigned proposal with the
    /// proposal tag.
    fn sign_proposal(&self, proposal: &UnsignedProposal) -> Signature {
        let payload = proposal_signing_bytes(&proposal.block, &proposal.proposer);
        let msg = domain_message(&self.tags.proposal, &payload);
        Signature(self.key.sign(&msg).to_bytes())
    }

    /// Sign the canonical encoding of a block with the vote tag.
    fn sign_vote(&self, block: &Block) -> Signature {
        let msg = domain_message(&self.tags.vote, &block_signing_bytes(block));
        Signature(self.key.sign(&msg).to_bytes())
    }
}
