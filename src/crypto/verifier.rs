use crate::crypto::signer::{domain_message, DomainTags};
use crate::types::serialization::{block_signing_bytes, proposal_signing_bytes};
use crate::types::{Block, Committee, QuorumCertificate, ReplicaId, Signature};
use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use std::collections::BTreeSet;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    /// The public key bytes do not decode to a curve point. Distinct from an
    /// invalid signature: callers must not penalize a peer for this the way
    /// they would for a forgery.
    #[error("malformed public key")]
    MalformedKey,
}

/// Which aggregate scheme a verifier (and the QCs it checks) uses. The
/// variant is fixed at construction; swapping in a real aggregate scheme
/// (e.g. BLS) adds a variant here without changing any caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateScheme {
    /// Aggregate = ordered list of partial signatures, verified pairwise.
    SignatureList,
}

/// Validates partial and aggregated staking signatures.
///
/// The message is always recomputed from the full block (or proposal)
/// handed in by the caller, never taken from fields travelling with the
/// signature: a vote claiming to cover a different payload than it signs
/// fails here. Callers are expected to hold the candidate block already.
///
/// Stateless with respect to inputs; sharing one verifier across threads
/// and views is safe.
pub struct SigVerifier {
    tags: DomainTags,
    scheme: AggregateScheme,
}

impl SigVerifier {
    pub fn new(tags: DomainTags, scheme: AggregateScheme) -> Self {
        Self { tags, scheme }
    }

    pub fn scheme(&self) -> AggregateScheme {
        self.scheme
    }

    /// Verify one vote signature for `block` against `public_key`.
    /// `Ok(false)` for an invalid signature; `Err` only for a malformed key.
    pub fn verify_vote(
        &self,
        signature: &Signature,
        block: &Block,
        public_key: &[u8; 32],
    ) -> Result<bool, CryptoError> {
        let msg = domain_message(self.tags.vote(), &block_signing_bytes(block));
        self.verify_raw(signature, &msg, public_key)
    }

    /// Verify a leader signature over (block, proposer) with the proposal
    /// tag. A vote signature for the same block fails here: the tags differ.
    pub fn verify_proposal(
        &self,
        signature: &Signature,
        block: &Block,
        proposer: &ReplicaId,
        public_key: &[u8; 32],
    ) -> Result<bool, CryptoError> {
        let payload = proposal_signing_bytes(block, proposer);
        let msg = domain_message(self.tags.proposal(), &payload);
        self.verify_raw(signature, &msg, public_key)
    }

    /// Verify an aggregated vote signature for `block`.
    ///
    /// `signatures` and `public_keys` are parallel lists. A length mismatch
    /// is `Ok(false)` with no error, as is any failing pair. Every pair is
    /// checked against the same self-derived message.
    pub fn verify_aggregate(
        &self,
        signatures: &[Signature],
        block: &Block,
        public_keys: &[[u8; 32]],
    ) -> Result<bool, CryptoError> {
        if signatures.len() != public_keys.len() {
            return Ok(false);
        }

        match self.scheme {
            AggregateScheme::SignatureList => {
                let msg = domain_message(self.tags.vote(), &block_signing_bytes(block));
                for (sig, key) in signatures.iter().zip(public_keys) {
                    if !self.verify_raw(sig, &msg, key)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Check a QC against the block it claims to certify and the committee
    /// for its view: quorum weight, membership, no repeated signer, and the
    /// aggregate itself.
    pub fn verify_qc(
        &self,
        qc: &QuorumCertificate,
        block: &Block,
        committee: &Committee,
    ) -> Result<bool, CryptoError> {
        if qc.block_id != block.id() || qc.view != block.view {
            return Ok(false);
        }

        let mut seen = BTreeSet::new();
        let mut weight = 0u64;
        let mut keys = Vec::with_capacity(qc.signers.len());
        for signer in &qc.signers {
            if !seen.insert(*signer) {
                return Ok(false);
            }
            let member = match committee.member(signer) {
                Some(m) => m,
                None => return Ok(false),
            };
            weight = weight.saturating_add(member.weight);
            keys.push(member.public_key);
        }
        if weight < committee.quorum_threshold() {
            return Ok(false);
        }

        self.verify_aggregate(&qc.signatures.0, block, &keys)
    }

    fn verify_raw(
        &self,
        signature: &Signature,
        msg: &[u8],
        public_key: &[u8; 32],
    ) -> Result<bool, CryptoError> {
        let vk = VerifyingKey::from_bytes(public_key).map_err(|_| CryptoError::MalformedKey)?;
        let sig = DalekSignature::from_bytes(&signature.0);
        Ok(vk.verify_strict(msg, &sig).is_ok())
    }
}
