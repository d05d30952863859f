use crate::crypto::{CryptoError, SigVerifier};
use crate::types::{
    AggregateSignature, Block, Committee, Hash, QuorumCertificate, ReplicaId, Vote,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregatorState {
    Collecting,
    QuorumReached,
    Finalized,
}

#[derive(thiserror::Error, Debug)]
pub enum VoteRejected {
    #[error("vote for view {got}, aggregating view {expected}")]
    ViewMismatch { expected: u64, got: u64 },
    #[error("vote for a different block")]
    BlockMismatch,
    #[error("vote from non-member signer")]
    UnknownSigner,
    #[error("duplicate vote from already-seen signer")]
    DuplicateSigner,
    #[error("invalid vote signature")]
    InvalidSignature,
    #[error("aggregate integrity check failed")]
    AggregateInvalid,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteAccepted {
    /// Counted toward quorum; accumulated weight so far.
    Added { weight: u64 },
    /// This vote met the threshold: the QC is now available.
    QuorumReached,
    /// Arrived after the QC formed; recorded, QC untouched.
    RecordedLate { weight: u64 },
}

/// Accumulates votes for one (view, block) pair until combined signer weight
/// meets the committee's quorum threshold, then packages a QC.
///
/// Single-writer: the owning view task is the only mutator. Votes rejected
/// here never poison the aggregator; the first vote per signer is kept and
/// duplicates are only counted. If the view times out, the owner drops the
/// aggregator whole; a partial QC is never observable.
pub struct VoteAggregator {
    view: u64,
    block: Block,
    block_id: Hash,
    committee: Committee,
    votes: BTreeMap<ReplicaId, Vote>,
    weight: u64,
    state: AggregatorState,
    qc: Option<QuorumCertificate>,
    duplicate_votes: u64,
    late_votes: u64,
}

impl VoteAggregator {
    /// Start collecting for `block` at `view`. The full candidate block is
    /// required up front: signatures are verified against its self-derived
    /// encoding, never against anything a vote carries.
    pub fn new(view: u64, block: Block, committee: Committee) -> Self {
        let block_id = block.id();
        Self {
            view,
            block,
            block_id,
            committee,
            votes: BTreeMap::new(),
            weight: 0,
            state: AggregatorState::Collecting,
            qc: None,
            duplicate_votes: 0,
            late_votes: 0,
        }
    }

    pub fn view(&self) -> u64 {
        self.view
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    /// The QC, once quorum was reached and the aggregate checked.
    pub fn qc(&self) -> Option<&QuorumCertificate> {
        self.qc.as_ref()
    }

    pub fn accumulated_weight(&self) -> u64 {
        self.weight
    }

    pub fn duplicate_votes(&self) -> u64 {
        self.duplicate_votes
    }

    pub fn late_votes(&self) -> u64 {
        self.late_votes
    }

    pub fn accept_vote(
        &mut self,
        verifier: &SigVerifier,
        vote: Vote,
    ) -> Result<VoteAccepted, VoteRejected> {
        if vote.view != self.view {
            return Err(VoteRejected::ViewMismatch {
                expected: self.view,
                got: vote.view,
            });
        }
        if vote.block_id != self.block_id {
            return Err(VoteRejected::BlockMismatch);
        }

        let member = match self.committee.member(&vote.signer) {
            Some(m) => m,
            None => return Err(VoteRejected::UnknownSigner),
        };

        if self.votes.contains_key(&vote.signer) {
            // First vote kept, duplicate flagged.
            self.duplicate_votes += 1;
            debug!(view = self.view, signer = %vote.signer.short(), "duplicate vote");
            return Err(VoteRejected::DuplicateSigner);
        }

        if !verifier.verify_vote(&vote.signature, &self.block, &member.public_key)? {
            return Err(VoteRejected::InvalidSignature);
        }

        let member_weight = member.weight;
        self.votes.insert(vote.signer, vote);

        if self.state == AggregatorState::Finalized {
            // Late but novel: recorded, the QC never changes.
            self.late_votes += 1;
            return Ok(VoteAccepted::RecordedLate { weight: member_weight });
        }

        self.weight = self.weight.saturating_add(member_weight);

        if self.weight >= self.committee.quorum_threshold() {
            self.state = AggregatorState::QuorumReached;
            return self.finalize(verifier);
        }

        Ok(VoteAccepted::Added { weight: self.weight })
    }

    /// Quorum is met: run the aggregate check exactly once, expose the QC,
    /// move to Finalized.
    fn finalize(&mut self, verifier: &SigVerifier) -> Result<VoteAccepted, VoteRejected> {
        let mut signers = Vec::with_capacity(self.votes.len());
        let mut sigs = Vec::with_capacity(self.votes.len());
        let mut keys = Vec::with_capacity(self.votes.len());
        for (signer, vote) in &self.votes {
            // Membership was checked on entry.
            let member = self.committee.member(signer).expect("vote from member");
            signers.push(*signer);
            sigs.push(vote.signature);
            keys.push(member.public_key);
        }

        match verifier.verify_aggregate(&sigs, &self.block, &keys) {
            Ok(true) => {}
            Ok(false) => {
                // Unreachable while every vote is verified individually
                // over the same message.
                error!(view = self.view, "aggregate check failed after quorum");
                self.state = AggregatorState::Collecting;
                return Err(VoteRejected::AggregateInvalid);
            }
            Err(e) => {
                self.state = AggregatorState::Collecting;
                return Err(e.into());
            }
        }

        self.qc = Some(QuorumCertificate {
            view: self.view,
            block_id: self.block_id,
            signers,
            signatures: AggregateSignature(sigs),
        });
        self.state = AggregatorState::Finalized;
        info!(
            view = self.view,
            block = %self.block_id.short(),
            weight = self.weight,
            "quorum certificate formed"
        );
        Ok(VoteAccepted::QuorumReached)
    }
}
