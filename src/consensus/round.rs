use crate::consensus::aggregator::{VoteAccepted, VoteAggregator, VoteRejected};
use crate::consensus::events::{ConsensusCommand, ConsensusEvent};
use crate::consensus::producer::{BlockProducer, PayloadBuilder};
use crate::consensus::view_state::ViewState;
use crate::crypto::{SigVerifier, StakingSigner};
use crate::metrics::Metrics;
use crate::types::{Block, BlockProposal, CertifiedBlock, Vote};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One logical consensus task for one view.
///
/// Producer and aggregator are driven sequentially from this task; nothing
/// else mutates them. Verification is the only concurrent-safe piece (the
/// verifier is shared, stateless). The task ends when its view times out or
/// the replica advances past it; either way the in-flight aggregator is
/// dropped and no partial QC escapes.
pub struct ViewTask<B: PayloadBuilder> {
    view: u64,
    parent: CertifiedBlock,
    view_state: ViewState,
    signer: StakingSigner,
    verifier: Arc<SigVerifier>,
    producer: BlockProducer<StakingSigner, B>,

    candidate: Option<Block>,
    aggregator: Option<VoteAggregator>,
    /// Votes that arrived before the proposal did.
    pending_votes: Vec<Vote>,

    rx: Receiver<ConsensusEvent>,
    tx_cmd: Sender<ConsensusCommand>,
    metrics: Arc<Metrics>,
}

impl<B: PayloadBuilder> ViewTask<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        view: u64,
        parent: CertifiedBlock,
        view_state: ViewState,
        signer: StakingSigner,
        verifier: Arc<SigVerifier>,
        producer: BlockProducer<StakingSigner, B>,
        rx: Receiver<ConsensusEvent>,
        tx_cmd: Sender<ConsensusCommand>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            view,
            parent,
            view_state,
            signer,
            verifier,
            producer,
            candidate: None,
            aggregator: None,
            pending_votes: Vec::new(),
            rx,
            tx_cmd,
            metrics,
        }
    }

    pub fn run(mut self) {
        self.metrics.current_view.set(self.view as i64);
        self.start();

        loop {
            // 1. Blocking receive
            let ev = match self.rx.recv() {
                Ok(ev) => ev,
                Err(_) => break, // channel closed => shutdown
            };
            if self.process_event(ev) {
                break;
            }

            // 2. Batch processing: drain events available without blocking
            let mut done = false;
            while let Ok(ev) = self.rx.try_recv() {
                if self.process_event(ev) {
                    done = true;
                    break;
                }
            }
            if done {
                break;
            }
        }
    }

    /// Leader-only startup: produce and broadcast this view's proposal,
    /// then vote for it ourselves.
    fn start(&mut self) {
        if !self.view_state.is_self_leader(self.view) {
            return;
        }

        let proposal = match self.producer.make_block_proposal(self.view, &self.parent) {
            Ok(p) => p,
            Err(e) => {
                // One aborted attempt; the next view's leader takes over.
                warn!(view = self.view, error = %e, "proposal attempt aborted");
                return;
            }
        };
        self.metrics.proposals_produced.inc();

        self.adopt_candidate(proposal.block.clone());
        self.tx_cmd
            .send(ConsensusCommand::BroadcastProposal { proposal })
            .ok();

        // The leader votes for its own block like any other member.
        if let Some(block) = self.candidate.clone() {
            let vote = self.signer.vote_for(&block);
            self.tx_cmd
                .send(ConsensusCommand::BroadcastVote { vote: vote.clone() })
                .ok();
            self.handle_vote(vote);
        }
    }

    /// Returns true when the task is finished and should exit.
    fn process_event(&mut self, ev: ConsensusEvent) -> bool {
        match ev {
            ConsensusEvent::ProposalReceived { proposal } => {
                self.handle_proposal(proposal);
                false
            }
            ConsensusEvent::VoteReceived { vote } => {
                self.handle_vote(vote);
                false
            }
            ConsensusEvent::ViewTimeout { view } => {
                if view != self.view {
                    return false;
                }
                // Discard without exposing anything partial.
                self.aggregator = None;
                self.metrics.view_timeouts.inc();
                info!(view = self.view, "view timed out, aggregation discarded");
                true
            }
            ConsensusEvent::AdvanceView { to_view } => {
                if to_view <= self.view {
                    return false;
                }
                self.aggregator = None;
                debug!(view = self.view, to_view, "advanced past view");
                true
            }
        }
    }

    fn handle_proposal(&mut self, proposal: BlockProposal) {
        if self.candidate.is_some() {
            return; // only the first proposal for the view counts
        }
        if proposal.block.view != self.view {
            return;
        }
        if !self.validate_proposal(&proposal) {
            return;
        }
        self.metrics.proposals_received.inc();

        let block = proposal.block;
        // Vote for the candidate if we sit in this view's committee.
        if self.view_state.self_index(self.view).is_ok() {
            let vote = self.signer.vote_for(&block);
            self.tx_cmd
                .send(ConsensusCommand::BroadcastVote { vote: vote.clone() })
                .ok();
            self.adopt_candidate(block);
            self.handle_vote(vote);
        } else {
            self.adopt_candidate(block);
        }
    }

    /// Leader identity, leader signature, and chain structure. The signed
    /// message is recomputed from the block we hold, so a proposal claiming
    /// to cover different content than it signs dies here.
    fn validate_proposal(&self, proposal: &BlockProposal) -> bool {
        let committee = self.view_state.committee(self.view);

        if proposal.proposer != self.view_state.leader(self.view) {
            warn!(view = self.view, "proposal from non-leader");
            return false;
        }
        let leader = match committee.member(&proposal.proposer) {
            Some(m) => m,
            None => {
                warn!(view = self.view, "proposal leader not in committee");
                return false;
            }
        };

        match self.verifier.verify_proposal(
            &proposal.signature,
            &proposal.block,
            &proposal.proposer,
            &leader.public_key,
        ) {
            Ok(true) => {}
            Ok(false) => {
                warn!(view = self.view, "invalid proposal signature");
                return false;
            }
            Err(e) => {
                warn!(view = self.view, error = %e, "proposal verification fault");
                return false;
            }
        }

        let block = &proposal.block;
        if block.view <= block.parent_qc.view {
            warn!(view = self.view, "proposal view not above its parent QC view");
            return false;
        }
        if block.parent_id != self.parent.block.id()
            || block.height != self.parent.block.height + 1
        {
            warn!(view = self.view, "proposal does not extend the certified parent");
            return false;
        }

        // Root QCs carry no signatures; quorum rules start past genesis.
        if self.parent.block.view > 0 {
            match self
                .verifier
                .verify_qc(&block.parent_qc, &self.parent.block, committee)
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(view = self.view, "embedded parent QC invalid");
                    return false;
                }
                Err(e) => {
                    warn!(view = self.view, error = %e, "parent QC verification fault");
                    return false;
                }
            }
        }

        true
    }

    fn adopt_candidate(&mut self, block: Block) {
        let committee = self.view_state.committee(self.view).clone();
        self.aggregator = Some(VoteAggregator::new(self.view, block.clone(), committee));
        self.candidate = Some(block);

        // Votes may have raced ahead of the proposal.
        let pending = std::mem::take(&mut self.pending_votes);
        for vote in pending {
            self.handle_vote(vote);
        }
    }

    fn handle_vote(&mut self, vote: Vote) {
        let agg = match self.aggregator.as_mut() {
            Some(agg) => agg,
            None => {
                if vote.view == self.view {
                    self.pending_votes.push(vote);
                }
                return;
            }
        };

        match agg.accept_vote(&self.verifier, vote) {
            Ok(VoteAccepted::QuorumReached) => {
                self.metrics.votes_accepted.inc();
                self.metrics.qcs_formed.inc();
                let qc = agg.qc().cloned().expect("QC exists after quorum");
                let block = self.candidate.clone().expect("candidate exists");
                self.tx_cmd
                    .send(ConsensusCommand::QuorumFormed {
                        certified: CertifiedBlock { block, qc },
                    })
                    .ok();
            }
            Ok(VoteAccepted::Added { .. }) | Ok(VoteAccepted::RecordedLate { .. }) => {
                self.metrics.votes_accepted.inc();
            }
            Err(VoteRejected::DuplicateSigner) => {
                // Counted, never escalated.
                self.metrics.duplicate_votes.inc();
            }
            Err(e @ VoteRejected::UnknownSigner)
            | Err(e @ VoteRejected::InvalidSignature) => {
                self.metrics.votes_rejected.inc();
                warn!(view = self.view, error = %e, "vote rejected");
            }
            Err(e) => {
                self.metrics.votes_rejected.inc();
                debug!(view = self.view, error = %e, "vote not counted");
            }
        }
    }
}
