use crate::types::{BlockProposal, CertifiedBlock, Vote};

#[derive(Clone, Debug)]
pub enum ConsensusEvent {
    // From transport
    ProposalReceived { proposal: BlockProposal },
    VoteReceived { vote: Vote },

    // From the pacemaker: this view expired without quorum
    ViewTimeout { view: u64 },

    // The local replica moved past this view; discard in-flight work
    AdvanceView { to_view: u64 },
}

#[derive(Clone, Debug)]
pub enum ConsensusCommand {
    // To transport
    BroadcastProposal { proposal: BlockProposal },
    BroadcastVote { vote: Vote },

    // Quorum reached: the certified block parents the next view
    QuorumFormed { certified: CertifiedBlock },
}
