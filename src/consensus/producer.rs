use crate::consensus::view_state::{ViewState, ViewStateError};
use crate::crypto::ConsensusSigner;
use crate::types::{Block, BlockProposal, CertifiedBlock, Hash, UnsignedProposal};
use tracing::info;

#[derive(thiserror::Error, Debug)]
pub enum BuilderError {
    #[error("builder unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the opaque payload commitment for a candidate block, keyed by
/// the parent block id. Called exactly once per proposal attempt.
pub trait PayloadBuilder {
    fn build_on(&self, parent_id: Hash) -> Result<Hash, BuilderError>;
}

#[derive(thiserror::Error, Debug)]
pub enum ProducerError {
    #[error("parent view {parent_view} >= proposal view {view}")]
    NonMonotonicView { parent_view: u64, view: u64 },
    /// This replica has no seat in the view's committee, so it cannot sign.
    #[error(transparent)]
    ViewState(#[from] ViewStateError),
    /// The builder failed; this attempt is aborted and never retried here.
    /// The next view's leader may retry.
    #[error(transparent)]
    Builder(#[from] BuilderError),
}

/// Assembles, obtains a payload commitment for, and signs new candidate
/// blocks. Leader role only: the caller checks leadership against the view
/// state before invoking; it is not re-validated here.
pub struct BlockProducer<S: ConsensusSigner, B: PayloadBuilder> {
    signer: S,
    view_state: ViewState,
    builder: B,
    chain_id: String,
}

impl<S: ConsensusSigner, B: PayloadBuilder> BlockProducer<S, B> {
    pub fn new(signer: S, view_state: ViewState, builder: B, chain_id: &str) -> Self {
        Self {
            signer,
            view_state,
            builder,
            chain_id: chain_id.to_string(),
        }
    }

    /// Build a proposal for `view` on top of a certified parent.
    ///
    /// The proposal embeds the exact parent QC used for the height
    /// computation, so any verifier can confirm height/view monotonicity
    /// from the proposal alone.
    pub fn make_block_proposal(
        &self,
        view: u64,
        parent: &CertifiedBlock,
    ) -> Result<BlockProposal, ProducerError> {
        if parent.block.view >= view {
            return Err(ProducerError::NonMonotonicView {
                parent_view: parent.block.view,
                view,
            });
        }

        // Leadership is the caller's precondition (not re-checked here);
        // committee membership is.
        self.view_state.self_index(view)?;

        let parent_id = parent.block.id();
        let payload_hash = self.builder.build_on(parent_id)?;

        let block = Block {
            chain_id: self.chain_id.clone(),
            view,
            height: parent.block.height + 1,
            parent_id,
            parent_qc: parent.qc.clone(),
            payload_hash,
        };

        let unsigned = UnsignedProposal {
            block,
            proposer: self.view_state.self_id(),
        };
        let signature = self.signer.sign_proposal(&unsigned);

        info!(
            view,
            height = unsigned.block.height,
            parent = %parent_id.short(),
            "block proposal produced"
        );

        Ok(BlockProposal {
            block: unsigned.block,
            proposer: unsigned.proposer,
            signature,
        })
    }
}
