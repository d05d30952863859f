//! Block proposal producer tests.

use ed25519_dalek::SigningKey;
use hotstuff_core::consensus::{
    BlockProducer, BuilderError, PayloadBuilder, ProducerError, ViewState,
};
use hotstuff_core::crypto::{AggregateScheme, DomainTags, SigVerifier, StakingSigner};
use hotstuff_core::types::{
    AggregateSignature, Block, CertifiedBlock, Committee, Hash, Identity, QuorumCertificate, Role,
};

fn tags() -> DomainTags {
    DomainTags::new("consensus-proposal-v1", "consensus-vote-v1").unwrap()
}

struct FixedBuilder(Hash);
impl PayloadBuilder for FixedBuilder {
    fn build_on(&self, _parent_id: Hash) -> Result<Hash, BuilderError> {
        Ok(self.0)
    }
}

struct FailingBuilder;
impl PayloadBuilder for FailingBuilder {
    fn build_on(&self, _parent_id: Hash) -> Result<Hash, BuilderError> {
        Err(BuilderError::Unavailable("mempool down".to_string()))
    }
}

/// Records every parent id it was called with.
struct RecordingBuilder(std::rc::Rc<std::cell::RefCell<Vec<Hash>>>);
impl PayloadBuilder for RecordingBuilder {
    fn build_on(&self, parent_id: Hash) -> Result<Hash, BuilderError> {
        self.0.borrow_mut().push(parent_id);
        Ok(Hash([7u8; 32]))
    }
}

fn make_signer(seed: u8) -> StakingSigner {
    StakingSigner::new(SigningKey::from_bytes(&[seed; 32]), tags())
}

fn make_view_state(signer: &StakingSigner) -> ViewState {
    let committee = Committee::new(vec![Identity {
        id: signer.replica_id(),
        public_key: signer.public_key(),
        weight: 1,
        role: Role::Consensus,
    }]);
    ViewState::new(committee, signer.replica_id())
}

/// A certified parent at the given (view, height).
fn make_parent(view: u64, height: u64) -> CertifiedBlock {
    let block = Block {
        chain_id: "testnet".to_string(),
        view,
        height,
        parent_id: Hash([1u8; 32]),
        parent_qc: QuorumCertificate::root(Hash([1u8; 32])),
        payload_hash: Hash([2u8; 32]),
    };
    let qc = QuorumCertificate {
        view,
        block_id: block.id(),
        signers: vec![],
        signatures: AggregateSignature::default(),
    };
    CertifiedBlock { block, qc }
}

#[test]
fn test_height_and_view_monotonicity() {
    let signer = make_signer(1);
    let producer = BlockProducer::new(
        signer.clone(),
        make_view_state(&signer),
        FixedBuilder(Hash([7u8; 32])),
        "testnet",
    );

    let parent = make_parent(4, 10);
    let proposal = producer.make_block_proposal(5, &parent).unwrap();

    assert_eq!(proposal.block.view, 5);
    assert_eq!(proposal.block.height, 11);
    assert_eq!(proposal.block.parent_id, parent.block.id());
    assert_eq!(proposal.block.chain_id, "testnet");
}

/// parent.view >= view is a typed error.
#[test]
fn test_parent_view_not_below_rejected() {
    let signer = make_signer(1);
    let producer = BlockProducer::new(
        signer.clone(),
        make_view_state(&signer),
        FixedBuilder(Hash([7u8; 32])),
        "testnet",
    );

    for parent_view in [5u64, 6] {
        let parent = make_parent(parent_view, 10);
        let err = producer.make_block_proposal(5, &parent).unwrap_err();
        assert!(
            matches!(err, ProducerError::NonMonotonicView { parent_view: pv, view: 5 } if pv == parent_view),
            "parent view {} must be rejected",
            parent_view
        );
    }
}

/// A producer whose replica holds no committee seat surfaces a typed error.
#[test]
fn test_non_member_producer_rejected() {
    let member = make_signer(1);
    let outsider = make_signer(9);
    // Committee contains only the member; the outsider tries to produce.
    let view_state = ViewState::new(
        Committee::new(vec![Identity {
            id: member.replica_id(),
            public_key: member.public_key(),
            weight: 1,
            role: Role::Consensus,
        }]),
        outsider.replica_id(),
    );
    let producer = BlockProducer::new(outsider, view_state, FixedBuilder(Hash([7u8; 32])), "testnet");

    let err = producer.make_block_proposal(5, &make_parent(4, 10)).unwrap_err();
    assert!(err.to_string().contains("not in the committee"));
}

/// A builder failure aborts the attempt with a typed error, no retry.
#[test]
fn test_builder_failure_aborts_attempt() {
    let signer = make_signer(1);
    let producer = BlockProducer::new(
        signer.clone(),
        make_view_state(&signer),
        FailingBuilder,
        "testnet",
    );

    let err = producer.make_block_proposal(5, &make_parent(4, 10)).unwrap_err();
    assert!(matches!(err, ProducerError::Builder(BuilderError::Unavailable(_))));
    assert!(err.to_string().contains("mempool down"));
}

/// The builder is called exactly once per attempt, keyed by the parent id
/// derived from the certified parent.
#[test]
fn test_builder_called_once_with_parent_id() {
    let signer = make_signer(1);
    let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let builder = RecordingBuilder(calls.clone());
    let parent = make_parent(4, 10);
    let parent_id = parent.block.id();

    let producer = BlockProducer::new(signer.clone(), make_view_state(&signer), builder, "testnet");
    producer.make_block_proposal(5, &parent).unwrap();

    assert_eq!(calls.borrow().as_slice(), &[parent_id]);
}

/// The proposal embeds the exact parent QC used for the height computation.
#[test]
fn test_embeds_exact_parent_qc() {
    let signer = make_signer(1);
    let producer = BlockProducer::new(
        signer.clone(),
        make_view_state(&signer),
        FixedBuilder(Hash([7u8; 32])),
        "testnet",
    );

    let parent = make_parent(4, 10);
    let proposal = producer.make_block_proposal(5, &parent).unwrap();
    assert_eq!(proposal.block.parent_qc, parent.qc);
}

/// The leader's signature over the unsigned proposal verifies, and
/// tampering with the payload invalidates it.
#[test]
fn test_proposal_signature_covers_whole_proposal() {
    let signer = make_signer(1);
    let verifier = SigVerifier::new(tags(), AggregateScheme::SignatureList);
    let producer = BlockProducer::new(
        signer.clone(),
        make_view_state(&signer),
        FixedBuilder(Hash([7u8; 32])),
        "testnet",
    );

    let proposal = producer.make_block_proposal(5, &make_parent(4, 10)).unwrap();
    assert!(verifier
        .verify_proposal(
            &proposal.signature,
            &proposal.block,
            &proposal.proposer,
            &signer.public_key()
        )
        .unwrap());

    let mut tampered = proposal.block.clone();
    tampered.payload_hash = Hash([8u8; 32]);
    assert!(!verifier
        .verify_proposal(&proposal.signature, &tampered, &proposal.proposer, &signer.public_key())
        .unwrap());
}
