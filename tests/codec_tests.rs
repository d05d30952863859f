//! Wire codec tests: malformed input surfaces typed errors, never panics,
//! and the signing encoding actually excludes signature bytes.

use ed25519_dalek::SigningKey;
use hotstuff_core::crypto::{ConsensusSigner, DomainTags, StakingSigner};
use hotstuff_core::types::serialization::{
    block_signing_bytes, decode_proposal, decode_vote, encode_proposal, encode_vote, CodecError,
};
use hotstuff_core::types::{
    AggregateSignature, Block, BlockProposal, Hash, QuorumCertificate, ReplicaId, Signature,
};

fn tags() -> DomainTags {
    DomainTags::new("consensus-proposal-v1", "consensus-vote-v1").unwrap()
}

fn make_block(view: u64) -> Block {
    Block {
        chain_id: "testnet".to_string(),
        view,
        height: 1,
        parent_id: Hash([9u8; 32]),
        parent_qc: QuorumCertificate {
            view: view - 1,
            block_id: Hash([9u8; 32]),
            signers: vec![ReplicaId([1u8; 32]), ReplicaId([2u8; 32])],
            signatures: AggregateSignature(vec![Signature([3u8; 64]), Signature([4u8; 64])]),
        },
        payload_hash: Hash([7u8; 32]),
    }
}

#[test]
fn test_vote_wire_roundtrip() {
    let signer = StakingSigner::new(SigningKey::from_bytes(&[1u8; 32]), tags());
    let vote = signer.vote_for(&make_block(5));

    let bytes = encode_vote(&vote);
    let decoded = decode_vote(&bytes).unwrap();
    assert_eq!(decoded, vote);
}

#[test]
fn test_proposal_wire_roundtrip() {
    let signer = StakingSigner::new(SigningKey::from_bytes(&[1u8; 32]), tags());
    let block = make_block(5);
    let proposal = BlockProposal {
        proposer: signer.replica_id(),
        signature: signer.sign_vote(&block), // any 64 bytes will do on the wire
        block,
    };

    let bytes = encode_proposal(&proposal);
    let decoded = decode_proposal(&bytes).unwrap();
    assert_eq!(decoded, proposal);
}

#[test]
fn test_truncated_input_is_eof() {
    let signer = StakingSigner::new(SigningKey::from_bytes(&[1u8; 32]), tags());
    let bytes = encode_vote(&signer.vote_for(&make_block(5)));

    let err = decode_vote(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, CodecError::Eof));
}

#[test]
fn test_trailing_bytes_rejected() {
    let signer = StakingSigner::new(SigningKey::from_bytes(&[1u8; 32]), tags());
    let mut bytes = encode_vote(&signer.vote_for(&make_block(5)));
    bytes.push(0);

    let err = decode_vote(&bytes).unwrap_err();
    assert!(err.to_string().contains("trailing"));
}

#[test]
fn test_unknown_version_rejected() {
    let signer = StakingSigner::new(SigningKey::from_bytes(&[1u8; 32]), tags());
    let mut bytes = encode_vote(&signer.vote_for(&make_block(5)));
    bytes[0] = 0xFF;

    let err = decode_vote(&bytes).unwrap_err();
    assert!(err.to_string().contains("version"));
}

/// The signing encoding covers block content but none of the parent QC's
/// signature bytes: two blocks differing only there sign identically, while
/// any content change alters the message.
#[test]
fn test_signing_bytes_exclude_signatures() {
    let a = make_block(5);

    let mut b = a.clone();
    b.parent_qc.signatures = AggregateSignature(vec![Signature([9u8; 64]), Signature([9u8; 64])]);
    assert_eq!(block_signing_bytes(&a), block_signing_bytes(&b));

    let mut c = a.clone();
    c.payload_hash = Hash([8u8; 32]);
    assert_ne!(block_signing_bytes(&a), block_signing_bytes(&c));

    let mut d = a.clone();
    d.parent_qc.signers.pop();
    assert_ne!(
        block_signing_bytes(&a),
        block_signing_bytes(&d),
        "QC signer set is content and must be covered"
    );
}
