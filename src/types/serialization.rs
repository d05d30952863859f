//! Canonical byte encoding.
//!
//! Signing bytes (`block_signing_bytes`, `proposal_signing_bytes`) are the
//! single source of truth for what a signature covers: fixed big-endian
//! layout, versioned, and excluding every signature field. Signer and
//! verifier both derive the message from these functions and never from
//! bytes carried inside a vote or proposal.
//!
//! The wire codecs (`encode_vote`/`decode_vote`, ...) use the same encoder
//! but do include signatures.

use crate::types::{
    block::{AggregateSignature, Block, QuorumCertificate},
    hash::Hash,
    proposal::BlockProposal,
    vote::{Signature, Vote},
    ReplicaId,
};

/// Bumped on any layout change; signed messages from one version never
/// verify under another.
pub const CODEC_VERSION: u8 = 1;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("unexpected eof")]
    Eof,
    #[error("invalid data: {0}")]
    Invalid(&'static str),
}

pub struct Encoder {
    buf: Vec<u8>,
}
impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }
    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    pub fn put_bytes32(&mut self, v: &[u8; 32]) {
        self.buf.extend_from_slice(v);
    }
    pub fn put_bytes64(&mut self, v: &[u8; 64]) {
        self.buf.extend_from_slice(v);
    }
    pub fn put_str(&mut self, s: &str) {
        self.put_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }
}

pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}
impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + n > self.data.len() {
            return Err(CodecError::Eof);
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }
    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }
    pub fn get_bytes32(&mut self) -> Result<[u8; 32], CodecError> {
        let b = self.take(32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(b);
        Ok(out)
    }
    pub fn get_bytes64(&mut self) -> Result<[u8; 64], CodecError> {
        let b = self.take(64)?;
        let mut out = [0u8; 64];
        out.copy_from_slice(b);
        Ok(out)
    }
    pub fn get_str(&mut self) -> Result<String, CodecError> {
        let n = self.get_u32()? as usize;
        let b = self.take(n)?;
        String::from_utf8(b.to_vec()).map_err(|_| CodecError::Invalid("non-utf8 string"))
    }
    pub fn finish(&self) -> Result<(), CodecError> {
        if self.pos != self.data.len() {
            return Err(CodecError::Invalid("trailing bytes"));
        }
        Ok(())
    }
}

// ---- signing bytes ----

/// The message an honest voter signs for a block. Excludes the parent QC's
/// aggregated signature (a signature field); the QC's view, block id and
/// signer set are block content and stay in.
pub fn block_signing_bytes(b: &Block) -> Vec<u8> {
    let mut e = Encoder::new();
    e.put_u8(CODEC_VERSION);
    e.put_str(&b.chain_id);
    e.put_u64(b.view);
    e.put_u64(b.height);
    e.put_bytes32(&b.parent_id.0);
    e.put_u64(b.parent_qc.view);
    e.put_bytes32(&b.parent_qc.block_id.0);
    e.put_u32(b.parent_qc.signers.len() as u32);
    for s in &b.parent_qc.signers {
        e.put_bytes32(&s.0);
    }
    e.put_bytes32(&b.payload_hash.0);
    e.into_bytes()
}

/// The message the leader signs for a proposal: the block signing bytes plus
/// the proposer id. Longer than the block message and domain-tagged
/// differently, so the two can never collide.
pub fn proposal_signing_bytes(block: &Block, proposer: &ReplicaId) -> Vec<u8> {
    let mut bytes = block_signing_bytes(block);
    bytes.extend_from_slice(&proposer.0);
    bytes
}

// ---- wire codecs ----

pub fn encode_vote(v: &Vote) -> Vec<u8> {
    let mut e = Encoder::new();
    e.put_u8(CODEC_VERSION);
    e.put_u64(v.view);
    e.put_bytes32(&v.block_id.0);
    e.put_bytes32(&v.signer.0);
    e.put_bytes64(&v.signature.0);
    e.into_bytes()
}

pub fn decode_vote(data: &[u8]) -> Result<Vote, CodecError> {
    let mut d = Decoder::new(data);
    check_version(d.get_u8()?)?;
    let vote = Vote {
        view: d.get_u64()?,
        block_id: Hash(d.get_bytes32()?),
        signer: ReplicaId(d.get_bytes32()?),
        signature: Signature(d.get_bytes64()?),
    };
    d.finish()?;
    Ok(vote)
}

fn encode_qc(e: &mut Encoder, qc: &QuorumCertificate) {
    e.put_u64(qc.view);
    e.put_bytes32(&qc.block_id.0);
    e.put_u32(qc.signers.len() as u32);
    for s in &qc.signers {
        e.put_bytes32(&s.0);
    }
    e.put_u32(qc.signatures.len() as u32);
    for sig in &qc.signatures.0 {
        e.put_bytes64(&sig.0);
    }
}

fn decode_qc(d: &mut Decoder<'_>) -> Result<QuorumCertificate, CodecError> {
    let view = d.get_u64()?;
    let block_id = Hash(d.get_bytes32()?);
    let n_signers = d.get_u32()? as usize;
    let mut signers = Vec::with_capacity(n_signers);
    for _ in 0..n_signers {
        signers.push(ReplicaId(d.get_bytes32()?));
    }
    let n_sigs = d.get_u32()? as usize;
    if n_sigs != n_signers {
        return Err(CodecError::Invalid("qc signer/signature count mismatch"));
    }
    let mut sigs = Vec::with_capacity(n_sigs);
    for _ in 0..n_sigs {
        sigs.push(Signature(d.get_bytes64()?));
    }
    Ok(QuorumCertificate {
        view,
        block_id,
        signers,
        signatures: AggregateSignature(sigs),
    })
}

fn encode_block_inner(e: &mut Encoder, b: &Block) {
    e.put_str(&b.chain_id);
    e.put_u64(b.view);
    e.put_u64(b.height);
    e.put_bytes32(&b.parent_id.0);
    encode_qc(e, &b.parent_qc);
    e.put_bytes32(&b.payload_hash.0);
}

fn decode_block_inner(d: &mut Decoder<'_>) -> Result<Block, CodecError> {
    Ok(Block {
        chain_id: d.get_str()?,
        view: d.get_u64()?,
        height: d.get_u64()?,
        parent_id: Hash(d.get_bytes32()?),
        parent_qc: decode_qc(d)?,
        payload_hash: Hash(d.get_bytes32()?),
    })
}

pub fn encode_block(b: &Block) -> Vec<u8> {
    let mut e = Encoder::new();
    e.put_u8(CODEC_VERSION);
    encode_block_inner(&mut e, b);
    e.into_bytes()
}

pub fn decode_block(data: &[u8]) -> Result<Block, CodecError> {
    let mut d = Decoder::new(data);
    check_version(d.get_u8()?)?;
    let b = decode_block_inner(&mut d)?;
    d.finish()?;
    Ok(b)
}

pub fn encode_proposal(p: &BlockProposal) -> Vec<u8> {
    let mut e = Encoder::new();
    e.put_u8(CODEC_VERSION);
    encode_block_inner(&mut e, &p.block);
    e.put_bytes32(&p.proposer.0);
    e.put_bytes64(&p.signature.0);
    e.into_bytes()
}

pub fn decode_proposal(data: &[u8]) -> Result<BlockProposal, CodecError> {
    let mut d = Decoder::new(data);
    check_version(d.get_u8()?)?;
    let block = decode_block_inner(&mut d)?;
    let proposer = ReplicaId(d.get_bytes32()?);
    let signature = Signature(d.get_bytes64()?);
    d.finish()?;
    Ok(BlockProposal { block, proposer, signature })
}

fn check_version(v: u8) -> Result<(), CodecError> {
    if v != CODEC_VERSION {
        return Err(CodecError::Invalid("unknown codec version"));
    }
    Ok(())
}
