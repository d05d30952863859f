pub mod hash;
pub mod committee;
pub mod vote;
pub mod block;
pub mod proposal;
pub mod serialization;

pub use hash::Hash;
pub use committee::{Committee, Identity, ReplicaId, Role};
pub use vote::{Signature, Vote};
pub use block::{AggregateSignature, Block, CertifiedBlock, QuorumCertificate};
pub use proposal::{BlockProposal, UnsignedProposal};
pub use serialization::CodecError;
