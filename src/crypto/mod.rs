pub mod hash;
pub mod keys;
pub mod signer;
pub mod verifier;

pub use signer::{ConfigError, ConsensusSigner, DomainTags, StakingSigner};
pub use verifier::{AggregateScheme, CryptoError, SigVerifier};
