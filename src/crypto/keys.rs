use std::fs;
use std::path::Path;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_core::OsRng;
use anyhow::Result;

use crate::types::ReplicaId;

pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
    let sk = SigningKey::generate(&mut OsRng);
    let vk = sk.verifying_key();
    (sk, vk)
}

/// The replica id is the staking public key.
pub fn replica_id(vk: &VerifyingKey) -> ReplicaId {
    ReplicaId(vk.to_bytes())
}

pub fn load_or_generate_keypair<P: AsRef<Path>>(
    path: P,
) -> Result<(SigningKey, VerifyingKey)> {
    let path = path.as_ref();

    if path.exists() {
        let bytes = fs::read(path)?;
        if bytes.len() != 32 {
            anyhow::bail!("invalid staking key file length");
        }
        let mut sk_bytes = [0u8; 32];
        sk_bytes.copy_from_slice(&bytes);
        let signing = SigningKey::from_bytes(&sk_bytes);
        let verify = signing.verifying_key();
        Ok((signing, verify))
    } else {
        let (signing, verify) = generate_keypair();
        fs::write(path, signing.to_bytes())?;
        Ok((signing, verify))
    }
}
