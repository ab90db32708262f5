// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! BLAKE2b hashing used throughout the chain: content addressing for
//! expression hashes, context indices, and the 20-byte key-hash digest
//! of a public key.

use blake2::digest::{Input, VariableOutput};
use blake2::VarBlake2b;
use failure::Fail;

#[derive(Debug, Fail)]
pub enum Blake2bError {
    #[fail(display = "invalid output size requested: {}", size)]
    InvalidOutputSize { size: usize },
}

/// BLAKE2b with a 32-byte digest, e.g. expression hashes (`0x05 || bytes`).
pub fn digest_256(data: &[u8]) -> Vec<u8> {
    digest(data, 32).expect("32 is a valid blake2b output size")
}

/// BLAKE2b with a 20-byte digest, e.g. public-key hashes (`tz1`/`tz2`/`tz3`).
pub fn digest_160(data: &[u8]) -> Vec<u8> {
    digest(data, 20).expect("20 is a valid blake2b output size")
}

pub fn digest(data: &[u8], size: usize) -> Result<Vec<u8>, Blake2bError> {
    let mut hasher = VarBlake2b::new(size).map_err(|_| Blake2bError::InvalidOutputSize { size })?;
    hasher.input(data);
    let mut out = vec![0u8; size];
    hasher.variable_result(|res| out.copy_from_slice(res));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_256_is_32_bytes() {
        assert_eq!(digest_256(b"tezos").len(), 32);
    }

    #[test]
    fn digest_160_is_20_bytes() {
        assert_eq!(digest_160(b"tezos").len(), 20);
    }
}
