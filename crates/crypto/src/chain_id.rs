// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Chain id text encoding for `T_CHAIN_ID` (4-byte value, `Net…` prefix).

use failure::Fail;

use crate::hash::{self, HashType};

#[derive(Debug, Fail)]
pub enum ChainIdError {
    #[fail(display = "chain id payload must be exactly 4 bytes, got {}", len)]
    WrongLength { len: usize },
    #[fail(display = "base58check decode failed: {}", _0)]
    Base58(String),
}

pub fn decode_to_text(bytes: &[u8]) -> Result<String, ChainIdError> {
    if bytes.len() != 4 {
        return Err(ChainIdError::WrongLength { len: bytes.len() });
    }
    Ok(hash::encode(HashType::ChainId, bytes))
}

pub fn encode_to_bytes(text: &str) -> Result<Vec<u8>, ChainIdError> {
    hash::decode(HashType::ChainId, text).map_err(|e| ChainIdError::Base58(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let bytes = vec![0xAAu8, 0xBB, 0xCC, 0xDD];
        let text = decode_to_text(&bytes).unwrap();
        assert!(text.starts_with("Net"));
        assert_eq!(encode_to_bytes(&text).unwrap(), bytes);
    }
}
