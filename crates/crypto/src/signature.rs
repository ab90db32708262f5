// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Signature text encoding. Michelson `signature` values carry no curve
//! tag, so they always render with the generic `sig` prefix rather than
//! a curve-specific one (`edsig`/`spsig`/`p2sig`) - matching the chain
//! client's own behaviour when the signing curve isn't known from context.

use failure::Fail;

use crate::hash::{self, HashType};

#[derive(Debug, Fail)]
pub enum SignatureError {
    #[fail(display = "signature payload must be exactly 64 bytes, got {}", len)]
    WrongLength { len: usize },
    #[fail(display = "base58check decode failed: {}", _0)]
    Base58(String),
}

pub fn decode_to_text(bytes: &[u8]) -> Result<String, SignatureError> {
    if bytes.len() != 64 {
        return Err(SignatureError::WrongLength { len: bytes.len() });
    }
    Ok(hash::encode(HashType::GenericSignature, bytes))
}

pub fn encode_to_bytes(text: &str) -> Result<Vec<u8>, SignatureError> {
    hash::decode(HashType::GenericSignature, text).map_err(|e| SignatureError::Base58(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let bytes = vec![0x5au8; 64];
        let text = decode_to_text(&bytes).unwrap();
        assert!(text.starts_with("sig"));
        assert_eq!(encode_to_bytes(&text).unwrap(), bytes);
    }
}
