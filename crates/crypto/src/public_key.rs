// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Public key text encoding for Michelson `key` values: a 1-byte curve
//! tag followed by the raw curve point.

use failure::Fail;

use crate::hash::{self, HashType};

#[derive(Debug, Fail)]
pub enum PublicKeyError {
    #[fail(display = "public key payload is empty")]
    Empty,
    #[fail(display = "unsupported curve tag {}", tag)]
    UnsupportedCurve { tag: u8 },
    #[fail(display = "base58check decode failed: {}", _0)]
    Base58(String),
}

pub fn decode_to_text(bytes: &[u8]) -> Result<String, PublicKeyError> {
    let (tag, rest) = bytes.split_first().ok_or(PublicKeyError::Empty)?;
    match tag {
        0x00 => Ok(hash::encode(HashType::PublicKeyEd25519, rest)),
        0x01 => Ok(hash::encode(HashType::PublicKeySecp256k1, rest)),
        0x02 => Ok(hash::encode(HashType::PublicKeyP256, rest)),
        other => Err(PublicKeyError::UnsupportedCurve { tag: *other }),
    }
}

pub fn encode_to_bytes(text: &str) -> Result<Vec<u8>, PublicKeyError> {
    let (tag, hash_type) = if text.starts_with("edpk") {
        (0x00u8, HashType::PublicKeyEd25519)
    } else if text.starts_with("sppk") {
        (0x01u8, HashType::PublicKeySecp256k1)
    } else if text.starts_with("p2pk") {
        (0x02u8, HashType::PublicKeyP256)
    } else {
        return Err(PublicKeyError::UnsupportedCurve { tag: 0xff });
    };
    let mut out = vec![tag];
    out.extend(hash::decode(hash_type, text).map_err(|e| PublicKeyError::Base58(e.to_string()))?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_round_trip() {
        let mut raw = vec![0x00u8];
        raw.extend(vec![0x07u8; 32]);
        let text = decode_to_text(&raw).unwrap();
        assert!(text.starts_with("edpk"));
        assert_eq!(encode_to_bytes(&text).unwrap(), raw);
    }

    #[test]
    fn secp256k1_round_trip() {
        let mut raw = vec![0x01u8];
        raw.extend(vec![0x11u8; 33]);
        let text = decode_to_text(&raw).unwrap();
        assert!(text.starts_with("sppk"));
        assert_eq!(encode_to_bytes(&text).unwrap(), raw);
    }

    #[test]
    fn p256_round_trip() {
        let mut raw = vec![0x02u8];
        raw.extend(vec![0x22u8; 33]);
        let text = decode_to_text(&raw).unwrap();
        assert!(text.starts_with("p2pk"));
        assert_eq!(encode_to_bytes(&text).unwrap(), raw);
    }

    #[test]
    fn unknown_curve_tag_is_rejected() {
        let raw = vec![0x09u8, 0x01, 0x02];
        assert!(decode_to_text(&raw).is_err());
    }
}
