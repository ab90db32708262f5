// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Base58Check prefixes for the hash/key kinds the Michelson scalar
//! renderer needs to interface with (`T_ADDRESS`, `T_KEY`, `T_SIGNATURE`,
//! `T_CHAIN_ID`, and the expression hash used for big-map key hashing).
//! This module is the "opaque binary<->text converter" boundary: the
//! Michelson core treats these as black boxes and never inspects the
//! curve-specific internals.

use crate::base58::{self, FromBase58CheckError};

/// A named base58check prefix/length pair, one entry per supported hash
/// kind. `HashType` is a closed, process-wide constant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// `tz1` - ed25519 public key hash (20 bytes)
    ContractTz1Hash,
    /// `tz2` - secp256k1 public key hash (20 bytes)
    ContractTz2Hash,
    /// `tz3` - p256 public key hash (20 bytes)
    ContractTz3Hash,
    /// `KT1` - originated contract hash (20 bytes)
    ContractKt1Hash,
    /// `edpk` - ed25519 public key (32 bytes)
    PublicKeyEd25519,
    /// `sppk` - secp256k1 public key (33 bytes, compressed point)
    PublicKeySecp256k1,
    /// `p2pk` - P-256 public key (33 bytes, compressed point)
    PublicKeyP256,
    /// `edsig` - ed25519 signature (64 bytes)
    SignatureEd25519,
    /// generic `sig` signature (64 bytes)
    GenericSignature,
    /// `expr` - script expression hash (32 bytes)
    ScriptExprHash,
    /// `Net` - chain id (4 bytes)
    ChainId,
}

impl HashType {
    pub fn base58check_prefix(&self) -> &'static [u8] {
        match self {
            HashType::ContractTz1Hash => &[6, 161, 159],
            HashType::ContractTz2Hash => &[6, 161, 161],
            HashType::ContractTz3Hash => &[6, 161, 164],
            HashType::ContractKt1Hash => &[2, 90, 121],
            HashType::PublicKeyEd25519 => &[13, 15, 37, 217],
            HashType::PublicKeySecp256k1 => &[3, 254, 226, 86],
            HashType::PublicKeyP256 => &[3, 178, 139, 127],
            HashType::SignatureEd25519 => &[9, 245, 205, 172, 58],
            HashType::GenericSignature => &[4, 130, 43],
            HashType::ScriptExprHash => &[13, 44, 64, 27],
            HashType::ChainId => &[87, 82, 0],
        }
    }

    pub fn payload_len(&self) -> usize {
        match self {
            HashType::ContractTz1Hash
            | HashType::ContractTz2Hash
            | HashType::ContractTz3Hash
            | HashType::ContractKt1Hash => 20,
            HashType::PublicKeyEd25519 => 32,
            HashType::PublicKeySecp256k1 | HashType::PublicKeyP256 => 33,
            HashType::SignatureEd25519 | HashType::GenericSignature => 64,
            HashType::ScriptExprHash => 32,
            HashType::ChainId => 4,
        }
    }

    /// The tag byte this curve/kind uses inside the binary "tagged"
    /// address/key/signature encodings (`0x00` = ed25519, `0x01` =
    /// secp256k1, `0x02` = p256, for the key-hash/key/signature family).
    pub fn curve_tag(&self) -> Option<u8> {
        match self {
            HashType::ContractTz1Hash | HashType::PublicKeyEd25519 | HashType::SignatureEd25519 => Some(0),
            HashType::ContractTz2Hash => Some(1),
            HashType::ContractTz3Hash => Some(2),
            _ => None,
        }
    }
}

pub fn encode(hash_type: HashType, payload: &[u8]) -> String {
    base58::encode(hash_type.base58check_prefix(), payload)
}

pub fn decode(hash_type: HashType, text: &str) -> Result<Vec<u8>, FromBase58CheckError> {
    base58::decode(hash_type.base58check_prefix(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tz1_round_trip() {
        let payload = vec![0x42u8; 20];
        let text = encode(HashType::ContractTz1Hash, &payload);
        assert!(text.starts_with("tz1"));
        assert_eq!(decode(HashType::ContractTz1Hash, &text).unwrap(), payload);
    }

    #[test]
    fn expr_round_trip() {
        let payload = vec![0x7fu8; 32];
        let text = encode(HashType::ScriptExprHash, &payload);
        assert!(text.starts_with("expr"));
        assert_eq!(decode(HashType::ScriptExprHash, &text).unwrap(), payload);
    }
}
