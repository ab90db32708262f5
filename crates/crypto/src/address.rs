// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Contract id (address) encoding: the 22-byte padded binary form used
//! inside Michelson `bytes` payloads, and its base58check text form
//! (`tz1…`/`tz2…`/`tz3…`/`KT1…`).
//!
//! Binary layout (22 bytes total):
//! - implicit account: `0x00`, curve tag (`0x00` ed25519 / `0x01`
//!   secp256k1 / `0x02` p256), 20-byte public key hash
//! - originated contract: `0x01`, 20-byte contract hash, `0x00` padding

use failure::Fail;

use crate::hash::{self, HashType};

#[derive(Debug, Fail)]
pub enum AddressError {
    #[fail(display = "address payload must be exactly 22 bytes, got {}", len)]
    WrongLength { len: usize },
    #[fail(display = "unknown address tag byte {}", tag)]
    UnknownTag { tag: u8 },
    #[fail(display = "unknown curve tag byte {}", tag)]
    UnknownCurve { tag: u8 },
    #[fail(display = "base58check decode failed: {}", _0)]
    Base58(String),
    #[fail(display = "address text is too short")]
    TooShort,
}

pub fn decode_to_text(bytes: &[u8]) -> Result<String, AddressError> {
    if bytes.len() != 22 {
        return Err(AddressError::WrongLength { len: bytes.len() });
    }
    match bytes[0] {
        0x00 => {
            let hash_type = match bytes[1] {
                0x00 => HashType::ContractTz1Hash,
                0x01 => HashType::ContractTz2Hash,
                0x02 => HashType::ContractTz3Hash,
                other => return Err(AddressError::UnknownCurve { tag: other }),
            };
            Ok(hash::encode(hash_type, &bytes[2..22]))
        }
        0x01 => Ok(hash::encode(HashType::ContractKt1Hash, &bytes[1..21])),
        other => Err(AddressError::UnknownTag { tag: other }),
    }
}

pub fn encode_to_bytes(text: &str) -> Result<Vec<u8>, AddressError> {
    if text.len() < 3 {
        return Err(AddressError::TooShort);
    }
    let prefix = &text[0..3];
    let mut out = Vec::with_capacity(22);
    match prefix {
        "tz1" => {
            out.push(0x00);
            out.push(0x00);
            out.extend(hash::decode(HashType::ContractTz1Hash, text).map_err(|e| AddressError::Base58(e.to_string()))?);
        }
        "tz2" => {
            out.push(0x00);
            out.push(0x01);
            out.extend(hash::decode(HashType::ContractTz2Hash, text).map_err(|e| AddressError::Base58(e.to_string()))?);
        }
        "tz3" => {
            out.push(0x00);
            out.push(0x02);
            out.extend(hash::decode(HashType::ContractTz3Hash, text).map_err(|e| AddressError::Base58(e.to_string()))?);
        }
        "KT1" => {
            out.push(0x01);
            out.extend(hash::decode(HashType::ContractKt1Hash, text).map_err(|e| AddressError::Base58(e.to_string()))?);
            out.push(0x00);
        }
        _ => return Err(AddressError::UnknownTag { tag: 0xff }),
    }
    Ok(out)
}
