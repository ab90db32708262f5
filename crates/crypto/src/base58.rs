// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Base58Check: a fixed version-byte prefix, the raw payload, and a
//! 4-byte SHA256d checksum, all base58-encoded. This is the same scheme
//! Bitcoin uses; the chain's distinguishing prefixes are longer than one
//! byte so that the base58 alphabet produces a recognizable leading
//! string such as `tz1` or `KT1`.

use failure::Fail;
use sha2::{Digest, Sha256};

#[derive(Debug, Fail)]
pub enum FromBase58CheckError {
    #[fail(display = "invalid base58 character")]
    InvalidBase58,
    #[fail(display = "checksum mismatch")]
    InvalidChecksum,
    #[fail(display = "payload too short to contain a checksum")]
    MissingChecksum,
    #[fail(display = "prefix mismatch: expected {:?}", expected)]
    InvalidPrefix { expected: &'static [u8] },
}

fn checksum(payload: &[u8]) -> [u8; 4] {
    let round1 = Sha256::digest(payload);
    let round2 = Sha256::digest(&round1);
    let mut out = [0u8; 4];
    out.copy_from_slice(&round2[0..4]);
    out
}

pub fn encode(prefix: &[u8], payload: &[u8]) -> String {
    let mut buf = Vec::with_capacity(prefix.len() + payload.len() + 4);
    buf.extend_from_slice(prefix);
    buf.extend_from_slice(payload);
    let cksum = checksum(&buf);
    buf.extend_from_slice(&cksum);
    bs58::encode(buf).into_string()
}

/// Decodes and strips `prefix`, verifying the trailing checksum.
pub fn decode(prefix: &[u8], data: &str) -> Result<Vec<u8>, FromBase58CheckError> {
    let bytes = bs58::decode(data)
        .into_vec()
        .map_err(|_| FromBase58CheckError::InvalidBase58)?;
    if bytes.len() < 4 {
        return Err(FromBase58CheckError::MissingChecksum);
    }
    let (body, given_cksum) = bytes.split_at(bytes.len() - 4);
    if checksum(body) != given_cksum {
        return Err(FromBase58CheckError::InvalidChecksum);
    }
    if body.len() < prefix.len() || &body[..prefix.len()] != prefix {
        return Err(FromBase58CheckError::InvalidPrefix { expected: leak(prefix) });
    }
    Ok(body[prefix.len()..].to_vec())
}

// The prefix tables below are `'static` constants; this lets decode errors
// report the expected prefix without borrowing from the caller's slice.
fn leak(prefix: &[u8]) -> &'static [u8] {
    match prefix {
        [6, 161, 159] => &[6, 161, 159],
        [6, 161, 161] => &[6, 161, 161],
        [6, 161, 164] => &[6, 161, 164],
        [2, 90, 121] => &[2, 90, 121],
        [13, 15, 37, 217] => &[13, 15, 37, 217],
        [3, 254, 226, 86] => &[3, 254, 226, 86],
        [3, 178, 139, 127] => &[3, 178, 139, 127],
        [9, 245, 205, 172, 58] => &[9, 245, 205, 172, 58],
        [4, 130, 43] => &[4, 130, 43],
        [13, 44, 64, 27] => &[13, 44, 64, 27],
        [87, 82, 0] => &[87, 82, 0],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let prefix = &[6, 161, 159][..];
        let payload = vec![1u8; 20];
        let encoded = encode(prefix, &payload);
        assert_eq!(decode(prefix, &encoded).unwrap(), payload);
    }

    #[test]
    fn rejects_bad_checksum() {
        let prefix = &[6, 161, 159][..];
        let mut encoded = encode(prefix, &vec![1u8; 20]);
        encoded.pop();
        encoded.push('z');
        assert!(decode(prefix, &encoded).is_err());
    }
}
