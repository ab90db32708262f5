// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Zarith: the variable-length signed big integer encoding used for
//! Michelson `Int` primitives. The head byte carries the sign in bit 6
//! and 6 payload bits; every subsequent byte carries 7 payload bits with
//! a continuation flag in bit 7.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::error::EncodingError;

/// Encodes a signed big integer using the base-128 continuation scheme.
pub fn encode(value: &BigInt) -> Vec<u8> {
    let negative = value.sign() == Sign::Minus;
    let mut magnitude: BigUint = value.magnitude().clone();

    let mut out = Vec::new();

    // Head byte: bit7 continuation, bit6 sign, bits0-5 payload.
    let six_bits = (&magnitude & BigUint::from(0x3fu8)).to_u8().unwrap_or(0);
    magnitude >>= 6usize;
    let mut head = six_bits & 0x3f;
    if negative {
        head |= 0x40;
    }
    if !magnitude.is_zero() {
        head |= 0x80;
    }
    out.push(head);

    while !magnitude.is_zero() {
        let seven_bits = (&magnitude & BigUint::from(0x7fu8)).to_u8().unwrap_or(0);
        magnitude >>= 7usize;
        let mut byte = seven_bits & 0x7f;
        if !magnitude.is_zero() {
            byte |= 0x80;
        }
        out.push(byte);
    }

    out
}

/// Decodes a Zarith integer from the front of `bytes`, returning the
/// value and the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(BigInt, usize), EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::ShortBuffer { needed: 1, available: 0 });
    }

    let head = bytes[0];
    let negative = head & 0x40 != 0;
    let mut magnitude = BigInt::from(head & 0x3f);
    let mut shift: u32 = 6;
    let mut consumed = 1;
    let mut more = head & 0x80 != 0;

    while more {
        if consumed >= bytes.len() {
            return Err(EncodingError::ShortBuffer { needed: consumed + 1, available: bytes.len() });
        }
        let byte = bytes[consumed];
        magnitude |= BigInt::from(byte & 0x7f) << shift;
        more = byte & 0x80 != 0;
        shift += 7;
        consumed += 1;
    }

    let value = if negative { -magnitude } else { magnitude };
    Ok((value, consumed))
}

/// Convenience wrapper used at the encoding boundary: decodes a single
/// Zarith value and requires the whole buffer to be consumed.
pub fn from_zarith_bytes(bytes: &[u8]) -> Result<BigInt, EncodingError> {
    let (value, consumed) = decode(bytes)?;
    if consumed != bytes.len() {
        return Err(EncodingError::TrailingData { extra: bytes.len() - consumed });
    }
    Ok(value)
}

pub fn to_zarith_bytes(value: &BigInt) -> Vec<u8> {
    encode(value)
}
