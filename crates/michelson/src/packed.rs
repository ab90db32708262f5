// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Packed-value detection and unpacking. `PACK` prefixes
//! a re-encodable primitive with the byte `0x05`; `Prim::unpack_all`
//! (prim.rs) drives the recursive pass over a whole tree.

use crate::error::PrimError;
use crate::prim::Prim;

/// True iff `bytes` begins with the packed-value marker and is long
/// enough to plausibly contain a primitive after it.
pub fn is_packed(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x05
}

/// Strips the `0x05` marker and decodes the remainder as a `Prim`.
pub fn unpack(bytes: &[u8]) -> Result<Prim, PrimError> {
    if !is_packed(bytes) {
        return Err(PrimError::UnpackFailed("missing 0x05 packed-value marker".into()));
    }
    Prim::from_bytes(&bytes[1..])
}

/// The inverse of `unpack`: encodes `prim` and prepends the marker.
pub fn pack(prim: &Prim) -> Vec<u8> {
    let mut out = vec![0x05u8];
    out.extend(prim.encode());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn pack_unpack_round_trip() {
        let p = Prim::int(BigInt::from(42));
        let packed = pack(&p);
        assert!(is_packed(&packed));
        let unpacked = unpack(&packed).unwrap();
        assert_eq!(unpacked, p);
    }

    #[test]
    fn unpack_all_is_idempotent() {
        let inner = Prim::int(BigInt::from(7));
        let packed_bytes = pack(&inner);
        let tree = Prim::bytes(packed_bytes);
        let once = tree.unpack_all();
        let twice = once.unpack_all();
        assert_eq!(once, twice);
        assert!(once.was_packed());
    }

    #[test]
    fn unpack_failure_leaves_bytes_untouched() {
        let garbage = Prim::bytes(vec![0x05, 0xff, 0xff]);
        let result = garbage.unpack_all();
        assert_eq!(result, garbage);
    }

    #[test]
    fn non_packed_bytes_are_untouched() {
        let plain = Prim::bytes(vec![0x01, 0x02, 0x03]);
        assert_eq!(plain.unpack_all(), plain);
    }
}
