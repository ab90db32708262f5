// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Opaque binary<->text converters for addresses, keys, signatures and
//! chain ids, plus the BLAKE2b hashing primitive used for content
//! addressing. The Michelson core treats this crate as an external
//! collaborator: it calls these functions but never reimplements
//! base58check or curve handling itself.

pub mod address;
pub mod base58;
pub mod blake2b;
pub mod chain_id;
pub mod hash;
pub mod public_key;
pub mod signature;
