// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Low-level Michelson wire plumbing: the closed opcode table (component
//! 1) and the Zarith variable-length integer codec (component 2). The
//! `michelson` crate builds its primitive tree codec on top of these.

pub mod error;
pub mod opcode;
pub mod zarith;

pub use error::EncodingError;
pub use opcode::{OpCode, OpCodeError, OpKind};
pub use zarith::{from_zarith_bytes, to_zarith_bytes};
