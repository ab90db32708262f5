// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Error kinds for the primitive tree, type walker, key parser, script
//! framing and entrypoint dispatch.

use failure::Fail;

use michelson_encoding::EncodingError;

use crate::prim::Prim;

#[derive(Debug, Fail)]
pub enum PrimError {
    #[fail(display = "encoding error: {}", _0)]
    Encoding(#[cause] EncodingError),

    #[fail(display = "json error: {}", _0)]
    Json(#[cause] serde_json::Error),

    #[fail(display = "bad entrypoint path: {}", _0)]
    BadPath(String),

    #[fail(display = "bad map/big_map key: {}", _0)]
    BadKey(String),

    #[fail(display = "type mismatch: value {:?} does not fit type {:?}", value, ty)]
    TypeMismatch { ty: Prim, value: Prim },

    #[fail(display = "walk exceeded max depth {}", max_depth)]
    MaxDepth { max_depth: u32 },

    #[fail(display = "broken primitive: {}", _0)]
    BrokenPrim(String),

    #[fail(display = "unknown entrypoint {:?}, resolved branch {:?}", name, branch)]
    UnknownEntrypoint { name: String, branch: String },

    #[fail(display = "unpack failed: {}", _0)]
    UnpackFailed(String),

    #[fail(display = "annotation conflict: {}", _0)]
    AnnoConflict(String),
}

impl From<EncodingError> for PrimError {
    fn from(e: EncodingError) -> Self {
        PrimError::Encoding(e)
    }
}

impl From<serde_json::Error> for PrimError {
    fn from(e: serde_json::Error) -> Self {
        PrimError::Json(e)
    }
}
