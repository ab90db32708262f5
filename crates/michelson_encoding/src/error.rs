// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Low-level decode failures shared by the Zarith codec and the
//! primitive binary reader/writer.

use failure::Fail;

#[derive(Debug, Fail, PartialEq)]
pub enum EncodingError {
    #[fail(display = "buffer too short: needed {} bytes, had {}", needed, available)]
    ShortBuffer { needed: usize, available: usize },
    #[fail(display = "leading tag byte {:#04x} is not a known primitive tag", tag)]
    BadTag { tag: u8 },
    #[fail(display = "{} extra bytes after a fully-decoded value", extra)]
    TrailingData { extra: usize },
    #[fail(display = "opcode error: {}", _0)]
    Opcode(#[cause] crate::opcode::OpCodeError),
    #[fail(display = "string payload is not valid UTF-8")]
    InvalidUtf8,
}

impl From<crate::opcode::OpCodeError> for EncodingError {
    fn from(e: crate::opcode::OpCodeError) -> Self {
        EncodingError::Opcode(e)
    }
}
