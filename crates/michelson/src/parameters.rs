// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! `Parameters`: the entrypoint-name-plus-value call payload, its binary
//! tag encoding for the five well-known entrypoints, and dispatch to an
//! entrypoint by branch path.

use michelson_encoding::OpCode;

use crate::error::PrimError;
use crate::prim::Prim;
use crate::type_view::{enumerate_entrypoints, find_entrypoint, unwrap_longest_branch, Entrypoint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub entrypoint: String,
    pub value: Prim,
}

fn well_known_tag(name: &str) -> Option<u8> {
    match name {
        "default" => Some(0),
        "root" => Some(1),
        "do" => Some(2),
        "set_delegate" => Some(3),
        "remove_delegate" => Some(4),
        _ => None,
    }
}

fn well_known_name(tag: u8) -> Option<&'static str> {
    match tag {
        0 => Some("default"),
        1 => Some("root"),
        2 => Some("do"),
        3 => Some("set_delegate"),
        4 => Some("remove_delegate"),
        _ => None,
    }
}

impl Parameters {
    pub fn new(entrypoint: impl Into<String>, value: Prim) -> Parameters {
        Parameters { entrypoint: entrypoint.into(), value }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if let Some(tag) = well_known_tag(&self.entrypoint) {
            out.push(tag);
        } else {
            out.push(255);
            let name_bytes = self.entrypoint.as_bytes();
            out.push(name_bytes.len() as u8);
            out.extend_from_slice(name_bytes);
        }
        let value_bytes = self.value.encode();
        out.extend((value_bytes.len() as u32).to_be_bytes());
        out.extend(value_bytes);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Parameters, PrimError> {
        if bytes.is_empty() {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: 1, available: 0 }.into());
        }
        let tag = bytes[0];
        let mut at = 1;

        let entrypoint = if tag == 255 {
            if bytes.len() < at + 1 {
                return Err(michelson_encoding::EncodingError::ShortBuffer { needed: at + 1, available: bytes.len() }.into());
            }
            let len = bytes[at] as usize;
            at += 1;
            let end = at + len;
            if bytes.len() < end {
                return Err(michelson_encoding::EncodingError::ShortBuffer { needed: end, available: bytes.len() }.into());
            }
            let name = std::str::from_utf8(&bytes[at..end]).map_err(|_| michelson_encoding::EncodingError::InvalidUtf8)?.to_string();
            at = end;
            name
        } else {
            well_known_name(tag).ok_or_else(|| PrimError::BadPath(format!("unknown parameters tag byte {}", tag)))?.to_string()
        };

        // An empty body after the tag (and optional custom name)
        // implies a `D_UNIT` value.
        if at == bytes.len() {
            return Ok(Parameters { entrypoint, value: Prim::nullary(OpCode::D_UNIT) });
        }

        if bytes.len() < at + 4 {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: at + 4, available: bytes.len() }.into());
        }
        let value_len = u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize;
        at += 4;
        let end = at + value_len;
        if bytes.len() < end {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: end, available: bytes.len() }.into());
        }
        let (value, consumed) = Prim::decode(&bytes[at..end])?;
        if consumed != value_len {
            return Err(michelson_encoding::EncodingError::TrailingData { extra: value_len - consumed }.into());
        }
        if end != bytes.len() {
            return Err(michelson_encoding::EncodingError::TrailingData { extra: bytes.len() - end }.into());
        }

        Ok(Parameters { entrypoint, value })
    }

    /// Resolves `self` against `parameter_type`'s entrypoint tree,
    /// returning the matched entrypoint and the residual parameter
    /// value:
    ///
    /// - `default`/`root`/empty name: pure structural match, consuming
    ///   the longest `D_LEFT`/`D_RIGHT` prefix of `value` that matches a
    ///   registered branch.
    /// - a name matching a registered entrypoint: returned verbatim,
    ///   `value` is already scoped to that entrypoint.
    /// - any other name (including contract-specific aliases for a
    ///   branch that has no annotation of its own, e.g. FA2's
    ///   `update_adhoc_operators`): falls back to the same structural
    ///   match as `root`, since the caller's name does not appear in
    ///   the type at all.
    pub fn dispatch(&self, parameter_type: &Prim) -> Result<(Entrypoint, Prim), PrimError> {
        let entrypoints = enumerate_entrypoints(parameter_type);

        match self.entrypoint.as_str() {
            "default" | "root" | "" => unwrap_longest_branch(&entrypoints, &self.value),
            name => {
                if let Some(ep) = find_entrypoint(&entrypoints, name) {
                    return Ok((ep.clone(), self.value.clone()));
                }
                unwrap_longest_branch(&entrypoints, &self.value)
                    .map_err(|_| PrimError::UnknownEntrypoint { name: name.to_string(), branch: String::new() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn manager_parameter() -> Prim {
        Prim::binary(
            OpCode::T_OR,
            Prim::node(
                OpCode::T_LAMBDA,
                vec![Prim::nullary(OpCode::T_UNIT), Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_OPERATION))],
                vec!["%do".into()],
            ),
            Prim::node(OpCode::T_UNIT, vec![], vec!["%default".into()]),
        )
    }

    #[test]
    fn named_entrypoint_round_trips() {
        let value = Prim::nullary(OpCode::D_UNIT);
        let params = Parameters::new("do", value.clone());
        let decoded = Parameters::decode(&params.encode()).unwrap();
        assert_eq!(decoded.entrypoint, "do");
        assert!(decoded.value.eq_with_anno(&value));
    }

    #[test]
    fn custom_name_round_trips() {
        let params = Parameters::new("add_adhoc_operators", Prim::int(BigInt::from(1)));
        let decoded = Parameters::decode(&params.encode()).unwrap();
        assert_eq!(decoded.entrypoint, "add_adhoc_operators");
    }

    #[test]
    fn empty_body_implies_unit() {
        let bytes = vec![2u8]; // tag "do", no value bytes follow
        let decoded = Parameters::decode(&bytes).unwrap();
        assert_eq!(decoded.entrypoint, "do");
        assert!(decoded.value.is_opcode(OpCode::D_UNIT));
    }

    #[test]
    fn dispatch_named_entrypoint_returns_value_verbatim() {
        let params = Parameters::new("do", Prim::nullary(OpCode::D_UNIT));
        let (ep, residual) = params.dispatch(&manager_parameter()).unwrap();
        assert_eq!(ep.name, "do");
        assert!(residual.eq_with_anno(&params.value));
    }

    #[test]
    fn dispatch_default_unwraps_branch() {
        let params = Parameters::new("default", Prim::unary(OpCode::D_LEFT, Prim::nullary(OpCode::D_UNIT)));
        let (ep, _residual) = params.dispatch(&manager_parameter()).unwrap();
        assert_eq!(ep.name, "do");
    }

    #[test]
    fn dispatch_root_fallback_on_unknown_name() {
        // scenario 2: calling with an unrecognized alias still resolves
        // structurally from the value's Left/Right prefix.
        let params = Parameters::new("update_adhoc_operators", Prim::unary(OpCode::D_LEFT, Prim::nullary(OpCode::D_UNIT)));
        let (ep, _residual) = params.dispatch(&manager_parameter()).unwrap();
        assert_eq!(ep.name, "do");
    }
}
