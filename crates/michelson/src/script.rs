// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! `Script` & `Code`: the four-section contract container (parameter
//! type, storage type, code, views) with size-prefixed binary framing
//! and constant expansion.

use std::collections::HashMap;

use michelson_encoding::OpCode;

use crate::error::PrimError;
use crate::prim::Prim;

/// One `view` section: a named, typed, callable read of storage,
/// framed the same way `Code` wraps `K_CODE` - a Sequence carrying
/// `[name, arg_type, return_type, body]`.
#[derive(Debug, Clone)]
pub struct View {
    pub name: String,
    pub arg_type: Prim,
    pub return_type: Prim,
    pub code: Prim,
}

impl View {
    fn to_prim(&self) -> Prim {
        Prim::node(
            OpCode::K_VIEW,
            vec![Prim::string(self.name.clone()), self.arg_type.clone(), self.return_type.clone(), self.code.clone()],
            Vec::new(),
        )
    }

    fn from_prim(p: &Prim) -> Result<View, PrimError> {
        let args = p.args();
        if args.len() != 4 {
            return Err(PrimError::BrokenPrim(format!("view node expected 4 args, got {}", args.len())));
        }
        let name = args[0].string_value().ok_or_else(|| PrimError::BrokenPrim("view name must be a string".into()))?.to_string();
        Ok(View { name, arg_type: args[1].clone(), return_type: args[2].clone(), code: args[3].clone() })
    }
}

/// The four-section code container: `K_PARAMETER`, `K_STORAGE`,
/// `K_CODE`, zero or more `K_VIEW`, and an optional ill-formed marker
/// (the `0xff` `BadCode` placeholder, reusing the same sentinel byte as
/// `Prim::empty()`'s constant-substitution marker).
#[derive(Debug, Clone)]
pub struct Code {
    pub parameter_type: Prim,
    pub storage_type: Prim,
    pub code: Prim,
    pub views: Vec<View>,
    pub ill_formed: bool,
}

impl Code {
    pub fn encode(&self) -> Vec<u8> {
        let mut children = vec![
            Prim::unary(OpCode::K_PARAMETER, self.parameter_type.clone()),
            Prim::unary(OpCode::K_STORAGE, self.storage_type.clone()),
            Prim::unary(OpCode::K_CODE, self.code.clone()),
        ];
        children.extend(self.views.iter().map(View::to_prim));
        if self.ill_formed {
            children.push(Prim::empty());
        }
        Prim::sequence(children).encode()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Code, PrimError> {
        let sequence = Prim::from_bytes(bytes)?;
        Code::from_sequence(&sequence)
    }

    fn from_sequence(sequence: &Prim) -> Result<Code, PrimError> {
        if !sequence.is_sequence() {
            return Err(PrimError::BrokenPrim("code section is not a sequence".into()));
        }

        let mut parameter_type = None;
        let mut storage_type = None;
        let mut code = None;
        let mut views = Vec::new();
        let mut ill_formed = false;

        for child in sequence.args() {
            if child.is_empty_prim() {
                ill_formed = true;
                continue;
            }
            match child.opcode() {
                Some(OpCode::K_PARAMETER) => parameter_type = child.args().first().cloned(),
                Some(OpCode::K_STORAGE) => storage_type = child.args().first().cloned(),
                Some(OpCode::K_CODE) => code = child.args().first().cloned(),
                Some(OpCode::K_VIEW) => views.push(View::from_prim(child)?),
                _ => return Err(PrimError::BrokenPrim(format!("unexpected code-section node {:?}", child.opcode_name()))),
            }
        }

        Ok(Code {
            parameter_type: parameter_type.ok_or_else(|| PrimError::BrokenPrim("missing K_PARAMETER".into()))?,
            storage_type: storage_type.ok_or_else(|| PrimError::BrokenPrim("missing K_STORAGE".into()))?,
            code: code.ok_or_else(|| PrimError::BrokenPrim("missing K_CODE".into()))?,
            views,
            ill_formed,
        })
    }

    /// Tree-level comb/structural normalization applied to each section.
    pub fn simplify(&self) -> Code {
        Code {
            parameter_type: self.parameter_type.simplify(),
            storage_type: self.storage_type.simplify(),
            code: self.code.simplify(),
            views: self.views.clone(),
            ill_formed: self.ill_formed,
        }
    }

    pub fn expand_constants(&self, constants: &HashMap<String, Prim>) -> Code {
        Code {
            parameter_type: expand(&self.parameter_type, constants),
            storage_type: expand(&self.storage_type, constants),
            code: expand(&self.code, constants),
            views: self
                .views
                .iter()
                .map(|v| View {
                    name: v.name.clone(),
                    arg_type: expand(&v.arg_type, constants),
                    return_type: expand(&v.return_type, constants),
                    code: expand(&v.code, constants),
                })
                .collect(),
            ill_formed: self.ill_formed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Script {
    pub code: Code,
    pub storage: Prim,
}

impl Script {
    pub fn encode(&self) -> Vec<u8> {
        let code_bytes = self.code.encode();
        let storage_bytes = self.storage.encode();
        let mut out = Vec::with_capacity(8 + code_bytes.len() + storage_bytes.len());
        out.extend((code_bytes.len() as u32).to_be_bytes());
        out.extend(code_bytes);
        out.extend((storage_bytes.len() as u32).to_be_bytes());
        out.extend(storage_bytes);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Script, PrimError> {
        if bytes.len() < 4 {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: 4, available: bytes.len() }.into());
        }
        let code_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let mut at = 4;
        let code_end = at + code_len;
        if bytes.len() < code_end {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: code_end, available: bytes.len() }.into());
        }
        let code = Code::from_bytes(&bytes[at..code_end])?;
        at = code_end;

        if bytes.len() < at + 4 {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: at + 4, available: bytes.len() }.into());
        }
        let storage_len = u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize;
        at += 4;
        let storage_end = at + storage_len;
        if bytes.len() < storage_end {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: storage_end, available: bytes.len() }.into());
        }
        let (storage, consumed) = Prim::decode(&bytes[at..storage_end])?;
        if consumed != storage_len {
            return Err(michelson_encoding::EncodingError::TrailingData { extra: storage_len - consumed }.into());
        }
        if storage_end != bytes.len() {
            return Err(michelson_encoding::EncodingError::TrailingData { extra: bytes.len() - storage_end }.into());
        }

        Ok(Script { code, storage })
    }

    pub fn expand_constants(&self, constants: &HashMap<String, Prim>) -> Script {
        Script { code: self.code.expand_constants(constants), storage: expand(&self.storage, constants) }
    }
}

fn expand(node: &Prim, constants: &HashMap<String, Prim>) -> Prim {
    if node.opcode() == Some(OpCode::H_CONSTANT) {
        if let Some(hash_arg) = node.args().first() {
            if let Some(hash) = hash_arg.string_value() {
                if let Some(replacement) = constants.get(hash) {
                    return expand(replacement, constants);
                }
            }
        }
    }
    let mut clone = node.clone();
    for a in clone.args_mut().iter_mut() {
        *a = expand(a, constants);
    }
    clone
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn sample_code() -> Code {
        Code {
            parameter_type: Prim::nullary(OpCode::T_UNIT),
            storage_type: Prim::nullary(OpCode::T_UNIT),
            code: Prim::sequence(vec![Prim::nullary(OpCode::I_UNIT), Prim::binary(OpCode::I_PAIR, Prim::nullary(OpCode::I_UNIT), Prim::nullary(OpCode::I_UNIT))]),
            views: Vec::new(),
            ill_formed: false,
        }
    }

    #[test]
    fn code_round_trips() {
        let code = sample_code();
        let decoded = Code::from_bytes(&code.encode()).unwrap();
        assert!(decoded.parameter_type.eq_with_anno(&code.parameter_type));
        assert!(decoded.storage_type.eq_with_anno(&code.storage_type));
        assert!(decoded.code.eq_with_anno(&code.code));
    }

    #[test]
    fn script_round_trips_and_rejects_trailing_data() {
        let script = Script { code: sample_code(), storage: Prim::nullary(OpCode::D_UNIT) };
        let mut encoded = script.encode();
        let decoded = Script::from_bytes(&encoded).unwrap();
        assert!(decoded.storage.eq_with_anno(&script.storage));

        encoded.push(0xAB);
        assert!(Script::from_bytes(&encoded).is_err());
    }

    #[test]
    fn view_round_trips_inside_code() {
        let mut code = sample_code();
        code.views.push(View {
            name: "get_total".to_string(),
            arg_type: Prim::nullary(OpCode::T_UNIT),
            return_type: Prim::nullary(OpCode::T_NAT),
            code: Prim::sequence(vec![Prim::nullary(OpCode::I_DROP)]),
        });
        let decoded = Code::from_bytes(&code.encode()).unwrap();
        assert_eq!(decoded.views.len(), 1);
        assert_eq!(decoded.views[0].name, "get_total");
    }

    #[test]
    fn constant_expansion_substitutes_and_recurses() {
        let mut constants = HashMap::new();
        constants.insert("exprHashOuter".to_string(), Prim::unary(OpCode::T_OPTION, Prim::nullary(OpCode::T_NAT)));

        let mut code = sample_code();
        code.storage_type = Prim::unary(OpCode::H_CONSTANT, Prim::string("exprHashOuter"));
        let expanded = code.expand_constants(&constants);
        assert_eq!(expanded.storage_type.opcode_name(), Some("option"));
    }

    #[test]
    fn ill_formed_marker_round_trips() {
        let mut code = sample_code();
        code.ill_formed = true;
        let decoded = Code::from_bytes(&code.encode()).unwrap();
        assert!(decoded.ill_formed);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(Script::from_bytes(&[0, 0]).is_err());
        assert!(Script::from_bytes(&(BigInt::from(0).to_string().into_bytes())).is_err());
    }
}
