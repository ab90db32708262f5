// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! `Value` & `walkTree`: the type-directed renderer that turns a
//! `(Type, Prim)` pair into a labeled, nested, JSON-shaped map
//! - the centerpiece of the crate.

use serde_json::{Map, Value as Json};

use michelson_encoding::OpCode;

use crate::error::PrimError;
use crate::key::Key;
use crate::prim::{Prim, PrimTag};
use crate::stack::Stack;
use crate::type_view::Type;

/// The walker's output: a labeled, nested, JSON-shaped map, named for
/// what callers build an RPC response from.
pub type RenderedMap = Json;

/// Depth cap of the type-directed walk; a safety net
/// against malformed or adversarial trees, not a tuning knob.
pub const MAX_DEPTH: u32 = 99;

/// How `Value::map` reports a render failure it cannot recover from
///.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPolicy {
    /// Fall back to the raw, unrendered value prim as JSON.
    Prim,
    /// Surface the `PrimError` to the caller.
    Fail,
    /// Panic - for callers that have already validated the tree and
    /// treat a render failure as a programming error.
    Panic,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub policy: RenderPolicy,
    pub max_depth: u32,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig { policy: RenderPolicy::Fail, max_depth: MAX_DEPTH }
    }
}

/// A `(Type, Prim)` pair awaiting rendering; the render is memoized on
/// first call to `map()`.
#[derive(Debug, Clone)]
pub struct Value {
    ty: Prim,
    value: Prim,
    rendered: Option<Json>,
}

impl Value {
    pub fn new(ty: Prim, value: Prim) -> Value {
        Value { ty, value, rendered: None }
    }

    pub fn ty(&self) -> &Prim {
        &self.ty
    }

    pub fn value(&self) -> &Prim {
        &self.value
    }

    /// Renders (and memoizes) the labeled map per `cfg`'s policy.
    pub fn map(&mut self, cfg: &RenderConfig) -> Json {
        if let Some(rendered) = &self.rendered {
            return rendered.clone();
        }
        let rendered = match walk_tree(&self.ty, &self.value, cfg) {
            Ok(json) => json,
            Err(err) => match cfg.policy {
                RenderPolicy::Prim => self.value.to_json(),
                RenderPolicy::Fail => render_error(&err, &self.ty, &self.value),
                RenderPolicy::Panic => panic!("value render failed: {}", err),
            },
        };
        self.rendered = Some(rendered.clone());
        rendered
    }
}

fn render_error(err: &PrimError, ty: &Prim, value: &Prim) -> Json {
    let mut obj = Map::new();
    let mut inner = Map::new();
    inner.insert("message".to_string(), Json::String(err.to_string()));
    inner.insert("type".to_string(), ty.to_json());
    inner.insert("value".to_string(), value.to_json());
    obj.insert("error".to_string(), Json::Object(inner));
    Json::Object(obj)
}

/// Entry point of the type-directed walk.
pub fn walk_tree(ty: &Prim, value: &Prim, cfg: &RenderConfig) -> Result<Json, PrimError> {
    let mut stack = Stack::from_single(value.clone());
    render(ty, &mut stack, 0, cfg).map_err(|err| {
        crate::diagnostics::log_debug("value walk failed", &err);
        err
    })
}

fn render(ty: &Prim, stack: &mut Stack, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    if depth >= cfg.max_depth {
        return Err(PrimError::MaxDepth { max_depth: cfg.max_depth });
    }

    let mut v = stack.pop().ok_or_else(|| PrimError::BrokenPrim("value stack exhausted".to_string()))?;

    // Step 2: a pair value arriving under a non-pair type is a stray
    // historical receipt; unfold it back onto the stack and retry.
    let mut unfold_guard = 0;
    while v.is_opcode(OpCode::D_PAIR) && ty.opcode_name() != Some("pair") && unfold_guard < 16 {
        stack.push_many_front(v.args().to_vec());
        v = stack.pop().ok_or_else(|| PrimError::BrokenPrim("value stack exhausted during pair unfold".to_string()))?;
        unfold_guard += 1;
    }

    // Step 3: packed-value recovery - the original type is unknown, so
    // synthesize a stand-in from the value's own shape.
    let synthesized;
    let effective_ty: &Prim = if v.was_packed() && (!v.is_scalar_leaf() || ty.opcode() == Some(OpCode::T_BYTES)) {
        synthesized = synthesize_type(&v, ty.anno().to_vec());
        &synthesized
    } else {
        ty
    };

    // Step 4: cross-check tag/opcode compatibility.
    if effective_ty.opcode_name() != Some("pair") && !v.is_sequence() && !v.was_packed() {
        if let Some(opcode) = effective_ty.opcode() {
            if !compatible(v.tag(), &v, opcode) {
                return Err(PrimError::TypeMismatch { ty: effective_ty.clone(), value: v.clone() });
            }
        }
    }

    dispatch(effective_ty, &v, stack, depth, cfg)
}

fn dispatch(ty: &Prim, v: &Prim, stack: &mut Stack, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    match ty.opcode() {
        Some(OpCode::T_SET) => render_list_like(&ty.args()[0], v, depth, cfg, false),
        Some(OpCode::T_LIST) => render_list_like(&ty.args()[0], v, depth, cfg, true),
        Some(OpCode::T_LAMBDA) => Ok(v.to_json()),
        Some(OpCode::T_MAP) => render_map(ty, v, depth, cfg),
        Some(OpCode::T_BIG_MAP) => render_big_map(ty, v, depth, cfg),
        Some(OpCode::T_PAIR) => render_pair(ty, v, depth, cfg),
        Some(OpCode::T_OPTION) => render_option(ty, v, depth, cfg),
        Some(OpCode::T_OR) => render_or(ty, v, depth, cfg),
        Some(OpCode::T_TICKET) => {
            let expanded = Type::ticket_expanded(&ty.args()[0]);
            let mut sub = Stack::from_single(v.clone());
            render(&expanded, &mut sub, depth + 1, cfg)
        }
        Some(OpCode::T_SAPLING_STATE) => render_sapling_state(ty, v),
        Some(op) => render_scalar(v, op),
        None => Ok(v.to_json()),
    }
}

fn render_list_like(elem_ty: &Prim, v: &Prim, depth: u32, cfg: &RenderConfig, flatten_nested: bool) -> Result<Json, PrimError> {
    let items: Vec<Prim> = if v.is_sequence() { v.args().to_vec() } else { vec![v.clone()] };
    let mut arr = Vec::with_capacity(items.len());
    for item in items {
        let mut sub = Stack::from_single(item);
        let rendered = render(elem_ty, &mut sub, depth + 1, cfg)?;
        if flatten_nested {
            if let Json::Object(o) = &rendered {
                if o.len() == 1 {
                    if let Some(Json::Array(inner)) = o.get("0") {
                        arr.push(Json::Array(inner.clone()));
                        continue;
                    }
                }
            }
        }
        arr.push(rendered);
    }
    Ok(Json::Array(arr))
}

fn big_map_reference(v: &Prim) -> Option<Json> {
    if let Some(n) = v.int_value() {
        return Some(Json::String(n.to_str_radix(10)));
    }
    if v.is_sequence() {
        if v.args().is_empty() {
            // pre-Babylon empty placeholder: the id is out of scope here.
            return Some(Json::Null);
        }
        if let Some(n) = v.args()[0].int_value() {
            return Some(Json::String(n.to_str_radix(10)));
        }
    }
    None
}

fn render_big_map(ty: &Prim, v: &Prim, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    if let Some(reference) = big_map_reference(v) {
        return Ok(reference);
    }
    render_elts(&ty.args()[0], &ty.args()[1], v, depth, cfg)
}

fn render_map(ty: &Prim, v: &Prim, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    render_elts(&ty.args()[0], &ty.args()[1], v, depth, cfg)
}

fn render_elts(key_ty: &Prim, val_ty: &Prim, v: &Prim, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    let elts: Vec<Prim> = if v.is_sequence() { v.args().to_vec() } else { vec![v.clone()] };
    let mut obj = Map::new();
    for elt in elts {
        if elt.opcode() != Some(OpCode::D_ELT) {
            return Err(PrimError::BrokenPrim(format!("expected Elt, got {:?}", elt.opcode_name())));
        }
        let key_prim = &elt.args()[0];
        let val_prim = &elt.args()[1];
        let key = if key_prim.was_packed() {
            let synth = synthesize_type(key_prim, Vec::new());
            Key::from_type_value(&synth, key_prim)?
        } else {
            Key::from_type_value(key_ty, key_prim)?
        };
        let mut sub = Stack::from_single(val_prim.clone());
        let rendered = render(val_ty, &mut sub, depth + 1, cfg)?;
        obj.insert(key.text().to_string(), rendered);
    }
    Ok(Json::Object(obj))
}

fn render_pair(ty: &Prim, v: &Prim, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    let type_args = ty.comb_flatten();
    let value_args: Vec<Prim> = if v.is_converted_comb() || v.is_opcode(OpCode::D_PAIR) { v.comb_flatten() } else { vec![v.clone()] };

    if type_args.len() != value_args.len() {
        return Err(PrimError::BrokenPrim(format!("pair arity mismatch: type has {}, value has {}", type_args.len(), value_args.len())));
    }

    let mut obj = Map::new();
    for (i, (field_ty, field_value)) in type_args.iter().zip(value_args.iter()).enumerate() {
        let mut sub = Stack::from_single(field_value.clone());
        let rendered = render(field_ty, &mut sub, depth + 1, cfg)?;
        let key = field_ty.field_anno().map(|a| a.trim_start_matches('%').to_string()).unwrap_or_else(|| i.to_string());
        obj.insert(key, rendered);
    }
    Ok(Json::Object(obj))
}

fn render_option(ty: &Prim, v: &Prim, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    match v.opcode_name() {
        Some("None") => Ok(Json::Null),
        Some("Some") => {
            let inner_ty = &ty.args()[0];
            let mut sub = Stack::from_single(v.args()[0].clone());
            render(inner_ty, &mut sub, depth + 1, cfg)
        }
        _ => Err(PrimError::TypeMismatch { ty: ty.clone(), value: v.clone() }),
    }
}

fn render_or(ty: &Prim, v: &Prim, depth: u32, cfg: &RenderConfig) -> Result<Json, PrimError> {
    match v.opcode_name() {
        Some("Left") => {
            let inner_ty = &ty.args()[0];
            let mut sub = Stack::from_single(v.args()[0].clone());
            let rendered = render(inner_ty, &mut sub, depth + 1, cfg)?;
            Ok(wrap_or_branch(rendered, inner_ty, "@or_0"))
        }
        Some("Right") => {
            let inner_ty = &ty.args()[1];
            let mut sub = Stack::from_single(v.args()[0].clone());
            let rendered = render(inner_ty, &mut sub, depth + 1, cfg)?;
            Ok(wrap_or_branch(rendered, inner_ty, "@or_1"))
        }
        _ => Err(PrimError::TypeMismatch { ty: ty.clone(), value: v.clone() }),
    }
}

/// Labels the chosen `or` branch: an explicit field annotation wins; a
/// single-field nested object is lifted out of the wrapper; otherwise
/// the ambiguous branch is tagged `@or_0`/`@or_1`.
fn wrap_or_branch(rendered: Json, inner_ty: &Prim, default_label: &str) -> Json {
    if let Some(anno) = inner_ty.field_anno() {
        let mut obj = Map::new();
        obj.insert(anno.trim_start_matches('%').to_string(), rendered);
        return Json::Object(obj);
    }
    if let Json::Object(o) = &rendered {
        if o.len() == 1 {
            return rendered;
        }
    }
    let mut obj = Map::new();
    obj.insert(default_label.to_string(), rendered);
    Json::Object(obj)
}

fn render_sapling_state(ty: &Prim, v: &Prim) -> Result<Json, PrimError> {
    let memo_size = ty.args().first().and_then(|a| a.int_value()).map(|n| Json::String(n.to_str_radix(10))).unwrap_or(Json::Null);
    let mut obj = Map::new();
    obj.insert("memo_size".to_string(), memo_size);
    obj.insert("content".to_string(), v.to_json());
    Ok(Json::Object(obj))
}

/// Renders a scalar leaf under its target opcode.
fn render_scalar(v: &Prim, opcode: OpCode) -> Result<Json, PrimError> {
    match opcode {
        OpCode::T_INT | OpCode::T_NAT | OpCode::T_MUTEZ => {
            let n = v.int_value().ok_or_else(|| PrimError::TypeMismatch { ty: Prim::nullary(opcode), value: v.clone() })?;
            Ok(Json::String(n.to_str_radix(10)))
        }
        OpCode::T_TIMESTAMP => render_timestamp(v),
        OpCode::T_ADDRESS | OpCode::T_CONTRACT | OpCode::T_KEY_HASH => {
            if let Some(bytes) = v.bytes_value() {
                match crypto::address::decode_to_text(bytes) {
                    Ok(text) => Ok(Json::String(text)),
                    Err(_) => Ok(Json::String(hex::encode(bytes))),
                }
            } else if let Some(s) = v.string_value() {
                Ok(Json::String(s.to_string()))
            } else {
                Err(PrimError::TypeMismatch { ty: Prim::nullary(opcode), value: v.clone() })
            }
        }
        OpCode::T_KEY => {
            let bytes = v.bytes_value().ok_or_else(|| PrimError::TypeMismatch { ty: Prim::nullary(opcode), value: v.clone() })?;
            crypto::public_key::decode_to_text(bytes).map(Json::String).map_err(|e| PrimError::BadKey(e.to_string()))
        }
        OpCode::T_SIGNATURE => {
            let bytes = v.bytes_value().ok_or_else(|| PrimError::TypeMismatch { ty: Prim::nullary(opcode), value: v.clone() })?;
            crypto::signature::decode_to_text(bytes).map(Json::String).map_err(|e| PrimError::BadKey(e.to_string()))
        }
        OpCode::T_CHAIN_ID => {
            let bytes = v.bytes_value().ok_or_else(|| PrimError::TypeMismatch { ty: Prim::nullary(opcode), value: v.clone() })?;
            crypto::chain_id::decode_to_text(bytes).map(Json::String).map_err(|e| PrimError::BadKey(e.to_string()))
        }
        OpCode::T_BYTES => render_bytes(v),
        OpCode::T_BOOL => match v.opcode_name() {
            Some("True") => Ok(Json::Bool(true)),
            Some("False") => Ok(Json::Bool(false)),
            _ => Err(PrimError::TypeMismatch { ty: Prim::nullary(opcode), value: v.clone() }),
        },
        OpCode::T_UNIT => Ok(Json::Null),
        OpCode::T_NEVER => Err(PrimError::BrokenPrim("`never` has no inhabitants".to_string())),
        OpCode::T_OPERATION => Ok(v.to_json()),
        OpCode::T_BLS12_381_G1 | OpCode::T_BLS12_381_G2 | OpCode::T_BLS12_381_FR | OpCode::T_CHEST | OpCode::T_CHEST_KEY => {
            v.bytes_value().map(hex::encode).map(Json::String).ok_or_else(|| PrimError::TypeMismatch { ty: Prim::nullary(opcode), value: v.clone() })
        }
        _ => Ok(v.to_json()),
    }
}

fn render_timestamp(v: &Prim) -> Result<Json, PrimError> {
    use chrono::{TimeZone, Utc, Datelike};

    if let Some(n) = v.int_value() {
        let seconds: i64 = match n.to_string().parse() {
            Ok(s) => s,
            Err(_) => return Ok(Json::String(n.to_str_radix(10))),
        };
        return match Utc.timestamp_opt(seconds, 0).single() {
            Some(dt) if (0..=9999).contains(&dt.year()) => Ok(Json::String(dt.to_rfc3339())),
            _ => Ok(Json::String(n.to_str_radix(10))),
        };
    }
    if let Some(s) = v.string_value() {
        return Ok(Json::String(s.to_string()));
    }
    Err(PrimError::TypeMismatch { ty: Prim::nullary(OpCode::T_TIMESTAMP), value: v.clone() })
}

fn render_bytes(v: &Prim) -> Result<Json, PrimError> {
    let bytes = v.bytes_value().ok_or_else(|| PrimError::TypeMismatch { ty: Prim::nullary(OpCode::T_BYTES), value: v.clone() })?;

    if crate::packed::is_packed(bytes) {
        if let Ok(unpacked) = crate::packed::unpack(bytes) {
            let synth = synthesize_type(&unpacked, Vec::new());
            return render_scalar_or_tree(&synth, &unpacked);
        }
    }
    if let Ok(text) = crypto::address::decode_to_text(bytes) {
        return Ok(Json::String(text));
    }
    if !bytes.is_empty() && bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        if let Ok(s) = std::str::from_utf8(bytes) {
            return Ok(Json::String(s.to_string()));
        }
    }
    Ok(Json::String(hex::encode(bytes)))
}

fn render_scalar_or_tree(ty: &Prim, v: &Prim) -> Result<Json, PrimError> {
    let cfg = RenderConfig::default();
    let mut stack = Stack::from_single(v.clone());
    render(ty, &mut stack, 0, &cfg)
}

/// Builds a stand-in type for a value whose original type annotation
/// was lost to byte-packing.
fn synthesize_type(v: &Prim, anno: Vec<String>) -> Prim {
    let base = match v.opcode_name() {
        Some("Pair") => build_pair_type(v.comb_flatten().iter().map(|e| synthesize_type(e, Vec::new())).collect()),
        Some("Left") => Prim::binary(OpCode::T_OR, synthesize_type(&v.args()[0], Vec::new()), Prim::nullary(OpCode::T_UNIT)),
        Some("Right") => Prim::binary(OpCode::T_OR, Prim::nullary(OpCode::T_UNIT), synthesize_type(&v.args()[0], Vec::new())),
        Some("Some") => Prim::unary(OpCode::T_OPTION, synthesize_type(&v.args()[0], Vec::new())),
        Some("None") => Prim::unary(OpCode::T_OPTION, Prim::nullary(OpCode::T_UNIT)),
        Some("True") | Some("False") => Prim::nullary(OpCode::T_BOOL),
        Some("Unit") => Prim::nullary(OpCode::T_UNIT),
        Some("Elt") => Prim::binary(OpCode::T_MAP, synthesize_type(&v.args()[0], Vec::new()), synthesize_type(&v.args()[1], Vec::new())),
        _ if v.is_sequence() => synthesize_sequence_type(v),
        _ => match v.tag() {
            PrimTag::Int => Prim::nullary(OpCode::T_INT),
            PrimTag::String => Prim::nullary(OpCode::T_STRING),
            PrimTag::Bytes => Prim::nullary(OpCode::T_BYTES),
            _ => Prim::nullary(OpCode::T_BYTES),
        },
    };
    if anno.is_empty() {
        base
    } else {
        Prim::node(base.opcode().unwrap_or(OpCode::T_BYTES), base.args().to_vec(), anno)
    }
}

fn synthesize_sequence_type(v: &Prim) -> Prim {
    match v.args().first() {
        None => Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_BYTES)),
        Some(first) if first.opcode() == Some(OpCode::D_ELT) => {
            Prim::binary(OpCode::T_MAP, synthesize_type(&first.args()[0], Vec::new()), synthesize_type(&first.args()[1], Vec::new()))
        }
        Some(first) => Prim::unary(OpCode::T_LIST, synthesize_type(first, Vec::new())),
    }
}

fn build_pair_type(mut elems: Vec<Prim>) -> Prim {
    if elems.is_empty() {
        return Prim::nullary(OpCode::T_UNIT);
    }
    if elems.len() == 1 {
        return elems.remove(0);
    }
    let first = elems.remove(0);
    Prim::binary(OpCode::T_PAIR, first, build_pair_type(elems))
}

/// Tag/opcode compatibility matrix.
fn compatible(tag: PrimTag, v: &Prim, opcode: OpCode) -> bool {
    use OpCode::*;

    match tag {
        PrimTag::Sequence => matches!(opcode, T_LIST | T_SET | T_MAP | T_BIG_MAP | T_LAMBDA | T_OR | T_OPTION | T_PAIR | T_SAPLING_STATE | T_TICKET),
        PrimTag::Int => matches!(
            opcode,
            T_INT | T_NAT | T_MUTEZ | T_TIMESTAMP | T_BIG_MAP | T_OR | T_OPTION | T_SAPLING_STATE | T_BLS12_381_G1 | T_BLS12_381_G2 | T_BLS12_381_FR | T_TICKET
        ),
        PrimTag::String => matches!(
            opcode,
            T_STRING | T_BYTES | T_ADDRESS | T_CONTRACT | T_KEY | T_KEY_HASH | T_SIGNATURE | T_TIMESTAMP | T_OR | T_OPTION | T_CHAIN_ID | T_TICKET
        ),
        PrimTag::Bytes => matches!(
            opcode,
            T_BYTES
                | T_STRING
                | T_BOOL
                | T_ADDRESS
                | T_KEY
                | T_KEY_HASH
                | T_CONTRACT
                | T_SIGNATURE
                | T_OPERATION
                | T_LAMBDA
                | T_OR
                | T_OPTION
                | T_CHAIN_ID
                | T_SAPLING_STATE
                | T_SAPLING_TRANSACTION
                | T_BLS12_381_G1
                | T_BLS12_381_G2
                | T_BLS12_381_FR
                | T_TICKET
                | T_CHEST
                | T_CHEST_KEY
        ),
        _ => match v.opcode() {
            Some(D_PAIR) => matches!(opcode, T_PAIR | T_OR | T_LIST | T_OPTION | T_TICKET),
            Some(D_SOME) | Some(D_NONE) => opcode == T_OPTION,
            Some(D_UNIT) => matches!(opcode, T_UNIT | K_PARAMETER),
            Some(D_LEFT) | Some(D_RIGHT) => opcode == T_OR,
            Some(D_TRUE) | Some(D_FALSE) => opcode == T_BOOL,
            _ => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn scalar_int_renders_decimal_string() {
        let ty = Prim::nullary(OpCode::T_INT);
        let value = Prim::int(BigInt::from(42));
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        assert_eq!(rendered, Json::String("42".to_string()));
    }

    #[test]
    fn unit_renders_null() {
        let ty = Prim::nullary(OpCode::T_UNIT);
        let value = Prim::nullary(OpCode::D_UNIT);
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        assert_eq!(rendered, Json::Null);
    }

    #[test]
    fn option_address_scenario_5() {
        let ty = Prim::unary(OpCode::T_OPTION, Prim::nullary(OpCode::T_ADDRESS));
        let none_value = Prim::nullary(OpCode::D_NONE);
        assert_eq!(walk_tree(&ty, &none_value, &RenderConfig::default()).unwrap(), Json::Null);
    }

    #[test]
    fn pair_renders_named_and_positional_fields() {
        let ty = Prim::binary(
            OpCode::T_PAIR,
            Prim::node(OpCode::T_NAT, Vec::new(), vec!["%amount".into()]),
            Prim::nullary(OpCode::T_STRING),
        );
        let value = Prim::binary(OpCode::D_PAIR, Prim::int(BigInt::from(7)), Prim::string("hi"));
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        let obj = rendered.as_object().unwrap();
        assert_eq!(obj.get("amount").unwrap(), &Json::String("7".to_string()));
        assert_eq!(obj.get("1").unwrap(), &Json::String("hi".to_string()));
    }

    #[test]
    fn set_renders_array_of_scalars() {
        let ty = Prim::unary(OpCode::T_SET, Prim::nullary(OpCode::T_STRING));
        let value = Prim::sequence(vec![Prim::string("a"), Prim::string("b")]);
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        assert_eq!(rendered, Json::Array(vec![Json::String("a".to_string()), Json::String("b".to_string())]));
    }

    #[test]
    fn map_renders_object_keyed_by_key_text() {
        let ty = Prim::binary(OpCode::T_MAP, Prim::nullary(OpCode::T_INT), Prim::nullary(OpCode::T_STRING));
        let value = Prim::sequence(vec![Prim::binary(OpCode::D_ELT, Prim::int(BigInt::from(1)), Prim::string("one"))]);
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        assert_eq!(rendered.as_object().unwrap().get("1").unwrap(), &Json::String("one".to_string()));
    }

    #[test]
    fn big_map_reference_renders_id_string() {
        let ty = Prim::binary(OpCode::T_BIG_MAP, Prim::nullary(OpCode::T_INT), Prim::nullary(OpCode::T_STRING));
        let value = Prim::int(BigInt::from(17));
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        assert_eq!(rendered, Json::String("17".to_string()));
    }

    #[test]
    fn or_without_annotation_is_tagged_ambiguous() {
        let ty = Prim::binary(OpCode::T_OR, Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_STRING));
        let value = Prim::unary(OpCode::D_LEFT, Prim::int(BigInt::from(3)));
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        assert_eq!(rendered.as_object().unwrap().get("@or_0").unwrap(), &Json::String("3".to_string()));
    }

    #[test]
    fn packed_bytes_are_unpacked_once_scenario_6() {
        let inner = Prim::int(BigInt::from(99));
        let mut packed_bytes = vec![0x05u8];
        packed_bytes.extend(inner.encode());
        let mut value = Prim::bytes(packed_bytes);
        value.set_was_packed(false); // the bytes themselves carry 0x05; was_packed marks descendants after unpacking.

        let ty = Prim::nullary(OpCode::T_BYTES);
        let rendered = walk_tree(&ty, &value, &RenderConfig::default()).unwrap();
        assert_eq!(rendered, Json::String("99".to_string()));
    }

    #[test]
    fn type_mismatch_reports_under_prim_policy() {
        let ty = Prim::nullary(OpCode::T_UNIT);
        let value = Prim::int(BigInt::from(1));
        let mut v = Value::new(ty, value.clone());
        let cfg = RenderConfig { policy: RenderPolicy::Prim, max_depth: MAX_DEPTH };
        assert_eq!(v.map(&cfg), value.to_json());
    }

    #[test]
    fn depth_cap_is_enforced() {
        let ty = Prim::nullary(OpCode::T_INT);
        let value = Prim::int(BigInt::from(1));
        let cfg = RenderConfig { policy: RenderPolicy::Fail, max_depth: 0 };
        let err = walk_tree(&ty, &value, &cfg).unwrap_err();
        assert!(matches!(err, PrimError::MaxDepth { .. }));
    }
}
