// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! `Prim`: the universal Michelson tree node. A single recursive tagged
//! union round-trips losslessly between the tag-length binary encoding
//! and the JSON encoding.

use std::fmt;

use num_bigint::BigInt;
use num_traits::Num;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use michelson_encoding::{zarith, OpCode};

use crate::error::PrimError;

/// The eleven wire shapes a `Prim` node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimTag {
    Int,
    String,
    Sequence,
    Nullary,
    NullaryAnno,
    Unary,
    UnaryAnno,
    Binary,
    BinaryAnno,
    VariadicAnno,
    Bytes,
}

impl PrimTag {
    pub fn byte(self) -> u8 {
        match self {
            PrimTag::Int => 0x00,
            PrimTag::String => 0x01,
            PrimTag::Sequence => 0x02,
            PrimTag::Nullary => 0x03,
            PrimTag::NullaryAnno => 0x04,
            PrimTag::Unary => 0x05,
            PrimTag::UnaryAnno => 0x06,
            PrimTag::Binary => 0x07,
            PrimTag::BinaryAnno => 0x08,
            PrimTag::VariadicAnno => 0x09,
            PrimTag::Bytes => 0x0a,
        }
    }

    pub fn from_byte(byte: u8) -> Result<PrimTag, PrimError> {
        Ok(match byte {
            0x00 => PrimTag::Int,
            0x01 => PrimTag::String,
            0x02 => PrimTag::Sequence,
            0x03 => PrimTag::Nullary,
            0x04 => PrimTag::NullaryAnno,
            0x05 => PrimTag::Unary,
            0x06 => PrimTag::UnaryAnno,
            0x07 => PrimTag::Binary,
            0x08 => PrimTag::BinaryAnno,
            0x09 => PrimTag::VariadicAnno,
            0x0a => PrimTag::Bytes,
            other => {
                return Err(PrimError::Encoding(michelson_encoding::EncodingError::BadTag { tag: other }))
            }
        })
    }

    pub fn has_anno_slot(self) -> bool {
        matches!(
            self,
            PrimTag::NullaryAnno | PrimTag::UnaryAnno | PrimTag::BinaryAnno | PrimTag::VariadicAnno
        )
    }

    pub fn carries_opcode(self) -> bool {
        matches!(
            self,
            PrimTag::Nullary
                | PrimTag::NullaryAnno
                | PrimTag::Unary
                | PrimTag::UnaryAnno
                | PrimTag::Binary
                | PrimTag::BinaryAnno
                | PrimTag::VariadicAnno
        )
    }
}

#[derive(Debug, Clone)]
enum Payload {
    None,
    Int(BigInt),
    Str(String),
    Bytes(Vec<u8>),
}

/// A Michelson primitive tree node. See module docs for the wire shapes.
#[derive(Debug, Clone)]
pub struct Prim {
    tag: PrimTag,
    // Raw wire byte; `None` for Int/String/Bytes/Sequence. May be
    // `OpCode::EMPTY` (255) for the placeholder used in constant-form
    // scripts - that byte has no `OpCode` variant, so it is kept as a
    // raw byte rather than forced through the closed enum.
    opcode_byte: Option<u8>,
    args: Vec<Prim>,
    anno: Vec<String>,
    payload: Payload,
    was_packed: bool,
}

impl Prim {
    // --- constructors -----------------------------------------------

    pub fn int(value: BigInt) -> Prim {
        Prim { tag: PrimTag::Int, opcode_byte: None, args: Vec::new(), anno: Vec::new(), payload: Payload::Int(value), was_packed: false }
    }

    pub fn string(value: impl Into<String>) -> Prim {
        Prim { tag: PrimTag::String, opcode_byte: None, args: Vec::new(), anno: Vec::new(), payload: Payload::Str(value.into()), was_packed: false }
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Prim {
        Prim { tag: PrimTag::Bytes, opcode_byte: None, args: Vec::new(), anno: Vec::new(), payload: Payload::Bytes(value.into()), was_packed: false }
    }

    pub fn sequence(args: Vec<Prim>) -> Prim {
        Prim { tag: PrimTag::Sequence, opcode_byte: None, args, anno: Vec::new(), payload: Payload::None, was_packed: false }
    }

    /// General opcode-node constructor. The concrete tag (`Nullary` vs
    /// `Binary` vs `VariadicAnno`, etc.) is inferred from `args.len()`
    /// and whether `anno` is non-empty, matching the JSON decoder's tag
    /// inference - this is the single path used by both
    /// decoders and by hand-built trees so the two can never disagree.
    pub fn node(opcode: OpCode, args: Vec<Prim>, anno: Vec<String>) -> Prim {
        let has_anno = !anno.is_empty();
        let tag = match args.len() {
            0 => if has_anno { PrimTag::NullaryAnno } else { PrimTag::Nullary },
            1 => if has_anno { PrimTag::UnaryAnno } else { PrimTag::Unary },
            2 => if has_anno { PrimTag::BinaryAnno } else { PrimTag::Binary },
            _ => PrimTag::VariadicAnno,
        };
        Prim { tag, opcode_byte: Some(opcode.byte()), args, anno, payload: Payload::None, was_packed: false }
    }

    pub fn nullary(opcode: OpCode) -> Prim {
        Prim::node(opcode, Vec::new(), Vec::new())
    }

    pub fn unary(opcode: OpCode, arg: Prim) -> Prim {
        Prim::node(opcode, vec![arg], Vec::new())
    }

    pub fn binary(opcode: OpCode, a: Prim, b: Prim) -> Prim {
        Prim::node(opcode, vec![a, b], Vec::new())
    }

    /// The placeholder used by constant-form scripts (`H_constant`
    /// substitution sites); a `Nullary` whose opcode byte has no
    /// `OpCode` variant.
    pub fn empty() -> Prim {
        Prim { tag: PrimTag::Nullary, opcode_byte: Some(OpCode::EMPTY), args: Vec::new(), anno: Vec::new(), payload: Payload::None, was_packed: false }
    }

    pub fn is_empty_prim(&self) -> bool {
        self.opcode_byte == Some(OpCode::EMPTY)
    }

    // --- accessors -----------------------------------------------------

    pub fn tag(&self) -> PrimTag {
        self.tag
    }

    pub fn opcode(&self) -> Option<OpCode> {
        self.opcode_byte.and_then(|b| OpCode::from_byte(b).ok())
    }

    pub fn opcode_name(&self) -> Option<&'static str> {
        self.opcode().map(|o| o.name())
    }

    pub fn args(&self) -> &[Prim] {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut Vec<Prim> {
        &mut self.args
    }

    pub fn anno(&self) -> &[String] {
        &self.anno
    }

    pub fn first_anno(&self) -> Option<&str> {
        self.anno.first().map(|s| s.as_str())
    }

    /// First annotation beginning with `%` (a field annotation), with
    /// the sigil stripped.
    pub fn field_anno(&self) -> Option<&str> {
        self.anno.iter().find(|a| a.starts_with('%')).map(|a| &a[1..])
    }

    pub fn int_value(&self) -> Option<&BigInt> {
        match &self.payload {
            Payload::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.payload {
            Payload::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn bytes_value(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn was_packed(&self) -> bool {
        self.was_packed
    }

    pub fn set_was_packed(&mut self, value: bool) {
        self.was_packed = value;
        for a in &mut self.args {
            a.set_was_packed(value);
        }
    }

    pub fn is_scalar_leaf(&self) -> bool {
        matches!(self.tag, PrimTag::Int | PrimTag::String | PrimTag::Bytes)
    }

    pub fn is_sequence(&self) -> bool {
        self.tag == PrimTag::Sequence
    }

    pub fn is_opcode(&self, opcode: OpCode) -> bool {
        self.opcode() == Some(opcode)
    }

    // --- equality --------------------------------------------------

    /// Annotation-sensitive structural equality.
    pub fn eq_with_anno(&self, other: &Prim) -> bool {
        self.tag == other.tag
            && self.opcode_byte == other.opcode_byte
            && self.anno == other.anno
            && self.payload_eq(other)
            && self.args.len() == other.args.len()
            && self.args.iter().zip(other.args.iter()).all(|(a, b)| a.eq_with_anno(b))
    }

    /// Annotation-insensitive structural equality, used by interface detection (§4.10).
    pub fn eq_ignore_anno(&self, other: &Prim) -> bool {
        self.tag == other.tag
            && self.opcode_byte == other.opcode_byte
            && self.payload_eq(other)
            && self.args.len() == other.args.len()
            && self.args.iter().zip(other.args.iter()).all(|(a, b)| a.eq_ignore_anno(b))
    }

    fn payload_eq(&self, other: &Prim) -> bool {
        match (&self.payload, &other.payload) {
            (Payload::None, Payload::None) => true,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Str(a), Payload::Str(b)) => a == b,
            (Payload::Bytes(a), Payload::Bytes(b)) => a == b,
            _ => false,
        }
    }

    // --- comb heuristics --------------

    /// True iff `self` is a `Sequence` whose direct children contain no
    /// `D_PAIR`/`T_PAIR` node - the wire-level signature of an optimized
    /// comb pair (as opposed to a genuine list/set/map/lambda body).
    pub fn is_converted_comb(&self) -> bool {
        self.tag == PrimTag::Sequence
            && !self.args.is_empty()
            && !self.args.iter().any(|a| a.opcode_name() == Some("Pair") || a.opcode_name() == Some("pair"))
    }

    /// Heuristic distinguishing a genuine container (list/set/map/lambda
    /// body) from an optimized comb sequence: a container's children are
    /// homogeneous in shape, or are `Elt` pairs, or are themselves
    /// scalars of one kind; a comb's children are the heterogeneous
    /// fields of a flattened tuple.
    pub fn looks_like_container(&self) -> bool {
        if self.tag != PrimTag::Sequence {
            return false;
        }
        if self.args.is_empty() {
            return true;
        }
        if self.args.iter().all(|a| a.opcode_name() == Some("Elt")) {
            return true;
        }
        let first_shape = PrimShape::of(&self.args[0]);
        self.args.iter().all(|a| PrimShape::of(a) == first_shape)
    }

    /// Flattens a right-nested `Pair`/`pair` tree (or an already
    /// converted comb sequence) into its leaf elements, one level at a
    /// time: `Pair(a, Pair(b, c))` and `[a, b, c]` both flatten to
    /// `[a, b, c]`.
    pub fn comb_flatten(&self) -> Vec<Prim> {
        let is_pair_opcode = matches!(self.opcode_name(), Some("Pair") | Some("pair"));
        if is_pair_opcode && self.args.len() == 2 {
            let mut out = vec![self.args[0].clone()];
            out.extend(self.args[1].comb_flatten());
            out
        } else if self.is_converted_comb() {
            self.args.iter().flat_map(|a| a.comb_flatten()).collect()
        } else {
            vec![self.clone()]
        }
    }

    /// Regroups a flat list of elements into a right-nested `D_PAIR`
    /// tree of `arity` top-level branches, folding any surplus elements
    /// into the last branch. Inverse (up to shape) of `comb_flatten`
    /// for the data-level `Pair` opcode.
    pub fn comb_unflatten(mut elems: Vec<Prim>, opcode: OpCode, arity: usize) -> Prim {
        if elems.is_empty() {
            return Prim::nullary(opcode);
        }
        if arity <= 1 || elems.len() == 1 {
            return elems.remove(0);
        }
        let head = elems.remove(0);
        let tail = Prim::comb_unflatten(elems, opcode, arity - 1);
        Prim::binary(opcode, head, tail)
    }

    /// Recursively collects every packed (`0x05`-prefixed) `Bytes` node
    /// in the tree and replaces it with its unpacked form, marking the
    /// substitution (and its descendants) `was_packed`. Unpack failures
    /// are swallowed: the bytes are left untouched.
    pub fn unpack_all(&self) -> Prim {
        if let Payload::Bytes(bytes) = &self.payload {
            if crate::packed::is_packed(bytes) {
                if let Ok(mut unpacked) = crate::packed::unpack(bytes) {
                    unpacked.set_was_packed(true);
                    return unpacked.unpack_all();
                }
            }
            return self.clone();
        }
        let mut clone = self.clone();
        for a in clone.args.iter_mut() {
            *a = a.unpack_all();
        }
        clone
    }

    /// Tree-level comb normalization independent of a `Type`: collapses
    /// every converted-comb `Sequence` of `Pair`-shaped siblings into
    /// nested `D_PAIR`/`T_PAIR` nodes; the inverse (unflattening an
    /// already-expanded tree back into a comb sequence) is *not*
    /// attempted here - this only walks toward the canonical (fully
    /// expanded) form.
    pub fn simplify(&self) -> Prim {
        let mut clone = self.clone();
        for a in clone.args.iter_mut() {
            *a = a.simplify();
        }
        if clone.is_converted_comb() && !clone.looks_like_container() {
            let pair_opcode = match clone.args[0].opcode() {
                Some(op) if op.is_type() => OpCode::T_PAIR,
                _ => OpCode::D_PAIR,
            };
            let arity = clone.args.len();
            return Prim::comb_unflatten(clone.args, pair_opcode, arity);
        }
        clone
    }

    /// Depth-first walk over every node in the tree, including `self`.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Prim)) {
        f(self);
        for a in &self.args {
            a.walk(f);
        }
    }

    /// True iff any node in the tree carries the given opcode.
    pub fn contains_opcode(&self, opcode: OpCode) -> bool {
        let mut found = false;
        self.walk(&mut |p| {
            if p.is_opcode(opcode) {
                found = true;
            }
        });
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimShape {
    Int,
    String,
    Bytes,
    Sequence,
    Node(u8, usize),
}

impl PrimShape {
    fn of(p: &Prim) -> PrimShape {
        match p.tag {
            PrimTag::Int => PrimShape::Int,
            PrimTag::String => PrimShape::String,
            PrimTag::Bytes => PrimShape::Bytes,
            PrimTag::Sequence => PrimShape::Sequence,
            _ => PrimShape::Node(p.opcode_byte.unwrap_or(0), p.args.len()),
        }
    }
}

impl PartialEq for Prim {
    fn eq(&self, other: &Prim) -> bool {
        self.eq_with_anno(other)
    }
}
impl Eq for Prim {}

// ---------------------------------------------------------------------
// Binary codec
// ---------------------------------------------------------------------

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, PrimError> {
    if bytes.len() < at + 4 {
        return Err(michelson_encoding::EncodingError::ShortBuffer { needed: at + 4, available: bytes.len() }.into());
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    Ok(u32::from_be_bytes(buf))
}

fn write_anno_block(out: &mut Vec<u8>, anno: &[String]) {
    let joined = anno.join(" ");
    write_u32(out, joined.len() as u32);
    out.extend_from_slice(joined.as_bytes());
}

fn read_anno_block(bytes: &[u8], at: usize) -> Result<(Vec<String>, usize), PrimError> {
    let len = read_u32(bytes, at)? as usize;
    let start = at + 4;
    let end = start + len;
    if bytes.len() < end {
        return Err(michelson_encoding::EncodingError::ShortBuffer { needed: end, available: bytes.len() }.into());
    }
    let text = std::str::from_utf8(&bytes[start..end]).map_err(|_| michelson_encoding::EncodingError::InvalidUtf8)?;
    let anno = if text.is_empty() { Vec::new() } else { text.split(' ').map(|s| s.to_string()).collect() };
    Ok((anno, end - at))
}

impl Prim {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.tag.byte());
        match self.tag {
            PrimTag::Int => {
                let v = self.int_value().expect("Int prim carries an int payload");
                out.extend(zarith::encode(v));
            }
            PrimTag::String => {
                let v = self.string_value().expect("String prim carries a string payload");
                write_u32(out, v.len() as u32);
                out.extend_from_slice(v.as_bytes());
            }
            PrimTag::Bytes => {
                let v = self.bytes_value().expect("Bytes prim carries a bytes payload");
                write_u32(out, v.len() as u32);
                out.extend_from_slice(v);
            }
            PrimTag::Sequence => {
                let mut body = Vec::new();
                for a in &self.args {
                    a.encode_into(&mut body);
                }
                write_u32(out, body.len() as u32);
                out.extend(body);
            }
            PrimTag::Nullary => {
                out.push(self.opcode_byte.expect("Nullary prim carries an opcode byte"));
            }
            PrimTag::NullaryAnno => {
                out.push(self.opcode_byte.expect("NullaryAnno prim carries an opcode byte"));
                write_anno_block(out, &self.anno);
            }
            PrimTag::Unary => {
                out.push(self.opcode_byte.expect("Unary prim carries an opcode byte"));
                self.args[0].encode_into(out);
            }
            PrimTag::UnaryAnno => {
                out.push(self.opcode_byte.expect("UnaryAnno prim carries an opcode byte"));
                self.args[0].encode_into(out);
                write_anno_block(out, &self.anno);
            }
            PrimTag::Binary => {
                out.push(self.opcode_byte.expect("Binary prim carries an opcode byte"));
                self.args[0].encode_into(out);
                self.args[1].encode_into(out);
            }
            PrimTag::BinaryAnno => {
                out.push(self.opcode_byte.expect("BinaryAnno prim carries an opcode byte"));
                self.args[0].encode_into(out);
                self.args[1].encode_into(out);
                write_anno_block(out, &self.anno);
            }
            PrimTag::VariadicAnno => {
                out.push(self.opcode_byte.expect("VariadicAnno prim carries an opcode byte"));
                let mut body = Vec::new();
                for a in &self.args {
                    a.encode_into(&mut body);
                }
                write_u32(out, body.len() as u32);
                out.extend(body);
                write_anno_block(out, &self.anno);
            }
        }
    }

    /// Decodes a `Prim` from the front of `bytes`, returning the value
    /// and the number of bytes consumed. Rejects any leading tag byte
    /// above `0x0A` and any length prefix that overruns the buffer.
    pub fn decode(bytes: &[u8]) -> Result<(Prim, usize), PrimError> {
        Prim::decode_core(bytes).map_err(|err| {
            crate::diagnostics::log_debug("prim decode failed", &err);
            err
        })
    }

    fn decode_core(bytes: &[u8]) -> Result<(Prim, usize), PrimError> {
        if bytes.is_empty() {
            return Err(michelson_encoding::EncodingError::ShortBuffer { needed: 1, available: 0 }.into());
        }
        let tag = PrimTag::from_byte(bytes[0])?;
        let mut at = 1;

        let prim = match tag {
            PrimTag::Int => {
                let (v, consumed) = zarith::decode(&bytes[at..])?;
                at += consumed;
                Prim::int(v)
            }
            PrimTag::String => {
                let len = read_u32(bytes, at)? as usize;
                at += 4;
                let end = at + len;
                if bytes.len() < end {
                    return Err(michelson_encoding::EncodingError::ShortBuffer { needed: end, available: bytes.len() }.into());
                }
                let s = std::str::from_utf8(&bytes[at..end]).map_err(|_| michelson_encoding::EncodingError::InvalidUtf8)?;
                at = end;
                Prim::string(s)
            }
            PrimTag::Bytes => {
                let len = read_u32(bytes, at)? as usize;
                at += 4;
                let end = at + len;
                if bytes.len() < end {
                    return Err(michelson_encoding::EncodingError::ShortBuffer { needed: end, available: bytes.len() }.into());
                }
                at = end;
                Prim::bytes(bytes[at - len..at].to_vec())
            }
            PrimTag::Sequence => {
                let body_len = read_u32(bytes, at)? as usize;
                at += 4;
                let end = at + body_len;
                if bytes.len() < end {
                    return Err(michelson_encoding::EncodingError::ShortBuffer { needed: end, available: bytes.len() }.into());
                }
                let mut children = Vec::new();
                let mut pos = at;
                while pos < end {
                    let (child, consumed) = Prim::decode_core(&bytes[pos..end])?;
                    children.push(child);
                    pos += consumed;
                }
                if pos != end {
                    return Err(michelson_encoding::EncodingError::TrailingData { extra: pos - end }.into());
                }
                at = end;
                Prim::sequence(children)
            }
            PrimTag::Nullary => {
                let op = require_byte(bytes, at)?;
                at += 1;
                Prim { tag, opcode_byte: Some(op), args: Vec::new(), anno: Vec::new(), payload: Payload::None, was_packed: false }
            }
            PrimTag::NullaryAnno => {
                let op = require_byte(bytes, at)?;
                at += 1;
                let (anno, consumed) = read_anno_block(bytes, at)?;
                at += consumed;
                Prim { tag, opcode_byte: Some(op), args: Vec::new(), anno, payload: Payload::None, was_packed: false }
            }
            PrimTag::Unary => {
                let op = require_byte(bytes, at)?;
                at += 1;
                let (child, consumed) = Prim::decode_core(&bytes[at..])?;
                at += consumed;
                Prim { tag, opcode_byte: Some(op), args: vec![child], anno: Vec::new(), payload: Payload::None, was_packed: false }
            }
            PrimTag::UnaryAnno => {
                let op = require_byte(bytes, at)?;
                at += 1;
                let (child, consumed) = Prim::decode_core(&bytes[at..])?;
                at += consumed;
                let (anno, consumed) = read_anno_block(bytes, at)?;
                at += consumed;
                Prim { tag, opcode_byte: Some(op), args: vec![child], anno, payload: Payload::None, was_packed: false }
            }
            PrimTag::Binary => {
                let op = require_byte(bytes, at)?;
                at += 1;
                let (c1, consumed) = Prim::decode_core(&bytes[at..])?;
                at += consumed;
                let (c2, consumed) = Prim::decode_core(&bytes[at..])?;
                at += consumed;
                Prim { tag, opcode_byte: Some(op), args: vec![c1, c2], anno: Vec::new(), payload: Payload::None, was_packed: false }
            }
            PrimTag::BinaryAnno => {
                let op = require_byte(bytes, at)?;
                at += 1;
                let (c1, consumed) = Prim::decode_core(&bytes[at..])?;
                at += consumed;
                let (c2, consumed) = Prim::decode_core(&bytes[at..])?;
                at += consumed;
                let (anno, consumed) = read_anno_block(bytes, at)?;
                at += consumed;
                Prim { tag, opcode_byte: Some(op), args: vec![c1, c2], anno, payload: Payload::None, was_packed: false }
            }
            PrimTag::VariadicAnno => {
                let op = require_byte(bytes, at)?;
                at += 1;
                let args_len = read_u32(bytes, at)? as usize;
                at += 4;
                let end = at + args_len;
                if bytes.len() < end {
                    return Err(michelson_encoding::EncodingError::ShortBuffer { needed: end, available: bytes.len() }.into());
                }
                let mut children = Vec::new();
                let mut pos = at;
                while pos < end {
                    let (child, consumed) = Prim::decode_core(&bytes[pos..end])?;
                    children.push(child);
                    pos += consumed;
                }
                if pos != end {
                    return Err(michelson_encoding::EncodingError::TrailingData { extra: pos - end }.into());
                }
                at = end;
                let (anno, consumed) = read_anno_block(bytes, at)?;
                at += consumed;
                Prim { tag, opcode_byte: Some(op), args: children, anno, payload: Payload::None, was_packed: false }
            }
        };

        Ok((prim, at))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Prim, PrimError> {
        let (prim, consumed) = Prim::decode(bytes)?;
        if consumed != bytes.len() {
            return Err(michelson_encoding::EncodingError::TrailingData { extra: bytes.len() - consumed }.into());
        }
        Ok(prim)
    }
}

fn require_byte(bytes: &[u8], at: usize) -> Result<u8, PrimError> {
    bytes.get(at).copied().ok_or_else(|| michelson_encoding::EncodingError::ShortBuffer { needed: at + 1, available: bytes.len() }.into())
}

// ---------------------------------------------------------------------
// JSON codec
// ---------------------------------------------------------------------

impl Serialize for Prim {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.tag {
            PrimTag::Int => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("int", &self.int_value().unwrap().to_str_radix(10))?;
                map.end()
            }
            PrimTag::String => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("string", self.string_value().unwrap())?;
                map.end()
            }
            PrimTag::Bytes => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("bytes", &hex::encode(self.bytes_value().unwrap()))?;
                map.end()
            }
            PrimTag::Sequence => {
                let mut seq = serializer.serialize_seq(Some(self.args.len()))?;
                for a in &self.args {
                    seq.serialize_element(a)?;
                }
                seq.end()
            }
            _ => {
                let mut len = 1;
                if !self.args.is_empty() {
                    len += 1;
                }
                if self.tag.has_anno_slot() && !self.anno.is_empty() {
                    len += 1;
                }
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("prim", self.opcode_name().unwrap_or("unknown"))?;
                if !self.args.is_empty() {
                    map.serialize_entry("args", &self.args)?;
                }
                if self.tag.has_anno_slot() && !self.anno.is_empty() {
                    map.serialize_entry("annots", &self.anno)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Prim {
    fn deserialize<D>(deserializer: D) -> Result<Prim, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PrimVisitor)
    }
}

struct PrimVisitor;

impl<'de> Visitor<'de> for PrimVisitor {
    type Value = Prim;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Michelson primitive JSON value")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Prim, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut args = Vec::new();
        while let Some(p) = seq.next_element::<Prim>()? {
            args.push(p);
        }
        Ok(Prim::sequence(args))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Prim, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut int_val: Option<String> = None;
        let mut string_val: Option<String> = None;
        let mut bytes_val: Option<String> = None;
        let mut prim_val: Option<String> = None;
        let mut args_val: Option<Vec<Prim>> = None;
        let mut annots_val: Option<Vec<String>> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "int" => int_val = Some(map.next_value()?),
                "string" => string_val = Some(map.next_value()?),
                "bytes" => bytes_val = Some(map.next_value()?),
                "prim" => prim_val = Some(map.next_value()?),
                "args" => args_val = Some(map.next_value()?),
                "annots" => annots_val = Some(map.next_value()?),
                _ => {
                    let _: serde_json::Value = map.next_value()?;
                }
            }
        }

        if let Some(s) = int_val {
            let v = BigInt::from_str_radix(&s, 10).map_err(de::Error::custom)?;
            return Ok(Prim::int(v));
        }
        if let Some(s) = string_val {
            return Ok(Prim::string(s));
        }
        if let Some(h) = bytes_val {
            let v = hex::decode(&h).map_err(de::Error::custom)?;
            return Ok(Prim::bytes(v));
        }
        if let Some(name) = prim_val {
            let opcode = OpCode::from_name(&name).map_err(de::Error::custom)?;
            let args = args_val.unwrap_or_default();
            let anno = annots_val.unwrap_or_default();
            return Ok(Prim::node(opcode, args, anno));
        }

        Err(de::Error::custom("expected one of int/string/bytes/prim keys"))
    }
}

impl Prim {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("Prim serialization is infallible")
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Prim, PrimError> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_binary_round_trip() {
        let p = Prim::int(BigInt::from(352));
        let (decoded, consumed) = Prim::decode(&p.encode()).unwrap();
        assert_eq!(decoded, p);
        assert_eq!(consumed, p.encode().len());
    }

    #[test]
    fn node_with_anno_round_trips_both_shapes() {
        let pair = Prim::node(
            OpCode::D_PAIR,
            vec![Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2))],
            vec!["%a".into(), "%b".into()],
        );
        assert_eq!(pair.tag(), PrimTag::BinaryAnno);
        let (decoded, _) = Prim::decode(&pair.encode()).unwrap();
        assert!(decoded.eq_with_anno(&pair));
    }

    #[test]
    fn variadic_round_trips() {
        let seq = Prim::node(
            OpCode::I_PUSH,
            vec![Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2)), Prim::int(BigInt::from(3))],
            Vec::new(),
        );
        assert_eq!(seq.tag(), PrimTag::VariadicAnno);
        let (decoded, consumed) = Prim::decode(&seq.encode()).unwrap();
        assert_eq!(decoded, seq);
        assert_eq!(consumed, seq.encode().len());
    }

    #[test]
    fn sequence_round_trips() {
        let seq = Prim::sequence(vec![Prim::string("a"), Prim::string("b")]);
        let (decoded, _) = Prim::decode(&seq.encode()).unwrap();
        assert_eq!(decoded, seq);
    }

    #[test]
    fn bad_tag_is_rejected() {
        assert!(Prim::decode(&[0xff]).is_err());
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(Prim::decode(&[]).is_err());
        // Sequence tag claiming a body longer than what follows.
        assert!(Prim::decode(&[0x02, 0x00, 0x00, 0x00, 0x05]).is_err());
    }

    #[test]
    fn trailing_data_in_sequence_body_is_rejected() {
        // A sequence whose declared body length splits a child prim in half.
        let child = Prim::int(BigInt::from(1));
        let mut body = child.encode();
        body.push(0xAB); // stray byte inside the declared body length
        let mut bytes = vec![0x02];
        bytes.extend((body.len() as u32).to_be_bytes());
        bytes.extend(body);
        assert!(Prim::decode(&bytes).is_err());
    }

    #[test]
    fn json_scalar_round_trip() {
        let p = Prim::string("tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw");
        let json = p.to_json();
        assert_eq!(json, serde_json::json!({"string": "tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw"}));
        let back = Prim::from_json(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn json_node_round_trip() {
        let p = Prim::node(OpCode::D_PAIR, vec![Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2))], vec!["%a".into()]);
        let json = p.to_json();
        let back = Prim::from_json(&json).unwrap();
        assert!(back.eq_with_anno(&p));
    }

    #[test]
    fn json_array_is_sequence() {
        let json = serde_json::json!([{"int": "1"}, {"int": "2"}]);
        let p = Prim::from_json(&json).unwrap();
        assert!(p.is_sequence());
        assert_eq!(p.args().len(), 2);
    }

    #[test]
    fn comb_flatten_and_unflatten() {
        let nested = Prim::binary(
            OpCode::D_PAIR,
            Prim::int(BigInt::from(1)),
            Prim::binary(OpCode::D_PAIR, Prim::int(BigInt::from(2)), Prim::int(BigInt::from(3))),
        );
        let flat = nested.comb_flatten();
        assert_eq!(flat.len(), 3);
        let rebuilt = Prim::comb_unflatten(flat, OpCode::D_PAIR, 3);
        assert!(rebuilt.eq_with_anno(&nested));
    }

    #[test]
    fn converted_comb_detection() {
        let comb = Prim::sequence(vec![Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2)), Prim::int(BigInt::from(3))]);
        assert!(comb.is_converted_comb());
        let not_comb = Prim::sequence(vec![Prim::binary(OpCode::D_PAIR, Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2)))]);
        assert!(!not_comb.is_converted_comb());
    }

    #[test]
    fn simplify_collapses_data_comb() {
        // [1; "abc"; Unit] is a converted D_PAIR comb: heterogeneous
        // siblings, none of them already a `Pair`.
        let comb = Prim::sequence(vec![Prim::int(BigInt::from(1)), Prim::string("abc"), Prim::nullary(OpCode::D_UNIT)]);
        let simplified = comb.simplify();
        let expected = Prim::binary(
            OpCode::D_PAIR,
            Prim::int(BigInt::from(1)),
            Prim::binary(OpCode::D_PAIR, Prim::string("abc"), Prim::nullary(OpCode::D_UNIT)),
        );
        assert!(simplified.eq_with_anno(&expected));
    }

    #[test]
    fn simplify_collapses_type_comb() {
        let comb = Prim::sequence(vec![Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_STRING), Prim::nullary(OpCode::T_BOOL)]);
        let simplified = comb.simplify();
        let expected = Prim::binary(
            OpCode::T_PAIR,
            Prim::nullary(OpCode::T_NAT),
            Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_STRING), Prim::nullary(OpCode::T_BOOL)),
        );
        assert!(simplified.eq_with_anno(&expected));
    }

    #[test]
    fn simplify_leaves_homogeneous_sequence_alone() {
        // A genuine list of nats is shaped identically to a converted
        // comb of same-typed leaves; simplify must not touch it.
        let list = Prim::sequence(vec![Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2)), Prim::int(BigInt::from(3))]);
        let simplified = list.simplify();
        assert!(simplified.eq_with_anno(&list));
    }
}
