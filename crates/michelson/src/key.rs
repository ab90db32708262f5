// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! `Key`: a comparable map/bigmap key. Parses from
//! text via an ordered probe chain, renders to the canonical binary form
//! of its value prim, and computes the domain-separated "expression
//! hash" used for content-addressed big-map lookups.

use chrono::{DateTime, TimeZone, Utc};
use michelson_encoding::OpCode;
use num_bigint::BigInt;
use num_traits::Num;

use crate::error::PrimError;
use crate::prim::Prim;

/// Controls ambiguous cases in the text-parsing probe chain; currently just whether a bare integer literal without a known
/// type should be treated as `T_INT` or `T_NAT`.
#[derive(Debug, Clone, Copy)]
pub struct KeyParseConfig {
    pub bare_integer_is_nat: bool,
}

impl Default for KeyParseConfig {
    fn default() -> KeyParseConfig {
        KeyParseConfig { bare_integer_is_nat: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind {
    Int,
    Nat,
    Mutez,
    String,
    Bytes,
    Bool,
    Timestamp,
    Address,
    KeyHash,
    PublicKey,
    Signature,
    Unit,
    ChainId,
    Pair,
    Option,
    Or,
}

/// A parsed, comparable key. `prim` is the canonical value-level
/// primitive whose binary encoding is the key's content-addressing
/// preimage; `text` is the canonical human-readable rendering.
#[derive(Debug, Clone)]
pub struct Key {
    kind: KeyKind,
    prim: Prim,
    text: String,
}

impl Key {
    pub fn kind(&self) -> &KeyKind {
        &self.kind
    }

    pub fn prim(&self) -> &Prim {
        &self.prim
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Canonical binary encoding of the key's prim.
    pub fn bytes(&self) -> Vec<u8> {
        self.prim.encode()
    }

    /// `BLAKE2b-256(0x05 || bytes)`, base58check-encoded with the
    /// `expr…` script-expression-hash prefix.
    pub fn expr_hash(&self) -> String {
        let mut preimage = vec![0x05u8];
        preimage.extend(self.bytes());
        let digest = crypto::blake2b::digest_256(&preimage);
        crypto::hash::encode(crypto::hash::HashType::ScriptExprHash, &digest)
    }

    // --- construction from (Type, Value) -----------------------------

    pub fn from_type_value(ty: &Prim, value: &Prim) -> Result<Key, PrimError> {
        match ty.opcode_name() {
            Some("int") => int_like(value, KeyKind::Int),
            Some("nat") => int_like(value, KeyKind::Nat),
            Some("mutez") => int_like(value, KeyKind::Mutez),
            Some("string") => {
                let s = value.string_value().ok_or_else(|| PrimError::BadKey("expected a string value".into()))?;
                Ok(Key { kind: KeyKind::String, prim: Prim::string(s), text: s.to_string() })
            }
            Some("bytes") => {
                let b = value.bytes_value().ok_or_else(|| PrimError::BadKey("expected a bytes value".into()))?.to_vec();
                let text = hex::encode(&b);
                Ok(Key { kind: KeyKind::Bytes, prim: Prim::bytes(b), text })
            }
            Some("bool") => match value.opcode_name() {
                Some("True") => Ok(Key { kind: KeyKind::Bool, prim: value.clone(), text: "true".to_string() }),
                Some("False") => Ok(Key { kind: KeyKind::Bool, prim: value.clone(), text: "false".to_string() }),
                _ => Err(PrimError::BadKey("expected True/False".into())),
            },
            Some("timestamp") => timestamp_key(value),
            Some("address") => address_key(value),
            Some("key_hash") => key_hash_key(value),
            Some("key") => {
                let b = value.bytes_value().ok_or_else(|| PrimError::BadKey("expected key bytes".into()))?;
                let text = crypto::public_key::decode_to_text(b).map_err(|e| PrimError::BadKey(e.to_string()))?;
                Ok(Key { kind: KeyKind::PublicKey, prim: value.clone(), text })
            }
            Some("signature") => {
                let b = value.bytes_value().ok_or_else(|| PrimError::BadKey("expected signature bytes".into()))?;
                let text = crypto::signature::decode_to_text(b).map_err(|e| PrimError::BadKey(e.to_string()))?;
                Ok(Key { kind: KeyKind::Signature, prim: value.clone(), text })
            }
            Some("chain_id") => {
                let b = value.bytes_value().ok_or_else(|| PrimError::BadKey("expected chain_id bytes".into()))?;
                let text = crypto::chain_id::decode_to_text(b).map_err(|e| PrimError::BadKey(e.to_string()))?;
                Ok(Key { kind: KeyKind::ChainId, prim: value.clone(), text })
            }
            Some("unit") => Ok(Key { kind: KeyKind::Unit, prim: Prim::nullary(OpCode::D_UNIT), text: "Unit".to_string() }),
            Some("pair") => pair_key(ty, value),
            Some("option") => option_key(ty, value),
            Some("or") => or_key(ty, value),
            other => Err(PrimError::BadKey(format!("unsupported key type opcode {:?}", other))),
        }
    }

    /// Parses freeform text into a key, inferring its type via the
    /// ordered probe chain below when `ty` is `None`.
    pub fn from_text(ty: Option<&Prim>, text: &str, config: &KeyParseConfig) -> Result<Key, PrimError> {
        if let Some(ty) = ty {
            return parse_typed(ty, text, config);
        }
        probe_untyped(text, config)
    }
}

fn int_like(value: &Prim, kind: KeyKind) -> Result<Key, PrimError> {
    let n = value.int_value().ok_or_else(|| PrimError::BadKey("expected an int value".into()))?;
    Ok(Key { kind, prim: Prim::int(n.clone()), text: n.to_str_radix(10) })
}

fn timestamp_key(value: &Prim) -> Result<Key, PrimError> {
    if let Some(n) = value.int_value() {
        let seconds: i64 = n.to_string().parse().map_err(|_| PrimError::BadKey("timestamp int out of range".into()))?;
        let text = Utc.timestamp_opt(seconds, 0).single().map(|dt| dt.to_rfc3339()).unwrap_or_else(|| n.to_str_radix(10));
        return Ok(Key { kind: KeyKind::Timestamp, prim: value.clone(), text });
    }
    if let Some(s) = value.string_value() {
        return Ok(Key { kind: KeyKind::Timestamp, prim: value.clone(), text: s.to_string() });
    }
    Err(PrimError::BadKey("expected a timestamp int or string".into()))
}

fn address_key(value: &Prim) -> Result<Key, PrimError> {
    let b = value.bytes_value().ok_or_else(|| PrimError::BadKey("expected address bytes".into()))?;
    let text = crypto::address::decode_to_text(b).map_err(|e| PrimError::BadKey(e.to_string()))?;
    Ok(Key { kind: KeyKind::Address, prim: value.clone(), text })
}

/// Key-hashes strip the address's leading implicit/originated
/// discriminator byte, carrying only `[curve_tag, hash20]` (21 bytes).
fn key_hash_key(value: &Prim) -> Result<Key, PrimError> {
    let b = value.bytes_value().ok_or_else(|| PrimError::BadKey("expected key_hash bytes".into()))?;
    if b.len() != 21 {
        return Err(PrimError::BadKey(format!("key_hash payload must be 21 bytes, got {}", b.len())));
    }
    let hash_type = match b[0] {
        0x00 => crypto::hash::HashType::ContractTz1Hash,
        0x01 => crypto::hash::HashType::ContractTz2Hash,
        0x02 => crypto::hash::HashType::ContractTz3Hash,
        other => return Err(PrimError::BadKey(format!("unknown key_hash curve tag {}", other))),
    };
    let text = crypto::hash::encode(hash_type, &b[1..]);
    Ok(Key { kind: KeyKind::KeyHash, prim: value.clone(), text })
}

fn pair_key(ty: &Prim, value: &Prim) -> Result<Key, PrimError> {
    let type_args = ty.comb_flatten();
    let value_args = value.comb_flatten();
    if type_args.len() != value_args.len() {
        return Err(PrimError::BadKey(format!("pair key arity mismatch: type has {}, value has {}", type_args.len(), value_args.len())));
    }
    let parts: Result<Vec<Key>, PrimError> = type_args.iter().zip(value_args.iter()).map(|(t, v)| Key::from_type_value(t, v)).collect();
    let parts = parts?;
    let text = parts.iter().map(|k| k.text.clone()).collect::<Vec<_>>().join(",");
    let prims: Vec<Prim> = parts.iter().map(|k| k.prim.clone()).collect();
    let prim = Prim::comb_unflatten(prims, OpCode::D_PAIR, type_args.len());
    Ok(Key { kind: KeyKind::Pair, prim, text })
}

fn option_key(ty: &Prim, value: &Prim) -> Result<Key, PrimError> {
    match value.opcode_name() {
        Some("None") => Ok(Key { kind: KeyKind::Option, prim: Prim::nullary(OpCode::D_NONE), text: "None".to_string() }),
        Some("Some") => {
            let inner_ty = &ty.args()[0];
            let inner = Key::from_type_value(inner_ty, &value.args()[0])?;
            let prim = Prim::unary(OpCode::D_SOME, inner.prim.clone());
            Ok(Key { kind: KeyKind::Option, prim, text: format!("Some({})", inner.text) })
        }
        _ => Err(PrimError::BadKey("expected None/Some".into())),
    }
}

fn or_key(ty: &Prim, value: &Prim) -> Result<Key, PrimError> {
    match value.opcode_name() {
        Some("Left") => {
            let inner = Key::from_type_value(&ty.args()[0], &value.args()[0])?;
            let prim = Prim::unary(OpCode::D_LEFT, inner.prim.clone());
            Ok(Key { kind: KeyKind::Or, prim, text: format!("Left({})", inner.text) })
        }
        Some("Right") => {
            let inner = Key::from_type_value(&ty.args()[1], &value.args()[0])?;
            let prim = Prim::unary(OpCode::D_RIGHT, inner.prim.clone());
            Ok(Key { kind: KeyKind::Or, prim, text: format!("Right({})", inner.text) })
        }
        _ => Err(PrimError::BadKey("expected Left/Right".into())),
    }
}

// --- text parsing ------------------------------------

fn parse_typed(ty: &Prim, text: &str, config: &KeyParseConfig) -> Result<Key, PrimError> {
    match ty.opcode_name() {
        Some("int") | Some("nat") | Some("mutez") => {
            let n = BigInt::from_str_radix(text, 10).map_err(|_| PrimError::BadKey(format!("not an integer: {:?}", text)))?;
            int_like(&Prim::int(n), key_kind_for(ty.opcode_name()))
        }
        Some("string") => Ok(Key { kind: KeyKind::String, prim: Prim::string(text), text: text.to_string() }),
        Some("bytes") => {
            let b = hex::decode(text).map_err(|_| PrimError::BadKey(format!("not hex bytes: {:?}", text)))?;
            Ok(Key { kind: KeyKind::Bytes, prim: Prim::bytes(b.clone()), text: hex::encode(b) })
        }
        Some("bool") => match text {
            "true" | "True" => Ok(Key { kind: KeyKind::Bool, prim: Prim::nullary(OpCode::D_TRUE), text: "true".to_string() }),
            "false" | "False" => Ok(Key { kind: KeyKind::Bool, prim: Prim::nullary(OpCode::D_FALSE), text: "false".to_string() }),
            _ => Err(PrimError::BadKey(format!("not a boolean: {:?}", text))),
        },
        Some("timestamp") => match DateTime::parse_from_rfc3339(text) {
            Ok(dt) => timestamp_key(&Prim::int(BigInt::from(dt.timestamp()))),
            Err(_) => timestamp_key(&Prim::string(text)),
        },
        Some("address") => {
            let b = crypto::address::encode_to_bytes(text).map_err(|e| PrimError::BadKey(e.to_string()))?;
            address_key(&Prim::bytes(b))
        }
        Some("key_hash") => {
            let (hash_type, prefix_tag) = key_hash_hash_type(text)?;
            let b = crypto::hash::decode(hash_type, text).map_err(|e| PrimError::BadKey(e.to_string()))?;
            let mut payload = vec![prefix_tag];
            payload.extend(b);
            key_hash_key(&Prim::bytes(payload))
        }
        Some("key") => {
            let b = crypto::public_key::encode_to_bytes(text).map_err(|e| PrimError::BadKey(e.to_string()))?;
            Key::from_type_value(ty, &Prim::bytes(b))
        }
        Some("signature") => {
            let b = crypto::signature::encode_to_bytes(text).map_err(|e| PrimError::BadKey(e.to_string()))?;
            Key::from_type_value(ty, &Prim::bytes(b))
        }
        Some("chain_id") => {
            let b = crypto::chain_id::encode_to_bytes(text).map_err(|e| PrimError::BadKey(e.to_string()))?;
            Key::from_type_value(ty, &Prim::bytes(b))
        }
        Some("unit") => Ok(Key { kind: KeyKind::Unit, prim: Prim::nullary(OpCode::D_UNIT), text: "Unit".to_string() }),
        Some("pair") => {
            let type_args = ty.comb_flatten();
            let parts_text = split_top_level_commas(text);
            if parts_text.len() != type_args.len() {
                return Err(PrimError::BadKey(format!("pair key expected {} components, got {}", type_args.len(), parts_text.len())));
            }
            let parts: Result<Vec<Key>, PrimError> =
                type_args.iter().zip(parts_text.iter()).map(|(t, p)| parse_typed(t, p, config)).collect();
            let parts = parts?;
            let text = parts.iter().map(|k| k.text.clone()).collect::<Vec<_>>().join(",");
            let prims: Vec<Prim> = parts.iter().map(|k| k.prim.clone()).collect();
            let prim = Prim::comb_unflatten(prims, OpCode::D_PAIR, type_args.len());
            Ok(Key { kind: KeyKind::Pair, prim, text })
        }
        other => Err(PrimError::BadKey(format!("unsupported key type for text parsing: {:?}", other))),
    }
}

fn key_kind_for(opcode_name: Option<&'static str>) -> KeyKind {
    match opcode_name {
        Some("nat") => KeyKind::Nat,
        Some("mutez") => KeyKind::Mutez,
        _ => KeyKind::Int,
    }
}

fn key_hash_hash_type(text: &str) -> Result<(crypto::hash::HashType, u8), PrimError> {
    if text.starts_with("tz1") {
        Ok((crypto::hash::HashType::ContractTz1Hash, 0x00))
    } else if text.starts_with("tz2") {
        Ok((crypto::hash::HashType::ContractTz2Hash, 0x01))
    } else if text.starts_with("tz3") {
        Ok((crypto::hash::HashType::ContractTz3Hash, 0x02))
    } else {
        Err(PrimError::BadKey(format!("unrecognized key_hash text: {:?}", text)))
    }
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    // Pair keys are comma-separated with no nested parenthesisation in
    // the plain (non-composite-of-composite) case; nested composite
    // components are not split further here.
    text.split(',').collect()
}

/// Ordered probe chain for inferring a key's type from text alone:
/// unit -> address -> key -> signature -> RFC3339
/// timestamp -> integer -> hex bytes -> comma-composite -> boolean ->
/// string (the final, always-matching fallback).
fn probe_untyped(text: &str, config: &KeyParseConfig) -> Result<Key, PrimError> {
    if text == "Unit" {
        return Ok(Key { kind: KeyKind::Unit, prim: Prim::nullary(OpCode::D_UNIT), text: text.to_string() });
    }
    if text.starts_with("tz1") || text.starts_with("tz2") || text.starts_with("tz3") || text.starts_with("KT1") {
        if let Ok(b) = crypto::address::encode_to_bytes(text) {
            return address_key(&Prim::bytes(b));
        }
    }
    if text.starts_with("edpk") || text.starts_with("sppk") || text.starts_with("p2pk") {
        if let Ok(b) = crypto::public_key::encode_to_bytes(text) {
            return Key::from_type_value(&Prim::nullary(OpCode::T_KEY), &Prim::bytes(b));
        }
    }
    if text.starts_with("sig") || text.starts_with("edsig") {
        if let Ok(b) = crypto::signature::encode_to_bytes(text) {
            return Key::from_type_value(&Prim::nullary(OpCode::T_SIGNATURE), &Prim::bytes(b));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return timestamp_key(&Prim::int(BigInt::from(dt.timestamp())));
    }
    if let Ok(n) = BigInt::from_str_radix(text, 10) {
        let kind = if config.bare_integer_is_nat { KeyKind::Nat } else { KeyKind::Int };
        return int_like(&Prim::int(n), kind);
    }
    if text.chars().all(|c| c.is_ascii_hexdigit()) && text.len() % 2 == 0 && !text.is_empty() {
        if let Ok(b) = hex::decode(text) {
            return Ok(Key { kind: KeyKind::Bytes, prim: Prim::bytes(b.clone()), text: hex::encode(b) });
        }
    }
    if text.contains(',') {
        let parts_text = split_top_level_commas(text);
        let parts: Result<Vec<Key>, PrimError> = parts_text.iter().map(|p| probe_untyped(p, config)).collect();
        let parts = parts?;
        let joined = parts.iter().map(|k| k.text.clone()).collect::<Vec<_>>().join(",");
        let prims: Vec<Prim> = parts.iter().map(|k| k.prim.clone()).collect();
        let arity = prims.len();
        let prim = Prim::comb_unflatten(prims, OpCode::D_PAIR, arity);
        return Ok(Key { kind: KeyKind::Pair, prim, text: joined });
    }
    if text == "true" || text == "false" {
        let prim = if text == "true" { Prim::nullary(OpCode::D_TRUE) } else { Prim::nullary(OpCode::D_FALSE) };
        return Ok(Key { kind: KeyKind::Bool, prim, text: text.to_string() });
    }
    Ok(Key { kind: KeyKind::String, prim: Prim::string(text), text: text.to_string() })
}
