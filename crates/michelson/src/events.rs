// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Lazy events: decoding of the storage-diff events a node reports
//! alongside a block's operations (big-map alloc/update/remove/copy,
//! sapling state diffs), consumed by external indexers.
//!
//! The wire shape is the chain's `lazy_storage_diff` RPC JSON: an array
//! of `{"kind": "big_map"|"sapling_state", "id": "…", "diff": {…}}`
//! objects.

use serde_json::Value as Json;

use crate::error::PrimError;
use crate::prim::Prim;

#[derive(Debug, Clone, PartialEq)]
pub enum BigMapAction {
    Alloc { key_type: Prim, value_type: Prim },
    Update { key_hash: String, key: Prim, value: Option<Prim> },
    Remove,
    Copy { source: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BigMapDiff {
    pub id: i64,
    pub action: BigMapAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaplingUpdate {
    pub commitments_and_ciphertexts: Vec<Json>,
    pub nullifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaplingAction {
    Alloc { memo_size: u32 },
    Update(SaplingUpdate),
    Remove,
    Copy { source: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaplingStateDiff {
    pub id: i64,
    pub action: SaplingAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LazyEvent {
    BigMap(BigMapDiff),
    SaplingState(SaplingStateDiff),
}

/// Parses the `lazy_storage_diff` JSON array reported alongside an
/// operation's metadata. Unknown
/// `kind`s are skipped rather than treated as a hard error, since new
/// lazy-storage kinds are added to the chain over time.
pub fn parse_lazy_storage_diff(json: &Json) -> Result<Vec<LazyEvent>, PrimError> {
    let entries = json.as_array().ok_or_else(|| PrimError::BrokenPrim("lazy_storage_diff must be a JSON array".to_string()))?;
    let mut events = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.get("kind").and_then(Json::as_str) {
            Some("big_map") => events.push(LazyEvent::BigMap(parse_big_map_diff(entry)?)),
            Some("sapling_state") => events.push(LazyEvent::SaplingState(parse_sapling_state_diff(entry)?)),
            _ => continue,
        }
    }
    Ok(events)
}

fn field<'a>(entry: &'a Json, name: &str) -> Result<&'a Json, PrimError> {
    entry.get(name).ok_or_else(|| PrimError::BrokenPrim(format!("lazy_storage_diff entry missing {:?}", name)))
}

fn parse_id(entry: &Json) -> Result<i64, PrimError> {
    let raw = field(entry, "id")?;
    if let Some(s) = raw.as_str() {
        return s.parse().map_err(|_| PrimError::BrokenPrim(format!("big_map/sapling_state id not an integer: {:?}", s)));
    }
    raw.as_i64().ok_or_else(|| PrimError::BrokenPrim("big_map/sapling_state id must be a string or integer".to_string()))
}

fn parse_prim_field(entry: &Json, name: &str) -> Result<Prim, PrimError> {
    Prim::from_json(field(entry, name)?)
}

fn parse_big_map_diff(entry: &Json) -> Result<BigMapDiff, PrimError> {
    let id = parse_id(entry)?;
    let diff = field(entry, "diff")?;
    let action = match diff.get("action").and_then(Json::as_str) {
        Some("alloc") => BigMapAction::Alloc { key_type: parse_prim_field(diff, "key_type")?, value_type: parse_prim_field(diff, "value_type")? },
        Some("update") => {
            let key_hash = field(diff, "key_hash")?.as_str().ok_or_else(|| PrimError::BrokenPrim("big_map update missing key_hash".to_string()))?.to_string();
            let key = parse_prim_field(diff, "key")?;
            let value = match diff.get("value") {
                Some(v) if !v.is_null() => Some(Prim::from_json(v)?),
                _ => None,
            };
            BigMapAction::Update { key_hash, key, value }
        }
        Some("remove") => BigMapAction::Remove,
        Some("copy") => {
            let source = field(diff, "source")?.as_str().ok_or_else(|| PrimError::BrokenPrim("big_map copy missing source".to_string()))?;
            let source = source.parse().map_err(|_| PrimError::BrokenPrim(format!("big_map copy source not an integer: {:?}", source)))?;
            BigMapAction::Copy { source }
        }
        other => return Err(PrimError::BrokenPrim(format!("unknown big_map diff action {:?}", other))),
    };
    Ok(BigMapDiff { id, action })
}

fn parse_sapling_state_diff(entry: &Json) -> Result<SaplingStateDiff, PrimError> {
    let id = parse_id(entry)?;
    let diff = field(entry, "diff")?;
    let action = match diff.get("action").and_then(Json::as_str) {
        Some("alloc") => {
            let memo_size = field(diff, "memo_size")?.as_u64().ok_or_else(|| PrimError::BrokenPrim("sapling_state alloc missing memo_size".to_string()))? as u32;
            SaplingAction::Alloc { memo_size }
        }
        Some("update") => {
            let updates = field(diff, "updates")?;
            let commitments_and_ciphertexts = updates.get("commitments_and_ciphertexts").and_then(Json::as_array).cloned().unwrap_or_default();
            let nullifiers = updates
                .get("nullifiers")
                .and_then(Json::as_array)
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            SaplingAction::Update(SaplingUpdate { commitments_and_ciphertexts, nullifiers })
        }
        Some("remove") => SaplingAction::Remove,
        Some("copy") => {
            let source = field(diff, "source")?.as_str().ok_or_else(|| PrimError::BrokenPrim("sapling_state copy missing source".to_string()))?;
            let source = source.parse().map_err(|_| PrimError::BrokenPrim(format!("sapling_state copy source not an integer: {:?}", source)))?;
            SaplingAction::Copy { source }
        }
        other => return Err(PrimError::BrokenPrim(format!("unknown sapling_state diff action {:?}", other))),
    };
    Ok(SaplingStateDiff { id, action })
}
