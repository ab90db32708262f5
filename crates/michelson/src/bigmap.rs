// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Bigmap-id discovery: walks a storage type and value in lock-step to
//! find every `T_BIG_MAP` reference reachable from storage, naming each
//! by its path through the type tree.

use std::collections::HashMap;

use michelson_encoding::OpCode;

use crate::prim::Prim;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigMapRef {
    pub name: String,
    pub id: i64,
}

/// Walks `storage_type`/`storage_value` in lock-step, recording every
/// big-map reference found. Name collisions are disambiguated with a
/// `_n` suffix in discovery order.
pub fn discover(storage_type: &Prim, storage_value: &Prim) -> Vec<BigMapRef> {
    let mut found = Vec::new();
    let mut seen_names: HashMap<String, usize> = HashMap::new();
    walk(storage_type, storage_value, "storage", &mut found, &mut seen_names);
    found
}

fn record(name_hint: &str, id: i64, found: &mut Vec<BigMapRef>, seen_names: &mut HashMap<String, usize>) {
    let name = match seen_names.get_mut(name_hint) {
        Some(count) => {
            *count += 1;
            format!("{}_{}", name_hint, count)
        }
        None => {
            seen_names.insert(name_hint.to_string(), 0);
            name_hint.to_string()
        }
    };
    found.push(BigMapRef { name, id });
}

fn walk(ty: &Prim, value: &Prim, name_hint: &str, found: &mut Vec<BigMapRef>, seen_names: &mut HashMap<String, usize>) {
    match ty.opcode() {
        Some(OpCode::T_BIG_MAP) => {
            if let Some(id) = big_map_id(value) {
                record(name_hint, id, found, seen_names);
            }
        }
        Some(OpCode::T_OR) => {
            // Descend only into the branch the value actually chose.
            match value.opcode_name() {
                Some("Left") => walk(&ty.args()[0], &value.args()[0], name_hint, found, seen_names),
                Some("Right") => walk(&ty.args()[1], &value.args()[0], name_hint, found, seen_names),
                _ => {}
            }
        }
        Some(OpCode::T_PAIR) => {
            let type_args = ty.comb_flatten();
            let value_args = if value.is_opcode(OpCode::D_PAIR) || value.is_converted_comb() { value.comb_flatten() } else { vec![value.clone()] };
            for (i, (t, v)) in type_args.iter().zip(value_args.iter()).enumerate() {
                let field_hint = t.field_anno().map(|a| a.to_string()).unwrap_or_else(|| format!("{}.{}", name_hint, i));
                walk(t, v, &field_hint, found, seen_names);
            }
        }
        Some(OpCode::T_OPTION) => {
            if value.opcode_name() == Some("Some") {
                walk(&ty.args()[0], &value.args()[0], name_hint, found, seen_names);
            }
        }
        Some(OpCode::T_LIST) | Some(OpCode::T_SET) => {
            let elem_ty = &ty.args()[0];
            let items: &[Prim] = if value.is_sequence() { value.args() } else { &[] };
            for (i, item) in items.iter().enumerate() {
                walk(elem_ty, item, &format!("{}.{}", name_hint, i), found, seen_names);
            }
        }
        Some(OpCode::T_MAP) => {
            let key_ty = &ty.args()[0];
            let val_ty = &ty.args()[1];
            if val_ty.opcode() == Some(OpCode::T_BIG_MAP) {
                let elts: &[Prim] = if value.is_sequence() { value.args() } else { &[] };
                for elt in elts {
                    if elt.opcode() != Some(OpCode::D_ELT) {
                        continue;
                    }
                    let key_prim = &elt.args()[0];
                    let val_prim = &elt.args()[1];
                    let name = elt_key_name(key_ty, key_prim).unwrap_or_else(|| name_hint.to_string());
                    walk(val_ty, val_prim, &name, found, seen_names);
                }
            }
        }
        _ => {}
    }
}

/// Integer, or a pre-Babylon empty sequence (no id in scope here), or a
/// sequence whose first child is an integer.
fn big_map_id(value: &Prim) -> Option<i64> {
    if let Some(n) = value.int_value() {
        return n.to_string().parse().ok();
    }
    if value.is_sequence() {
        if let Some(first) = value.args().first() {
            if let Some(n) = first.int_value() {
                return n.to_string().parse().ok();
            }
        }
    }
    None
}

fn elt_key_name(key_ty: &Prim, key_prim: &Prim) -> Option<String> {
    match key_ty.opcode_name() {
        Some("string") => key_prim.string_value().map(|s| s.to_string()),
        Some("bytes") => key_prim.bytes_value().and_then(|b| std::str::from_utf8(b).ok()).map(|s| s.to_string()),
        Some("address") => key_prim.bytes_value().and_then(|b| crypto::address::decode_to_text(b).ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn finds_single_top_level_big_map() {
        let ty = Prim::binary(OpCode::T_BIG_MAP, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT));
        let value = Prim::int(BigInt::from(4));
        let refs = discover(&ty, &value);
        assert_eq!(refs, vec![BigMapRef { name: "storage".to_string(), id: 4 }]);
    }

    #[test]
    fn finds_named_big_maps_inside_pair() {
        let ty = Prim::binary(
            OpCode::T_PAIR,
            Prim::node(OpCode::T_BIG_MAP, vec![Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)], vec!["%ledger".into()]),
            Prim::node(OpCode::T_BIG_MAP, vec![Prim::nullary(OpCode::T_STRING), Prim::nullary(OpCode::T_NAT)], vec!["%metadata".into()]),
        );
        let value = Prim::binary(OpCode::D_PAIR, Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2)));
        let refs = discover(&ty, &value);
        assert_eq!(refs, vec![BigMapRef { name: "ledger".to_string(), id: 1 }, BigMapRef { name: "metadata".to_string(), id: 2 }]);
    }

    #[test]
    fn or_descends_only_into_chosen_branch() {
        let ty = Prim::binary(
            OpCode::T_OR,
            Prim::nullary(OpCode::T_BIG_MAP), // malformed but unreachable: Right branch chosen below.
            Prim::binary(OpCode::T_BIG_MAP, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)),
        );
        let value = Prim::unary(OpCode::D_RIGHT, Prim::int(BigInt::from(9)));
        let refs = discover(&ty, &value);
        assert_eq!(refs, vec![BigMapRef { name: "storage".to_string(), id: 9 }]);
    }

    #[test]
    fn removing_a_branch_cannot_increase_discovered_ids() {
        let ty_with_two = Prim::binary(
            OpCode::T_PAIR,
            Prim::node(OpCode::T_BIG_MAP, vec![Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)], vec!["%a".into()]),
            Prim::node(OpCode::T_BIG_MAP, vec![Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)], vec!["%b".into()]),
        );
        let value = Prim::binary(OpCode::D_PAIR, Prim::int(BigInt::from(1)), Prim::int(BigInt::from(2)));
        let ty_with_one = Prim::node(OpCode::T_BIG_MAP, vec![Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)], vec!["%a".into()]);
        let value_one = Prim::int(BigInt::from(1));

        assert!(discover(&ty_with_one, &value_one).len() <= discover(&ty_with_two, &value).len());
    }
}
