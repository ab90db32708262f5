// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! End-to-end coverage of the seed scenarios: entrypoint
//! enumeration, call dispatch, bigmap key hashing, and value rendering
//! exercised together rather than unit-by-unit.

use assert_json_diff::assert_json_eq;
use failure::Error;
use num_bigint::BigInt;
use serde_json::json;

use michelson::{Parameters, Prim, RenderConfig, Value};
use michelson_encoding::OpCode;

fn fa2_parameter() -> Prim {
    // or (or (transfer ...) %transfer (balance_of ...) %balance_of)
    //    (or (update_operators ...) %update_operators
    //        (or (add_adhoc_operators ...) %add_adhoc_operators (remove_adhoc_operators ...) %remove_adhoc_operators))
    let transfer = Prim::node(OpCode::T_LIST, vec![Prim::nullary(OpCode::T_UNIT)], vec!["%transfer".into()]);
    let balance_of = Prim::node(OpCode::T_UNIT, vec![], vec!["%balance_of".into()]);
    let update_operators = Prim::node(OpCode::T_LIST, vec![Prim::nullary(OpCode::T_UNIT)], vec!["%update_operators".into()]);
    let add_adhoc_operators = Prim::node(
        OpCode::T_LIST,
        vec![Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT))],
        vec!["%add_adhoc_operators".into()],
    );
    let remove_adhoc_operators = Prim::node(OpCode::T_UNIT, vec![], vec!["%remove_adhoc_operators".into()]);

    let adhoc_or = Prim::binary(OpCode::T_OR, add_adhoc_operators, remove_adhoc_operators);
    let ops_or = Prim::binary(OpCode::T_OR, update_operators, adhoc_or);
    let transfer_or = Prim::binary(OpCode::T_OR, transfer, balance_of);
    Prim::binary(OpCode::T_OR, transfer_or, ops_or)
}

#[test]
fn scenario_2_fa2_update_adhoc_operators_resolves_by_structural_prefix() -> Result<(), Error> {
    let param_ty = fa2_parameter();
    let addr = Prim::bytes(crypto::address::encode_to_bytes("tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw")?);
    let pair = Prim::binary(OpCode::D_PAIR, addr, Prim::int(BigInt::from(0)));
    let value = Prim::sequence(vec![pair.clone()]);

    // Callers sometimes use `update_adhoc_operators` as a made-up alias
    // that never appears in the parameter type; dispatch falls back to
    // the structural Left/Right prefix match and lands on whichever
    // branch the value actually encodes (`add_adhoc_operators`, here
    // reached via Right/Right/Left).
    let call = Parameters::new("update_adhoc_operators", Prim::unary(OpCode::D_RIGHT, Prim::unary(OpCode::D_RIGHT, Prim::unary(OpCode::D_LEFT, value.clone()))));
    let (entrypoint, residual) = call.dispatch(&param_ty)?;

    assert_eq!(entrypoint.name, "add_adhoc_operators");
    assert!(residual.eq_with_anno(&value));
    Ok(())
}

#[test]
fn scenario_1_manager_tz_entrypoints_and_dispatch() -> Result<(), Error> {
    let param_ty = Prim::binary(
        OpCode::T_OR,
        Prim::node(
            OpCode::T_LAMBDA,
            vec![Prim::nullary(OpCode::T_UNIT), Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_OPERATION))],
            vec!["%do".into()],
        ),
        Prim::node(OpCode::T_UNIT, vec![], vec!["%default".into()]),
    );

    let entrypoints = michelson::type_view::enumerate_entrypoints(&param_ty);
    assert_eq!(entrypoints.len(), 2);
    assert_eq!(entrypoints[0].name, "do");
    assert_eq!(entrypoints[0].branch, "/L");
    assert_eq!(entrypoints[1].name, "default");
    assert_eq!(entrypoints[1].branch, "/R");

    let call = Parameters::new("do", Prim::nullary(OpCode::D_UNIT));
    let (entrypoint, residual) = call.dispatch(&param_ty)?;
    assert_eq!(entrypoint.id, 0);
    assert!(residual.is_opcode(OpCode::D_UNIT));
    Ok(())
}

#[test]
fn scenario_4_pair_key_renders_and_hashes() -> Result<(), Error> {
    let key_ty = Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT));
    let addr_bytes = crypto::address::encode_to_bytes("tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw")?;
    let key_value = Prim::binary(OpCode::D_PAIR, Prim::bytes(addr_bytes), Prim::int(BigInt::from(153)));

    let key = michelson::Key::from_type_value(&key_ty, &key_value)?;
    assert_eq!(key.text(), "tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw,153");

    let hex_bytes = hex::encode(key.bytes());
    assert!(hex_bytes.starts_with("07070a00000016"));
    assert!(hex_bytes.ends_with("009902"));
    Ok(())
}

#[test]
fn nested_pair_and_option_render_into_labeled_map() {
    // pair (pair %from address %to address) (option %memo string)
    let ty = Prim::binary(
        OpCode::T_PAIR,
        Prim::node(
            OpCode::T_PAIR,
            vec![
                Prim::node(OpCode::T_ADDRESS, vec![], vec!["%from".into()]),
                Prim::node(OpCode::T_ADDRESS, vec![], vec!["%to".into()]),
            ],
            Vec::new(),
        ),
        Prim::node(OpCode::T_OPTION, vec![Prim::nullary(OpCode::T_STRING)], vec!["%memo".into()]),
    );

    let from_bytes = crypto::address::encode_to_bytes("tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw").unwrap();
    let to_bytes = crypto::address::encode_to_bytes("tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw").unwrap();
    let value = Prim::binary(
        OpCode::D_PAIR,
        Prim::binary(OpCode::D_PAIR, Prim::bytes(from_bytes), Prim::bytes(to_bytes)),
        Prim::unary(OpCode::D_SOME, Prim::string("payment")),
    );

    let mut rendered = Value::new(ty, value);
    let json = rendered.map(&RenderConfig::default());

    assert_json_eq!(
        json,
        json!({
            "0": {
                "from": "tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw",
                "to": "tz1UBZUkXpKGhYsP5KtzDNqLLchwF4uHrGjw"
            },
            "memo": "payment"
        })
    );
}
