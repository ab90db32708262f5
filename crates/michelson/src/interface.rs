// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Interface detection: a declarative catalog of well-known contract
//! interfaces (token standards, manager, delegate) matched against a
//! contract's enumerated entrypoints by annotation-insensitive
//! structural equality.

use michelson_encoding::OpCode;

use crate::prim::Prim;
use crate::type_view::Entrypoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    /// Manager.tz-style `do`/`default` generic lambda execution.
    Manager,
    /// A `set_delegate`/`default` entrypoint accepting `option(key_hash)`.
    SetDelegate,
    /// TZIP-5 bare fungible token (`transfer`, `getBalance`, `getTotalSupply`, no allowances).
    Fa1,
    /// TZIP-7 fungible token (`transfer`, `approve`, `getBalance`).
    Fa12,
    /// TZIP-12 multi-asset token (`transfer`, `balance_of`, `update_operators`).
    Fa2,
    /// Dexter-style constant-product exchange (`addLiquidity`, `removeLiquidity`, `xtzToToken`, `tokenToXtz`).
    Dex,
}

struct Requirement {
    entrypoint: &'static str,
    ty: fn() -> Prim,
}

fn manager_requirements() -> Vec<Requirement> {
    vec![Requirement { entrypoint: "do", ty: || Prim::binary(OpCode::T_LAMBDA, Prim::nullary(OpCode::T_UNIT), Prim::unary(OpCode::T_LIST, Prim::nullary(OpCode::T_OPERATION))) }]
}

fn set_delegate_requirements() -> Vec<Requirement> {
    vec![Requirement { entrypoint: "set_delegate", ty: || Prim::unary(OpCode::T_OPTION, Prim::nullary(OpCode::T_KEY_HASH)) }]
}

fn fa12_requirements() -> Vec<Requirement> {
    vec![
        Requirement {
            entrypoint: "transfer",
            ty: || {
                Prim::binary(
                    OpCode::T_PAIR,
                    Prim::nullary(OpCode::T_ADDRESS),
                    Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)),
                )
            },
        },
        Requirement {
            entrypoint: "approve",
            ty: || Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)),
        },
        Requirement {
            entrypoint: "getBalance",
            ty: || Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::binary(OpCode::T_CONTRACT, Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_NAT))),
        },
    ]
}

fn fa1_requirements() -> Vec<Requirement> {
    vec![
        Requirement {
            entrypoint: "transfer",
            ty: || {
                Prim::binary(
                    OpCode::T_PAIR,
                    Prim::nullary(OpCode::T_ADDRESS),
                    Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)),
                )
            },
        },
        Requirement {
            entrypoint: "getBalance",
            ty: || Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::binary(OpCode::T_CONTRACT, Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_NAT))),
        },
        Requirement {
            entrypoint: "getTotalSupply",
            ty: || Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_UNIT), Prim::binary(OpCode::T_CONTRACT, Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_NAT))),
        },
    ]
}

fn dex_requirements() -> Vec<Requirement> {
    vec![
        Requirement {
            entrypoint: "addLiquidity",
            ty: || {
                Prim::binary(
                    OpCode::T_PAIR,
                    Prim::nullary(OpCode::T_ADDRESS),
                    Prim::binary(
                        OpCode::T_PAIR,
                        Prim::nullary(OpCode::T_NAT),
                        Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_TIMESTAMP)),
                    ),
                )
            },
        },
        Requirement {
            entrypoint: "removeLiquidity",
            ty: || {
                Prim::binary(
                    OpCode::T_PAIR,
                    Prim::nullary(OpCode::T_ADDRESS),
                    Prim::binary(
                        OpCode::T_PAIR,
                        Prim::nullary(OpCode::T_NAT),
                        Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_MUTEZ), Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_TIMESTAMP))),
                    ),
                )
            },
        },
        Requirement {
            entrypoint: "xtzToToken",
            ty: || {
                Prim::binary(
                    OpCode::T_PAIR,
                    Prim::nullary(OpCode::T_ADDRESS),
                    Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_NAT), Prim::nullary(OpCode::T_TIMESTAMP)),
                )
            },
        },
        Requirement {
            entrypoint: "tokenToXtz",
            ty: || {
                Prim::binary(
                    OpCode::T_PAIR,
                    Prim::nullary(OpCode::T_ADDRESS),
                    Prim::binary(
                        OpCode::T_PAIR,
                        Prim::nullary(OpCode::T_NAT),
                        Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_MUTEZ), Prim::nullary(OpCode::T_TIMESTAMP)),
                    ),
                )
            },
        },
    ]
}

fn fa2_requirements() -> Vec<Requirement> {
    vec![
        Requirement {
            // balance_of : pair (list (pair address nat))
            //                   (contract (list (pair (pair address nat) nat)))
            entrypoint: "balance_of",
            ty: || {
                let request = Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT));
                let response = Prim::binary(OpCode::T_PAIR, request.clone(), Prim::nullary(OpCode::T_NAT));
                Prim::binary(
                    OpCode::T_PAIR,
                    Prim::unary(OpCode::T_LIST, request),
                    Prim::unary(OpCode::T_CONTRACT, Prim::unary(OpCode::T_LIST, response)),
                )
            },
        },
        Requirement {
            // update_operators : list (or (pair address (pair address nat))
            //                             (pair address (pair address nat)))
            entrypoint: "update_operators",
            ty: || {
                let operator = Prim::binary(
                    OpCode::T_PAIR,
                    Prim::nullary(OpCode::T_ADDRESS),
                    Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)),
                );
                Prim::unary(OpCode::T_LIST, Prim::binary(OpCode::T_OR, operator.clone(), operator))
            },
        },
    ]
}

fn requirements(interface: Interface) -> Vec<Requirement> {
    match interface {
        Interface::Manager => manager_requirements(),
        Interface::SetDelegate => set_delegate_requirements(),
        Interface::Fa1 => fa1_requirements(),
        Interface::Fa12 => fa12_requirements(),
        Interface::Fa2 => fa2_requirements(),
        Interface::Dex => dex_requirements(),
    }
}

const ALL: [Interface; 6] =
    [Interface::Manager, Interface::SetDelegate, Interface::Fa1, Interface::Fa12, Interface::Fa2, Interface::Dex];

/// Returns every interface for which all required entrypoint shapes
/// are present among `entrypoints`, compared under
/// annotation-insensitive structural equality.
pub fn detect(entrypoints: &[Entrypoint]) -> Vec<Interface> {
    ALL.iter()
        .copied()
        .filter(|iface| {
            requirements(*iface).iter().all(|req| {
                entrypoints.iter().any(|e| e.name == req.entrypoint && e.ty.eq_ignore_anno(&(req.ty)()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_view::enumerate_entrypoints;

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
    fn manager_tz_is_detected() {
        let entrypoints = enumerate_entrypoints(&manager_parameter());
        let detected = detect(&entrypoints);
        assert!(detected.contains(&Interface::Manager));
        assert!(!detected.contains(&Interface::Fa12));
    }

    #[test]
    fn unrelated_parameter_matches_nothing() {
        let ty = Prim::unary(OpCode::T_OPTION, Prim::nullary(OpCode::T_ADDRESS));
        let entrypoints = enumerate_entrypoints(&ty);
        assert!(detect(&entrypoints).is_empty());
    }

    fn named(entrypoint: &Prim, name: &str) -> Prim {
        Prim::node(entrypoint.opcode().unwrap(), entrypoint.args().to_vec(), vec![format!("%{}", name)])
    }

    fn fa2_parameter() -> Prim {
        let request = Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT));
        let response = Prim::binary(OpCode::T_PAIR, request.clone(), Prim::nullary(OpCode::T_NAT));
        let balance_of = Prim::binary(
            OpCode::T_PAIR,
            Prim::unary(OpCode::T_LIST, request),
            Prim::unary(OpCode::T_CONTRACT, Prim::unary(OpCode::T_LIST, response)),
        );
        let operator = Prim::binary(
            OpCode::T_PAIR,
            Prim::nullary(OpCode::T_ADDRESS),
            Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)),
        );
        let update_operators = Prim::unary(OpCode::T_LIST, Prim::binary(OpCode::T_OR, operator.clone(), operator));
        let transfer = Prim::binary(
            OpCode::T_PAIR,
            Prim::nullary(OpCode::T_ADDRESS),
            Prim::binary(OpCode::T_PAIR, Prim::nullary(OpCode::T_ADDRESS), Prim::nullary(OpCode::T_NAT)),
        );
        Prim::binary(
            OpCode::T_OR,
            named(&transfer, "transfer"),
            Prim::binary(OpCode::T_OR, named(&balance_of, "balance_of"), named(&update_operators, "update_operators")),
        )
    }

    #[test]
    fn fa2_is_detected_from_real_tzip12_shapes() {
        let entrypoints = enumerate_entrypoints(&fa2_parameter());
        let detected = detect(&entrypoints);
        assert!(detected.contains(&Interface::Fa2));
    }
}
