// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Feature-flag detection: a bitset of capabilities derived by walking
//! a contract's code tree for instruction opcodes.

use michelson_encoding::OpCode;

use crate::prim::Prim;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features(u32);

impl Features {
    pub const CONTRACT_FACTORY: Features = Features(1 << 0);
    pub const ACCOUNT_FACTORY: Features = Features(1 << 1);
    pub const DELEGATABLE: Features = Features(1 << 2);
    pub const LAMBDA: Features = Features(1 << 3);
    pub const TOKEN_TRANSFER: Features = Features(1 << 4);
    pub const CHAIN_ID: Features = Features(1 << 5);
    pub const TICKETS: Features = Features(1 << 6);
    pub const SAPLING: Features = Features(1 << 7);

    pub fn empty() -> Features {
        Features(0)
    }

    pub fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    fn insert(&mut self, other: Features) {
        self.0 |= other.0;
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Walks `code`'s instruction tree and sets a feature bit for every
/// opcode that indicates the corresponding capability.
pub fn detect(code: &Prim) -> Features {
    let mut features = Features::empty();
    code.walk(&mut |node| {
        match node.opcode() {
            Some(OpCode::I_CREATE_CONTRACT) => features.insert(Features::CONTRACT_FACTORY),
            Some(OpCode::I_CREATE_ACCOUNT) | Some(OpCode::I_IMPLICIT_ACCOUNT) => features.insert(Features::ACCOUNT_FACTORY),
            Some(OpCode::I_SET_DELEGATE) => features.insert(Features::DELEGATABLE),
            Some(OpCode::I_LAMBDA) | Some(OpCode::I_EXEC) | Some(OpCode::I_APPLY) => features.insert(Features::LAMBDA),
            Some(OpCode::I_TRANSFER_TOKENS) => features.insert(Features::TOKEN_TRANSFER),
            Some(OpCode::I_CHAIN_ID) => features.insert(Features::CHAIN_ID),
            Some(OpCode::I_TICKET) | Some(OpCode::I_READ_TICKET) | Some(OpCode::I_SPLIT_TICKET) | Some(OpCode::I_JOIN_TICKETS) => {
                features.insert(Features::TICKETS)
            }
            Some(OpCode::I_SAPLING_EMPTY_STATE) | Some(OpCode::I_SAPLING_VERIFY_UPDATE) => features.insert(Features::SAPLING),
            _ => {}
        }
    });
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_contract_sets_factory_bit() {
        let code = Prim::sequence(vec![Prim::nullary(OpCode::I_CREATE_CONTRACT)]);
        let features = detect(&code);
        assert!(features.contains(Features::CONTRACT_FACTORY));
        assert!(!features.contains(Features::TICKETS));
    }

    #[test]
    fn nested_instructions_are_found() {
        let code = Prim::sequence(vec![Prim::sequence(vec![Prim::nullary(OpCode::I_SET_DELEGATE), Prim::nullary(OpCode::I_CHAIN_ID)])]);
        let features = detect(&code);
        assert!(features.contains(Features::DELEGATABLE));
        assert!(features.contains(Features::CHAIN_ID));
    }

    #[test]
    fn empty_code_has_no_features() {
        let code = Prim::sequence(vec![Prim::nullary(OpCode::I_DROP)]);
        assert_eq!(detect(&code), Features::empty());
    }
}
