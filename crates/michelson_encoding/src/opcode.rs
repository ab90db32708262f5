// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! The closed enumeration of Michelson tags: instructions (`I_*`), types
//! (`T_*`), data constructors (`D_*`) and section keywords (`K_*`). This
//! table is process-wide and immutable; adding a new Michelson primitive
//! is a breaking-by-design change to the `michelson_opcode!` list below,
//! not something callers extend at runtime.

use failure::Fail;

#[derive(Debug, Fail, PartialEq)]
pub enum OpCodeError {
    #[fail(display = "unknown opcode byte {}", _0)]
    UnknownByte(u8),
    #[fail(display = "unknown opcode name {:?}", _0)]
    UnknownName(String),
}

/// Which of the four primitive families an opcode belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Instruction,
    Type,
    Data,
    Keyword,
}

// Single source of truth: (enum variant, wire byte, textual name, kind).
// The byte assignment follows the chain's own Michelson_v1_primitives
// ordering so that `encode`d scripts match the canonical wire format.
macro_rules! michelson_opcode {
    ( $( $variant:ident = $byte:expr, $name:expr, $kind:ident ; )* ) => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OpCode {
            $( $variant ),*
        }

        impl OpCode {
            pub fn byte(&self) -> u8 {
                match self {
                    $( OpCode::$variant => $byte ),*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( OpCode::$variant => $name ),*
                }
            }

            pub fn kind(&self) -> OpKind {
                match self {
                    $( OpCode::$variant => OpKind::$kind ),*
                }
            }

            pub fn from_byte(byte: u8) -> Result<OpCode, OpCodeError> {
                match byte {
                    $( $byte => Ok(OpCode::$variant), )*
                    other => Err(OpCodeError::UnknownByte(other)),
                }
            }

            pub fn from_name(name: &str) -> Result<OpCode, OpCodeError> {
                match name {
                    $( $name => Ok(OpCode::$variant), )*
                    other => Err(OpCodeError::UnknownName(other.to_string())),
                }
            }
        }
    };
}

michelson_opcode! {
    K_PARAMETER = 0, "parameter", Keyword;
    K_STORAGE = 1, "storage", Keyword;
    K_CODE = 2, "code", Keyword;
    D_FALSE = 3, "False", Data;
    D_ELT = 4, "Elt", Data;
    D_LEFT = 5, "Left", Data;
    D_NONE = 6, "None", Data;
    D_PAIR = 7, "Pair", Data;
    D_RIGHT = 8, "Right", Data;
    D_SOME = 9, "Some", Data;
    D_TRUE = 10, "True", Data;
    D_UNIT = 11, "Unit", Data;
    I_PACK = 12, "PACK", Instruction;
    I_UNPACK = 13, "UNPACK", Instruction;
    I_BLAKE2B = 14, "BLAKE2B", Instruction;
    I_SHA256 = 15, "SHA256", Instruction;
    I_SHA512 = 16, "SHA512", Instruction;
    I_ABS = 17, "ABS", Instruction;
    I_ADD = 18, "ADD", Instruction;
    I_AMOUNT = 19, "AMOUNT", Instruction;
    I_AND = 20, "AND", Instruction;
    I_BALANCE = 21, "BALANCE", Instruction;
    I_CAR = 22, "CAR", Instruction;
    I_CDR = 23, "CDR", Instruction;
    I_CHECK_SIGNATURE = 24, "CHECK_SIGNATURE", Instruction;
    I_COMPARE = 25, "COMPARE", Instruction;
    I_CONCAT = 26, "CONCAT", Instruction;
    I_CONS = 27, "CONS", Instruction;
    I_CREATE_ACCOUNT = 28, "CREATE_ACCOUNT", Instruction;
    I_CREATE_CONTRACT = 29, "CREATE_CONTRACT", Instruction;
    I_IMPLICIT_ACCOUNT = 30, "IMPLICIT_ACCOUNT", Instruction;
    I_DIP = 31, "DIP", Instruction;
    I_DROP = 32, "DROP", Instruction;
    I_DUP = 33, "DUP", Instruction;
    I_EDIV = 34, "EDIV", Instruction;
    I_EMPTY_MAP = 35, "EMPTY_MAP", Instruction;
    I_EMPTY_SET = 36, "EMPTY_SET", Instruction;
    I_EQ = 37, "EQ", Instruction;
    I_EXEC = 38, "EXEC", Instruction;
    I_FAILWITH = 39, "FAILWITH", Instruction;
    I_GE = 40, "GE", Instruction;
    I_GET = 41, "GET", Instruction;
    I_GT = 42, "GT", Instruction;
    I_HASH_KEY = 43, "HASH_KEY", Instruction;
    I_IF = 44, "IF", Instruction;
    I_IF_CONS = 45, "IF_CONS", Instruction;
    I_IF_LEFT = 46, "IF_LEFT", Instruction;
    I_IF_NONE = 47, "IF_NONE", Instruction;
    I_INT = 48, "INT", Instruction;
    I_LAMBDA = 49, "LAMBDA", Instruction;
    I_LE = 50, "LE", Instruction;
    I_LEFT = 51, "LEFT", Instruction;
    I_LOOP = 52, "LOOP", Instruction;
    I_LSL = 53, "LSL", Instruction;
    I_LSR = 54, "LSR", Instruction;
    I_LT = 55, "LT", Instruction;
    I_MAP = 56, "MAP", Instruction;
    I_MEM = 57, "MEM", Instruction;
    I_MUL = 58, "MUL", Instruction;
    I_NEG = 59, "NEG", Instruction;
    I_NEQ = 60, "NEQ", Instruction;
    I_NIL = 61, "NIL", Instruction;
    I_NONE = 62, "NONE", Instruction;
    I_NOT = 63, "NOT", Instruction;
    I_NOW = 64, "NOW", Instruction;
    I_OR = 65, "OR", Instruction;
    I_PAIR = 66, "PAIR", Instruction;
    I_PUSH = 67, "PUSH", Instruction;
    I_RIGHT = 68, "RIGHT", Instruction;
    I_SIZE = 69, "SIZE", Instruction;
    I_SOME = 70, "SOME", Instruction;
    I_SOURCE = 71, "SOURCE", Instruction;
    I_STEPS_TO_QUOTA = 72, "STEPS_TO_QUOTA", Instruction;
    I_SUB = 73, "SUB", Instruction;
    I_SWAP = 74, "SWAP", Instruction;
    I_TRANSFER_TOKENS = 75, "TRANSFER_TOKENS", Instruction;
    I_SET_DELEGATE = 76, "SET_DELEGATE", Instruction;
    I_UNIT = 77, "UNIT", Instruction;
    I_UPDATE = 78, "UPDATE", Instruction;
    I_XOR = 79, "XOR", Instruction;
    I_ITER = 80, "ITER", Instruction;
    I_LOOP_LEFT = 81, "LOOP_LEFT", Instruction;
    I_ADDRESS = 82, "ADDRESS", Instruction;
    I_CONTRACT = 83, "CONTRACT", Instruction;
    I_ISNAT = 84, "ISNAT", Instruction;
    I_CAST = 85, "CAST", Instruction;
    I_RENAME = 86, "RENAME", Instruction;
    T_BOOL = 87, "bool", Type;
    T_CONTRACT = 88, "contract", Type;
    T_INT = 89, "int", Type;
    T_KEY = 90, "key", Type;
    T_KEY_HASH = 91, "key_hash", Type;
    T_LAMBDA = 92, "lambda", Type;
    T_LIST = 93, "list", Type;
    T_MAP = 94, "map", Type;
    T_BIG_MAP = 95, "big_map", Type;
    T_NAT = 96, "nat", Type;
    T_OPTION = 97, "option", Type;
    T_OR = 98, "or", Type;
    T_PAIR = 99, "pair", Type;
    T_SET = 100, "set", Type;
    T_SIGNATURE = 101, "signature", Type;
    T_STRING = 102, "string", Type;
    T_BYTES = 103, "bytes", Type;
    T_MUTEZ = 104, "mutez", Type;
    T_TIMESTAMP = 105, "timestamp", Type;
    T_UNIT = 106, "unit", Type;
    T_OPERATION = 107, "operation", Type;
    T_ADDRESS = 108, "address", Type;
    I_SLICE = 109, "SLICE", Instruction;
    I_DIG = 110, "DIG", Instruction;
    I_DUG = 111, "DUG", Instruction;
    I_EMPTY_BIG_MAP = 112, "EMPTY_BIG_MAP", Instruction;
    I_APPLY = 113, "APPLY", Instruction;
    T_CHAIN_ID = 114, "chain_id", Type;
    I_CHAIN_ID = 115, "CHAIN_ID", Instruction;
    I_LEVEL = 116, "LEVEL", Instruction;
    I_SELF_ADDRESS = 117, "SELF_ADDRESS", Instruction;
    T_NEVER = 118, "never", Type;
    I_NEVER = 119, "NEVER", Instruction;
    I_UNPAIR = 120, "UNPAIR", Instruction;
    I_VOTING_POWER = 121, "VOTING_POWER", Instruction;
    I_TOTAL_VOTING_POWER = 122, "TOTAL_VOTING_POWER", Instruction;
    I_KECCAK = 123, "KECCAK", Instruction;
    I_SHA3 = 124, "SHA3", Instruction;
    I_PAIRING_CHECK = 125, "PAIRING_CHECK", Instruction;
    T_BLS12_381_G1 = 126, "bls12_381_g1", Type;
    T_BLS12_381_G2 = 127, "bls12_381_g2", Type;
    T_BLS12_381_FR = 128, "bls12_381_fr", Type;
    T_SAPLING_STATE = 129, "sapling_state", Type;
    T_SAPLING_TRANSACTION = 130, "sapling_transaction", Type;
    I_SAPLING_EMPTY_STATE = 131, "SAPLING_EMPTY_STATE", Instruction;
    I_SAPLING_VERIFY_UPDATE = 132, "SAPLING_VERIFY_UPDATE", Instruction;
    T_TICKET = 133, "ticket", Type;
    I_TICKET = 134, "TICKET", Instruction;
    I_READ_TICKET = 135, "READ_TICKET", Instruction;
    I_SPLIT_TICKET = 136, "SPLIT_TICKET", Instruction;
    I_JOIN_TICKETS = 137, "JOIN_TICKETS", Instruction;
    I_GET_AND_UPDATE = 138, "GET_AND_UPDATE", Instruction;
    I_CHEST = 139, "CHEST", Instruction;
    I_CHEST_KEY = 140, "CHEST_KEY", Instruction;
    T_CHEST = 141, "chest", Type;
    T_CHEST_KEY = 142, "chest_key", Type;
    I_OPEN_CHEST = 143, "OPEN_CHEST", Instruction;
    I_VIEW = 144, "VIEW", Instruction;
    K_VIEW = 145, "view", Keyword;
    H_CONSTANT = 146, "constant", Keyword;
}

impl OpCode {
    pub fn is_type(&self) -> bool {
        self.kind() == OpKind::Type
    }

    pub fn is_data(&self) -> bool {
        self.kind() == OpKind::Data
    }

    pub fn is_instruction(&self) -> bool {
        self.kind() == OpKind::Instruction
    }

    pub fn is_keyword(&self) -> bool {
        self.kind() == OpKind::Keyword
    }

    /// Placeholder opcode used by constant-form scripts (`H_constant`
    /// substitution sites and empty prims); spec.md §4.1.
    pub const EMPTY: u8 = 255;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_name_round_trip() {
        for byte in 0..=146u8 {
            let op = OpCode::from_byte(byte).unwrap();
            assert_eq!(op.byte(), byte);
            assert_eq!(OpCode::from_name(op.name()).unwrap(), op);
        }
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert!(OpCode::from_byte(200).is_err());
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(OpCode::from_name("NOT_A_PRIM").is_err());
    }

    #[test]
    fn classification() {
        assert!(OpCode::T_PAIR.is_type());
        assert!(OpCode::D_PAIR.is_data());
        assert!(OpCode::I_PAIR.is_instruction());
        assert!(OpCode::K_CODE.is_keyword());
    }
}
