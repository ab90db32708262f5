// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Michelson: the recursive primitive tree, its binary/JSON codec, and
//! the type-directed value renderer, entrypoint dispatcher, and
//! contract-interface analysis built on top of it.
//!
//! This crate covers inspection, decoding, and rendering of Michelson
//! programs and values; it is not an interpreter and does not
//! type-check, evaluate, or account for gas.

pub mod bigmap;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod features;
pub mod interface;
pub mod key;
pub mod packed;
pub mod parameters;
pub mod prim;
pub mod script;
pub mod stack;
pub mod type_view;
pub mod value;

pub use error::PrimError;
pub use events::{BigMapAction, BigMapDiff, LazyEvent, SaplingAction, SaplingStateDiff, SaplingUpdate};
pub use features::Features;
pub use interface::Interface;
pub use key::{Key, KeyKind, KeyParseConfig};
pub use parameters::Parameters;
pub use prim::{Prim, PrimTag};
pub use script::{Code, Script, View};
pub use stack::Stack;
pub use type_view::{Entrypoint, Type};
pub use value::{RenderConfig, RenderPolicy, RenderedMap, Value};
