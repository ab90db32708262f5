// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! `Type`: a thin wrapper over `Prim` exposing type-tree operations used
//! by the value walker and by entrypoint/bigmap analysis. A `Type` owns
//! its `Prim`; subtrees are handed out as fresh clones rather than
//! borrows, trading a little allocation for call sites that don't have
//! to thread lifetimes through the walkers.

use michelson_encoding::OpCode;

use crate::error::PrimError;
use crate::prim::Prim;

#[derive(Debug, Clone)]
pub struct Type(Prim);

impl Type {
    pub fn new(prim: Prim) -> Type {
        Type(prim)
    }

    pub fn prim(&self) -> &Prim {
        &self.0
    }

    pub fn into_prim(self) -> Prim {
        self.0
    }

    pub fn opcode(&self) -> Option<OpCode> {
        self.0.opcode()
    }

    pub fn opcode_name(&self) -> Option<&'static str> {
        self.0.opcode_name()
    }

    pub fn args(&self) -> &[Prim] {
        self.0.args()
    }

    pub fn annotation(&self) -> Option<&str> {
        self.0.field_anno().or_else(|| self.0.first_anno())
    }

    /// Flattens a right-nested `T_PAIR` comb into its leaf type nodes,
    /// one level at a time - mirrors `Prim::comb_flatten` but is exposed
    /// at the type level since callers reason about arity in terms of a
    /// type's argument count.
    pub fn comb_args(&self) -> Vec<Prim> {
        self.0.comb_flatten()
    }

    /// Builds the canonical expansion of `T_TICKET content_type` as
    /// `pair(address, pair(content_type, nat))`.
    pub fn ticket_expanded(content_type: &Prim) -> Prim {
        Prim::binary(
            OpCode::T_PAIR,
            Prim::nullary(OpCode::T_ADDRESS),
            Prim::binary(OpCode::T_PAIR, content_type.clone(), Prim::nullary(OpCode::T_NAT)),
        )
    }
}

/// One leaf (or annotated intermediate) of a parameter type's `T_OR`
/// tree, addressable by name or by branch path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entrypoint {
    pub name: String,
    pub branch: String,
    pub id: usize,
    pub ty: Prim,
}

/// Walks `parameter_type`'s `T_OR` tree and enumerates every entrypoint:
/// every leaf of the `T_OR` tree is covered exactly once.
pub fn enumerate_entrypoints(parameter_type: &Prim) -> Vec<Entrypoint> {
    let mut entrypoints = Vec::new();
    let mut next_id = 0usize;
    walk_entrypoints(parameter_type, String::new(), &mut next_id, &mut entrypoints);

    // An explicit `%default` anywhere in the tree overrides the
    // "root is named default" fallback; if no entrypoint is named
    // `default` and the root itself produced an entry at path "", name
    // that one `default`.
    if !entrypoints.iter().any(|e| e.name == "default") {
        if let Some(root) = entrypoints.iter_mut().find(|e| e.branch.is_empty()) {
            root.name = "default".to_string();
        }
    }

    entrypoints
}

fn walk_entrypoints(node: &Prim, path: String, next_id: &mut usize, out: &mut Vec<Entrypoint>) {
    let is_or = node.opcode_name() == Some("or");
    let own_anno = node.field_anno();

    if is_or && own_anno.is_none() {
        let left = &node.args()[0];
        let right = &node.args()[1];
        walk_entrypoints(left, format!("{}/L", path), next_id, out);
        walk_entrypoints(right, format!("{}/R", path), next_id, out);
        return;
    }

    let name = own_anno
        .map(|s| s.to_string())
        .unwrap_or_else(|| if path.is_empty() { "default".to_string() } else { path.trim_start_matches('/').to_string() });

    out.push(Entrypoint { name, branch: path, id: *next_id, ty: node.clone() });
    *next_id += 1;
}

/// Resolves a `/L`/`/R` branch path against `parameter_type`, returning
/// the type subtree reached, or `None` if the path runs into a non-`or`
/// node before it is exhausted.
pub fn resolve_path(parameter_type: &Prim, path: &str) -> Option<Prim> {
    let mut node = parameter_type.clone();
    let mut rest = path;
    while !rest.is_empty() {
        let (segment, tail) = rest.split_at(2); // "/L" or "/R"
        if node.opcode_name() != Some("or") {
            return None;
        }
        node = match segment {
            "/L" => node.args()[0].clone(),
            "/R" => node.args()[1].clone(),
            _ => return None,
        };
        rest = tail;
    }
    Some(node)
}

/// Finds the branch path of the entrypoint named `name`.
pub fn find_branch(parameter_type: &Prim, name: &str) -> Option<String> {
    enumerate_entrypoints(parameter_type).into_iter().find(|e| e.name == name).map(|e| e.branch)
}

pub fn find_entrypoint<'a>(entrypoints: &'a [Entrypoint], name: &str) -> Option<&'a Entrypoint> {
    entrypoints.iter().find(|e| e.name == name)
}

pub fn find_entrypoint_by_id(entrypoints: &[Entrypoint], id: usize) -> Option<&Entrypoint> {
    entrypoints.iter().find(|e| e.id == id)
}

/// Consumes `D_LEFT`/`D_RIGHT` prefixes off `value` for as long as the
/// accumulated path matches a known branch, stopping at the first
/// branch that is a registered entrypoint or at the first non-`Left`/
/// `Right` value node. Returns the matched entrypoint (by longest
/// matching prefix) together with the residual, unwrapped value.
pub fn unwrap_longest_branch(entrypoints: &[Entrypoint], value: &Prim) -> Result<(Entrypoint, Prim), PrimError> {
    let mut path = String::new();
    let mut node = value.clone();
    let mut best: Option<(Entrypoint, Prim)> = None;

    loop {
        if let Some(e) = entrypoints.iter().find(|e| e.branch == path) {
            best = Some((e.clone(), node.clone()));
        }
        match node.opcode_name() {
            Some("Left") => {
                path.push_str("/L");
                node = node.args()[0].clone();
            }
            Some("Right") => {
                path.push_str("/R");
                node = node.args()[0].clone();
            }
            _ => break,
        }
    }

    best.ok_or_else(|| PrimError::UnknownEntrypoint { name: "root".to_string(), branch: path })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_parameter() -> Prim {
        // or (lambda %do unit (list operation)) (unit %default)
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
    fn manager_entrypoints_match_scenario_1() {
        let entrypoints = enumerate_entrypoints(&manager_parameter());
        assert_eq!(entrypoints.len(), 2);
        assert_eq!(entrypoints[0].name, "do");
        assert_eq!(entrypoints[0].branch, "/L");
        assert_eq!(entrypoints[0].id, 0);
        assert_eq!(entrypoints[1].name, "default");
        assert_eq!(entrypoints[1].branch, "/R");
        assert_eq!(entrypoints[1].id, 1);
    }

    #[test]
    fn option_address_is_single_default_entrypoint() {
        // option(address), no T_OR: a contract parameter with only one
        // reachable entrypoint still gets a single implicit "default".
        let ty = Prim::unary(OpCode::T_OPTION, Prim::nullary(OpCode::T_ADDRESS));
        let entrypoints = enumerate_entrypoints(&ty);
        assert_eq!(entrypoints.len(), 1);
        assert_eq!(entrypoints[0].name, "default");
        assert_eq!(entrypoints[0].branch, "");
        assert_eq!(entrypoints[0].id, 0);
    }

    #[test]
    fn resolve_path_round_trips_branch() {
        let param = manager_parameter();
        let entrypoints = enumerate_entrypoints(&param);
        let do_ep = find_entrypoint(&entrypoints, "do").unwrap();
        let resolved = resolve_path(&param, &do_ep.branch).unwrap();
        assert!(resolved.eq_with_anno(&do_ep.ty));
    }

    #[test]
    fn ticket_expansion_shape() {
        let expanded = Type::ticket_expanded(&Prim::nullary(OpCode::T_NAT));
        assert_eq!(expanded.opcode_name(), Some("pair"));
        assert_eq!(expanded.args()[0].opcode_name(), Some("address"));
        assert_eq!(expanded.args()[1].opcode_name(), Some("pair"));
    }
}
