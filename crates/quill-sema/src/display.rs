//! Human-readable rendering of nodes.
//!
//! ```text
//! fn[T: Add[T]](T, T) -> T     (u8, bool)     ~i32     &[f64 * 4]
//! Vec[?3]                       impl Show for i32
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

use crate::handle::{Handle, Type, TypeVar, Uni};
use crate::node::{Kind, NodeId, NodeKind};
use crate::table::TypeTable;

/// Display adapter returned by [`TypeTable::display`].
pub struct Display<'a> {
    table: &'a TypeTable,
    id: NodeId,
    /// Instances of solved placeholders reachable from `id`.
    solved: FxHashMap<NodeId, NodeId>,
}

impl TypeTable {
    /// Render `h` as it stands. Placeholders that were solved but not yet
    /// canonicalized print as `?k`; use [`TypeTable::render`] to see
    /// through them.
    pub fn display(&self, h: impl Into<Uni>) -> Display<'_> {
        Display {
            table: self,
            id: h.into().id(),
            solved: FxHashMap::default(),
        }
    }

    /// Render `h` to a string, printing solved placeholders as their
    /// instances.
    pub fn render(&mut self, h: impl Into<Uni>) -> String {
        let id = h.into().id();
        let mut solved = FxHashMap::default();
        self.collect_solved(id, &mut solved);
        Display {
            table: self,
            id,
            solved,
        }
        .to_string()
    }

    fn collect_solved(&mut self, id: NodeId, solved: &mut FxHashMap<NodeId, NodeId>) {
        let id = self.deref(Uni::from_id(id));
        if solved.contains_key(&id) {
            return;
        }
        if self.nodes[id.index()].kind.tag() == Kind::Unknown {
            let resolved = self.resolve(Uni::from_id(id));
            if resolved != id {
                solved.insert(id, resolved);
                self.collect_solved(resolved, solved);
            }
            return;
        }

        let node = &self.nodes[id.index()];
        let mut parts: Vec<NodeId> = node.elems.iter().map(|e| e.id()).collect();
        if let NodeKind::Impl(info) = &node.kind {
            parts.push(info.bound.id());
        }
        for &var in &node.type_vars {
            parts.extend(self.var_bounds(var).iter().map(|b| b.id()));
        }
        for part in parts {
            self.collect_solved(part, solved);
        }
    }
}

impl Display<'_> {
    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        let table = self.table;
        let id = table.deref(Uni::from_id(id));
        let id = self.solved.get(&id).copied().unwrap_or(id);
        let node = &table.nodes[id.index()];
        let elems = &node.elems;
        match &node.kind {
            NodeKind::Prim(p) => f.write_str(p.name()),
            NodeKind::Fn => {
                f.write_str("fn")?;
                self.write_generics(f, &node.type_vars)?;
                f.write_str("(")?;
                self.write_list(f, &elems[..elems.len() - 1])?;
                f.write_str(") -> ")?;
                self.write_node(f, elems[elems.len() - 1].id())
            }
            NodeKind::Tuple => {
                f.write_str("(")?;
                self.write_list(f, elems)?;
                f.write_str(")")
            }
            NodeKind::Struct(info) => {
                f.write_str(&info.name)?;
                if !elems.is_empty() {
                    f.write_str("[")?;
                    self.write_list(f, elems)?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            NodeKind::OwnedPtr => {
                f.write_str("~")?;
                self.write_node(f, elems[0].id())
            }
            NodeKind::BorrowedPtr => {
                f.write_str("&")?;
                self.write_node(f, elems[0].id())
            }
            NodeKind::DefiniteArray(dim) => {
                f.write_str("[")?;
                self.write_node(f, elems[0].id())?;
                write!(f, " * {}]", dim)
            }
            NodeKind::IndefiniteArray => {
                f.write_str("[")?;
                self.write_node(f, elems[0].id())?;
                f.write_str("]")
            }
            NodeKind::Error => f.write_str("<type error>"),
            NodeKind::NoRet => f.write_str("<no-return>"),
            NodeKind::Unknown(key) => write!(f, "?{}", key.index()),
            NodeKind::TypeVar(info) => f.write_str(&info.name),
            NodeKind::Trait(info) => {
                f.write_str(&info.name)?;
                self.write_generics(f, &node.type_vars)
            }
            NodeKind::Bound(info) => {
                if table.is_error(Uni::from_id(id)) {
                    return f.write_str("<bound error>");
                }
                f.write_str(&table.trait_info(info.trait_).name)?;
                if !elems.is_empty() {
                    f.write_str("[")?;
                    self.write_list(f, elems)?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            NodeKind::Impl(info) => {
                f.write_str("impl")?;
                self.write_generics(f, &node.type_vars)?;
                f.write_str(" ")?;
                self.write_node(f, info.bound.id())?;
                f.write_str(" for ")?;
                self.write_node(f, elems[0].id())
            }
        }
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, elems: &[Type]) -> fmt::Result {
        for (i, elem) in elems.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            self.write_node(f, elem.id())?;
        }
        Ok(())
    }

    /// `[T, U: A + B]`, or nothing for a non-generic node.
    fn write_generics(&self, f: &mut fmt::Formatter<'_>, vars: &[TypeVar]) -> fmt::Result {
        if vars.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, &var) in vars.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            self.write_node(f, var.id())?;
            for (j, bound) in self.table.var_bounds(var).iter().enumerate() {
                f.write_str(if j == 0 { ": " } else { " + " })?;
                self.write_node(f, bound.id())?;
            }
        }
        f.write_str("]")
    }
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.id)
    }
}
