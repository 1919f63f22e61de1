//! Module definitions and the module tree.
//!
//! A [`Module`] is what users author. The store turns it into a tree of
//! nodes, one per module, that the installer walks to build the flat
//! mutation/action/getter registries.

mod node;
mod raw;
mod tree;

pub(crate) use node::ModuleNode;
pub use raw::{ActionFn, GetterFn, Module, MutationFn, StateFactory};
pub(crate) use tree::ModuleTree;
