// SPDX-License-Identifier: MIT OR Apache-2.0
//! Palette of node kinds available for placement.

use crate::kinds::{NodeCategory, NodeKind};
use crate::node::Node;
use indexmap::IndexMap;

/// Ordered registry of placeable node kinds, keyed by type name
#[derive(Debug, Clone)]
pub struct NodePalette {
    kinds: IndexMap<&'static str, NodeKind>,
}

impl NodePalette {
    /// Create an empty palette
    pub fn empty() -> Self {
        Self {
            kinds: IndexMap::new(),
        }
    }

    /// Register a kind; returns `false` if it was already present
    pub fn register(&mut self, kind: NodeKind) -> bool {
        self.kinds.insert(kind.type_name(), kind).is_none()
    }

    /// Look up a kind by its type name
    pub fn get(&self, type_name: &str) -> Option<NodeKind> {
        self.kinds.get(type_name).copied()
    }

    /// All registered kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.kinds.values().copied()
    }

    /// Kinds in one category
    pub fn in_category(&self, category: NodeCategory) -> impl Iterator<Item = NodeKind> + '_ {
        self.kinds().filter(move |k| k.category() == category)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kinds are registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Create a fresh node of the named kind
    pub fn create_node(&self, type_name: &str) -> Option<Node> {
        self.get(type_name).map(Node::new)
    }
}

impl Default for NodePalette {
    fn default() -> Self {
        let mut palette = Self::empty();
        for kind in NodeKind::ALL {
            palette.register(kind);
        }
        palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette() {
        let palette = NodePalette::default();
        assert_eq!(palette.len(), NodeKind::ALL.len());
        assert!(palette.kinds().eq(NodeKind::ALL));
        assert_eq!(palette.get("Multiply"), Some(NodeKind::Multiply));
        assert_eq!(palette.get("Divide"), None);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut palette = NodePalette::empty();
        assert!(palette.is_empty());
        assert!(palette.register(NodeKind::Lerp));
        assert!(!palette.register(NodeKind::Lerp));
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn test_in_category() {
        let palette = NodePalette::default();
        let math: Vec<_> = palette.in_category(NodeCategory::Math).collect();
        assert_eq!(math, vec![NodeKind::Add, NodeKind::Multiply, NodeKind::Lerp]);
        assert_eq!(palette.in_category(NodeCategory::Output).count(), 1);
    }

    #[test]
    fn test_create_node() {
        let palette = NodePalette::default();
        let node = palette.create_node("MakeVec3").unwrap();
        assert_eq!(node.kind(), NodeKind::MakeVec3);
        assert_eq!(node.name(), "MakeVec3Node");
        assert_eq!(node.inputs().count(), 3);
        assert!(palette.create_node("Unknown").is_none());
    }
}
