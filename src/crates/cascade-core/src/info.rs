//! Introspection views over a declared graph
//!
//! [`NodeInfo`] is the walkable, read-only metadata view of a node or binding
//! that the engine hands to diagnostics and to external visualizers. It
//! carries a display name, a kind tag, the ordered argument views, and the
//! full predecessor set (arguments plus happens-after edges).
//!
//! Infos are shared (`Arc`-backed): two views of the same declaration compare
//! equal under [`NodeInfo::same`], which is what lets a renderer deduplicate
//! diamonds without any side table.

use std::fmt;
use std::sync::Arc;

/// What a [`NodeInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A declared node (an asynchronous function unit).
    Node,
    /// A named input supplied externally at run time.
    Input,
    /// A constant bound directly into an argument slot.
    Parameter,
}

struct NodeInfoInner {
    name: String,
    kind: NodeKind,
    args: Vec<NodeInfo>,
    predecessors: Vec<NodeInfo>,
}

/// Metadata view of a node or binding, for diagnostics and visualization.
#[derive(Clone)]
pub struct NodeInfo {
    inner: Arc<NodeInfoInner>,
}

impl NodeInfo {
    pub(crate) fn new(
        name: String,
        kind: NodeKind,
        args: Vec<NodeInfo>,
        predecessors: Vec<NodeInfo>,
    ) -> Self {
        Self {
            inner: Arc::new(NodeInfoInner {
                name,
                kind,
                args,
                predecessors,
            }),
        }
    }

    /// The display name: the label set via `.named(..)`, an input's label, a
    /// constant's value, or `"unnamed"`.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self) -> NodeKind {
        self.inner.kind
    }

    /// The ordered argument views, one per binding.
    pub fn args(&self) -> &[NodeInfo] {
        &self.inner.args
    }

    /// Every predecessor: the arguments plus the happens-after edges.
    pub fn predecessors(&self) -> &[NodeInfo] {
        &self.inner.predecessors
    }

    /// Whether two views describe the same underlying declaration.
    pub fn same(&self, other: &NodeInfo) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInfo")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .field(
                "args",
                &self.inner.args.iter().map(NodeInfo::name).collect::<Vec<_>>(),
            )
            .field(
                "predecessors",
                &self
                    .inner
                    .predecessors
                    .iter()
                    .map(NodeInfo::name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_sharing() {
        let leaf = NodeInfo::new("leaf".into(), NodeKind::Input, vec![], vec![]);
        let a = NodeInfo::new("a".into(), NodeKind::Node, vec![leaf.clone()], vec![leaf.clone()]);
        assert!(a.args()[0].same(&a.predecessors()[0]));
        assert!(!a.same(&leaf));
    }
}
