//! # cascade-dot - DOT/Graphviz rendering for cascade graphs
//!
//! Renders a [`cascade_core`] graph into the DOT language by walking the
//! [`NodeInfo`] view exposed by [`Graph::info`](cascade_core::Graph::info).
//! This crate is a pure consumer of the core's introspection contract: it
//! never touches the engine itself.
//!
//! Data-flow edges are drawn solid, happens-after edges dashed; named inputs
//! render as boxes and constants as plaintext.
//!
//! # Examples
//!
//! ```rust
//! use cascade_core::{call1, graph, node1, Name};
//! use cascade_dot::to_dot;
//!
//! # fn main() -> cascade_core::Result<()> {
//! let who = Name::<String>::new("who");
//! let mut builder = graph::<String>();
//! builder.inputs(&[&who]);
//! builder.call(
//!     call1(node1(|w: String| async move { Ok(format!("hello {w}!")) }))
//!         .with(&who)
//!         .named("greet"),
//! );
//!
//! let dot = to_dot(&builder.build()?.info());
//! assert!(dot.contains("digraph"));
//! assert!(dot.contains("greet"));
//!
//! // Render with: dot -Tpng graph.dot -o graph.png
//! # Ok(())
//! # }
//! ```

use std::fmt::Write;

use cascade_core::{NodeInfo, NodeKind};

/// Rendering options for [`to_dot_with`].
#[derive(Debug, Clone, Default)]
pub struct DotOptions {
    /// Optional graph title, used as the digraph name and label.
    pub title: Option<String>,
}

impl DotOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }
}

/// Render the graph reachable from `root` with default options.
pub fn to_dot(root: &NodeInfo) -> String {
    to_dot_with(root, &DotOptions::default())
}

/// Render the graph reachable from `root` into the DOT language.
pub fn to_dot_with(root: &NodeInfo, options: &DotOptions) -> String {
    let mut nodes = Vec::new();
    collect(root, &mut nodes);

    let mut out = String::new();
    match &options.title {
        Some(title) => {
            let _ = writeln!(out, "digraph \"{}\" {{", escape(title));
            let _ = writeln!(out, "  label=\"{}\";", escape(title));
        }
        None => out.push_str("digraph G {\n"),
    }

    for (index, node) in nodes.iter().enumerate() {
        let _ = writeln!(
            out,
            "  n{index} [label=\"{}\"{}];",
            escape(node.name()),
            shape(node.kind())
        );
    }

    for (index, node) in nodes.iter().enumerate() {
        for arg in node.args() {
            let _ = writeln!(out, "  n{} -> n{index};", index_of(&nodes, arg));
        }
        for pred in node.predecessors() {
            if node.args().iter().any(|arg| arg.same(pred)) {
                continue;
            }
            let _ = writeln!(
                out,
                "  n{} -> n{index} [style=dashed];",
                index_of(&nodes, pred)
            );
        }
    }

    out.push_str("}\n");
    out
}

fn collect(info: &NodeInfo, seen: &mut Vec<NodeInfo>) {
    if seen.iter().any(|known| known.same(info)) {
        return;
    }
    seen.push(info.clone());
    for pred in info.predecessors() {
        collect(pred, seen);
    }
}

fn index_of(nodes: &[NodeInfo], info: &NodeInfo) -> usize {
    nodes
        .iter()
        .position(|known| known.same(info))
        .unwrap_or(usize::MAX)
}

fn shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Node => "",
        NodeKind::Input => ", shape=box",
        NodeKind::Parameter => ", shape=plaintext",
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::{call0, call1, call2, constant, graph, node0, node1, node2, Name};

    #[test]
    fn renders_nodes_inputs_and_data_edges() {
        let who = Name::<String>::new("who");
        let mut builder = graph::<String>();
        builder.inputs(&[&who]);
        builder.call(
            call1(node1(|w: String| async move { Ok(w) }))
                .with(&who)
                .named("greet"),
        );

        let dot = to_dot(&builder.build().unwrap().info());
        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("label=\"greet\""));
        assert!(dot.contains("label=\"who\", shape=box"));
        assert!(dot.contains("n1 -> n0;"));
    }

    #[test]
    fn happens_after_edges_are_dashed() {
        let mut builder = graph::<String>();
        let first = builder.call(call0(node0(|| async { Ok("x".to_string()) })).named("first"));
        let last = builder.call(call0(node0(|| async { Ok("y".to_string()) })).named("last"));
        last.after(&first);

        let dot = to_dot(&builder.build().unwrap().info());
        assert!(dot.contains("[style=dashed]"));
    }

    #[test]
    fn diamonds_are_rendered_once_per_declaration() {
        let mut builder = graph::<u64>();
        let base = builder.call(
            call0(node0(|| async { Ok(21u64) })).named("base"),
        );
        builder.call(
            call2(node2(|a: u64, b: u64| async move { Ok(a + b) }))
                .with(&base, &base)
                .named("sum"),
        );

        let dot = to_dot(&builder.build().unwrap().info());
        assert_eq!(dot.matches("label=\"base\"").count(), 1);
    }

    #[test]
    fn constants_render_as_plaintext_parameters() {
        let sum = call2(node2(|a: u64, b: u64| async move { Ok(a + b) }))
            .with(constant(40u64), constant(2u64))
            .named("sum")
            .build()
            .unwrap();

        let dot = to_dot(&sum.info());
        assert!(dot.contains("shape=plaintext"));
        assert!(dot.contains("label=\"40\""));
    }

    #[test]
    fn titles_escape_quotes() {
        let one = call0(node0(|| async { Ok(1u8) })).named("one").build().unwrap();
        let dot = to_dot_with(&one.info(), &DotOptions::titled("my \"graph\""));
        assert!(dot.contains("digraph \"my \\\"graph\\\"\""));
    }
}
