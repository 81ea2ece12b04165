//! Error types for graph construction and execution
//!
//! All fallible operations in this crate return [`GraphError`]. Build-time
//! failures (`build()`) are synchronous and structural; run-time failures
//! flow through the future chain to the sink, wrapped as
//! [`GraphExecutionError`] with full diagnostic context unless wrapping was
//! disabled via [`Graph::run_unwrapped`](crate::Graph::run_unwrapped).
//!
//! # Error Hierarchy
//!
//! ```text
//! GraphError
//! ├── EmptyGraph               - build(): no declarations
//! ├── IncorrectArgumentCount   - build(): node arity != bound arguments
//! ├── UndeclaredInput          - build(): binding names an undeclared input
//! ├── MultipleSinks            - build(): more than one undepended node
//! ├── CycleDetected            - build(): declarations form a cycle
//! ├── SinkTypeMismatch         - build()/run(): sink type disagrees
//! ├── UnboundInput             - run(): named input never bound
//! ├── NodeFailed               - run(): raw node failure (wrapping off)
//! └── Execution                - run(): wrapped GraphExecutionException
//! ```
//!
//! Errors are `Clone`: a failure memoized inside a shared node future is
//! observed by every dependent, so causes are reference-counted rather than
//! owned.
//!
//! # Examples
//!
//! ```rust
//! use cascade_core::GraphError;
//!
//! let err = cascade_core::graph::<String>().build().unwrap_err();
//! assert!(matches!(err, GraphError::EmptyGraph));
//! assert_eq!(err.to_string(), "Empty graph");
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::info::NodeInfo;
use crate::node::NodeError;
use crate::value::AnyValue;

/// Convenience result type using [`GraphError`].
pub type Result<T> = std::result::Result<T, GraphError>;

/// A cloneable handle on the original cause of a node failure.
///
/// The underlying error is shared, not copied; [`SharedCause::get`] returns
/// it for inspection or downcasting.
#[derive(Debug, Clone)]
pub struct SharedCause(Arc<dyn StdError + Send + Sync>);

impl SharedCause {
    pub(crate) fn new(cause: NodeError) -> Self {
        Self(Arc::from(cause))
    }

    /// The original error a node failed with.
    pub fn get(&self) -> &(dyn StdError + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Display for SharedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for SharedCause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Errors raised while declaring, validating, or executing a graph.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// `build()` was called on a builder with no declarations.
    #[error("Empty graph")]
    EmptyGraph,

    /// A node's arity does not match the number of bound arguments.
    ///
    /// The typed `.with(..)` surface makes this reachable only for a node
    /// declared without any `.with(..)` at all, but `build()` checks every
    /// declaration regardless.
    #[error("Incorrect argument count for node '{node}': the node takes {expected} arguments but {actual} were bound")]
    IncorrectArgumentCount {
        /// Display name of the offending node.
        node: String,
        /// The node's declared arity.
        expected: usize,
        /// How many arguments were actually bound.
        actual: usize,
    },

    /// A binding references a [`Name`](crate::Name) that was never declared
    /// via [`GraphBuilder::inputs`](crate::GraphBuilder::inputs).
    #[error("node '{node}' reads input '{input}' which was not declared on the graph")]
    UndeclaredInput {
        /// Display name of the node whose binding is at fault.
        node: String,
        /// Label of the undeclared input.
        input: String,
    },

    /// More than one declared node has no dependent.
    #[error("Multiple sinks: [{}]", nodes.join(", "))]
    MultipleSinks {
        /// Display names of every sink, in declaration order.
        nodes: Vec<String>,
    },

    /// The predecessor relation (bindings plus happens-after edges) contains
    /// a cycle; `path` holds one representative cycle such as `a -> b -> a`.
    #[error("cycle detected: {path}")]
    CycleDetected { path: String },

    /// The unique sink does not produce the type the graph was declared
    /// with.
    #[error("sink node '{node}' produces `{actual}` but the graph was declared to produce `{expected}`")]
    SinkTypeMismatch {
        node: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A named input was referenced during the run without a bound value.
    #[error("input '{name}' was not bound before the run")]
    UnboundInput { name: String },

    /// A node failed and exception wrapping was disabled for the run.
    ///
    /// The original cause stays reachable through `source()` or
    /// [`SharedCause::get`].
    #[error("node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: SharedCause,
    },

    /// A node failed; the failure site and execution context are carried in
    /// the wrapped [`GraphExecutionError`].
    #[error(transparent)]
    Execution(#[from] GraphExecutionError),
}

/// Diagnostic snapshot of one call whose argument futures all resolved.
///
/// Returned by [`GraphExecutionError::calls`], in the order the calls were
/// recorded by the scheduler.
#[derive(Debug, Clone)]
pub struct CallInfo {
    node: NodeInfo,
    args: Vec<AnyValue>,
}

impl CallInfo {
    pub(crate) fn new(node: NodeInfo, args: Vec<AnyValue>) -> Self {
        Self { node, args }
    }

    /// The called node's metadata view.
    pub fn node(&self) -> &NodeInfo {
        &self.node
    }

    /// The resolved argument values, in binding order.
    pub fn args(&self) -> &[AnyValue] {
        &self.args
    }
}

/// A node failure together with the execution context at the failure site.
///
/// Carries the failing node's [`NodeInfo`], the string form of each argument
/// value that was available when the node failed, the ordered list of calls
/// that had completed by then, and the original cause.
///
/// # Examples
///
/// ```rust,no_run
/// use cascade_core::{GraphError, GraphExecutionError};
///
/// fn report(err: GraphError) {
///     if let GraphError::Execution(e) = err {
///         eprintln!("failed at '{}'", e.node().name());
///         for call in e.calls() {
///             eprintln!("  completed: {}", call.node().name());
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GraphExecutionError {
    node: NodeInfo,
    arg_values: Vec<String>,
    calls: Vec<CallInfo>,
    cause: SharedCause,
}

impl GraphExecutionError {
    pub(crate) fn new(
        node: NodeInfo,
        args: &[AnyValue],
        calls: Vec<CallInfo>,
        cause: SharedCause,
    ) -> Self {
        Self {
            node,
            arg_values: args.iter().map(|value| value.to_string()).collect(),
            calls,
            cause,
        }
    }

    /// The failing node's metadata view.
    pub fn node(&self) -> &NodeInfo {
        &self.node
    }

    /// Calls that had completed when the failure was captured: every recorded
    /// call whose argument futures had all resolved successfully, excluding
    /// the failing call itself. Ordering follows record order.
    pub fn calls(&self) -> &[CallInfo] {
        &self.calls
    }

    /// The original cause of the failure.
    pub fn cause(&self) -> &(dyn StdError + 'static) {
        self.cause.get()
    }
}

impl fmt::Display for GraphExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node '{}' failed", self.node.name())?;
        if !self.node.args().is_empty() {
            let args = self
                .node
                .args()
                .iter()
                .zip(&self.arg_values)
                .map(|(info, value)| format!("{}={}", info.name(), value))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " (args: {args})")?;
        }
        write!(f, ": {}", self.cause)
    }
}

impl StdError for GraphExecutionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::NodeKind;

    fn info(name: &str, args: Vec<NodeInfo>) -> NodeInfo {
        let preds = args.clone();
        NodeInfo::new(name.to_string(), NodeKind::Node, args, preds)
    }

    #[test]
    fn message_names_node_args_and_values() {
        let arg = NodeInfo::new("greeting".into(), NodeKind::Input, vec![], vec![]);
        let failing = info("sink", vec![arg]);
        let err = GraphExecutionError::new(
            failing,
            &[AnyValue::new("hi".to_string())],
            vec![],
            SharedCause::new("boom".to_string().into()),
        );
        let message = err.to_string();
        assert!(message.contains("sink"));
        assert!(message.contains("greeting=\"hi\""));
        assert!(message.contains("boom"));
    }

    #[test]
    fn multiple_sinks_lists_names() {
        let err = GraphError::MultipleSinks {
            nodes: vec!["the first sink".into(), "unnamed".into()],
        };
        let message = err.to_string();
        assert!(message.contains("Multiple sinks"));
        assert!(message.contains("the first sink"));
        assert!(message.contains("unnamed"));
    }

    #[test]
    fn cause_survives_wrapping() {
        let err = GraphExecutionError::new(
            info("n", vec![]),
            &[],
            vec![],
            SharedCause::new(std::io::Error::new(std::io::ErrorKind::Other, "io down").into()),
        );
        let cause = err.cause();
        assert!(cause.downcast_ref::<std::io::Error>().is_some());
    }
}
