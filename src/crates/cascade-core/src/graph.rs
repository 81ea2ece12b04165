//! The immutable graph: frozen declarations and the run entry points
//!
//! A [`Graph`] is the frozen artifact a builder produces: the sink
//! declaration, the transitive closure of declarations reachable from it,
//! and the named inputs the graph requires. It is immutable and cheap to
//! clone, so one graph can be shared across any number of concurrent runs.
//!
//! Binding an input yields a *new* graph ([`Graph::bind`]); running creates a
//! per-run traversal state and returns the sink's value
//! ([`Graph::run`]).
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cascade_core::{call1, graph, node1, Inline, Name};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cascade_core::Result<()> {
//! let who = Name::<String>::new("who");
//!
//! let mut builder = graph::<String>();
//! builder.inputs(&[&who]);
//! builder.call(
//!     call1(node1(|name: String| async move { Ok(format!("hello {name}!")) }))
//!         .with(&who)
//!         .named("greet"),
//! );
//!
//! let greeting = builder.build()?;
//! let out = greeting
//!     .bind(&who, "petter".to_string())
//!     .run(Arc::new(Inline))
//!     .await?;
//! assert_eq!(out, "hello petter!");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::error::{GraphError, Result};
use crate::info::{NodeInfo, NodeKind};
use crate::name::{InputName, Name};
use crate::node::ErasedNode;
use crate::traverse::TraverseState;
use crate::value::{AnyValue, Value};

/// Display name used for declarations never given a label.
pub(crate) const UNNAMED: &str = "unnamed";

/// A frozen node declaration: the node plus its bindings, happens-after
/// predecessors, optional fallback, and display name.
pub(crate) struct NodeDecl {
    pub(crate) id: Uuid,
    pub(crate) name: Option<Arc<str>>,
    pub(crate) node: ErasedNode,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) after: Vec<Arc<NodeDecl>>,
    pub(crate) fallback: Option<AnyValue>,
}

/// What occupies one argument slot of a declared node.
pub(crate) enum Binding {
    /// The output of another declaration.
    Node(Arc<NodeDecl>),
    /// A named input supplied at run time.
    Input(InputName),
    /// A precomputed value.
    Constant(AnyValue),
}

impl NodeDecl {
    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    /// Build (or reuse) the [`NodeInfo`] view of this declaration. The memo
    /// keeps diamonds shared so `same`-identity survives the walk.
    pub(crate) fn info(self: &Arc<Self>, memo: &mut HashMap<Uuid, NodeInfo>) -> NodeInfo {
        if let Some(found) = memo.get(&self.id) {
            return found.clone();
        }
        let args: Vec<NodeInfo> = self.bindings.iter().map(|b| b.info(memo)).collect();
        let mut predecessors = args.clone();
        predecessors.extend(self.after.iter().map(|decl| decl.info(memo)));
        let info = NodeInfo::new(
            self.display_name().to_string(),
            NodeKind::Node,
            args,
            predecessors,
        );
        memo.insert(self.id, info.clone());
        info
    }
}

impl Binding {
    fn info(&self, memo: &mut HashMap<Uuid, NodeInfo>) -> NodeInfo {
        match self {
            Binding::Node(decl) => decl.info(memo),
            Binding::Input(name) => {
                if let Some(found) = memo.get(&name.id) {
                    return found.clone();
                }
                let info = NodeInfo::new(name.label.to_string(), NodeKind::Input, vec![], vec![]);
                memo.insert(name.id, info.clone());
                info
            }
            Binding::Constant(value) => {
                NodeInfo::new(value.to_string(), NodeKind::Parameter, vec![], vec![])
            }
        }
    }
}

/// An immutable, executable dataflow graph producing `R`.
///
/// Obtained from [`GraphBuilder::build`](crate::GraphBuilder::build) or from
/// a standalone configured call's `build()`. A graph is both an executable
/// unit and a reusable building block: pass `&graph` to another call's
/// `.with(..)` to nest it.
pub struct Graph<R> {
    pub(crate) sink: Arc<NodeDecl>,
    pub(crate) inputs: Arc<[InputName]>,
    pub(crate) bindings: HashMap<Uuid, AnyValue>,
    pub(crate) _out: PhantomData<fn() -> R>,
}

impl<R> Clone for Graph<R> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            inputs: self.inputs.clone(),
            bindings: self.bindings.clone(),
            _out: PhantomData,
        }
    }
}

impl<R: Value> Graph<R> {
    /// Bind a named input, returning a new graph with the binding stored.
    ///
    /// The receiver is untouched; per-run bindings layer over the shared
    /// immutable declaration tree.
    pub fn bind<T: Value>(&self, name: &Name<T>, value: T) -> Graph<R> {
        let mut next = self.clone();
        next.bindings.insert(name.id(), AnyValue::new(value));
        next
    }

    /// Labels of the named inputs this graph declared, in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|name| &*name.label)
    }

    /// The walkable metadata view of the sink declaration and everything
    /// reachable from it. Consumed by external visualizers.
    pub fn info(&self) -> NodeInfo {
        self.sink.info(&mut HashMap::new())
    }

    /// Execute the graph on the given context and return the sink's value.
    ///
    /// Node failures surface as
    /// [`GraphError::Execution`] carrying the failure site and the completed
    /// calls at that moment; see
    /// [`GraphExecutionError`](crate::GraphExecutionError).
    #[tracing::instrument(skip_all, fields(sink = %self.sink.display_name()))]
    pub async fn run(&self, ctx: Arc<dyn ExecutionContext>) -> Result<R> {
        self.run_with(ctx, true).await
    }

    /// Execute without exception wrapping: a node failure surfaces as
    /// [`GraphError::NodeFailed`] with the raw cause. Intended for tests and
    /// debugging that want to inspect causes directly.
    #[tracing::instrument(skip_all, fields(sink = %self.sink.display_name()))]
    pub async fn run_unwrapped(&self, ctx: Arc<dyn ExecutionContext>) -> Result<R> {
        self.run_with(ctx, false).await
    }

    async fn run_with(&self, ctx: Arc<dyn ExecutionContext>, wrap_failures: bool) -> Result<R> {
        let state = Arc::new(TraverseState::new(
            self.bindings.clone(),
            ctx,
            wrap_failures,
        ));
        tracing::debug!(sink = %self.sink.display_name(), "starting traversal");
        let value = state.resolve(&self.sink).await?;
        tracing::debug!(sink = %self.sink.display_name(), "traversal complete");
        value
            .downcast::<R>()
            .ok_or_else(|| GraphError::SinkTypeMismatch {
                node: self.sink.display_name().to_string(),
                expected: std::any::type_name::<R>(),
                actual: self.sink.node.output_type_name,
            })
    }
}

impl<R> std::fmt::Debug for Graph<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("sink", &self.sink.display_name())
            .field(
                "inputs",
                &self.inputs.iter().map(|n| n.label.as_ref()).collect::<Vec<_>>(),
            )
            .field("bound", &self.bindings.len())
            .finish()
    }
}
