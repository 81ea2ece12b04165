//! # cascade-core - Asynchronous Dataflow Graph Executor
//!
//! Compose a directed acyclic graph of asynchronous computations and execute
//! it with correct dependency ordering, argument forwarding, fallback
//! handling, and rich failure diagnostics.
//!
//! ## Overview
//!
//! `cascade-core` provides:
//!
//! - **Declarative builder** - Declare nodes, typed argument bindings, named
//!   inputs, happens-after ordering edges, per-node fallbacks, and display
//!   names; `build()` validates structure (single sink, no cycles, matching
//!   arities) and freezes an immutable, shareable [`Graph`]
//! - **Parallel scheduler** - Each node starts as soon as every predecessor
//!   resolves; independent branches run concurrently on a caller-supplied
//!   [`ExecutionContext`]
//! - **Exactly-once evaluation** - Per-run memoization: a node shared by
//!   several dependents is invoked once and its value fanned out
//! - **Failure diagnostics** - A failing node surfaces a
//!   [`GraphExecutionError`] carrying the failure site, its argument names
//!   and values, the calls already completed, and the original cause
//!
//! ## Core Concepts
//!
//! ### 1. Nodes
//!
//! A node is an asynchronous function of fixed arity producing a value.
//! Implement [`Node0`]..[`Node3`] on your own type, or wrap a closure with
//! [`node0`]..[`node3`].
//!
//! ### 2. Calls and Graphs
//!
//! [`call0`]..[`call3`] begin the declaration of one node invocation:
//! `.with(..)` binds arguments (another graph, a [`Name`], a [`DeclHandle`],
//! or a [`constant`]), `.after(..)` adds ordering edges, `.fallback(..)` and
//! `.named(..)` configure the declaration. A configured call freezes into a
//! standalone [`Graph`]; a [`GraphBuilder`] collects many declarations into
//! one graph with declared inputs.
//!
//! ### 3. Running
//!
//! [`Graph::bind`] supplies named inputs; [`Graph::run`] executes on an
//! execution context ([`Inline`] or [`TokioSpawn`]) and resolves to the
//! sink's value.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cascade_core::{call1, call2, graph, node1, node2, Inline, Name};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> cascade_core::Result<()> {
//!     let who = Name::<String>::new("who");
//!
//!     let mut builder = graph::<String>();
//!     builder.inputs(&[&who]);
//!
//!     let greeting = builder.call(
//!         call1(node1(|name: String| async move { Ok(format!("hello {name}")) }))
//!             .with(&who)
//!             .named("greeting"),
//!     );
//!     builder.call(
//!         call2(node2(|greeting: String, name: String| async move {
//!             Ok(format!("{greeting}, you are {name}!"))
//!         }))
//!         .with(&greeting, &who)
//!         .named("sentence"),
//!     );
//!
//!     let sentence = builder.build()?;
//!     let out = sentence
//!         .bind(&who, "petter".to_string())
//!         .run(Arc::new(Inline))
//!         .await?;
//!     assert_eq!(out, "hello petter, you are petter!");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────────────┐
//!        │   call builders / GraphBuilder           │
//!        │   • with() • after() • fallback()        │
//!        │   • named() • inputs() • build()         │
//!        └───────────────────┬──────────────────────┘
//!                            │ validate + freeze
//!                            ▼
//!        ┌──────────────────────────────────────────┐
//!        │   Graph (immutable, shareable)           │
//!        │   • bind() • run() • info()              │
//!        └───────────────────┬──────────────────────┘
//!                            │ per run
//!                            ▼
//!        ┌──────────────────────────────────────────┐
//!        │   TraverseState + scheduler              │
//!        │   • one shared future per declaration    │
//!        │   • call log for diagnostics             │
//!        └─────────┬────────────────────┬───────────┘
//!                  ▼                    ▼
//!        ┌──────────────────┐ ┌──────────────────────┐
//!        │ ExecutionContext │ │ GraphExecutionError  │
//!        │ Inline / tokio   │ │ site + calls + cause │
//!        └──────────────────┘ └──────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`builder`] - Call builders, [`GraphBuilder`], validation, freezing
//! - [`graph`] - The immutable [`Graph`] and its run entry points
//! - [`node`] - Node traits and closure adapters
//! - [`name`] - Typed named input slots
//! - [`context`] - Execution contexts
//! - [`error`] - [`GraphError`] and [`GraphExecutionError`]
//! - [`info`] - [`NodeInfo`] introspection consumed by visualizers
//! - [`value`] - Value bounds and the erased value carrier
//!
//! ## Guarantees
//!
//! - A node is invoked only after every declared argument binding *and*
//!   every happens-after predecessor completed successfully
//! - Siblings with no mutual dependency may execute concurrently; no
//!   implicit ordering is imposed
//! - Each declaration is invoked at most once per run
//! - A fallback covers only the node's own invocation failure, never the
//!   failures of its dependencies
//! - Once started, a run proceeds until the sink resolves or fails;
//!   cancellation is not modeled

pub mod builder;
pub mod context;
pub mod error;
pub mod graph;
pub mod info;
pub mod name;
pub mod node;
mod traverse;
pub mod value;

pub use builder::{
    call0, call1, call2, call3, constant, graph, Call1, Call2, Call3, ConfiguredCall, Constant,
    DeclHandle, GraphBuilder, IntoArg, IntoCall, Predecessor,
};
pub use context::{ExecutionContext, Inline, NodeTask, TokioSpawn};
pub use error::{CallInfo, GraphError, GraphExecutionError, Result, SharedCause};
pub use graph::Graph;
pub use info::{NodeInfo, NodeKind};
pub use name::{InputName, InputSlot, Name};
pub use node::{node0, node1, node2, node3, Node0, Node1, Node2, Node3, NodeError, NodeResult};
pub use value::{AnyValue, Value};
