//! Execution contexts: where node invocations run
//!
//! The engine owns no threads. When a node's predecessors have all resolved,
//! the scheduler hands the invocation to the caller-supplied
//! [`ExecutionContext`] and awaits whatever future the context returns.
//!
//! Two contexts ship with the crate:
//!
//! - [`Inline`] runs the invocation on the task that awaits it. Under a
//!   single-threaded runtime this yields strictly sequential execution;
//!   independent branches are still interleaved at await points.
//! - [`TokioSpawn`] posts every invocation to a tokio runtime's worker pool,
//!   so independent branches run in parallel.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cascade_core::{call0, node0, Inline, TokioSpawn};
//!
//! # async fn example() -> cascade_core::Result<()> {
//! let graph = call0(node0(|| async { Ok(1u32) })).build()?;
//!
//! // Sequential, on the awaiting task:
//! let one = graph.run(Arc::new(Inline)).await?;
//!
//! // Parallel, on the current tokio runtime:
//! let also_one = graph.run(Arc::new(TokioSpawn::current())).await?;
//! # assert_eq!(one, also_one);
//! # Ok(())
//! # }
//! ```

use futures::future::BoxFuture;

use crate::node::{NodeError, NodeResult};
use crate::value::AnyValue;

/// A dispatched node invocation: the work, boxed, with its eventual result.
pub type NodeTask = BoxFuture<'static, NodeResult<AnyValue>>;

/// Dispatches node invocations on behalf of the scheduler.
///
/// `dispatch` receives one invocation and returns a future for its
/// completion. Implementations decide where the work actually runs; the
/// scheduler only awaits the returned future.
pub trait ExecutionContext: Send + Sync {
    fn dispatch(&self, task: NodeTask) -> NodeTask;
}

/// Runs each invocation inline on the task awaiting the graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl ExecutionContext for Inline {
    fn dispatch(&self, task: NodeTask) -> NodeTask {
        task
    }
}

/// Posts each invocation to a tokio runtime's worker pool.
#[derive(Debug, Clone)]
pub struct TokioSpawn {
    handle: tokio::runtime::Handle,
}

impl TokioSpawn {
    /// Dispatch onto the runtime the caller is currently inside.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime, as
    /// [`Handle::current`](tokio::runtime::Handle::current) does.
    pub fn current() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }

    /// Dispatch onto an explicit runtime handle.
    pub fn on(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

impl ExecutionContext for TokioSpawn {
    fn dispatch(&self, task: NodeTask) -> NodeTask {
        let join = self.handle.spawn(task);
        Box::pin(async move {
            match join.await {
                Ok(result) => result,
                Err(err) => Err(Box::new(err) as NodeError),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AnyValue;

    #[tokio::test]
    async fn inline_runs_on_the_awaiting_task() {
        let ctx = Inline;
        let out = ctx
            .dispatch(Box::pin(async { Ok(AnyValue::new(7u8)) }))
            .await
            .unwrap();
        assert_eq!(out.downcast_ref::<u8>(), Some(&7));
    }

    #[tokio::test]
    async fn tokio_spawn_surfaces_the_result() {
        let ctx = TokioSpawn::current();
        let out = ctx
            .dispatch(Box::pin(async { Ok(AnyValue::new("spawned")) }))
            .await
            .unwrap();
        assert_eq!(out.downcast_ref::<&str>(), Some(&"spawned"));
    }
}
