//! Per-run traversal state and the callback-driven scheduler
//!
//! Each `run()` creates one [`TraverseState`]: the bound inputs, the
//! execution context, the failure-wrapping flag, a memo of one shared future
//! per declaration, and the call log.
//!
//! `resolve` composes the whole future tree synchronously before anything is
//! polled: for each declaration it resolves the argument and happens-after
//! futures, records the call (the argument futures now exist), and builds a
//! shared future that awaits every predecessor, dispatches the node through
//! the execution context, then applies fallback or failure wrapping. The
//! memo guarantees each declaration is composed, and therefore invoked, at
//! most once per run; sharing the future is what lets a diamond's two
//! consumers await the same computation.
//!
//! The call-log append is the only many-writers operation at run time and is
//! serialized behind a mutex.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::error::{CallInfo, GraphError, GraphExecutionError, SharedCause};
use crate::graph::{Binding, NodeDecl};
use crate::info::NodeInfo;
use crate::node::NodeError;
use crate::value::AnyValue;

/// A memoized node future: computed once, awaited by every dependent.
pub(crate) type NodeFuture = Shared<BoxFuture<'static, Result<AnyValue, GraphError>>>;

/// One recorded call: the node's view plus its argument futures, in binding
/// order. Recorded as soon as the argument futures exist.
struct FutureCall {
    info: NodeInfo,
    args: Vec<NodeFuture>,
}

pub(crate) struct TraverseState {
    bindings: HashMap<Uuid, AnyValue>,
    ctx: Arc<dyn ExecutionContext>,
    wrap_failures: bool,
    memo: Mutex<HashMap<Uuid, NodeFuture>>,
    calls: Mutex<Vec<FutureCall>>,
    infos: Mutex<HashMap<Uuid, NodeInfo>>,
}

impl TraverseState {
    pub(crate) fn new(
        bindings: HashMap<Uuid, AnyValue>,
        ctx: Arc<dyn ExecutionContext>,
        wrap_failures: bool,
    ) -> Self {
        Self {
            bindings,
            ctx,
            wrap_failures,
            memo: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            infos: Mutex::new(HashMap::new()),
        }
    }

    /// The memoized future for `decl`, composing it on first request.
    pub(crate) fn resolve(self: &Arc<Self>, decl: &Arc<NodeDecl>) -> NodeFuture {
        {
            let memo = self.memo.lock();
            if let Some(found) = memo.get(&decl.id) {
                return found.clone();
            }
        }
        let composed = self.compose(decl);
        self.memo
            .lock()
            .entry(decl.id)
            .or_insert(composed)
            .clone()
    }

    fn compose(self: &Arc<Self>, decl: &Arc<NodeDecl>) -> NodeFuture {
        let args: Vec<NodeFuture> = decl
            .bindings
            .iter()
            .map(|binding| match binding {
                Binding::Node(dep) => self.resolve(dep),
                Binding::Input(name) => match self.bindings.get(&name.id) {
                    Some(value) => immediate(value.clone()),
                    None => immediate_failure(GraphError::UnboundInput {
                        name: name.label.to_string(),
                    }),
                },
                Binding::Constant(value) => immediate(value.clone()),
            })
            .collect();
        let after: Vec<NodeFuture> = decl.after.iter().map(|dep| self.resolve(dep)).collect();

        let info = self.info(decl);
        self.calls.lock().push(FutureCall {
            info: info.clone(),
            args: args.clone(),
        });
        tracing::trace!(
            node = %info.name(),
            args = args.len(),
            after = after.len(),
            "composed node future"
        );

        let state = Arc::clone(self);
        let node = decl.node.clone();
        let fallback = decl.fallback.clone();
        async move {
            let values = future::try_join_all(args).await?;
            future::try_join_all(after).await?;
            tracing::debug!(node = %info.name(), "dispatching node");
            match state.ctx.dispatch(node.invoke(values.clone())).await {
                Ok(value) => Ok(value),
                Err(cause) => state.failed(info, values, cause, fallback),
            }
        }
        .boxed()
        .shared()
    }

    fn failed(
        &self,
        info: NodeInfo,
        args: Vec<AnyValue>,
        cause: NodeError,
        fallback: Option<AnyValue>,
    ) -> Result<AnyValue, GraphError> {
        if let Some(value) = fallback {
            tracing::debug!(node = %info.name(), cause = %cause, "node failed, substituting fallback");
            return Ok(value);
        }
        let cause = SharedCause::new(cause);
        if self.wrap_failures {
            tracing::debug!(node = %info.name(), "node failed, capturing execution context");
            let calls = self.completed_calls(&info);
            Err(GraphError::Execution(GraphExecutionError::new(
                info, &args, calls, cause,
            )))
        } else {
            Err(GraphError::NodeFailed {
                node: info.name().to_string(),
                source: cause,
            })
        }
    }

    /// Snapshot of the calls completed so far: every recorded call whose
    /// argument futures have all resolved successfully, excluding the
    /// failing call itself. Record order is preserved.
    fn completed_calls(&self, failing: &NodeInfo) -> Vec<CallInfo> {
        self.calls
            .lock()
            .iter()
            .filter(|call| !call.info.same(failing))
            .filter_map(|call| {
                let mut values = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    match arg.peek() {
                        Some(Ok(value)) => values.push(value.clone()),
                        _ => return None,
                    }
                }
                Some(CallInfo::new(call.info.clone(), values))
            })
            .collect()
    }

    fn info(&self, decl: &Arc<NodeDecl>) -> NodeInfo {
        let mut memo = self.infos.lock();
        decl.info(&mut memo)
    }
}

fn immediate(value: AnyValue) -> NodeFuture {
    future::ready(Ok(value)).boxed().shared()
}

fn immediate_failure(err: GraphError) -> NodeFuture {
    future::ready(Err(err)).boxed().shared()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::builder::{call1, call2, constant, graph};
    use crate::context::Inline;
    use crate::node::{node1, node2};

    #[tokio::test]
    async fn diamond_dependencies_are_invoked_once() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counted = invocations.clone();

        let mut builder = graph::<u64>();
        let base = builder.call(
            call1(node1(move |x: u64| {
                let counted = counted.clone();
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(x)
                }
            }))
            .with(constant(21u64))
            .named("base"),
        );
        builder.call(
            call2(node2(|a: u64, b: u64| async move { Ok(a + b) }))
                .with(&base, &base)
                .named("sum"),
        );

        let out = builder
            .build()
            .unwrap()
            .run(Arc::new(Inline))
            .await
            .unwrap();
        assert_eq!(out, 42);
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unbound_input_fails_fast() {
        let who = crate::name::Name::<String>::new("who");
        let standalone = call1(node1(|name: String| async move { Ok(name) }))
            .with(&who)
            .named("greet")
            .build()
            .unwrap();
        let err = standalone.run(Arc::new(Inline)).await.unwrap_err();
        assert!(err.to_string().contains("who"));
    }
}
