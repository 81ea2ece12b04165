//! Node seams: the asynchronous function units inside a graph
//!
//! A node is a user-supplied asynchronous function of fixed arity producing a
//! [`Value`]. The typed surface keeps one trait per arity ([`Node0`] through
//! [`Node3`]); implement a trait on your own type, or wrap a closure with the
//! matching [`node0`]..[`node3`] adapter.
//!
//! The engine never inspects a node's internals: it invokes the node with
//! exactly as many resolved argument values as the node's arity and consumes
//! the future it returns.
//!
//! # Examples
//!
//! ## Closure adapters
//!
//! ```rust
//! use cascade_core::{node0, node1};
//!
//! let hello = node0(|| async { Ok("hello world!!".to_string()) });
//!
//! let greet = node1(|who: String| async move {
//!     Ok(format!("hello {who}!"))
//! });
//! # let _ = (hello, greet);
//! ```
//!
//! ## Implementing a node trait directly
//!
//! ```rust
//! use async_trait::async_trait;
//! use cascade_core::{Node1, NodeResult};
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl Node1<String, String> for Shout {
//!     async fn run(&self, input: String) -> NodeResult<String> {
//!         Ok(input.to_uppercase())
//!     }
//! }
//! ```

use std::any::TypeId;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::value::{AnyValue, Value};

/// Error type a node may fail with.
///
/// Any error convertible into a boxed `std::error::Error` works; the engine
/// preserves it as the cause of the eventual
/// [`GraphExecutionError`](crate::GraphExecutionError).
pub type NodeError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by node implementations.
pub type NodeResult<T> = std::result::Result<T, NodeError>;

/// An asynchronous node taking no arguments.
#[async_trait]
pub trait Node0<R: Value>: Send + Sync {
    async fn run(&self) -> NodeResult<R>;
}

/// An asynchronous node taking one argument.
#[async_trait]
pub trait Node1<A: Value, R: Value>: Send + Sync {
    async fn run(&self, a: A) -> NodeResult<R>;
}

/// An asynchronous node taking two arguments.
#[async_trait]
pub trait Node2<A: Value, B: Value, R: Value>: Send + Sync {
    async fn run(&self, a: A, b: B) -> NodeResult<R>;
}

/// An asynchronous node taking three arguments.
#[async_trait]
pub trait Node3<A: Value, B: Value, C: Value, R: Value>: Send + Sync {
    async fn run(&self, a: A, b: B, c: C) -> NodeResult<R>;
}

struct FnNode0<F>(F);

#[async_trait]
impl<R, F, Fut> Node0<R> for FnNode0<F>
where
    R: Value,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    async fn run(&self) -> NodeResult<R> {
        (self.0)().await
    }
}

struct FnNode1<F>(F);

#[async_trait]
impl<A, R, F, Fut> Node1<A, R> for FnNode1<F>
where
    A: Value,
    R: Value,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    async fn run(&self, a: A) -> NodeResult<R> {
        (self.0)(a).await
    }
}

struct FnNode2<F>(F);

#[async_trait]
impl<A, B, R, F, Fut> Node2<A, B, R> for FnNode2<F>
where
    A: Value,
    B: Value,
    R: Value,
    F: Fn(A, B) -> Fut + Send + Sync,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    async fn run(&self, a: A, b: B) -> NodeResult<R> {
        (self.0)(a, b).await
    }
}

struct FnNode3<F>(F);

#[async_trait]
impl<A, B, C, R, F, Fut> Node3<A, B, C, R> for FnNode3<F>
where
    A: Value,
    B: Value,
    C: Value,
    R: Value,
    F: Fn(A, B, C) -> Fut + Send + Sync,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    async fn run(&self, a: A, b: B, c: C) -> NodeResult<R> {
        (self.0)(a, b, c).await
    }
}

/// Wrap an async closure of arity 0 as a [`Node0`].
pub fn node0<R, F, Fut>(f: F) -> impl Node0<R> + 'static
where
    R: Value,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    FnNode0(f)
}

/// Wrap an async closure of arity 1 as a [`Node1`].
pub fn node1<A, R, F, Fut>(f: F) -> impl Node1<A, R> + 'static
where
    A: Value,
    R: Value,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    FnNode1(f)
}

/// Wrap an async closure of arity 2 as a [`Node2`].
pub fn node2<A, B, R, F, Fut>(f: F) -> impl Node2<A, B, R> + 'static
where
    A: Value,
    B: Value,
    R: Value,
    F: Fn(A, B) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    FnNode2(f)
}

/// Wrap an async closure of arity 3 as a [`Node3`].
pub fn node3<A, B, C, R, F, Fut>(f: F) -> impl Node3<A, B, C, R> + 'static
where
    A: Value,
    B: Value,
    C: Value,
    R: Value,
    F: Fn(A, B, C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = NodeResult<R>> + Send + 'static,
{
    FnNode3(f)
}

type ErasedInvoke =
    Arc<dyn Fn(Vec<AnyValue>) -> BoxFuture<'static, NodeResult<AnyValue>> + Send + Sync>;

/// Arity-erased node used internally by the scheduler.
///
/// The typed builder surface guarantees the argument downcasts succeed; a
/// failed downcast would mean the builder let a mistyped binding through and
/// is surfaced as an ordinary node failure rather than a panic.
#[derive(Clone)]
pub(crate) struct ErasedNode {
    pub(crate) arity: usize,
    pub(crate) output_type: TypeId,
    pub(crate) output_type_name: &'static str,
    invoke: ErasedInvoke,
}

impl ErasedNode {
    pub(crate) fn invoke(&self, args: Vec<AnyValue>) -> BoxFuture<'static, NodeResult<AnyValue>> {
        (self.invoke)(args)
    }

    pub(crate) fn from_node0<R: Value>(node: impl Node0<R> + 'static) -> Self {
        let node = Arc::new(node);
        let invoke: ErasedInvoke = Arc::new(move |_args| {
            let node = node.clone();
            Box::pin(async move { node.run().await.map(AnyValue::new) })
        });
        Self {
            arity: 0,
            output_type: TypeId::of::<R>(),
            output_type_name: std::any::type_name::<R>(),
            invoke,
        }
    }

    pub(crate) fn from_node1<A: Value, R: Value>(node: impl Node1<A, R> + 'static) -> Self {
        let node = Arc::new(node);
        let invoke: ErasedInvoke = Arc::new(move |args| {
            let node = node.clone();
            Box::pin(async move {
                let a = take_arg::<A>(&args, 0)?;
                node.run(a).await.map(AnyValue::new)
            })
        });
        Self {
            arity: 1,
            output_type: TypeId::of::<R>(),
            output_type_name: std::any::type_name::<R>(),
            invoke,
        }
    }

    pub(crate) fn from_node2<A: Value, B: Value, R: Value>(
        node: impl Node2<A, B, R> + 'static,
    ) -> Self {
        let node = Arc::new(node);
        let invoke: ErasedInvoke = Arc::new(move |args| {
            let node = node.clone();
            Box::pin(async move {
                let a = take_arg::<A>(&args, 0)?;
                let b = take_arg::<B>(&args, 1)?;
                node.run(a, b).await.map(AnyValue::new)
            })
        });
        Self {
            arity: 2,
            output_type: TypeId::of::<R>(),
            output_type_name: std::any::type_name::<R>(),
            invoke,
        }
    }

    pub(crate) fn from_node3<A: Value, B: Value, C: Value, R: Value>(
        node: impl Node3<A, B, C, R> + 'static,
    ) -> Self {
        let node = Arc::new(node);
        let invoke: ErasedInvoke = Arc::new(move |args| {
            let node = node.clone();
            Box::pin(async move {
                let a = take_arg::<A>(&args, 0)?;
                let b = take_arg::<B>(&args, 1)?;
                let c = take_arg::<C>(&args, 2)?;
                node.run(a, b, c).await.map(AnyValue::new)
            })
        });
        Self {
            arity: 3,
            output_type: TypeId::of::<R>(),
            output_type_name: std::any::type_name::<R>(),
            invoke,
        }
    }
}

fn take_arg<T: Value>(args: &[AnyValue], index: usize) -> NodeResult<T> {
    args.get(index).and_then(|value| value.downcast::<T>()).ok_or_else(|| {
        format!(
            "argument {index} does not carry the expected type `{}`",
            std::any::type_name::<T>()
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn erased_node_preserves_arity_and_output() {
        let node = ErasedNode::from_node2(node2(|a: u32, b: u32| async move { Ok(a + b) }));
        assert_eq!(node.arity, 2);
        assert_eq!(node.output_type, TypeId::of::<u32>());

        let out = node
            .invoke(vec![AnyValue::new(40u32), AnyValue::new(2u32)])
            .await
            .unwrap();
        assert_eq!(out.downcast_ref::<u32>(), Some(&42));
    }

    #[tokio::test]
    async fn mistyped_argument_is_a_node_failure() {
        let node = ErasedNode::from_node1(node1(|a: u32| async move { Ok(a) }));
        let err = node.invoke(vec![AnyValue::new("nope")]).await.unwrap_err();
        assert!(err.to_string().contains("expected type"));
    }
}
