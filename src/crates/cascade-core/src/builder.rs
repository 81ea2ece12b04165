//! Declarative graph construction and validation
//!
//! Graphs are declared in two layers:
//!
//! - **Call builders** ([`call0`]..[`call3`]) configure a single node: its
//!   ordered argument bindings (`.with(..)`), happens-after predecessors
//!   (`.after(..)`), optional fallback value (`.fallback(..)`), and display
//!   name (`.named(..)`). A configured call can be frozen directly into a
//!   standalone [`Graph`] with `.build()`, so a call is itself a reusable
//!   sub-graph.
//! - **[`GraphBuilder`]** (from [`graph()`]) accumulates declarations for a
//!   multi-node graph: declare required inputs with
//!   [`inputs`](GraphBuilder::inputs), register calls with
//!   [`call`](GraphBuilder::call) (which returns a [`DeclHandle`] usable as
//!   an argument or predecessor of later calls), and finish with
//!   [`build`](GraphBuilder::build).
//!
//! Declarations stay mutable while the builder is alive (a handle can gain
//! `.after` edges after other calls reference it) and are frozen into the
//! immutable [`Graph`] by `build()`.
//!
//! # Validation
//!
//! `build()` validates before freezing, failing fast on the first problem in
//! this order:
//!
//! 1. **Empty graph**: no declarations at all.
//! 2. **Arity**: every node's arity equals its bound argument count.
//! 3. **Inputs**: every named input referenced by a binding was declared
//!    via `inputs(..)`.
//! 4. **Sink uniqueness**: exactly one declaration has no dependent.
//! 5. **Cycles**: the predecessor relation (bindings plus happens-after) is
//!    a DAG; a violation reports one representative cycle like
//!    `a -> b -> a`.
//!
//! Each failure names the offending declaration(s) by display name
//! (`"unnamed"` when no name was set).
//!
//! # Examples
//!
//! ## A diamond with a named input
//!
//! ```rust
//! use cascade_core::{call1, call2, graph, node1, node2, Name};
//!
//! # fn main() -> cascade_core::Result<()> {
//! let base = Name::<u64>::new("base");
//!
//! let mut builder = graph::<u64>();
//! builder.inputs(&[&base]);
//!
//! let double = builder.call(
//!     call1(node1(|x: u64| async move { Ok(x * 2) }))
//!         .with(&base)
//!         .named("double"),
//! );
//! let square = builder.call(
//!     call1(node1(|x: u64| async move { Ok(x * x) }))
//!         .with(&base)
//!         .named("square"),
//! );
//! builder.call(
//!     call2(node2(|a: u64, b: u64| async move { Ok(a + b) }))
//!         .with(&double, &square)
//!         .named("sum"),
//! );
//!
//! let summed = builder.build()?;
//! # let _ = summed;
//! # Ok(())
//! # }
//! ```
//!
//! ## A standalone call as a graph
//!
//! ```rust
//! use cascade_core::{call0, node0};
//!
//! # fn main() -> cascade_core::Result<()> {
//! let hello = call0(node0(|| async { Ok("hello world!!".to_string()) }))
//!     .named("hello")
//!     .build()?;
//! # let _ = hello;
//! # Ok(())
//! # }
//! ```

use std::any::TypeId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{GraphError, Result};
use crate::graph::{Binding, Graph, NodeDecl, UNNAMED};
use crate::name::{InputName, InputSlot, Name};
use crate::node::{ErasedNode, Node0, Node1, Node2, Node3};
use crate::value::{AnyValue, Value};

/// Mutable declaration state, shared between a builder and its handles.
pub(crate) struct DeclState {
    id: Uuid,
    name: Option<Arc<str>>,
    node: ErasedNode,
    bindings: Vec<BuildBinding>,
    after: Vec<DeclLink>,
    fallback: Option<AnyValue>,
}

pub(crate) type DeclRef = Arc<RwLock<DeclState>>;

/// A reference from one declaration to another, either still open in a
/// builder or already frozen inside a built graph.
#[derive(Clone)]
pub(crate) enum DeclLink {
    Open(DeclRef),
    Frozen(Arc<NodeDecl>),
}

#[derive(Clone)]
pub(crate) enum BuildBinding {
    Link(DeclLink),
    Input(InputName),
    Constant(AnyValue),
}

/// The accumulated configuration of one `call`. Opaque; produced by the call
/// builders and consumed by [`GraphBuilder::call`] or a standalone `build()`.
#[doc(hidden)]
pub struct CallParts {
    node: ErasedNode,
    name: Option<Arc<str>>,
    bindings: Vec<BuildBinding>,
    after: Vec<DeclLink>,
    fallback: Option<AnyValue>,
}

impl CallParts {
    fn new(node: ErasedNode) -> Self {
        Self {
            node,
            name: None,
            bindings: Vec::new(),
            after: Vec::new(),
            fallback: None,
        }
    }
}

/// An erased argument binding. Opaque; produced by [`IntoArg`] impls.
#[doc(hidden)]
pub struct ArgBinding {
    binding: BuildBinding,
}

/// Something that can occupy a typed argument slot: a [`Name`], another
/// [`Graph`], a [`DeclHandle`] from the same builder, or a [`constant`].
pub trait IntoArg<A: Value> {
    #[doc(hidden)]
    fn into_arg(self) -> ArgBinding;
}

impl<A: Value> IntoArg<A> for &Name<A> {
    fn into_arg(self) -> ArgBinding {
        ArgBinding {
            binding: BuildBinding::Input(self.erased()),
        }
    }
}

impl<A: Value> IntoArg<A> for &Graph<A> {
    fn into_arg(self) -> ArgBinding {
        ArgBinding {
            binding: BuildBinding::Link(DeclLink::Frozen(self.sink.clone())),
        }
    }
}

impl<A: Value> IntoArg<A> for &DeclHandle<A> {
    fn into_arg(self) -> ArgBinding {
        ArgBinding {
            binding: BuildBinding::Link(DeclLink::Open(self.decl.clone())),
        }
    }
}

/// A precomputed value bound directly into an argument slot.
pub struct Constant<A>(A);

/// Bind a constant into an argument slot: `.with(constant(42))`.
pub fn constant<A: Value>(value: A) -> Constant<A> {
    Constant(value)
}

impl<A: Value> IntoArg<A> for Constant<A> {
    fn into_arg(self) -> ArgBinding {
        ArgBinding {
            binding: BuildBinding::Constant(AnyValue::new(self.0)),
        }
    }
}

/// An erased happens-after reference. Opaque; produced by [`Predecessor`]
/// impls.
#[doc(hidden)]
pub struct PredecessorRef {
    link: DeclLink,
}

/// Something usable as a happens-after predecessor: a [`DeclHandle`] or a
/// built [`Graph`].
pub trait Predecessor {
    #[doc(hidden)]
    fn predecessor(&self) -> PredecessorRef;
}

impl<T: Value> Predecessor for DeclHandle<T> {
    fn predecessor(&self) -> PredecessorRef {
        PredecessorRef {
            link: DeclLink::Open(self.decl.clone()),
        }
    }
}

impl<T: Value> Predecessor for Graph<T> {
    fn predecessor(&self) -> PredecessorRef {
        PredecessorRef {
            link: DeclLink::Frozen(self.sink.clone()),
        }
    }
}

macro_rules! call_configuration {
    () => {
        /// Set the display name used in diagnostics and visualization.
        /// Unnamed declarations render as `"unnamed"`.
        pub fn named(mut self, label: impl Into<String>) -> Self {
            self.parts.name = Some(label.into().into());
            self
        }

        /// Add a happens-after predecessor: an ordering edge with no data
        /// flow. This node is invoked only after `pred` completes
        /// successfully.
        pub fn after(mut self, pred: &impl Predecessor) -> Self {
            self.parts.after.push(pred.predecessor().link);
            self
        }

        /// Substitute `value` if this node's own invocation fails. Failures
        /// of the node's dependencies are not masked by the fallback.
        pub fn fallback(mut self, value: R) -> Self {
            self.parts.fallback = Some(AnyValue::new(value));
            self
        }

        /// Validate and freeze this call into a standalone [`Graph`].
        pub fn build(self) -> Result<Graph<R>> {
            build_standalone::<R>(self.parts)
        }
    };
}

/// A call awaiting no arguments; fully configured from the start.
pub struct ConfiguredCall<R> {
    parts: CallParts,
    _out: PhantomData<fn() -> R>,
}

impl<R: Value> ConfiguredCall<R> {
    call_configuration!();
}

/// A one-argument call awaiting its binding.
pub struct Call1<A, R> {
    parts: CallParts,
    _out: PhantomData<fn(A) -> R>,
}

impl<A: Value, R: Value> Call1<A, R> {
    /// Bind the node's argument.
    pub fn with(mut self, a: impl IntoArg<A>) -> ConfiguredCall<R> {
        self.parts.bindings.push(a.into_arg().binding);
        ConfiguredCall {
            parts: self.parts,
            _out: PhantomData,
        }
    }

    call_configuration!();
}

/// A two-argument call awaiting its bindings.
pub struct Call2<A, B, R> {
    parts: CallParts,
    _out: PhantomData<fn(A, B) -> R>,
}

impl<A: Value, B: Value, R: Value> Call2<A, B, R> {
    /// Bind the node's arguments, in order.
    pub fn with(mut self, a: impl IntoArg<A>, b: impl IntoArg<B>) -> ConfiguredCall<R> {
        self.parts.bindings.push(a.into_arg().binding);
        self.parts.bindings.push(b.into_arg().binding);
        ConfiguredCall {
            parts: self.parts,
            _out: PhantomData,
        }
    }

    call_configuration!();
}

/// A three-argument call awaiting its bindings.
pub struct Call3<A, B, C, R> {
    parts: CallParts,
    _out: PhantomData<fn(A, B, C) -> R>,
}

impl<A: Value, B: Value, C: Value, R: Value> Call3<A, B, C, R> {
    /// Bind the node's arguments, in order.
    pub fn with(
        mut self,
        a: impl IntoArg<A>,
        b: impl IntoArg<B>,
        c: impl IntoArg<C>,
    ) -> ConfiguredCall<R> {
        self.parts.bindings.push(a.into_arg().binding);
        self.parts.bindings.push(b.into_arg().binding);
        self.parts.bindings.push(c.into_arg().binding);
        ConfiguredCall {
            parts: self.parts,
            _out: PhantomData,
        }
    }

    call_configuration!();
}

/// Begin declaring a call of a zero-argument node.
pub fn call0<R: Value>(node: impl Node0<R> + 'static) -> ConfiguredCall<R> {
    ConfiguredCall {
        parts: CallParts::new(ErasedNode::from_node0(node)),
        _out: PhantomData,
    }
}

/// Begin declaring a call of a one-argument node.
pub fn call1<A: Value, R: Value>(node: impl Node1<A, R> + 'static) -> Call1<A, R> {
    Call1 {
        parts: CallParts::new(ErasedNode::from_node1(node)),
        _out: PhantomData,
    }
}

/// Begin declaring a call of a two-argument node.
pub fn call2<A: Value, B: Value, R: Value>(node: impl Node2<A, B, R> + 'static) -> Call2<A, B, R> {
    Call2 {
        parts: CallParts::new(ErasedNode::from_node2(node)),
        _out: PhantomData,
    }
}

/// Begin declaring a call of a three-argument node.
pub fn call3<A: Value, B: Value, C: Value, R: Value>(
    node: impl Node3<A, B, C, R> + 'static,
) -> Call3<A, B, C, R> {
    Call3 {
        parts: CallParts::new(ErasedNode::from_node3(node)),
        _out: PhantomData,
    }
}

/// A call builder in any configuration state, registrable with
/// [`GraphBuilder::call`].
///
/// Implemented by [`ConfiguredCall`] and by the not-yet-bound
/// [`Call1`]/[`Call2`]/[`Call3`]: registering an unbound call is legal and
/// fails at `build()` with an incorrect-argument-count error naming the node.
pub trait IntoCall<R: Value> {
    #[doc(hidden)]
    fn into_parts(self) -> CallParts;
}

impl<R: Value> IntoCall<R> for ConfiguredCall<R> {
    fn into_parts(self) -> CallParts {
        self.parts
    }
}

impl<A: Value, R: Value> IntoCall<R> for Call1<A, R> {
    fn into_parts(self) -> CallParts {
        self.parts
    }
}

impl<A: Value, B: Value, R: Value> IntoCall<R> for Call2<A, B, R> {
    fn into_parts(self) -> CallParts {
        self.parts
    }
}

impl<A: Value, B: Value, C: Value, R: Value> IntoCall<R> for Call3<A, B, C, R> {
    fn into_parts(self) -> CallParts {
        self.parts
    }
}

/// A handle on a declaration registered in a [`GraphBuilder`].
///
/// Handles are how later declarations reference earlier ones (`.with(&h)`,
/// `.after(&h)`), and they keep the declaration mutable until `build()`:
/// ordering edges, a name, or a fallback can still be added after other
/// calls already depend on the handle.
pub struct DeclHandle<T> {
    pub(crate) decl: DeclRef,
    _out: PhantomData<fn() -> T>,
}

impl<T> Clone for DeclHandle<T> {
    fn clone(&self) -> Self {
        Self {
            decl: self.decl.clone(),
            _out: PhantomData,
        }
    }
}

impl<T: Value> DeclHandle<T> {
    /// Add a happens-after predecessor to the underlying declaration.
    pub fn after(&self, pred: &impl Predecessor) -> &Self {
        self.decl.write().after.push(pred.predecessor().link);
        self
    }

    /// Set the declaration's display name.
    pub fn named(&self, label: impl Into<String>) -> &Self {
        self.decl.write().name = Some(label.into().into());
        self
    }

    /// Set a fallback value for the declaration's own invocation failures.
    pub fn fallback(&self, value: T) -> &Self {
        self.decl.write().fallback = Some(AnyValue::new(value));
        self
    }
}

/// Begin a builder for a graph producing `R`.
pub fn graph<R: Value>() -> GraphBuilder<R> {
    GraphBuilder {
        decls: Vec::new(),
        inputs: Vec::new(),
        _out: PhantomData,
    }
}

/// Accumulates node declarations and named inputs, then validates and
/// freezes them into a [`Graph`].
///
/// See the [module docs](self) for the validation rules and an example.
pub struct GraphBuilder<R> {
    decls: Vec<DeclRef>,
    inputs: Vec<InputName>,
    _out: PhantomData<fn() -> R>,
}

impl<R: Value> GraphBuilder<R> {
    /// Declare the named inputs this graph requires at run time.
    pub fn inputs(&mut self, names: &[&dyn InputSlot]) -> &mut Self {
        self.inputs.extend(names.iter().map(|name| name.erased()));
        self
    }

    /// Register a call as a declaration of this graph, returning a handle
    /// for use in later `.with(..)` / `.after(..)` clauses.
    pub fn call<T: Value>(&mut self, call: impl IntoCall<T>) -> DeclHandle<T> {
        let parts = call.into_parts();
        let decl: DeclRef = Arc::new(RwLock::new(DeclState {
            id: Uuid::new_v4(),
            name: parts.name,
            node: parts.node,
            bindings: parts.bindings,
            after: parts.after,
            fallback: parts.fallback,
        }));
        self.decls.push(decl.clone());
        DeclHandle {
            decl,
            _out: PhantomData,
        }
    }

    /// Validate the accumulated declarations and freeze them into an
    /// immutable [`Graph`].
    pub fn build(self) -> Result<Graph<R>> {
        build_graph::<R>(self.decls, self.inputs, true)
    }
}

impl<R: Value> Default for GraphBuilder<R> {
    fn default() -> Self {
        graph::<R>()
    }
}

fn build_standalone<R: Value>(parts: CallParts) -> Result<Graph<R>> {
    let decl: DeclRef = Arc::new(RwLock::new(DeclState {
        id: Uuid::new_v4(),
        name: parts.name,
        node: parts.node,
        bindings: parts.bindings,
        after: parts.after,
        fallback: parts.fallback,
    }));
    // Standalone calls declare no inputs; unbound names fail at run time.
    build_graph::<R>(vec![decl], Vec::new(), false)
}

fn build_graph<R: Value>(
    decls: Vec<DeclRef>,
    inputs: Vec<InputName>,
    check_inputs: bool,
) -> Result<Graph<R>> {
    if decls.is_empty() {
        return Err(GraphError::EmptyGraph);
    }

    let universe = reachable(&decls);
    check_arity(&universe)?;
    if check_inputs {
        check_declared_inputs(&universe, &inputs)?;
    }

    let sinks = find_sinks(&universe);
    let sink = match sinks.as_slice() {
        [] => {
            // Every declaration has a dependent, so the predecessor relation
            // necessarily loops.
            return Err(cycle_error(&universe));
        }
        [single] => single.clone(),
        many => {
            let nodes = many
                .iter()
                .map(|decl| decl.read().display_name().to_string())
                .collect();
            return Err(GraphError::MultipleSinks { nodes });
        }
    };

    if let Some(path) = find_cycle(&universe) {
        return Err(GraphError::CycleDetected { path });
    }

    check_sink_type::<R>(&sink)?;

    let frozen = freeze(&sink, &mut HashMap::new());
    Ok(Graph {
        sink: frozen,
        inputs: inputs.into(),
        bindings: HashMap::new(),
        _out: PhantomData,
    })
}

impl DeclState {
    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    fn open_predecessors(&self) -> Vec<DeclRef> {
        let bindings = self.bindings.iter().filter_map(|binding| match binding {
            BuildBinding::Link(DeclLink::Open(decl)) => Some(decl.clone()),
            _ => None,
        });
        let after = self.after.iter().filter_map(|link| match link {
            DeclLink::Open(decl) => Some(decl.clone()),
            _ => None,
        });
        bindings.chain(after).collect()
    }
}

fn key_of(decl: &DeclRef) -> usize {
    Arc::as_ptr(decl) as *const () as usize
}

/// Every open declaration reachable from the registered ones, in a
/// deterministic breadth-first order starting at registration order.
fn reachable(decls: &[DeclRef]) -> Vec<DeclRef> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut ordered: Vec<DeclRef> = Vec::new();
    let mut queue: VecDeque<DeclRef> = decls.iter().cloned().collect();
    while let Some(decl) = queue.pop_front() {
        if !seen.insert(key_of(&decl)) {
            continue;
        }
        queue.extend(decl.read().open_predecessors());
        ordered.push(decl);
    }
    ordered
}

fn check_arity(universe: &[DeclRef]) -> Result<()> {
    for decl in universe {
        let state = decl.read();
        if state.node.arity != state.bindings.len() {
            return Err(GraphError::IncorrectArgumentCount {
                node: state.display_name().to_string(),
                expected: state.node.arity,
                actual: state.bindings.len(),
            });
        }
    }
    Ok(())
}

fn check_declared_inputs(universe: &[DeclRef], inputs: &[InputName]) -> Result<()> {
    let declared: HashSet<Uuid> = inputs.iter().map(|name| name.id).collect();
    let mut visited_frozen: HashSet<Uuid> = HashSet::new();
    for decl in universe {
        let state = decl.read();
        for binding in &state.bindings {
            match binding {
                BuildBinding::Input(name) if !declared.contains(&name.id) => {
                    return Err(GraphError::UndeclaredInput {
                        node: state.display_name().to_string(),
                        input: name.label.to_string(),
                    });
                }
                BuildBinding::Link(DeclLink::Frozen(frozen)) => {
                    check_frozen_inputs(frozen, &declared, &mut visited_frozen)?;
                }
                _ => {}
            }
        }
        for link in &state.after {
            if let DeclLink::Frozen(frozen) = link {
                check_frozen_inputs(frozen, &declared, &mut visited_frozen)?;
            }
        }
    }
    Ok(())
}

fn check_frozen_inputs(
    decl: &Arc<NodeDecl>,
    declared: &HashSet<Uuid>,
    visited: &mut HashSet<Uuid>,
) -> Result<()> {
    if !visited.insert(decl.id) {
        return Ok(());
    }
    for binding in &decl.bindings {
        match binding {
            Binding::Input(name) if !declared.contains(&name.id) => {
                return Err(GraphError::UndeclaredInput {
                    node: decl.display_name().to_string(),
                    input: name.label.to_string(),
                });
            }
            Binding::Node(dep) => check_frozen_inputs(dep, declared, visited)?,
            _ => {}
        }
    }
    for dep in &decl.after {
        check_frozen_inputs(dep, declared, visited)?;
    }
    Ok(())
}

/// Declarations no other declaration depends on, in declaration order.
fn find_sinks(universe: &[DeclRef]) -> Vec<DeclRef> {
    let mut referenced: HashSet<usize> = HashSet::new();
    for decl in universe {
        for pred in decl.read().open_predecessors() {
            referenced.insert(key_of(&pred));
        }
    }
    universe
        .iter()
        .filter(|decl| !referenced.contains(&key_of(decl)))
        .cloned()
        .collect()
}

fn cycle_error(universe: &[DeclRef]) -> GraphError {
    find_cycle(universe)
        .map(|path| GraphError::CycleDetected { path })
        .unwrap_or_else(|| GraphError::CycleDetected {
            path: "<unresolved>".to_string(),
        })
}

/// Depth-first search over the predecessor relation with in-stack coloring;
/// returns one representative cycle rendered as `a -> b -> a`.
fn find_cycle(universe: &[DeclRef]) -> Option<String> {
    #[derive(PartialEq)]
    enum Color {
        InStack,
        Done,
    }

    fn visit(
        decl: &DeclRef,
        colors: &mut HashMap<usize, Color>,
        stack: &mut Vec<(usize, String)>,
    ) -> Option<String> {
        let key = key_of(decl);
        match colors.get(&key) {
            Some(Color::Done) => return None,
            Some(Color::InStack) => {
                let start = stack.iter().position(|(k, _)| *k == key).unwrap_or(0);
                let mut names: Vec<&str> =
                    stack[start..].iter().map(|(_, name)| name.as_str()).collect();
                names.push(stack[start].1.as_str());
                return Some(names.join(" -> "));
            }
            None => {}
        }
        colors.insert(key, Color::InStack);
        let state = decl.read();
        stack.push((key, state.display_name().to_string()));
        let predecessors = state.open_predecessors();
        drop(state);
        for pred in &predecessors {
            if let Some(path) = visit(pred, colors, stack) {
                return Some(path);
            }
        }
        stack.pop();
        colors.insert(key, Color::Done);
        None
    }

    let mut colors = HashMap::new();
    let mut stack = Vec::new();
    for decl in universe {
        if let Some(path) = visit(decl, &mut colors, &mut stack) {
            return Some(path);
        }
    }
    None
}

fn check_sink_type<R: Value>(sink: &DeclRef) -> Result<()> {
    let state = sink.read();
    if state.node.output_type != TypeId::of::<R>() {
        return Err(GraphError::SinkTypeMismatch {
            node: state.display_name().to_string(),
            expected: std::any::type_name::<R>(),
            actual: state.node.output_type_name,
        });
    }
    Ok(())
}

fn freeze(decl: &DeclRef, memo: &mut HashMap<usize, Arc<NodeDecl>>) -> Arc<NodeDecl> {
    let key = key_of(decl);
    if let Some(found) = memo.get(&key) {
        return found.clone();
    }
    let state = decl.read();
    let bindings = state
        .bindings
        .iter()
        .map(|binding| match binding {
            BuildBinding::Link(link) => Binding::Node(freeze_link(link, memo)),
            BuildBinding::Input(name) => Binding::Input(name.clone()),
            BuildBinding::Constant(value) => Binding::Constant(value.clone()),
        })
        .collect();
    let after = state.after.iter().map(|link| freeze_link(link, memo)).collect();
    let frozen = Arc::new(NodeDecl {
        id: state.id,
        name: state.name.clone(),
        node: state.node.clone(),
        bindings,
        after,
        fallback: state.fallback.clone(),
    });
    memo.insert(key, frozen.clone());
    frozen
}

fn freeze_link(link: &DeclLink, memo: &mut HashMap<usize, Arc<NodeDecl>>) -> Arc<NodeDecl> {
    match link {
        DeclLink::Open(decl) => freeze(decl, memo),
        DeclLink::Frozen(decl) => decl.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{node0, node1, node2};

    fn hello() -> impl Node0<String> + 'static {
        node0(|| async { Ok("hello".to_string()) })
    }

    #[test]
    fn empty_builder_is_rejected() {
        let err = graph::<String>().build().unwrap_err();
        assert!(matches!(err, GraphError::EmptyGraph));
    }

    #[test]
    fn unbound_call_is_an_arity_mismatch() {
        let mut builder = graph::<String>();
        builder.call(
            call2(node2(|a: String, b: String| async move { Ok(a + &b) })).named("concat"),
        );
        let err = builder.build().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Incorrect argument count"));
        assert!(message.contains("concat"));
    }

    #[test]
    fn undeclared_input_is_rejected() {
        let who = Name::<String>::new("who");
        let mut builder = graph::<String>();
        builder.call(
            call1(node1(|name: String| async move { Ok(name) }))
                .with(&who)
                .named("greet"),
        );
        let err = builder.build().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("greet"));
        assert!(message.contains("who"));
    }

    #[test]
    fn multiple_sinks_are_listed_by_name() {
        let mut builder = graph::<String>();
        builder.call(call0(hello()).named("the first sink"));
        builder.call(call0(hello()));
        let err = builder.build().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Multiple sinks"));
        assert!(message.contains("the first sink"));
        assert!(message.contains("unnamed"));
    }

    #[test]
    fn cycle_is_reported_with_a_path() {
        let mut builder = graph::<String>();
        let n1 = builder.call(call0(hello()).named("n1"));
        let n2 = builder.call(
            call1(node1(|s: String| async move { Ok(s) }))
                .with(&n1)
                .named("n2"),
        );
        n1.after(&n2);
        let err = builder.build().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("cycle detected"));
        assert!(
            message.contains("n1 -> n2 -> n1") || message.contains("n2 -> n1 -> n2"),
            "unexpected cycle path: {message}"
        );
    }

    #[test]
    fn sink_type_must_match_the_declared_output() {
        let mut builder = graph::<String>();
        builder.call(call0(node0(|| async { Ok(7u32) })).named("seven"));
        let err = builder.build().unwrap_err();
        assert!(matches!(err, GraphError::SinkTypeMismatch { .. }));
        assert!(err.to_string().contains("seven"));
    }

    #[test]
    fn standalone_call_builds_without_a_builder() {
        let standalone = call0(hello()).named("hi").build().unwrap();
        assert_eq!(standalone.info().name(), "hi");
    }

    #[test]
    fn nested_graph_counts_as_a_dependency_not_a_sink() {
        let inner = call0(hello()).named("inner").build().unwrap();
        let mut builder = graph::<String>();
        builder.call(
            call1(node1(|s: String| async move { Ok(s) }))
                .with(&inner)
                .named("outer"),
        );
        let built = builder.build().unwrap();
        assert_eq!(built.info().name(), "outer");
        assert_eq!(built.info().args()[0].name(), "inner");
    }

    #[test]
    fn handles_registered_but_referenced_are_not_sinks() {
        let mut builder = graph::<String>();
        let first = builder.call(call0(hello()).named("first"));
        builder.call(
            call1(node1(|s: String| async move { Ok(s) }))
                .with(&first)
                .named("second"),
        );
        let built = builder.build().unwrap();
        assert_eq!(built.info().name(), "second");
    }
}
