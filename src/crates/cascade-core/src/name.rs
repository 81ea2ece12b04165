//! Named input slots
//!
//! A [`Name`] is a typed slot for a value supplied from outside the graph at
//! run time, via [`Graph::bind`](crate::Graph::bind). Identity, not the
//! label, is what keys a slot: two names created with the same label are
//! distinct inputs, so independently-authored sub-graphs can never collide on
//! a label.
//!
//! # Examples
//!
//! ```rust
//! use cascade_core::Name;
//!
//! let who = Name::<String>::new("who");
//! assert_eq!(who.label(), "who");
//!
//! // Same label, different slot.
//! let other = Name::<String>::new("who");
//! let _ = other;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::value::Value;

/// A typed, externally-bindable input slot.
///
/// Declare the names a graph requires with
/// [`GraphBuilder::inputs`](crate::GraphBuilder::inputs), reference them in
/// argument position via `.with(&name)`, and supply values with
/// [`Graph::bind`](crate::Graph::bind) before running.
///
/// Cloning a `Name` preserves its identity: a clone refers to the same slot.
pub struct Name<T> {
    id: Uuid,
    label: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Value> Name<T> {
    /// Create a fresh input slot with the given human-readable label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into().into(),
            _marker: PhantomData,
        }
    }

    /// The human-readable label, used in diagnostics and visualization.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }
}

impl<T> Clone for Name<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: self.label.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Name<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Name").field("label", &self.label).finish()
    }
}

/// An erased view of a [`Name`], carrying only identity and label.
#[derive(Clone, Debug)]
pub struct InputName {
    pub(crate) id: Uuid,
    pub(crate) label: Arc<str>,
}

/// Object-safe erasure for [`Name`], so heterogeneously-typed names can be
/// declared together via [`GraphBuilder::inputs`](crate::GraphBuilder::inputs).
pub trait InputSlot {
    #[doc(hidden)]
    fn erased(&self) -> InputName;
}

impl<T: Value> InputSlot for Name<T> {
    fn erased(&self) -> InputName {
        InputName {
            id: self.id,
            label: self.label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_label_distinct_identity() {
        let a = Name::<String>::new("input");
        let b = Name::<String>::new("input");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn clone_preserves_identity() {
        let a = Name::<u32>::new("n");
        let b = a.clone();
        assert_eq!(a.id(), b.id());
    }
}
