//! Value bounds and the type-erased value carrier
//!
//! Every value that flows along a graph edge satisfies the [`Value`] bound:
//! it can be cloned into each consumer, moved across tasks, and rendered into
//! diagnostics. Inside the engine values travel type-erased as [`AnyValue`];
//! the typed builder surface guarantees that every downcast at a node
//! boundary succeeds.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Blanket bound for values produced and consumed by graph nodes.
///
/// Automatically implemented for every type that is
/// `Debug + Clone + Send + Sync + 'static`. `Debug` is what lets execution
/// errors include the string form of argument values; `Clone` is what lets a
/// node output fan out to several consumers.
///
/// # Examples
///
/// ```rust
/// use cascade_core::Value;
///
/// fn assert_value<T: Value>() {}
///
/// assert_value::<String>();
/// assert_value::<Vec<u64>>();
/// assert_value::<Option<(bool, i32)>>();
/// ```
pub trait Value: fmt::Debug + Clone + Send + Sync + 'static {}

impl<T> Value for T where T: fmt::Debug + Clone + Send + Sync + 'static {}

/// A type-erased graph value.
///
/// Wraps the concrete value in an `Arc` together with its `Debug` rendering,
/// captured at construction time. The rendering is what appears in
/// [`GraphExecutionError`](crate::GraphExecutionError) messages and
/// [`CallInfo`](crate::CallInfo) snapshots; the `Arc` is what makes cloning a
/// value into every dependent cheap.
#[derive(Clone)]
pub struct AnyValue {
    inner: Arc<dyn Any + Send + Sync>,
    repr: Arc<str>,
}

impl AnyValue {
    pub(crate) fn new<T: Value>(value: T) -> Self {
        let repr = format!("{value:?}").into();
        Self {
            inner: Arc::new(value),
            repr,
        }
    }

    /// Borrow the contained value as `T`, if that is what it holds.
    pub fn downcast_ref<T: Value>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the contained value out as `T`, if that is what it holds.
    pub(crate) fn downcast<T: Value>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl fmt::Display for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_debug_form() {
        let value = AnyValue::new("hello".to_string());
        assert_eq!(value.to_string(), "\"hello\"");
        assert_eq!(format!("{value:?}"), "\"hello\"");
    }

    #[test]
    fn downcasts_to_the_original_type() {
        let value = AnyValue::new(42u64);
        assert_eq!(value.downcast_ref::<u64>(), Some(&42));
        assert_eq!(value.downcast::<u64>(), Some(42));
        assert!(value.downcast_ref::<i64>().is_none());
    }

    #[test]
    fn clones_share_the_payload() {
        let value = AnyValue::new(vec![1, 2, 3]);
        let copy = value.clone();
        assert_eq!(copy.downcast::<Vec<i32>>(), Some(vec![1, 2, 3]));
    }
}
