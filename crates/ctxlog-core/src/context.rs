//! Immutable request-scoped context values.
//!
//! A [`Context`] is an append-only chain of typed slots. Deriving a child
//! never touches the parent, so one context can be shared freely between
//! threads and call chains.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Key type for one context slot.
///
/// The key is the implementing type itself. Keeping the type private to a
/// module reserves the slot for that module.
pub trait ContextKey: 'static {
    type Value: Send + Sync + 'static;
}

/// Immutable chain of request-scoped values.
#[derive(Clone, Default)]
pub struct Context {
    node: Option<Arc<Node>>,
}

struct Node {
    parent: Context,
    key: TypeId,
    value: Box<dyn Any + Send + Sync>,
}

impl Context {
    /// The empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child holding `value` in the `K` slot.
    ///
    /// A value already held by `self` in that slot is shadowed, not replaced.
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Self {
        Self {
            node: Some(Arc::new(Node {
                parent: self.clone(),
                key: TypeId::of::<K>(),
                value: Box::new(value),
            })),
        }
    }

    /// Nearest value stored in the `K` slot.
    pub fn value<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        let mut current = self;
        while let Some(node) = &current.node {
            if node.key == key {
                return node.value.downcast_ref::<K::Value>();
            }
            current = &node.parent;
        }
        None
    }

    /// Number of values in the chain, shadowed ones included.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(node) = &current.node {
            depth += 1;
            current = &node.parent;
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("depth", &self.depth()).finish()
    }
}
