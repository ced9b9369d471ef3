//! Object identity and the object-model contract.
//!
//! Every object, method, module, and primitive is identified by an
//! [`ObjectId`]. Identity is the only notion of sameness: two objects with
//! identical methods and metadata are still different objects.
//!
//! The [`ObjectModel`] trait is the read-only surface that mirrors compose
//! over. [`ObjectHeap`] is the in-crate implementation; hosts with their own
//! object model implement the trait instead.

pub mod heap;

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ReflectResult};
use crate::selector::Selector;

pub use heap::{ObjectHeap, ObjectSpec, Refinement};

/// Unique, niche-optimized handle for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ObjectId(NonZeroU64);

impl ObjectId {
    /// Create an `ObjectId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ObjectId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj:{}", self.0)
    }
}

/// What kind of object a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// An ordinary prototype object.
    Plain,
    /// A module: the scope objects are defined in and contexts resolve against.
    Module,
    /// A low-level primitive. Primitives never have a defining module.
    Primitive,
    /// A method. Methods are objects too, owned by the object defining them.
    Method {
        /// Number of arguments the method takes.
        arity: usize,
        /// Whether this is a placeholder a refinement must supply.
        required: bool,
    },
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Plain => write!(f, "Object"),
            ObjectKind::Module => write!(f, "Module"),
            ObjectKind::Primitive => write!(f, "Primitive"),
            ObjectKind::Method {
                arity,
                required: false,
            } => write!(f, "Method/{arity}"),
            ObjectKind::Method {
                arity,
                required: true,
            } => write!(f, "RequiredMethod/{arity}"),
        }
    }
}

/// Read-only view of a live object graph.
///
/// Every operation is total: it always returns a definite answer, with
/// absence reported through [`ReflectError`](crate::error::ReflectError)
/// rather than by panicking. Implementations must keep parent, owner, and
/// module edges acyclic.
pub trait ObjectModel {
    /// Whether the model currently holds this object.
    fn contains(&self, id: ObjectId) -> bool;

    /// The object's kind, or `None` for unknown ids.
    fn kind(&self, id: ObjectId) -> Option<ObjectKind>;

    /// A human-readable label, or `None` for unknown ids.
    fn label(&self, id: ObjectId) -> Option<String>;

    /// Own methods as `(name, method)` pairs, in definition order.
    fn own_methods(&self, id: ObjectId) -> Vec<(String, ObjectId)>;

    /// The method the object itself defines for `selector`. Never consults parents.
    fn method_for(&self, id: ObjectId, selector: &Selector) -> ReflectResult<ObjectId>;

    /// The object's immediate parent.
    fn parent(&self, id: ObjectId) -> ReflectResult<ObjectId>;

    /// The object's lexical owner.
    fn owner(&self, id: ObjectId) -> ReflectResult<ObjectId>;

    /// The module the object was defined in.
    fn defining_module(&self, id: ObjectId) -> ReflectResult<ObjectId>;

    fn is_module(&self, id: ObjectId) -> bool {
        matches!(self.kind(id), Some(ObjectKind::Module))
    }
}

/// Thread-safe object ID allocator producing monotonically increasing IDs from 1.
#[derive(Debug)]
pub struct AtomicObjectAllocator {
    next: AtomicU64,
}

impl AtomicObjectAllocator {
    /// Create a new allocator that starts from ID 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next object ID.
    ///
    /// Once the counter reaches `u64::MAX` every further call fails; ids are
    /// never reissued.
    pub fn next_id(&self) -> Result<ObjectId, EngineError> {
        let raw = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map_err(|_| EngineError::AllocatorExhausted)?;
        ObjectId::new(raw).ok_or(EngineError::AllocatorExhausted)
    }

    /// Return the next ID that *would* be allocated, without consuming it.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for AtomicObjectAllocator {
    fn default() -> Self {
        Self::new()
    }
}
