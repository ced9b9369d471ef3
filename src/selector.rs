//! Selectors and resolution contexts.
//!
//! A [`Selector`] is the canonical identity of a message. Method lookup by
//! selector is direct and unambiguous. A [`Context`] is the per-module table
//! that turns the names a programmer writes into selectors; two modules may
//! map the same name to different selectors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MethodLookup, ReflectError, ReflectResult};
use crate::object::ObjectId;

/// Canonical message identity, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Selector {
    namespace: String,
    name: String,
}

impl Selector {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The namespace (usually the declaring module's name).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ContextTable {
    module: ObjectId,
    names: BTreeMap<String, Selector>,
}

/// Immutable name → selector table scoped to a module.
///
/// Cloning is cheap (the table is shared). Contexts compare by value: same
/// module and same bindings.
#[derive(Debug, Clone)]
pub struct Context {
    table: Arc<ContextTable>,
}

impl Context {
    /// Start building a context for the given module.
    pub fn builder(module: ObjectId) -> ContextBuilder {
        ContextBuilder {
            module,
            names: BTreeMap::new(),
        }
    }

    /// A context for `module` that resolves no names.
    pub fn empty(module: ObjectId) -> Self {
        Self::builder(module).build()
    }

    /// The module this context is scoped to.
    pub fn module(&self) -> ObjectId {
        self.table.module
    }

    /// Resolve a name to its selector in this scope.
    pub fn resolve(&self, name: &str) -> ReflectResult<Selector> {
        self.table
            .names
            .get(name)
            .cloned()
            .ok_or_else(|| ReflectError::NoSuchMethod {
                lookup: MethodLookup::Name(name.to_owned()),
            })
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.names.is_empty()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table) || self.table == other.table
    }
}

impl Eq for Context {}

/// Builder for [`Context`].
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    module: ObjectId,
    names: BTreeMap<String, Selector>,
}

impl ContextBuilder {
    /// Bind `name` to `selector`. A later binding for the same name replaces the earlier one.
    pub fn bind(mut self, name: impl Into<String>, selector: Selector) -> Self {
        self.names.insert(name.into(), selector);
        self
    }

    pub fn build(self) -> Context {
        Context {
            table: Arc::new(ContextTable {
                module: self.module,
                names: self.names,
            }),
        }
    }
}
