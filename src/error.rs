//! Rich diagnostic error types for mirrorkit.
//!
//! Errors fall into two classes that callers must be able to tell apart:
//!
//! - **Absence** ([`ReflectError`], [`MetaError`]): the object simply does not
//!   have the requested method, edge, or metadata key. These are ordinary,
//!   non-fatal outcomes that callers branch on.
//! - **Contract violations** ([`ContractError`]): the caller handed the layer
//!   something it must never receive (a value of the wrong shape for a
//!   well-known key, an unknown object, a context scoped to a non-module).
//!
//! Every subsystem error rolls up into [`MirrorError`], preserving its
//! diagnostic code and help text.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::selector::Selector;

/// Top-level error type for mirrorkit.
#[derive(Debug, Error, Diagnostic)]
pub enum MirrorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Reflect(#[from] ReflectError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

/// Which stage of a method lookup failed.
///
/// A name that the context cannot resolve fails as [`MethodLookup::Name`]; a
/// resolved selector that the object does not define fails as
/// [`MethodLookup::Selector`], never under the original name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodLookup {
    Name(String),
    Selector(Selector),
}

impl fmt::Display for MethodLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodLookup::Name(name) => write!(f, "name \"{name}\""),
            MethodLookup::Selector(selector) => write!(f, "selector {selector}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reflection errors (absence)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ReflectError {
    #[error("no such method: {lookup}")]
    #[diagnostic(
        code(mirror::reflect::no_such_method),
        help(
            "Names resolve through the mirror's context; selectors are looked up \
             directly on the reflectee. Parents are never searched, so walk \
             `parent()` yourself if an inherited method should count."
        )
    )]
    NoSuchMethod { lookup: MethodLookup },

    #[error("object {object} has no parent")]
    #[diagnostic(
        code(mirror::reflect::no_parent),
        help("The object sits at the root of its prototype chain.")
    )]
    NoParent { object: u64 },

    #[error("object {object} is free: it has no lexical owner")]
    #[diagnostic(
        code(mirror::reflect::free),
        help("Only objects defined inside another object (typically methods) have an owner.")
    )]
    Free { object: u64 },

    #[error("object {object} has no defining module")]
    #[diagnostic(
        code(mirror::reflect::no_module),
        help("Primitives and modules themselves are not defined inside a module.")
    )]
    NoModule { object: u64 },
}

// ---------------------------------------------------------------------------
// Metadata errors (absence)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MetaError {
    #[error("metadata key not found: {key}")]
    #[diagnostic(
        code(mirror::meta::not_found),
        help(
            "The key has not been set on this object. Only authors, licence, \
             platforms, repository, portability and stability fall back to the \
             owner and the defining module."
        )
    )]
    NotFound { key: String },

    #[error("metadata key {key} does not hold a {expected} value")]
    #[diagnostic(
        code(mirror::meta::shape_mismatch),
        help("A typed accessor was used on a key whose stored value has a different shape.")
    )]
    ShapeMismatch { key: String, expected: &'static str },
}

// ---------------------------------------------------------------------------
// Contract violations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ContractError {
    #[error("invalid value for metadata key {key}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(mirror::contract::invalid_shape),
        help(
            "Well-known keys have fixed shapes: tags, authors and platforms take \
             lists of text, examples take a list, see-also takes a list of \
             references, stability takes a stability level, source takes a \
             source location, everything else takes text."
        )
    )]
    InvalidShape {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("context is scoped to {module}, which is not a module")]
    #[diagnostic(
        code(mirror::contract::invalid_context),
        help("Build the context with the id of a module object known to the model.")
    )]
    InvalidContext { module: u64 },

    #[error("unknown object: {object}")]
    #[diagnostic(
        code(mirror::contract::unknown_object),
        help("The object model does not contain this id. It may have been released.")
    )]
    UnknownObject { object: u64 },

    #[error("object {object} is not a module")]
    #[diagnostic(
        code(mirror::contract::not_a_module),
        help("Objects can only be placed inside module objects. Create one with `create_module`.")
    )]
    NotAModule { object: u64 },

    #[error("object {object} already defines selector {selector}")]
    #[diagnostic(
        code(mirror::contract::duplicate_selector),
        help("Use a refinement to override an existing method without mutating the base.")
    )]
    DuplicateSelector { object: u64, selector: String },

    #[error("object {object} leaves required method {selector} unimplemented")]
    #[diagnostic(
        code(mirror::contract::required_unimplemented),
        help("Supply the method in a refinement before using the object concretely.")
    )]
    RequiredUnimplemented { object: u64, selector: String },
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("serialization error: {message}")]
    #[diagnostic(
        code(mirror::export::serde),
        help("Failed to serialize the metadata export. This indicates a bug in a value type.")
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("object allocator exhausted: cannot allocate more than u64::MAX objects")]
    #[diagnostic(
        code(mirror::engine::exhausted),
        help(
            "The object id space is exhausted. This requires 2^64 allocations; \
             check for allocation loops."
        )
    )]
    AllocatorExhausted,
}

/// Convenience alias for functions returning mirrorkit results.
pub type MirrorResult<T> = std::result::Result<T, MirrorError>;

/// Result of a structural reflection query.
pub type ReflectResult<T> = std::result::Result<T, ReflectError>;

/// Result of a metadata read.
pub type MetaResult<T> = std::result::Result<T, MetaError>;

/// Result of an operation that can only fail through caller error.
pub type ContractResult<T> = std::result::Result<T, ContractError>;
