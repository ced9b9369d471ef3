// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # mirrorkit
//!
//! Capability-scoped structural reflection and out-of-band metadata for
//! prototype object graphs.
//!
//! ## Architecture
//!
//! - **Object model** (`object`): the `ObjectModel` trait plus `ObjectHeap`, a
//!   DashMap-backed prototype arena with pure refinement
//! - **Selectors** (`selector`): canonical message identities and the
//!   per-module `Context` that resolves names to them
//! - **Mirrors** (`mirror`): read-only structural views scoped by a context
//! - **Metadata** (`meta`): identity-keyed records and the `MetaMirror` façade
//! - **Decorators** (`decorators`): definition-time metadata writers
//!
//! ## Library usage
//!
//! ```no_run
//! use mirrorkit::config::EngineConfig;
//! use mirrorkit::decorators::doc;
//! use mirrorkit::engine::Engine;
//! use mirrorkit::object::ObjectSpec;
//! use mirrorkit::selector::{Context, Selector};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let module = engine.heap().create_module("geometry").unwrap();
//! let point = engine.heap().create_object(ObjectSpec::new("point").in_module(module)).unwrap();
//! engine.heap().define_method(point, "x", Selector::new("geometry", "x"), 0).unwrap();
//!
//! let context = Context::builder(module).bind("x", Selector::new("geometry", "x")).build();
//! engine.decorate(point, &context, &[doc("A 2D point.")]).unwrap();
//!
//! let mirror = engine.reflect(point, &context).unwrap();
//! assert!(mirror.responds_to("x"));
//! assert_eq!(mirror.meta().documentation().unwrap(), "A 2D point.");
//! ```

pub mod config;
pub mod decorators;
pub mod engine;
pub mod error;
pub mod export;
pub mod meta;
pub mod mirror;
pub mod object;
pub mod selector;
