//! Out-of-band metadata: documentation, stability, provenance, examples.
//!
//! Metadata lives in a [`MetadataStore`] keyed by object identity, entirely
//! separate from behavior. [`MetaMirror`] is the typed façade consumers use;
//! it validates well-known keys on write and applies the one-hop
//! owner → module fallback for provenance keys on read.

pub mod keys;
pub mod mirror;
pub mod store;
pub mod value;

pub use keys::{MetaKey, Shape};
pub use mirror::MetaMirror;
pub use store::{MetadataRecord, MetadataStore};
pub use value::{MetaValue, SeeAlso, SourceLocation, StabilityLevel};
