//! The closed set of well-known metadata keys and their value shapes.
//!
//! Any string can be used as a custom key; custom keys accept any value.
//! A well-known key only accepts values of its [`Shape`], checked on write.

use crate::error::{ContractError, ContractResult};

use super::value::MetaValue;

/// Well-known metadata keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaKey {
    Name,
    Category,
    Tags,
    Documentation,
    Examples,
    Complexity,
    Source,
    Authors,
    Licence,
    Since,
    Platforms,
    Repository,
    SeeAlso,
    Stability,
    Portability,
    Deprecated,
}

impl MetaKey {
    pub const ALL: [MetaKey; 16] = [
        MetaKey::Name,
        MetaKey::Category,
        MetaKey::Tags,
        MetaKey::Documentation,
        MetaKey::Examples,
        MetaKey::Complexity,
        MetaKey::Source,
        MetaKey::Authors,
        MetaKey::Licence,
        MetaKey::Since,
        MetaKey::Platforms,
        MetaKey::Repository,
        MetaKey::SeeAlso,
        MetaKey::Stability,
        MetaKey::Portability,
        MetaKey::Deprecated,
    ];

    /// The record key this variant is stored under.
    pub fn as_str(self) -> &'static str {
        match self {
            MetaKey::Name => "name",
            MetaKey::Category => "category",
            MetaKey::Tags => "tags",
            MetaKey::Documentation => "documentation",
            MetaKey::Examples => "examples",
            MetaKey::Complexity => "complexity",
            MetaKey::Source => "source",
            MetaKey::Authors => "authors",
            MetaKey::Licence => "licence",
            MetaKey::Since => "since",
            MetaKey::Platforms => "platforms",
            MetaKey::Repository => "repository",
            MetaKey::SeeAlso => "see-also",
            MetaKey::Stability => "stability",
            MetaKey::Portability => "portability",
            MetaKey::Deprecated => "deprecated",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Whether reads fall back to the owner and then the defining module.
    ///
    /// Only provenance-style keys inherit. Documentation, tags, and category
    /// describe one definition and never leak from its container.
    pub fn inherits(self) -> bool {
        matches!(
            self,
            MetaKey::Authors
                | MetaKey::Licence
                | MetaKey::Platforms
                | MetaKey::Repository
                | MetaKey::Portability
                | MetaKey::Stability
        )
    }

    pub fn shape(self) -> Shape {
        match self {
            MetaKey::Tags | MetaKey::Authors | MetaKey::Platforms => Shape::TextList,
            MetaKey::Examples => Shape::List,
            MetaKey::SeeAlso => Shape::SeeAlsoList,
            MetaKey::Stability => Shape::Stability,
            MetaKey::Source => Shape::Source,
            MetaKey::Name
            | MetaKey::Category
            | MetaKey::Documentation
            | MetaKey::Complexity
            | MetaKey::Licence
            | MetaKey::Since
            | MetaKey::Repository
            | MetaKey::Portability
            | MetaKey::Deprecated => Shape::Text,
        }
    }
}

impl std::fmt::Display for MetaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape a well-known key's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Text,
    TextList,
    List,
    SeeAlsoList,
    Stability,
    Source,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::Text => "text",
            Shape::TextList => "list of text",
            Shape::List => "list",
            Shape::SeeAlsoList => "list of see-also references",
            Shape::Stability => "stability level",
            Shape::Source => "source location",
        }
    }

    pub fn admits(self, value: &MetaValue) -> bool {
        match (self, value) {
            (Shape::Text, MetaValue::Text(_)) => true,
            (Shape::TextList, MetaValue::List(items)) => {
                items.iter().all(|v| matches!(v, MetaValue::Text(_)))
            }
            (Shape::List, MetaValue::List(_)) => true,
            (Shape::SeeAlsoList, MetaValue::List(items)) => {
                items.iter().all(|v| matches!(v, MetaValue::SeeAlso(_)))
            }
            (Shape::Stability, MetaValue::Stability(_)) => true,
            (Shape::Source, MetaValue::Source(_)) => true,
            _ => false,
        }
    }
}

/// Check `value` against the shape of `key`, if `key` is well-known.
pub fn validate(key: &str, value: &MetaValue) -> ContractResult<()> {
    let Some(known) = MetaKey::from_key(key) else {
        return Ok(());
    };
    let shape = known.shape();
    if shape.admits(value) {
        Ok(())
    } else {
        Err(ContractError::InvalidShape {
            key: key.to_owned(),
            expected: shape.name(),
            actual: value.shape_name(),
        })
    }
}
