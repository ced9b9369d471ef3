//! Definition-time decorators.
//!
//! A [`Decorator`] writes one metadata key and hands back the object it was
//! applied to, unchanged: decoration is not refinement and never creates a
//! new identity. Decorators targeting different keys commute. For the same
//! key the last write wins, except [`Decorator::Example`] and
//! [`Decorator::SeeAlso`], which always accumulate.

use crate::error::ContractResult;
use crate::meta::{MetaKey, MetaMirror, MetaValue, SeeAlso, SourceLocation, StabilityLevel};
use crate::mirror::Reflection;
use crate::object::ObjectId;
use crate::selector::Context;

#[derive(Debug, Clone, PartialEq)]
pub enum Decorator {
    Name(String),
    Category(String),
    Tags(Vec<String>),
    Documentation(String),
    Example(MetaValue),
    Complexity(String),
    Source(SourceLocation),
    Authors(Vec<String>),
    Licence(String),
    Since(String),
    Platforms(Vec<String>),
    Repository(String),
    SeeAlso(SeeAlso),
    Stability(StabilityLevel),
    Portability(String),
    /// Sets the deprecation reason and forces stability to `Deprecated`.
    Deprecated(String),
    /// Any other key. Well-known keys are still shape-checked.
    Custom { key: String, value: MetaValue },
}

impl Decorator {
    /// The record key this decorator writes.
    pub fn key(&self) -> &str {
        match self {
            Decorator::Name(_) => MetaKey::Name.as_str(),
            Decorator::Category(_) => MetaKey::Category.as_str(),
            Decorator::Tags(_) => MetaKey::Tags.as_str(),
            Decorator::Documentation(_) => MetaKey::Documentation.as_str(),
            Decorator::Example(_) => MetaKey::Examples.as_str(),
            Decorator::Complexity(_) => MetaKey::Complexity.as_str(),
            Decorator::Source(_) => MetaKey::Source.as_str(),
            Decorator::Authors(_) => MetaKey::Authors.as_str(),
            Decorator::Licence(_) => MetaKey::Licence.as_str(),
            Decorator::Since(_) => MetaKey::Since.as_str(),
            Decorator::Platforms(_) => MetaKey::Platforms.as_str(),
            Decorator::Repository(_) => MetaKey::Repository.as_str(),
            Decorator::SeeAlso(_) => MetaKey::SeeAlso.as_str(),
            Decorator::Stability(_) => MetaKey::Stability.as_str(),
            Decorator::Portability(_) => MetaKey::Portability.as_str(),
            Decorator::Deprecated(_) => MetaKey::Deprecated.as_str(),
            Decorator::Custom { key, .. } => key,
        }
    }

    /// Write this decorator's key and return the decorated object.
    pub fn apply(&self, meta: &MetaMirror<'_>) -> ContractResult<ObjectId> {
        match self {
            Decorator::Name(v) => meta.set_name(v.as_str()),
            Decorator::Category(v) => meta.set_category(v.as_str()),
            Decorator::Tags(v) => meta.set_tags(v.iter().map(String::as_str)),
            Decorator::Documentation(v) => meta.set_documentation(v.as_str()),
            Decorator::Example(v) => meta.add_example(v.clone()),
            Decorator::Complexity(v) => meta.set_complexity(v.as_str()),
            Decorator::Source(v) => meta.set_source(v.clone()),
            Decorator::Authors(v) => meta.set_authors(v.iter().map(String::as_str)),
            Decorator::Licence(v) => meta.set_licence(v.as_str()),
            Decorator::Since(v) => meta.set_since(v.as_str()),
            Decorator::Platforms(v) => meta.set_platforms(v.iter().map(String::as_str)),
            Decorator::Repository(v) => meta.set_repository(v.as_str()),
            Decorator::SeeAlso(v) => meta.add_see_also(v.clone()),
            Decorator::Stability(v) => meta.set_stability(*v),
            Decorator::Portability(v) => meta.set_portability(v.as_str()),
            Decorator::Deprecated(v) => meta.deprecate(v.as_str()),
            Decorator::Custom { key, value } => meta.set(key, value.clone())?,
        };
        Ok(meta.reflectee())
    }
}

pub fn doc(text: impl Into<String>) -> Decorator {
    Decorator::Documentation(text.into())
}

pub fn example(value: impl Into<MetaValue>) -> Decorator {
    Decorator::Example(value.into())
}

pub fn see_also(reference: ObjectId, reason: impl Into<String>) -> Decorator {
    Decorator::SeeAlso(SeeAlso::new(reference, reason))
}

pub fn deprecated(reason: impl Into<String>) -> Decorator {
    Decorator::Deprecated(reason.into())
}

pub fn stability(level: StabilityLevel) -> Decorator {
    Decorator::Stability(level)
}

pub fn tags<I, S>(tags: I) -> Decorator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Decorator::Tags(tags.into_iter().map(Into::into).collect())
}

pub fn custom(key: impl Into<String>, value: impl Into<MetaValue>) -> Decorator {
    Decorator::Custom {
        key: key.into(),
        value: value.into(),
    }
}

impl<'w> Reflection<'w> {
    /// Apply `decorators` to `object` in order and return `object`.
    ///
    /// Stops at the first contract violation; earlier decorators stay applied.
    pub fn decorate(
        &self,
        object: ObjectId,
        context: &Context,
        decorators: &[Decorator],
    ) -> ContractResult<ObjectId> {
        let meta = self.reflect(object, context)?.meta();
        for decorator in decorators {
            decorator.apply(&meta)?;
        }
        Ok(object)
    }
}
