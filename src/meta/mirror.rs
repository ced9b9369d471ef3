//! MetaMirror: typed façade over an object's metadata record.

use crate::error::{ContractResult, MetaError, MetaResult};
use crate::mirror::Mirror;
use crate::object::ObjectId;

use super::keys::{self, MetaKey};
use super::store::{MetadataRecord, MetadataStore};
use super::value::{MetaValue, SeeAlso, SourceLocation, StabilityLevel};

/// Metadata view derived from a [`Mirror`].
///
/// Every operation acts on the record keyed by the mirror's reflectee.
/// Reads are partial: a missing key is [`MetaError::NotFound`], never a
/// default value. Provenance keys (see [`MetaKey::inherits`]) fall back to
/// [`inherited`](MetaMirror::inherited) when the object has no own value.
#[derive(Clone)]
pub struct MetaMirror<'w> {
    mirror: Mirror<'w>,
}

impl<'w> MetaMirror<'w> {
    pub fn new(mirror: Mirror<'w>) -> Self {
        Self { mirror }
    }

    pub fn mirror(&self) -> &Mirror<'w> {
        &self.mirror
    }

    pub fn reflectee(&self) -> ObjectId {
        self.mirror.reflectee()
    }

    fn store(&self) -> &'w MetadataStore {
        self.mirror.reflection().store()
    }

    /// The object's own value for `key`.
    pub fn get(&self, key: &str) -> MetaResult<MetaValue> {
        self.store()
            .get(self.reflectee(), key)
            .ok_or_else(|| MetaError::NotFound {
                key: key.to_owned(),
            })
    }

    pub fn has(&self, key: &str) -> bool {
        self.store().contains(self.reflectee(), key)
    }

    /// Set `key`, replacing any previous value.
    ///
    /// Well-known keys are checked against their shape; a mismatch is a
    /// contract violation and nothing is written.
    pub fn set(&self, key: &str, value: impl Into<MetaValue>) -> ContractResult<&Self> {
        let value = value.into();
        keys::validate(key, &value)?;
        tracing::debug!(object = %self.reflectee(), key, "metadata write");
        self.store().insert(self.reflectee(), key, value);
        Ok(self)
    }

    pub fn remove(&self, key: &str) -> MetaResult<MetaValue> {
        self.store()
            .remove(self.reflectee(), key)
            .ok_or_else(|| MetaError::NotFound {
                key: key.to_owned(),
            })
    }

    /// Own keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.store().keys(self.reflectee())
    }

    /// Snapshot of the own record; empty if nothing was ever written.
    pub fn record(&self) -> MetadataRecord {
        self.store().record(self.reflectee()).unwrap_or_default()
    }

    /// The owner's value for `key`, else the defining module's, else `NotFound`.
    ///
    /// Exactly one owner hop, then one module hop from the reflectee. Neither
    /// hop consults any further fallback.
    pub fn inherited(&self, key: &str) -> MetaResult<MetaValue> {
        if let Ok(owner) = self.mirror.belongs_to() {
            if let Ok(value) = owner.meta().get(key) {
                return Ok(value);
            }
        }
        if let Ok(module) = self.mirror.at_module() {
            if let Ok(value) = module.meta().get(key) {
                return Ok(value);
            }
        }
        Err(MetaError::NotFound {
            key: key.to_owned(),
        })
    }

    fn lookup(&self, key: MetaKey) -> MetaResult<MetaValue> {
        let own = self.get(key.as_str());
        if key.inherits() {
            own.or_else(|_| self.inherited(key.as_str()))
        } else {
            own
        }
    }

    fn mismatch(key: MetaKey) -> MetaError {
        MetaError::ShapeMismatch {
            key: key.as_str().to_owned(),
            expected: key.shape().name(),
        }
    }

    fn text(&self, key: MetaKey) -> MetaResult<String> {
        match self.lookup(key)? {
            MetaValue::Text(s) => Ok(s),
            _ => Err(Self::mismatch(key)),
        }
    }

    fn list(&self, key: MetaKey) -> MetaResult<Vec<MetaValue>> {
        match self.lookup(key)? {
            MetaValue::List(items) => Ok(items),
            _ => Err(Self::mismatch(key)),
        }
    }

    fn text_list(&self, key: MetaKey) -> MetaResult<Vec<String>> {
        self.list(key)?
            .into_iter()
            .map(|v| match v {
                MetaValue::Text(s) => Ok(s),
                _ => Err(Self::mismatch(key)),
            })
            .collect()
    }

    fn put(&self, key: MetaKey, value: MetaValue) -> &Self {
        debug_assert!(key.shape().admits(&value));
        tracing::debug!(object = %self.reflectee(), key = key.as_str(), "metadata write");
        self.store().insert(self.reflectee(), key.as_str(), value);
        self
    }

    fn append(&self, key: MetaKey, value: MetaValue) -> &Self {
        tracing::debug!(object = %self.reflectee(), key = key.as_str(), "metadata append");
        self.store().modify(self.reflectee(), |record| {
            let slot = record
                .entry(key.as_str().to_owned())
                .or_insert_with(|| MetaValue::List(Vec::new()));
            match slot {
                MetaValue::List(items) => items.push(value),
                other => *other = MetaValue::List(vec![value]),
            }
        });
        self
    }

    // -----------------------------------------------------------------------
    // Own-record keys
    // -----------------------------------------------------------------------

    pub fn name(&self) -> MetaResult<String> {
        self.text(MetaKey::Name)
    }

    pub fn set_name(&self, name: impl Into<String>) -> &Self {
        self.put(MetaKey::Name, MetaValue::Text(name.into()))
    }

    pub fn category(&self) -> MetaResult<String> {
        self.text(MetaKey::Category)
    }

    pub fn set_category(&self, category: impl Into<String>) -> &Self {
        self.put(MetaKey::Category, MetaValue::Text(category.into()))
    }

    pub fn tags(&self) -> MetaResult<Vec<String>> {
        self.text_list(MetaKey::Tags)
    }

    pub fn set_tags<I, S>(&self, tags: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.put(MetaKey::Tags, MetaValue::text_list(tags))
    }

    pub fn documentation(&self) -> MetaResult<String> {
        self.text(MetaKey::Documentation)
    }

    pub fn set_documentation(&self, text: impl Into<String>) -> &Self {
        self.put(MetaKey::Documentation, MetaValue::Text(text.into()))
    }

    /// Examples in the order they were added.
    pub fn examples(&self) -> MetaResult<Vec<MetaValue>> {
        self.list(MetaKey::Examples)
    }

    /// Append an example. Repeated calls accumulate.
    pub fn add_example(&self, example: impl Into<MetaValue>) -> &Self {
        self.append(MetaKey::Examples, example.into())
    }

    pub fn complexity(&self) -> MetaResult<String> {
        self.text(MetaKey::Complexity)
    }

    pub fn set_complexity(&self, complexity: impl Into<String>) -> &Self {
        self.put(MetaKey::Complexity, MetaValue::Text(complexity.into()))
    }

    pub fn source(&self) -> MetaResult<SourceLocation> {
        match self.lookup(MetaKey::Source)? {
            MetaValue::Source(loc) => Ok(loc),
            _ => Err(Self::mismatch(MetaKey::Source)),
        }
    }

    pub fn set_source(&self, source: SourceLocation) -> &Self {
        self.put(MetaKey::Source, MetaValue::Source(source))
    }

    pub fn since(&self) -> MetaResult<String> {
        self.text(MetaKey::Since)
    }

    pub fn set_since(&self, version: impl Into<String>) -> &Self {
        self.put(MetaKey::Since, MetaValue::Text(version.into()))
    }

    /// Cross-references in the order they were added.
    pub fn see_also(&self) -> MetaResult<Vec<SeeAlso>> {
        self.list(MetaKey::SeeAlso)?
            .into_iter()
            .map(|v| match v {
                MetaValue::SeeAlso(see) => Ok(see),
                _ => Err(Self::mismatch(MetaKey::SeeAlso)),
            })
            .collect()
    }

    /// Append a cross-reference. Repeated calls accumulate.
    pub fn add_see_also(&self, see: SeeAlso) -> &Self {
        self.append(MetaKey::SeeAlso, MetaValue::SeeAlso(see))
    }

    /// The deprecation reason.
    pub fn deprecated(&self) -> MetaResult<String> {
        self.text(MetaKey::Deprecated)
    }

    /// Record a deprecation reason and force stability to `Deprecated`.
    ///
    /// Both keys are written under one lock.
    pub fn deprecate(&self, reason: impl Into<String>) -> &Self {
        let reason = reason.into();
        tracing::debug!(object = %self.reflectee(), reason = %reason, "deprecating");
        self.store().modify(self.reflectee(), |record| {
            record.insert(MetaKey::Deprecated.as_str().to_owned(), MetaValue::Text(reason));
            record.insert(
                MetaKey::Stability.as_str().to_owned(),
                MetaValue::Stability(StabilityLevel::Deprecated),
            );
        });
        self
    }

    // -----------------------------------------------------------------------
    // Provenance keys (fall back to owner, then module)
    // -----------------------------------------------------------------------

    pub fn authors(&self) -> MetaResult<Vec<String>> {
        self.text_list(MetaKey::Authors)
    }

    pub fn set_authors<I, S>(&self, authors: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.put(MetaKey::Authors, MetaValue::text_list(authors))
    }

    pub fn licence(&self) -> MetaResult<String> {
        self.text(MetaKey::Licence)
    }

    pub fn set_licence(&self, licence: impl Into<String>) -> &Self {
        self.put(MetaKey::Licence, MetaValue::Text(licence.into()))
    }

    pub fn platforms(&self) -> MetaResult<Vec<String>> {
        self.text_list(MetaKey::Platforms)
    }

    pub fn set_platforms<I, S>(&self, platforms: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.put(MetaKey::Platforms, MetaValue::text_list(platforms))
    }

    pub fn repository(&self) -> MetaResult<String> {
        self.text(MetaKey::Repository)
    }

    pub fn set_repository(&self, url: impl Into<String>) -> &Self {
        self.put(MetaKey::Repository, MetaValue::Text(url.into()))
    }

    pub fn portability(&self) -> MetaResult<String> {
        self.text(MetaKey::Portability)
    }

    pub fn set_portability(&self, portability: impl Into<String>) -> &Self {
        self.put(MetaKey::Portability, MetaValue::Text(portability.into()))
    }

    pub fn stability(&self) -> MetaResult<StabilityLevel> {
        self.lookup(MetaKey::Stability)?
            .as_stability()
            .ok_or_else(|| Self::mismatch(MetaKey::Stability))
    }

    pub fn set_stability(&self, level: StabilityLevel) -> &Self {
        self.put(MetaKey::Stability, MetaValue::Stability(level))
    }

    // -----------------------------------------------------------------------
    // Merging
    // -----------------------------------------------------------------------

    /// Copy every key `other` has and this object lacks. This object wins
    /// on conflict, so applying it twice changes nothing the second time.
    ///
    /// Returns the number of keys copied.
    pub fn inherit_from(&self, other: &MetaMirror<'_>) -> usize {
        let source = other.record();
        if source.is_empty() || self.identical(other) {
            return 0;
        }
        let copied = self
            .store()
            .modify(self.reflectee(), |record| {
                let mut copied = 0;
                for (key, value) in source {
                    if !record.contains_key(&key) {
                        record.insert(key, value);
                        copied += 1;
                    }
                }
                copied
            })
            .unwrap_or(0);
        tracing::debug!(object = %self.reflectee(), from = %other.reflectee(), copied, "inherited metadata");
        copied
    }

    fn identical(&self, other: &MetaMirror<'_>) -> bool {
        self.mirror.identical_to(other.reflectee()) && std::ptr::eq(self.store(), other.store())
    }
}

impl std::fmt::Debug for MetaMirror<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaMirror")
            .field("reflectee", &self.reflectee())
            .field("keys", &self.keys())
            .finish()
    }
}
