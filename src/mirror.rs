//! Mirrors: read-only reflective views over live objects.
//!
//! A [`Mirror`] pairs an object with the [`Context`] its names resolve in.
//! It borrows a [`Reflection`], the explicit environment holding the object
//! model and the metadata store, so tests and tools can run against isolated
//! stores instead of hidden process-wide state.
//!
//! No mirror operation mutates the reflectee. Method lookup never walks the
//! parent chain; multi-level walks are explicit ([`Mirror::ancestors`]).

use crate::error::{ContractError, ContractResult, ReflectResult};
use crate::meta::{MetaKey, MetaMirror, MetadataStore};
use crate::object::{ObjectId, ObjectKind, ObjectModel};
use crate::selector::{Context, Selector};

/// The environment mirrors read from: an object model and a metadata store.
#[derive(Clone, Copy)]
pub struct Reflection<'w> {
    model: &'w dyn ObjectModel,
    store: &'w MetadataStore,
}

impl<'w> Reflection<'w> {
    pub fn new(model: &'w dyn ObjectModel, store: &'w MetadataStore) -> Self {
        Self { model, store }
    }

    pub fn model(&self) -> &'w dyn ObjectModel {
        self.model
    }

    pub fn store(&self) -> &'w MetadataStore {
        self.store
    }

    /// Pair `object` with `context`.
    ///
    /// Fails if the model does not know the object or the context is not
    /// scoped to a module; both indicate caller error, not missing data.
    pub fn reflect(&self, object: ObjectId, context: &Context) -> ContractResult<Mirror<'w>> {
        if !self.model.contains(object) {
            return Err(ContractError::UnknownObject {
                object: object.get(),
            });
        }
        if !self.model.is_module(context.module()) {
            return Err(ContractError::InvalidContext {
                module: context.module().get(),
            });
        }
        if self.store.warns_on_deprecated() {
            if let Some(reason) = self.store.get(object, MetaKey::Deprecated.as_str()) {
                let label = self.model.label(object).unwrap_or_default();
                tracing::warn!(
                    object = %object,
                    label = %label,
                    reason = reason.as_text().unwrap_or(""),
                    "reflecting deprecated object"
                );
            }
        }
        Ok(Mirror {
            reflection: *self,
            reflectee: object,
            context: context.clone(),
        })
    }
}

impl std::fmt::Debug for Reflection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reflection")
            .field("store", self.store)
            .finish_non_exhaustive()
    }
}

/// A reflective view of one object in one context.
///
/// Mirrors do not implement `PartialEq`; use
/// [`identical_to`](Mirror::identical_to) to compare reflectees.
#[derive(Clone)]
pub struct Mirror<'w> {
    reflection: Reflection<'w>,
    reflectee: ObjectId,
    context: Context,
}

impl<'w> Mirror<'w> {
    /// The reflected object.
    pub fn reflectee(&self) -> ObjectId {
        self.reflectee
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn reflection(&self) -> Reflection<'w> {
        self.reflection
    }

    /// Reflect another object in this mirror's context.
    pub fn reflect(&self, object: ObjectId) -> ContractResult<Mirror<'w>> {
        self.reflection.reflect(object, &self.context)
    }

    // Objects handed back by the model are live, and the context was
    // validated when this mirror was built.
    fn wrap(&self, object: ObjectId) -> Mirror<'w> {
        Mirror {
            reflection: self.reflection,
            reflectee: object,
            context: self.context.clone(),
        }
    }

    pub fn kind(&self) -> Option<ObjectKind> {
        self.reflection.model.kind(self.reflectee)
    }

    pub fn label(&self) -> Option<String> {
        self.reflection.model.label(self.reflectee)
    }

    /// Arity of a method reflectee; `None` for anything else.
    pub fn arity(&self) -> Option<usize> {
        match self.kind()? {
            ObjectKind::Method { arity, .. } => Some(arity),
            _ => None,
        }
    }

    /// Whether the reflectee is a required method placeholder.
    pub fn is_required(&self) -> bool {
        matches!(self.kind(), Some(ObjectKind::Method { required: true, .. }))
    }

    /// Own methods as `(name, mirror)` pairs, in the model's enumeration order.
    pub fn methods(&self) -> Vec<(String, Mirror<'w>)> {
        self.reflection
            .model
            .own_methods(self.reflectee)
            .into_iter()
            .map(|(name, method)| (name, self.wrap(method)))
            .collect()
    }

    pub fn selector_from_name(&self, name: &str) -> ReflectResult<Selector> {
        self.context.resolve(name)
    }

    /// Resolve `name` in the context, then look the selector up on the reflectee.
    ///
    /// The error names whichever stage failed.
    pub fn method_from_name(&self, name: &str) -> ReflectResult<Mirror<'w>> {
        let selector = self.selector_from_name(name)?;
        self.method_from_selector(&selector)
    }

    /// Look `selector` up on the reflectee itself, ignoring context and parents.
    pub fn method_from_selector(&self, selector: &Selector) -> ReflectResult<Mirror<'w>> {
        let method = self.reflection.model.method_for(self.reflectee, selector)?;
        Ok(self.wrap(method))
    }

    /// The immediate parent; exactly one level.
    pub fn parent(&self) -> ReflectResult<Mirror<'w>> {
        let parent = self.reflection.model.parent(self.reflectee)?;
        Ok(self.wrap(parent))
    }

    /// The lexical owner, chiefly meaningful for methods.
    pub fn belongs_to(&self) -> ReflectResult<Mirror<'w>> {
        let owner = self.reflection.model.owner(self.reflectee)?;
        Ok(self.wrap(owner))
    }

    /// The defining module. Primitives have none.
    pub fn at_module(&self) -> ReflectResult<Mirror<'w>> {
        let module = self.reflection.model.defining_module(self.reflectee)?;
        Ok(self.wrap(module))
    }

    pub fn responds_to(&self, name: &str) -> bool {
        self.method_from_name(name).is_ok()
    }

    /// Whether the reflectee is `other` by identity.
    pub fn identical_to(&self, other: ObjectId) -> bool {
        self.reflectee == other
    }

    pub fn meta(&self) -> MetaMirror<'w> {
        MetaMirror::new(self.clone())
    }

    /// Walk the parent chain, nearest first. Each step is one `parent()` call.
    pub fn ancestors(&self) -> Ancestors<'w> {
        Ancestors {
            next: self.parent().ok(),
        }
    }
}

impl std::fmt::Debug for Mirror<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("reflectee", &self.reflectee)
            .field("module", &self.context.module())
            .finish()
    }
}

/// Iterator over a mirror's ancestors. See [`Mirror::ancestors`].
pub struct Ancestors<'w> {
    next: Option<Mirror<'w>>,
}

impl<'w> Iterator for Ancestors<'w> {
    type Item = Mirror<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent().ok();
        Some(current)
    }
}
