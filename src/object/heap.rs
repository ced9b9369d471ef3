//! Arena-backed reference object model.
//!
//! Objects are records in a `DashMap` addressed by stable [`ObjectId`]
//! handles. Parents, owners, and modules are stored as handles to objects
//! that already exist when the edge is created, so the graph is acyclic by
//! construction. A parent may be shared by any number of children.
//!
//! Refinement never mutates a base: [`ObjectHeap::refine`] builds a new
//! identity whose method table is a superset of the base's.

use dashmap::DashMap;

use crate::error::{ContractError, MethodLookup, MirrorResult, ReflectError, ReflectResult};
use crate::selector::Selector;

use super::{AtomicObjectAllocator, ObjectId, ObjectKind, ObjectModel};

#[derive(Debug, Clone)]
struct MethodEntry {
    name: String,
    selector: Selector,
    method: ObjectId,
}

#[derive(Debug, Clone)]
struct ObjectRecord {
    label: String,
    kind: ObjectKind,
    parent: Option<ObjectId>,
    owner: Option<ObjectId>,
    module: Option<ObjectId>,
    methods: Vec<MethodEntry>,
}

impl ObjectRecord {
    fn new(label: String, kind: ObjectKind) -> Self {
        Self {
            label,
            kind,
            parent: None,
            owner: None,
            module: None,
            methods: Vec::new(),
        }
    }

    fn find(&self, selector: &Selector) -> Option<&MethodEntry> {
        self.methods.iter().find(|m| &m.selector == selector)
    }
}

/// Description of a plain object to create.
#[derive(Debug, Clone)]
pub struct ObjectSpec {
    label: String,
    parent: Option<ObjectId>,
    module: Option<ObjectId>,
}

impl ObjectSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            parent: None,
            module: None,
        }
    }

    /// Set the prototype parent.
    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Place the object in a module.
    pub fn in_module(mut self, module: ObjectId) -> Self {
        self.module = Some(module);
        self
    }
}

/// Concurrent arena of object records.
pub struct ObjectHeap {
    records: DashMap<ObjectId, ObjectRecord>,
    allocator: AtomicObjectAllocator,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            allocator: AtomicObjectAllocator::new(),
        }
    }

    /// Create a heap with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            allocator: AtomicObjectAllocator::new(),
        }
    }

    fn insert(&self, record: ObjectRecord) -> MirrorResult<ObjectId> {
        let id = self.allocator.next_id()?;
        self.records.insert(id, record);
        Ok(id)
    }

    fn require(&self, id: ObjectId) -> Result<(), ContractError> {
        if self.records.contains_key(&id) {
            Ok(())
        } else {
            Err(ContractError::UnknownObject { object: id.get() })
        }
    }

    fn require_module(&self, id: ObjectId) -> Result<(), ContractError> {
        match self.records.get(&id).map(|r| r.kind) {
            Some(ObjectKind::Module) => Ok(()),
            Some(_) => Err(ContractError::NotAModule { object: id.get() }),
            None => Err(ContractError::UnknownObject { object: id.get() }),
        }
    }

    /// Create a module object.
    pub fn create_module(&self, label: impl Into<String>) -> MirrorResult<ObjectId> {
        let id = self.insert(ObjectRecord::new(label.into(), ObjectKind::Module))?;
        tracing::debug!(module = %id, "created module");
        Ok(id)
    }

    /// Create a primitive. Primitives have no parent and no defining module.
    pub fn create_primitive(&self, label: impl Into<String>) -> MirrorResult<ObjectId> {
        self.insert(ObjectRecord::new(label.into(), ObjectKind::Primitive))
    }

    /// Create a plain object from a spec.
    ///
    /// The parent must exist and the module, if given, must be a module.
    pub fn create_object(&self, spec: ObjectSpec) -> MirrorResult<ObjectId> {
        if let Some(parent) = spec.parent {
            self.require(parent)?;
        }
        if let Some(module) = spec.module {
            self.require_module(module)?;
        }
        let mut record = ObjectRecord::new(spec.label, ObjectKind::Plain);
        record.parent = spec.parent;
        record.module = spec.module;
        self.insert(record)
    }

    /// Define a method on `object`.
    ///
    /// The method becomes an object of its own, owned by `object` and placed
    /// in the same module. Defining a selector twice is rejected.
    pub fn define_method(
        &self,
        object: ObjectId,
        name: impl Into<String>,
        selector: Selector,
        arity: usize,
    ) -> MirrorResult<ObjectId> {
        self.add_method(object, name.into(), selector, arity, false)
    }

    /// Declare a required method that a refinement must supply.
    pub fn require_method(
        &self,
        object: ObjectId,
        name: impl Into<String>,
        selector: Selector,
        arity: usize,
    ) -> MirrorResult<ObjectId> {
        self.add_method(object, name.into(), selector, arity, true)
    }

    fn method_record(&self, owner: ObjectId, name: &str, arity: usize, required: bool) -> Result<ObjectRecord, ContractError> {
        let module = self
            .records
            .get(&owner)
            .map(|r| r.module)
            .ok_or(ContractError::UnknownObject { object: owner.get() })?;
        let mut record = ObjectRecord::new(name.to_owned(), ObjectKind::Method { arity, required });
        record.owner = Some(owner);
        record.module = module;
        Ok(record)
    }

    fn add_method(
        &self,
        object: ObjectId,
        name: String,
        selector: Selector,
        arity: usize,
        required: bool,
    ) -> MirrorResult<ObjectId> {
        let record = self.method_record(object, &name, arity, required)?;
        let method = self.insert(record)?;

        // The method record is inserted before the owner is locked; a DashMap
        // guard must not be held across an insert into the same map.
        let duplicate = match self.records.get_mut(&object) {
            Some(mut owner) => {
                if owner.find(&selector).is_some() {
                    true
                } else {
                    owner.methods.push(MethodEntry {
                        name: name.clone(),
                        selector: selector.clone(),
                        method,
                    });
                    false
                }
            }
            None => {
                self.records.remove(&method);
                return Err(ContractError::UnknownObject { object: object.get() }.into());
            }
        };

        if duplicate {
            self.records.remove(&method);
            return Err(ContractError::DuplicateSelector {
                object: object.get(),
                selector: selector.to_string(),
            }
            .into());
        }

        tracing::debug!(object = %object, method = %method, %selector, required, "defined method");
        Ok(method)
    }

    /// Begin a refinement of `base`.
    pub fn refine(&self, base: ObjectId) -> MirrorResult<Refinement<'_>> {
        self.require(base)?;
        Ok(Refinement {
            heap: self,
            base,
            label: None,
            methods: Vec::new(),
        })
    }

    /// Check that no method of `object` is still a required placeholder.
    pub fn ensure_concrete(&self, object: ObjectId) -> Result<(), ContractError> {
        let entries = self
            .records
            .get(&object)
            .map(|r| r.methods.clone())
            .ok_or(ContractError::UnknownObject { object: object.get() })?;
        for entry in entries {
            if let Some(ObjectKind::Method { required: true, .. }) = self.kind(entry.method) {
                return Err(ContractError::RequiredUnimplemented {
                    object: object.get(),
                    selector: entry.selector.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Remove an object together with the methods it owns.
    ///
    /// An owned method that a refinement still lists in its table stays
    /// alive. Returns `false` if the object was not present.
    pub fn release(&self, object: ObjectId) -> bool {
        let Some((_, record)) = self.records.remove(&object) else {
            return false;
        };
        let mut released = 0usize;
        for entry in record.methods {
            let Some(owner) = self.records.get(&entry.method).and_then(|m| m.owner) else {
                continue;
            };
            // A shared method outlives its owner; the last table holding it frees it.
            let orphaned = owner == object || !self.records.contains_key(&owner);
            if orphaned && !self.is_referenced(entry.method) {
                self.records.remove(&entry.method);
                released += 1;
            }
        }
        tracing::debug!(object = %object, methods = released, "released object");
        true
    }

    /// Whether any live record's method table lists `method`.
    fn is_referenced(&self, method: ObjectId) -> bool {
        self.records
            .iter()
            .any(|r| r.value().methods.iter().any(|m| m.method == method))
    }

    /// Read an edge and drop it if its target has been released.
    fn live_edge(&self, id: ObjectId, edge: impl FnOnce(&ObjectRecord) -> Option<ObjectId>) -> Option<ObjectId> {
        // Copy the target out before probing, so no guard is held across lookups.
        let target = self.records.get(&id).and_then(|r| edge(r.value()))?;
        self.records.contains_key(&target).then_some(target)
    }

    /// Number of live objects, methods included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of live module objects.
    pub fn module_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.value().kind == ObjectKind::Module)
            .count()
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("count", &self.len())
            .field("next_id", &self.allocator.peek_next())
            .finish()
    }
}

impl ObjectModel for ObjectHeap {
    fn contains(&self, id: ObjectId) -> bool {
        self.records.contains_key(&id)
    }

    fn kind(&self, id: ObjectId) -> Option<ObjectKind> {
        self.records.get(&id).map(|r| r.kind)
    }

    fn label(&self, id: ObjectId) -> Option<String> {
        self.records.get(&id).map(|r| r.label.clone())
    }

    fn own_methods(&self, id: ObjectId) -> Vec<(String, ObjectId)> {
        self.records
            .get(&id)
            .map(|r| {
                r.methods
                    .iter()
                    .map(|m| (m.name.clone(), m.method))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn method_for(&self, id: ObjectId, selector: &Selector) -> ReflectResult<ObjectId> {
        self.records
            .get(&id)
            .and_then(|r| r.find(selector).map(|m| m.method))
            .ok_or_else(|| ReflectError::NoSuchMethod {
                lookup: MethodLookup::Selector(selector.clone()),
            })
    }

    fn parent(&self, id: ObjectId) -> ReflectResult<ObjectId> {
        self.live_edge(id, |r| r.parent)
            .ok_or(ReflectError::NoParent { object: id.get() })
    }

    fn owner(&self, id: ObjectId) -> ReflectResult<ObjectId> {
        self.live_edge(id, |r| r.owner)
            .ok_or(ReflectError::Free { object: id.get() })
    }

    fn defining_module(&self, id: ObjectId) -> ReflectResult<ObjectId> {
        self.live_edge(id, |r| r.module)
            .ok_or(ReflectError::NoModule { object: id.get() })
    }
}

/// Builder for a refined object. See [`ObjectHeap::refine`].
#[derive(Debug)]
pub struct Refinement<'h> {
    heap: &'h ObjectHeap,
    base: ObjectId,
    label: Option<String>,
    methods: Vec<(String, Selector, usize)>,
}

impl<'h> Refinement<'h> {
    /// Label for the refined object. Defaults to the base's label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a method, or override the base's method for the same selector.
    ///
    /// Naming a selector again replaces the earlier call in place.
    pub fn method(mut self, name: impl Into<String>, selector: Selector, arity: usize) -> Self {
        let name = name.into();
        match self.methods.iter_mut().find(|(_, s, _)| *s == selector) {
            Some(slot) => *slot = (name, selector, arity),
            None => self.methods.push((name, selector, arity)),
        }
        self
    }

    /// Create the refined object.
    ///
    /// It shares the base's parent and module, keeps every base entry (in
    /// order, overrides replaced in place), and appends new selectors. The
    /// base is left untouched.
    pub fn finish(self) -> MirrorResult<ObjectId> {
        let base = self
            .heap
            .records
            .get(&self.base)
            .map(|r| r.value().clone())
            .ok_or(ContractError::UnknownObject {
                object: self.base.get(),
            })?;

        let mut record = ObjectRecord::new(self.label.unwrap_or_else(|| base.label.clone()), base.kind);
        record.parent = base.parent;
        record.owner = base.owner;
        record.module = base.module;
        record.methods = base.methods;
        let refined = self.heap.insert(record)?;

        let mut entries = Vec::with_capacity(self.methods.len());
        for (name, selector, arity) in self.methods {
            let method = self.heap.insert(self.heap.method_record(refined, &name, arity, false)?)?;
            entries.push(MethodEntry {
                name,
                selector,
                method,
            });
        }

        if let Some(mut record) = self.heap.records.get_mut(&refined) {
            for entry in entries {
                match record.methods.iter_mut().find(|m| m.selector == entry.selector) {
                    Some(slot) => *slot = entry,
                    None => record.methods.push(entry),
                }
            }
        }

        tracing::debug!(base = %self.base, refined = %refined, "refined object");
        Ok(refined)
    }

    /// Like [`finish`](Self::finish), but rejects the result if any required
    /// method is still unimplemented. The rejected object is released.
    pub fn finish_concrete(self) -> MirrorResult<ObjectId> {
        let heap = self.heap;
        let refined = self.finish()?;
        if let Err(e) = heap.ensure_concrete(refined) {
            heap.release(refined);
            return Err(e.into());
        }
        Ok(refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;

    fn sel(name: &str) -> Selector {
        Selector::new("test", name)
    }

    #[test]
    fn create_object_in_module_with_parent() {
        let heap = ObjectHeap::new();
        let module = heap.create_module("test").unwrap();
        let base = heap.create_object(ObjectSpec::new("base").in_module(module)).unwrap();
        let child = heap
            .create_object(ObjectSpec::new("child").with_parent(base).in_module(module))
            .unwrap();

        assert_eq!(heap.parent(child).unwrap(), base);
        assert_eq!(heap.defining_module(child).unwrap(), module);
        assert!(heap.parent(base).is_err());
        assert_eq!(heap.label(child).as_deref(), Some("child"));
    }

    #[test]
    fn module_must_be_a_module() {
        let heap = ObjectHeap::new();
        let plain = heap.create_object(ObjectSpec::new("plain")).unwrap();
        let err = heap
            .create_object(ObjectSpec::new("x").in_module(plain))
            .unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Contract(ContractError::NotAModule { .. })
        ));
    }

    #[test]
    fn unknown_parent_rejected() {
        let heap = ObjectHeap::new();
        let ghost = ObjectId::new(999).unwrap();
        let err = heap
            .create_object(ObjectSpec::new("x").with_parent(ghost))
            .unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Contract(ContractError::UnknownObject { object: 999 })
        ));
    }

    #[test]
    fn methods_are_owned_objects_in_definition_order() {
        let heap = ObjectHeap::new();
        let module = heap.create_module("test").unwrap();
        let obj = heap.create_object(ObjectSpec::new("obj").in_module(module)).unwrap();
        let b = heap.define_method(obj, "b", sel("b"), 0).unwrap();
        let a = heap.define_method(obj, "a", sel("a"), 1).unwrap();

        let names: Vec<_> = heap.own_methods(obj).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(heap.owner(a).unwrap(), obj);
        assert_eq!(heap.defining_module(b).unwrap(), module);
        assert_eq!(
            heap.kind(a),
            Some(ObjectKind::Method {
                arity: 1,
                required: false
            })
        );
    }

    #[test]
    fn duplicate_selector_rejected_without_leaking() {
        let heap = ObjectHeap::new();
        let obj = heap.create_object(ObjectSpec::new("obj")).unwrap();
        heap.define_method(obj, "a", sel("a"), 0).unwrap();
        let before = heap.len();
        let err = heap.define_method(obj, "a2", sel("a"), 0).unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Contract(ContractError::DuplicateSelector { .. })
        ));
        assert_eq!(heap.len(), before);
    }

    #[test]
    fn method_lookup_ignores_parents() {
        let heap = ObjectHeap::new();
        let base = heap.create_object(ObjectSpec::new("base")).unwrap();
        heap.define_method(base, "a", sel("a"), 0).unwrap();
        let child = heap.create_object(ObjectSpec::new("child").with_parent(base)).unwrap();

        assert!(heap.method_for(base, &sel("a")).is_ok());
        assert_eq!(
            heap.method_for(child, &sel("a")).unwrap_err(),
            ReflectError::NoSuchMethod {
                lookup: MethodLookup::Selector(sel("a"))
            }
        );
    }

    #[test]
    fn refinement_is_a_superset_and_leaves_base_alone() {
        let heap = ObjectHeap::new();
        let module = heap.create_module("test").unwrap();
        let base = heap.create_object(ObjectSpec::new("base").in_module(module)).unwrap();
        let a = heap.define_method(base, "a", sel("a"), 0).unwrap();
        heap.define_method(base, "b", sel("b"), 0).unwrap();

        let refined = heap
            .refine(base)
            .unwrap()
            .method("b", sel("b"), 1)
            .method("c", sel("c"), 0)
            .finish()
            .unwrap();

        assert_ne!(refined, base);
        let names: Vec<_> = heap.own_methods(refined).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(heap.method_for(refined, &sel("a")).unwrap(), a);
        assert_ne!(
            heap.method_for(refined, &sel("b")).unwrap(),
            heap.method_for(base, &sel("b")).unwrap()
        );
        assert_eq!(heap.own_methods(base).len(), 2);
        assert_eq!(heap.defining_module(refined).unwrap(), module);
    }

    #[test]
    fn finish_concrete_rejects_required_methods() {
        let heap = ObjectHeap::new();
        let shape = heap.create_object(ObjectSpec::new("shape")).unwrap();
        heap.require_method(shape, "area", sel("area"), 0).unwrap();
        assert!(heap.ensure_concrete(shape).is_err());

        let before = heap.len();
        let err = heap.refine(shape).unwrap().finish_concrete().unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Contract(ContractError::RequiredUnimplemented { .. })
        ));
        assert_eq!(heap.len(), before);

        let square = heap
            .refine(shape)
            .unwrap()
            .label("square")
            .method("area", sel("area"), 0)
            .finish_concrete()
            .unwrap();
        assert!(heap.ensure_concrete(square).is_ok());
    }

    #[test]
    fn release_drops_owned_methods_only() {
        let heap = ObjectHeap::new();
        let base = heap.create_object(ObjectSpec::new("base")).unwrap();
        let a = heap.define_method(base, "a", sel("a"), 0).unwrap();
        let refined = heap
            .refine(base)
            .unwrap()
            .method("b", sel("b"), 0)
            .finish()
            .unwrap();
        let b = heap.method_for(refined, &sel("b")).unwrap();

        assert!(heap.release(refined));
        assert!(!heap.contains(refined));
        assert!(!heap.contains(b));
        assert!(heap.contains(a));
        assert!(!heap.release(refined));
    }

    #[test]
    fn releasing_base_keeps_methods_its_refinement_lists() {
        let heap = ObjectHeap::new();
        let module = heap.create_module("test").unwrap();
        let base = heap.create_object(ObjectSpec::new("base").in_module(module)).unwrap();
        let a = heap.define_method(base, "a", sel("a"), 0).unwrap();
        let refined = heap.refine(base).unwrap().finish().unwrap();

        assert!(heap.release(base));
        assert!(heap.contains(a));
        assert_eq!(heap.method_for(refined, &sel("a")).unwrap(), a);
        assert_eq!(heap.kind(a), Some(ObjectKind::Method { arity: 0, required: false }));
        // The owner is gone, so the method reads as free.
        assert!(matches!(heap.owner(a), Err(ReflectError::Free { .. })));

        assert!(heap.release(refined));
        assert!(!heap.contains(a));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn released_parent_reads_as_absent() {
        let heap = ObjectHeap::new();
        let base = heap.create_object(ObjectSpec::new("base")).unwrap();
        let child = heap.create_object(ObjectSpec::new("child").with_parent(base)).unwrap();
        heap.release(base);
        assert!(matches!(heap.parent(child), Err(ReflectError::NoParent { .. })));
    }

    #[test]
    fn repeated_refinement_selector_replaces_without_leaking() {
        let heap = ObjectHeap::new();
        let base = heap.create_object(ObjectSpec::new("base")).unwrap();
        let before = heap.len();
        let refined = heap
            .refine(base)
            .unwrap()
            .method("x", sel("x"), 0)
            .method("x2", sel("x"), 2)
            .finish()
            .unwrap();

        assert_eq!(heap.len(), before + 2);
        let methods = heap.own_methods(refined);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].0, "x2");
        assert_eq!(heap.kind(methods[0].1), Some(ObjectKind::Method { arity: 2, required: false }));

        heap.release(refined);
        assert_eq!(heap.len(), before);
    }

    #[test]
    fn concurrent_definitions() {
        use std::sync::Arc;
        let heap = Arc::new(ObjectHeap::new());
        let obj = heap.create_object(ObjectSpec::new("obj")).unwrap();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let heap = Arc::clone(&heap);
                std::thread::spawn(move || {
                    heap.define_method(obj, format!("m{i}"), sel(&format!("m{i}")), 0)
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(heap.own_methods(obj).len(), 16);
    }
}
