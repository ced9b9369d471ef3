//! Engine facade: top-level API for mirrorkit.
//!
//! The `Engine` owns an object heap and its metadata store, and hands out
//! [`Reflection`] environments that borrow both. Consumers that bring their
//! own [`ObjectModel`](crate::object::ObjectModel) can skip the engine and
//! build a `Reflection` directly.

use crate::config::EngineConfig;
use crate::decorators::Decorator;
use crate::error::{ContractResult, MirrorResult};
use crate::meta::MetadataStore;
use crate::mirror::{Mirror, Reflection};
use crate::object::{ObjectHeap, ObjectId};
use crate::selector::Context;

/// An object heap paired with its metadata store.
pub struct Engine {
    config: EngineConfig,
    heap: ObjectHeap,
    store: MetadataStore,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> MirrorResult<Self> {
        tracing::info!(
            metadata = config.metadata_enabled,
            warn_on_deprecated = config.warn_on_deprecated,
            capacity = config.capacity_hint,
            "initializing mirror engine"
        );
        Ok(Self {
            heap: ObjectHeap::with_capacity(config.capacity_hint),
            store: MetadataStore::with_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// A reflection environment over this engine's heap and store.
    pub fn reflection(&self) -> Reflection<'_> {
        Reflection::new(&self.heap, &self.store)
    }

    pub fn reflect(&self, object: ObjectId, context: &Context) -> ContractResult<Mirror<'_>> {
        self.reflection().reflect(object, context)
    }

    pub fn decorate(
        &self,
        object: ObjectId,
        context: &Context,
        decorators: &[Decorator],
    ) -> ContractResult<ObjectId> {
        self.reflection().decorate(object, context, decorators)
    }

    /// Release an object and drop its metadata record.
    ///
    /// Records of methods released alongside it are removed by the next
    /// [`sweep`](Self::sweep).
    pub fn release(&self, object: ObjectId) -> bool {
        let released = self.heap.release(object);
        if released {
            self.store.evict(object);
        }
        released
    }

    /// Drop metadata for every object the heap no longer holds.
    pub fn sweep(&self) -> usize {
        self.store.sweep(&self.heap)
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            object_count: self.heap.len(),
            module_count: self.heap.module_count(),
            annotated_objects: self.store.len(),
            metadata_enabled: self.store.is_enabled(),
        }
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub object_count: usize,
    pub module_count: usize,
    pub annotated_objects: usize,
    pub metadata_enabled: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "mirror engine info")?;
        writeln!(f, "  objects:      {}", self.object_count)?;
        writeln!(f, "  modules:      {}", self.module_count)?;
        writeln!(f, "  annotated:    {}", self.annotated_objects)?;
        writeln!(f, "  metadata:     {}", self.metadata_enabled)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("heap", &self.heap)
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorators::doc;
    use crate::error::ContractError;
    use crate::object::ObjectSpec;
    use crate::selector::Selector;

    #[test]
    fn create_default_engine() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let info = engine.info();
        assert_eq!(info.object_count, 0);
        assert_eq!(info.annotated_objects, 0);
        assert!(info.metadata_enabled);
        assert!(info.to_string().contains("objects:      0"));
    }

    #[test]
    fn decorate_and_read_back_through_engine() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let module = engine.heap().create_module("io").unwrap();
        let file = engine
            .heap()
            .create_object(ObjectSpec::new("file").in_module(module))
            .unwrap();
        let context = Context::empty(module);

        engine.decorate(file, &context, &[doc("A file handle.")]).unwrap();
        let meta = engine.reflect(file, &context).unwrap().meta();
        assert_eq!(meta.documentation().unwrap(), "A file handle.");

        let info = engine.info();
        assert_eq!(info.object_count, 2);
        assert_eq!(info.module_count, 1);
        assert_eq!(info.annotated_objects, 1);
    }

    #[test]
    fn reflect_rejects_unknown_object() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let module = engine.heap().create_module("io").unwrap();
        let bogus = ObjectId::new(999).unwrap();
        let err = engine.reflect(bogus, &Context::empty(module)).unwrap_err();
        assert_eq!(err, ContractError::UnknownObject { object: 999 });
    }

    #[test]
    fn release_evicts_metadata_and_sweep_cleans_methods() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let module = engine.heap().create_module("io").unwrap();
        let file = engine
            .heap()
            .create_object(ObjectSpec::new("file").in_module(module))
            .unwrap();
        let read = engine
            .heap()
            .define_method(file, "read", Selector::new("io", "read"), 1)
            .unwrap();
        let context = Context::empty(module);
        engine.decorate(file, &context, &[doc("A file.")]).unwrap();
        engine.decorate(read, &context, &[doc("Reads.")]).unwrap();

        assert!(engine.release(file));
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.sweep(), 1);
        assert!(engine.store().is_empty());
        assert!(!engine.release(file));
    }

    #[test]
    fn refinement_keeps_shared_methods_after_base_release() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let module = engine.heap().create_module("io").unwrap();
        let base = engine
            .heap()
            .create_object(ObjectSpec::new("stream").in_module(module))
            .unwrap();
        engine
            .heap()
            .define_method(base, "read", Selector::new("io", "read"), 1)
            .unwrap();
        let buffered = engine.heap().refine(base).unwrap().label("buffered").finish().unwrap();
        let context = Context::builder(module)
            .bind("read", Selector::new("io", "read"))
            .build();

        assert!(engine.release(base));
        let mirror = engine.reflect(buffered, &context).unwrap();
        assert!(mirror.responds_to("read"));
        let read = mirror.method_from_name("read").unwrap();
        assert!(engine.reflect(read.reflectee(), &context).is_ok());
        assert_eq!(read.arity(), Some(1));
    }

    #[test]
    fn disabled_metadata_from_config() {
        let engine = Engine::new(EngineConfig {
            metadata_enabled: false,
            ..Default::default()
        })
        .unwrap();
        let module = engine.heap().create_module("io").unwrap();
        let context = Context::empty(module);
        engine.decorate(module, &context, &[doc("ignored")]).unwrap();
        assert!(engine.reflect(module, &context).unwrap().meta().documentation().is_err());
        assert!(!engine.info().metadata_enabled);
    }
}
