//! Export types for serializing metadata.
//!
//! These provide label-resolved snapshots of metadata records suitable for
//! JSON export, e.g. for documentation tooling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::meta::{MetaValue, MetadataStore};
use crate::object::ObjectModel;

/// One object's metadata with its label and kind resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataExport {
    /// Numeric object ID.
    pub id: u64,
    pub label: String,
    /// Object kind as displayed, e.g. `Module` or `Method/2`.
    pub kind: String,
    pub metadata: BTreeMap<String, MetaValue>,
}

impl MetadataStore {
    /// Snapshot every record whose object the model still contains, sorted
    /// by id. Records of released objects are skipped.
    pub fn export(&self, model: &dyn ObjectModel) -> Vec<MetadataExport> {
        self.objects()
            .into_iter()
            .filter_map(|id| {
                let kind = model.kind(id)?;
                let metadata = self.record(id)?;
                Some(MetadataExport {
                    id: id.get(),
                    label: model.label(id).unwrap_or_default(),
                    kind: kind.to_string(),
                    metadata,
                })
            })
            .collect()
    }
}

/// Render exports as pretty-printed JSON.
pub fn to_json(exports: &[MetadataExport]) -> Result<String, ExportError> {
    serde_json::to_string_pretty(exports).map_err(|e| ExportError::Serialization {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::StabilityLevel;
    use crate::object::{ObjectHeap, ObjectSpec};

    #[test]
    fn export_resolves_labels_and_skips_released() {
        let heap = ObjectHeap::new();
        let module = heap.create_module("time").unwrap();
        let clock = heap
            .create_object(ObjectSpec::new("clock").in_module(module))
            .unwrap();
        let gone = heap.create_object(ObjectSpec::new("gone")).unwrap();

        let store = MetadataStore::new();
        store.insert(clock, "documentation", "Wall time.".into());
        store.insert(gone, "documentation", "x".into());
        heap.release(gone);

        let exports = store.export(&heap);
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].id, clock.get());
        assert_eq!(exports[0].label, "clock");
        assert_eq!(exports[0].kind, "Object");
        assert_eq!(
            exports[0].metadata.get("documentation"),
            Some(&MetaValue::from("Wall time."))
        );
    }

    #[test]
    fn json_is_tagged_and_parses_back() {
        let heap = ObjectHeap::new();
        let clock = heap.create_object(ObjectSpec::new("clock")).unwrap();
        let store = MetadataStore::new();
        store.insert(clock, "stability", StabilityLevel::Locked.into());

        let json = to_json(&store.export(&heap)).unwrap();
        assert!(json.contains("\"stability\""));
        let back: Vec<MetadataExport> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store.export(&heap));
    }
}
