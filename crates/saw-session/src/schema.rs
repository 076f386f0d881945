//! Per-session cache of field catalogs and key-field sets.
//!
//! Catalogs are fetched with `GetFieldList` the first time an object type is
//! referenced and never refreshed: the engine's schema does not change while
//! a session is alive. Cached entries are shared through `Arc`; callers that
//! want to mutate one ask for a copy instead.

use crate::classify::{call, Payload};
use saw_core::{FieldCatalog, KeyFieldSet, ObjectType, SawError, SawResult, Variant};
use saw_transport::{SimAutoFunction, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SchemaCache {
    catalogs: HashMap<ObjectType, Arc<FieldCatalog>>,
    keys: HashMap<ObjectType, Arc<KeyFieldSet>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field catalog for `object_type`, fetching it on first use.
    pub fn field_catalog(
        &mut self,
        transport: &mut dyn Transport,
        object_type: &ObjectType,
    ) -> SawResult<Arc<FieldCatalog>> {
        if let Some(catalog) = self.catalogs.get(object_type) {
            return Ok(Arc::clone(catalog));
        }

        let payload = call(
            transport,
            SimAutoFunction::GetFieldList,
            &[Variant::from(object_type.as_str())],
        )?;
        let payload = match payload {
            Payload::Value(v) => v,
            Payload::Many(items) => Variant::Array(items),
            Payload::None | Payload::Count(_) => {
                return Err(SawError::RemoteOperation(format!(
                    "GetFieldList returned no fields for '{object_type}'"
                )))
            }
        };
        let catalog = Arc::new(FieldCatalog::from_payload(object_type.clone(), &payload)?);
        debug!(%object_type, fields = catalog.len(), "cached field catalog");
        self.catalogs
            .insert(object_type.clone(), Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Key-field set for `object_type`, derived from its catalog on first use.
    pub fn key_fields(
        &mut self,
        transport: &mut dyn Transport,
        object_type: &ObjectType,
    ) -> SawResult<Arc<KeyFieldSet>> {
        if let Some(keys) = self.keys.get(object_type) {
            return Ok(Arc::clone(keys));
        }
        let catalog = self.field_catalog(transport, object_type)?;
        let keys = Arc::new(KeyFieldSet::derive(&catalog)?);
        debug!(%object_type, keys = ?keys.names(), "cached key fields");
        self.keys.insert(object_type.clone(), Arc::clone(&keys));
        Ok(keys)
    }

    /// Fetch both catalog and key fields so later calls never hit the engine.
    pub fn prewarm(
        &mut self,
        transport: &mut dyn Transport,
        object_type: &ObjectType,
    ) -> SawResult<()> {
        self.key_fields(transport, object_type).map(|_| ())
    }

    pub fn is_cached(&self, object_type: &ObjectType) -> bool {
        self.catalogs.contains_key(object_type)
    }

    /// Object types with a cached catalog, sorted.
    pub fn cached_types(&self) -> Vec<&ObjectType> {
        let mut types: Vec<_> = self.catalogs.keys().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saw_transport::{FieldSpec, MemoryCase, MemoryEngine, ObjectData};

    fn engine_with(fields: Vec<FieldSpec>) -> MemoryEngine {
        MemoryEngine::with_open_case(
            MemoryCase::new().with_object("gen", ObjectData::new(fields)),
            "gens.pwb",
        )
    }

    #[test]
    fn catalog_is_fetched_once_per_type() {
        let mut engine = engine_with(vec![
            FieldSpec::new("BusNum", "Integer").key("*1*"),
            FieldSpec::new("GenID", "String").key("*2*"),
            FieldSpec::new("GenMW", "Real"),
        ]);
        let mut cache = SchemaCache::new();
        let gen = ObjectType::new("GEN");

        let first = cache.field_catalog(&mut engine, &gen).unwrap();
        let again = cache.field_catalog(&mut engine, &ObjectType::new("gen")).unwrap();
        let keys = cache.key_fields(&mut engine, &gen).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(keys.names(), vec!["BusNum", "GenID"]);
        assert_eq!(engine.calls_to(SimAutoFunction::GetFieldList), 1);
        assert_eq!(cache.cached_types(), vec![&gen]);
    }

    #[test]
    fn key_gap_is_an_invariant_failure() {
        let mut engine = engine_with(vec![
            FieldSpec::new("BusNum", "Integer").key("*1*"),
            FieldSpec::new("GenID", "String").key("*3*"),
        ]);
        let mut cache = SchemaCache::new();
        let err = cache
            .key_fields(&mut engine, &ObjectType::new("gen"))
            .unwrap_err();
        assert!(matches!(err, SawError::InvariantFailure(_)));
    }

    #[test]
    fn unknown_type_is_a_remote_error_and_not_cached() {
        let mut engine = engine_with(vec![FieldSpec::new("BusNum", "Integer").key("*1*")]);
        let mut cache = SchemaCache::new();
        let widget = ObjectType::new("widget");
        assert!(matches!(
            cache.field_catalog(&mut engine, &widget),
            Err(SawError::RemoteOperation(_))
        ));
        assert!(!cache.is_cached(&widget));
    }
}
