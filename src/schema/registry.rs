use super::Schema;
use super::SchemaBuilder;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

/// Process-lifetime schema cache, keyed by table name.
///
/// Derivation runs exactly once per table; every later declaration of the
/// same table returns the cached schema untouched. The registry is passed
/// by reference wherever schemas are declared or looked up, never held in
/// global state.
#[derive(Default)]
pub struct Registry {
    schemas: Mutex<HashMap<String, Arc<Schema>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the builder's schema on first sight of its table, caches
    /// it, and returns the shared handle.
    pub fn declare(&self, builder: SchemaBuilder) -> Result<Arc<Schema>> {
        let mut schemas = self.schemas.lock().expect("registry lock");
        if let Some(schema) = schemas.get(builder.table()) {
            return Ok(Arc::clone(schema));
        }
        let schema = Arc::new(builder.build()?);
        schemas.insert(schema.table().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    pub fn lookup(&self, table: &str) -> Option<Arc<Schema>> {
        self.schemas
            .lock()
            .expect("registry lock")
            .get(table)
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn users() -> SchemaBuilder {
        Schema::builder("users")
            .field(Field::varchar("id", 50).primary_key())
            .field(Field::string("name"))
    }

    #[test]
    fn declaration_is_idempotent() {
        let registry = Registry::new();
        let first = registry.declare(users()).unwrap();
        let second = registry.declare(users()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn redeclaration_never_rederives() {
        let registry = Registry::new();
        let first = registry.declare(users()).unwrap();
        // A conflicting shape for the same table is ignored, not merged.
        let second = registry
            .declare(Schema::builder("users").field(Field::text("bio").primary_key()))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.primary_key(), "id");
    }

    #[test]
    fn lookup_finds_declared_tables() {
        let registry = Registry::new();
        registry.declare(users()).unwrap();
        assert!(registry.lookup("users").is_some());
        assert!(registry.lookup("orders").is_none());
    }
}
