//! Registered type schemas and property-to-column maps.
//!
//! The cache is filled once while building an [`Engine`](crate::Engine) and is
//! read-only afterwards, so concurrent requests share it without locking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::TypeSchema;
use crate::error::{Error, SqlError};

/// Property name to column name for one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    /// Keyed by lower-cased property name
    columns: HashMap<String, String>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, property: impl AsRef<str>, column: impl Into<String>) -> Self {
        self.columns
            .insert(property.as_ref().to_lowercase(), column.into());
        self
    }

    /// Case-insensitive column lookup.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.columns
            .get(&property.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<P: AsRef<str>, C: Into<String>> FromIterator<(P, C)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ColumnMap::new(), |map, (property, column)| map.column(property, column))
    }
}

/// Cache of registered schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    /// Type schemas by lower-cased type name
    schemas: HashMap<String, TypeSchema>,
    /// Column maps by lower-cased type name
    columns: HashMap<String, ColumnMap>,
}

impl SchemaCache {
    /// Creates an empty schema cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type schema. A type may only be registered once.
    pub fn register(&mut self, schema: TypeSchema) -> Result<(), Error> {
        let key = schema.name.to_lowercase();
        if self.schemas.contains_key(&key) {
            return Err(Error::Configuration(format!(
                "type registered twice: {}",
                schema.name
            )));
        }
        self.schemas.insert(key, schema);
        Ok(())
    }

    /// Registers the column map of an already registered type.
    pub fn register_columns(&mut self, type_name: &str, map: ColumnMap) -> Result<(), Error> {
        let key = type_name.to_lowercase();
        if !self.schemas.contains_key(&key) {
            return Err(Error::Configuration(format!(
                "column map for unregistered type: {}",
                type_name
            )));
        }
        if self.columns.contains_key(&key) {
            return Err(Error::Configuration(format!(
                "column map registered twice: {}",
                type_name
            )));
        }
        self.columns.insert(key, map);
        Ok(())
    }

    /// Checks that every object type referenced by a field is registered.
    pub fn validate(&self) -> Result<(), Error> {
        for schema in self.schemas.values() {
            for field in &schema.fields {
                for name in field.tag.referenced_objects() {
                    if !self.contains(name) {
                        return Err(Error::Configuration(format!(
                            "{}.{} references unregistered type {}",
                            schema.name, field.name, name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(&type_name.to_lowercase())
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeSchema> {
        self.schemas.get(&type_name.to_lowercase())
    }

    /// Schema of a root type. Using an unregistered type is a configuration
    /// error.
    pub fn schema(&self, type_name: &str) -> Result<&TypeSchema, Error> {
        self.get(type_name)
            .ok_or_else(|| Error::Configuration(format!("type not registered: {}", type_name)))
    }

    pub fn columns(&self, type_name: &str) -> Result<&ColumnMap, SqlError> {
        self.columns
            .get(&type_name.to_lowercase())
            .ok_or_else(|| SqlError::SchemaMapNotFound(type_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeTag;

    #[test]
    fn test_register_and_lookup() {
        let mut cache = SchemaCache::new();
        cache
            .register(TypeSchema::new("Parent").field("id", TypeTag::Number))
            .unwrap();

        assert!(cache.contains("parent"));
        assert_eq!(cache.schema("PARENT").unwrap().name, "Parent");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_register_twice_fails() {
        let mut cache = SchemaCache::new();
        cache.register(TypeSchema::new("Parent")).unwrap();
        let result = cache.register(TypeSchema::new("parent"));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_unregistered_type() {
        let cache = SchemaCache::new();
        assert!(matches!(cache.schema("Ghost"), Err(Error::Configuration(_))));
        assert_eq!(
            cache.columns("Ghost"),
            Err(SqlError::SchemaMapNotFound("Ghost".to_string()))
        );
    }

    #[test]
    fn test_columns_require_registered_type() {
        let mut cache = SchemaCache::new();
        let result = cache.register_columns("Parent", ColumnMap::new());
        assert!(matches!(result, Err(Error::Configuration(_))));

        cache.register(TypeSchema::new("Parent")).unwrap();
        cache
            .register_columns("Parent", ColumnMap::new().column("alphaId", "alpha_id"))
            .unwrap();
        assert_eq!(cache.columns("parent").unwrap().get("ALPHAID"), Some("alpha_id"));
        assert!(cache.register_columns("Parent", ColumnMap::new()).is_err());
    }

    #[test]
    fn test_validate_dangling_reference() {
        let mut cache = SchemaCache::new();
        cache
            .register(TypeSchema::new("Group").field("owner", TypeTag::object("Person")))
            .unwrap();
        assert!(cache.validate().is_err());

        cache.register(TypeSchema::new("Person")).unwrap();
        assert!(cache.validate().is_ok());
    }

    #[test]
    fn test_column_map_from_iter() {
        let map: ColumnMap = [("id", "id"), ("created", "created_dt")].into_iter().collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Created"), Some("created_dt"));
    }
}
