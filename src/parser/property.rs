use super::common::split_path;
use crate::ast::{PropertyInfo, TypeSchema, TypeTag};
use crate::coerce;
use crate::error::ParseError;
use crate::schema_cache::SchemaCache;

/// Walks key paths through registered schemas.
///
/// Resolution is a pure function of the path and the schemas, so resolving
/// the same path twice yields identical [`PropertyInfo`]s.
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'a> {
    schemas: &'a SchemaCache,
    /// Longest-first
    delimiters: &'a [&'a str],
    default_delimiter: &'a str,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(schemas: &'a SchemaCache, delimiters: &'a [&'a str], default_delimiter: &'a str) -> Self {
        Self {
            schemas,
            delimiters,
            default_delimiter,
        }
    }

    /// Resolves `path` against `root`.
    ///
    /// Declared fields are matched case-insensitively. Segments below a map
    /// must convert to the map's key type, and segments inside a blob are
    /// free-form, lower-cased keys. Once a segment crosses a map or blob, it
    /// and all its descendants are traversal properties.
    ///
    /// # Errors
    ///
    /// `InvalidPropertyName` when a segment is not declared and no map was
    /// crossed, when a map key has the wrong type, or when a scalar field is
    /// followed by more segments.
    pub fn resolve(&self, root: &TypeSchema, path: &str) -> Result<PropertyInfo, ParseError> {
        let segments = split_path(path, self.delimiters);
        if segments.is_empty() {
            return Err(ParseError::property(path, "empty property name"));
        }

        let mut history: Vec<PropertyInfo> = Vec::with_capacity(segments.len());
        let mut context = TypeTag::object(root.name.clone());
        let mut crossed_map = false;
        let mut traversal = false;
        let mut extension = false;

        for segment in segments {
            let (key, tag, is_map_entry, is_flattened, enters_blob) =
                match context.underlying() {
                    TypeTag::Object(type_name) => {
                        let schema = self.schemas.get(type_name).ok_or_else(|| {
                            ParseError::property(path, format!("type {} is not registered", type_name))
                        })?;
                        match schema.get(segment) {
                            Some(field) => (
                                field.name.clone(),
                                field.tag.clone(),
                                false,
                                field.flatten,
                                matches!(field.tag.underlying(), TypeTag::Document),
                            ),
                            None if crossed_map => {
                                (segment.to_lowercase(), TypeTag::Any, true, false, false)
                            }
                            // Undeclared keys of a flattened blob sit inline
                            // with the declared fields.
                            None if schema.fields.iter().any(|f| f.flatten) => {
                                (segment.to_lowercase(), TypeTag::Any, true, false, true)
                            }
                            None => {
                                return Err(ParseError::property(
                                    path,
                                    format!("{} has no property {}", schema.name, segment),
                                ))
                            }
                        }
                    }
                    TypeTag::Map { key, value } => {
                        if !coerce::validate(segment, key) {
                            return Err(ParseError::property(
                                path,
                                format!("{} is not a valid {} map key", segment, key),
                            ));
                        }
                        crossed_map = true;
                        (segment.to_lowercase(), (**value).clone(), true, false, false)
                    }
                    TypeTag::Document | TypeTag::Any => {
                        (segment.to_lowercase(), TypeTag::Any, true, false, false)
                    }
                    other => {
                        return Err(ParseError::property(
                            path,
                            format!("cannot read {} from a {} value", segment, other),
                        ))
                    }
                };

            traversal |= is_map_entry;
            extension |= enters_blob;

            let path_key = match history.last() {
                Some(parent) => format!("{}{}{}", parent.path_key, self.default_delimiter, key),
                None => key.clone(),
            };

            let info = PropertyInfo {
                key,
                path_key,
                value_type: tag.clone(),
                is_traversal: traversal,
                is_extension_data: extension,
                is_flattened,
                path_history: history.clone(),
            };

            tracing::trace!(path, segment, traversal, extension, "resolved path segment");

            history.push(info);
            context = tag;
        }

        history
            .pop()
            .ok_or_else(|| ParseError::property(path, "empty property name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_cache, DELIMITERS};

    fn resolve(path: &str) -> Result<PropertyInfo, ParseError> {
        let cache = fixture_cache();
        let resolver = PropertyResolver::new(&cache, &DELIMITERS, ".");
        let root = cache.get("Person").unwrap().clone();
        resolver.resolve(&root, path)
    }

    #[test]
    fn test_resolve_top_level() {
        let info = resolve("FIRSTNAME").unwrap();
        assert_eq!(info.key, "firstName");
        assert_eq!(info.path_key, "firstName");
        assert_eq!(info.value_type, TypeTag::Text);
        assert!(!info.is_traversal);
        assert!(info.path_history.is_empty());
    }

    #[test]
    fn test_resolve_nested_object() {
        let info = resolve("owner.lastName").unwrap();
        assert_eq!(info.path_key, "owner.lastName");
        assert_eq!(info.path_history.len(), 1);
        assert_eq!(info.path_history[0].key, "owner");
        assert!(!info.is_traversal);
    }

    #[test]
    fn test_resolve_map_with_numeric_keys() {
        let info = resolve("owner.groups.42.name").unwrap();
        assert_eq!(info.path_key, "owner.groups.42.name");
        assert_eq!(info.value_type, TypeTag::Text);
        assert!(info.is_traversal);
        assert!(!info.path_history[1].is_traversal);
        assert!(info.path_history[2].is_traversal);
    }

    #[test]
    fn test_resolve_map_rejects_wrong_key_type() {
        let result = resolve("owner.groups.fortytwo.name");
        assert!(matches!(result, Err(ParseError::InvalidPropertyName { .. })));
    }

    #[test]
    fn test_resolve_after_map_allows_undeclared() {
        let info = resolve("owner.groups.42.nickname").unwrap();
        assert_eq!(info.value_type, TypeTag::Any);
        assert!(info.is_traversal);
    }

    #[test]
    fn test_resolve_multiple_delimiters() {
        let info = resolve("Owner->Groups->>42.Name").unwrap();
        assert_eq!(info.path_key, "owner.groups.42.name");
    }

    #[test]
    fn test_resolve_extension_data() {
        let info = resolve("fields.data.Color").unwrap();
        assert_eq!(info.key, "color");
        assert!(info.is_extension_data);
        assert!(info.is_traversal);
        assert_eq!(info.access_path(), vec!["fields", "color"]);
        assert_eq!(info.json_path(), vec!["color"]);
    }

    #[test]
    fn test_resolve_inline_extension_key() {
        let info = resolve("fields.color").unwrap();
        assert_eq!(info.path_key, "fields.color");
        assert!(info.is_extension_data);
        assert!(info.is_traversal);
        assert_eq!(info.access_path(), resolve("fields.data.color").unwrap().access_path());
    }

    #[test]
    fn test_resolve_document_column() {
        let info = resolve("settings.theme").unwrap();
        assert!(info.is_extension_data);
        assert!(info.is_traversal);
        assert_eq!(info.json_path(), vec!["theme"]);
    }

    #[test]
    fn test_resolve_unknown_property() {
        let result = resolve("nickname");
        assert!(matches!(result, Err(ParseError::InvalidPropertyName { .. })));
    }

    #[test]
    fn test_resolve_through_scalar_fails() {
        let result = resolve("firstName.length");
        assert!(matches!(result, Err(ParseError::InvalidPropertyName { .. })));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        assert_eq!(resolve("owner.groups.42.name"), resolve("owner.groups.42.name"));
    }
}
