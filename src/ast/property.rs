use super::TypeTag;
use serde::{Deserialize, Serialize};

/// Resolution of one key path segment against a registered schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    /// Declared field name, or the lower-cased key for map and blob entries.
    pub key: String,
    /// Full path, joined with the default delimiter.
    pub path_key: String,
    pub value_type: TypeTag,
    /// Reached through a dynamic map or blob. Inherited by every descendant.
    pub is_traversal: bool,
    /// Backed by a schemaless blob rather than a declared field.
    pub is_extension_data: bool,
    /// Segment is a flattened blob and absent from serialized items.
    pub is_flattened: bool,
    /// Ancestor segments, root first.
    pub path_history: Vec<PropertyInfo>,
}

impl PropertyInfo {
    pub fn new(key: impl Into<String>, value_type: TypeTag) -> Self {
        let key = key.into();
        Self {
            path_key: key.clone(),
            key,
            value_type,
            is_traversal: false,
            is_extension_data: false,
            is_flattened: false,
            path_history: Vec::new(),
        }
    }

    /// Every segment of the path, root first, ending with `self`.
    pub fn segments(&self) -> impl Iterator<Item = &PropertyInfo> {
        self.path_history.iter().chain(std::iter::once(self))
    }

    /// Key of the first segment, the one mapped to a column.
    pub fn root_key(&self) -> &str {
        self.path_history
            .first()
            .map(|root| root.key.as_str())
            .unwrap_or(self.key.as_str())
    }

    /// Keys to follow through a serialized item.
    pub fn access_path(&self) -> Vec<&str> {
        self.segments()
            .filter(|segment| !segment.is_flattened)
            .map(|segment| segment.key.as_str())
            .collect()
    }

    /// Keys navigated inside the root column's JSON representation.
    pub fn json_path(&self) -> Vec<&str> {
        self.segments()
            .skip(1)
            .filter(|segment| !segment.is_flattened)
            .map(|segment| segment.key.as_str())
            .collect()
    }

    pub fn depth(&self) -> usize {
        self.path_history.len() + 1
    }
}
