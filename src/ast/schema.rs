use serde::{Deserialize, Serialize};

/// Value type of a field, map key/value or blob entry.
///
/// Object types are referenced by their registered name, so self-referential
/// schemas need no special handling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Text,
    Char,
    Number,
    Boolean,
    Uuid,
    DateTime,
    Enum { symbols: Vec<String> },
    /// Structured document stored as a typed field.
    Json,
    /// Schemaless blob holding arbitrary key/value pairs.
    Document,
    /// Free-form key inside a blob; no declared type.
    Any,
    Optional(Box<TypeTag>),
    List(Box<TypeTag>),
    Map { key: Box<TypeTag>, value: Box<TypeTag> },
    Object(String),
}

impl TypeTag {
    pub fn optional(inner: TypeTag) -> Self {
        TypeTag::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeTag) -> Self {
        TypeTag::List(Box::new(inner))
    }

    pub fn map(key: TypeTag, value: TypeTag) -> Self {
        TypeTag::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        TypeTag::Object(name.into())
    }

    pub fn enumeration<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeTag::Enum {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeTag::Optional(_))
    }

    /// Strips any `Optional` wrappers.
    pub fn underlying(&self) -> &TypeTag {
        match self {
            TypeTag::Optional(inner) => inner.underlying(),
            other => other,
        }
    }

    /// True for types whose comparisons fold case.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self.underlying(),
            TypeTag::Text | TypeTag::Char | TypeTag::Enum { .. }
        )
    }

    /// True for types that support `>`, `>=`, `<`, `<=`.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self.underlying(),
            TypeTag::Text | TypeTag::Char | TypeTag::Number | TypeTag::DateTime | TypeTag::Any
        )
    }

    /// Names of object types this tag refers to, including nested ones.
    pub fn referenced_objects(&self) -> Vec<&str> {
        match self {
            TypeTag::Object(name) => vec![name.as_str()],
            TypeTag::Optional(inner) | TypeTag::List(inner) => inner.referenced_objects(),
            TypeTag::Map { key, value } => {
                let mut names = key.referenced_objects();
                names.extend(value.referenced_objects());
                names
            }
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Text => write!(f, "text"),
            TypeTag::Char => write!(f, "char"),
            TypeTag::Number => write!(f, "number"),
            TypeTag::Boolean => write!(f, "boolean"),
            TypeTag::Uuid => write!(f, "uuid"),
            TypeTag::DateTime => write!(f, "date time"),
            TypeTag::Enum { symbols } => write!(f, "enum [{}]", symbols.join(", ")),
            TypeTag::Json => write!(f, "json"),
            TypeTag::Document => write!(f, "document"),
            TypeTag::Any => write!(f, "any"),
            TypeTag::Optional(inner) => write!(f, "optional {}", inner),
            TypeTag::List(inner) => write!(f, "list of {}", inner),
            TypeTag::Map { key, value } => write!(f, "map of {} to {}", key, value),
            TypeTag::Object(name) => write!(f, "object {}", name),
        }
    }
}

/// A declared field of a registered type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub tag: TypeTag,
    /// Set on a blob whose entries are serialized inline with the parent
    /// (`#[serde(flatten)]`). The field keeps its place in key paths but is
    /// skipped when reading items and rendering JSON paths.
    #[serde(default)]
    pub flatten: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            flatten: false,
        }
    }

    pub fn flattened(mut self) -> Self {
        self.flatten = true;
        self
    }
}

/// Explicit property schema registered for one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl TypeSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.fields.push(FieldSchema::new(name, tag));
        self
    }

    /// Adds a flattened extension-data blob.
    pub fn extension(mut self, name: impl Into<String>) -> Self {
        self.fields
            .push(FieldSchema::new(name, TypeTag::Document).flattened());
        self
    }

    /// Case-insensitive field lookup.
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }
}
