use serde::{Deserialize, Serialize};

use crate::schema::field_options::snake_case;

/// Wire data type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Number,
    Boolean,
    Float,
    Time,
    Amount,
    SecureText,
    KeyValue,
    StringSet,
    IntSet,
    Bytes,
}

/// Data-protection classification of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[default]
    Anonymous,
    Personal,
    UserInput,
    Secure,
    ID,
}

/// Storage/indexing hints for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldOption {
    Unique,
    Indexed,
    Immutable,
    Required,
    ReverseLookup,
    Searchable,
    Verify,
}

/// Schema-level behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaOption {
    /// Entities of this type carry child records
    ChildEntities,
    /// Entities of this type are stored as children of a parent entity
    ChildOnly,
    /// Keep a revision history of entity properties
    StoreRevisions,
}

/// One named, typed property of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub classification: Classification,
    pub options: Vec<FieldOption>,
}

impl Field {
    pub fn has_option(&self, option: FieldOption) -> bool {
        self.options.contains(&option)
    }
}

/// The registered description of a record type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Server-assigned identifier, empty until registered
    pub id: String,
    pub type_name: String,
    pub display_name: String,
    pub singular: String,
    pub plural: String,
    pub description: String,
    pub fields: Vec<Field>,
    pub options: Vec<SchemaOption>,
    /// Vendor/app that owns the schema, assigned by the server
    pub source: Option<crate::protocol::VendorApp>,
    /// Child collection type names carried by this record
    pub child_types: Vec<String>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_option(&self, option: SchemaOption) -> bool {
        self.options.contains(&option)
    }

    /// Names of fields marked unique
    pub fn unique_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.has_option(FieldOption::Unique))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Identifier used when addressing the schema on unique lookups
    pub fn lookup_id(&self) -> &str {
        if self.id.is_empty() {
            &self.type_name
        } else {
            &self.id
        }
    }

    /// Merge the server's copy of the schema into this one.
    pub fn merge_defined(&mut self, defined: Schema) {
        if !defined.id.is_empty() {
            self.id = defined.id;
        }
        if !defined.display_name.is_empty() {
            self.display_name = defined.display_name;
        }
        if !defined.type_name.is_empty() {
            self.type_name = defined.type_name;
        }
        if defined.source.is_some() {
            self.source = defined.source;
        }
        if !defined.fields.is_empty() {
            self.fields = defined.fields;
        }
        if !defined.options.is_empty() {
            self.options = defined.options;
        }
        if !defined.singular.is_empty() {
            self.singular = defined.singular;
        }
        if !defined.plural.is_empty() {
            self.plural = defined.plural;
        }
    }
}

/// Registration metadata a record type declares about itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefinition {
    pub type_name: String,
    pub display_name: String,
    pub singular: String,
    pub plural: String,
    pub description: String,
    pub options: Vec<SchemaOption>,
}

impl TypeDefinition {
    /// Definition derived from a Rust type path such as `my_app::CustomerOrder`.
    ///
    /// The type name is the last path segment; the display name is its snake
    /// case form with spaces, e.g. `customer order`.
    pub fn from_type_path(path: &str) -> Self {
        let base = path.split('<').next().unwrap_or(path);
        let type_name = base.rsplit("::").next().unwrap_or(base).to_string();
        let display_name = snake_case(&type_name).replace('_', " ");
        Self {
            type_name,
            display_name,
            ..Self::default()
        }
    }

    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            display_name: snake_case(type_name).replace('_', " "),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn with_singular(mut self, singular: &str) -> Self {
        self.singular = singular.to_string();
        self
    }

    pub fn with_plural(mut self, plural: &str) -> Self {
        self.plural = plural.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_option(mut self, option: SchemaOption) -> Self {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }
}
