use crate::protocol::{
    ChildRequest, EntityView, LockRequest, PropertyRequest, SchemaKey, VendorApp,
};

/// How `get` addresses the entity to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrieveBy {
    EntityId(String),
    /// Match `value` against a unique property of the record's schema
    UniqueProperty { property: String, value: String },
}

impl RetrieveBy {
    pub fn entity_id(entity_id: &str) -> Self {
        RetrieveBy::EntityId(entity_id.to_string())
    }

    pub fn unique_property(property: &str, value: &str) -> Self {
        RetrieveBy::UniqueProperty {
            property: property.to_string(),
            value: value.to_string(),
        }
    }
}

/// One adjustment of what a read returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrieveOption {
    Properties { names: Vec<String>, decrypt: bool },
    Relationships(Vec<String>),
    Labels,
    Links,
    Children { type_name: String, ids: Vec<String> },
    View(String),
    Summary,
    Datum,
    TotalRelationshipCount,
    RelationshipCount { relationship: String, source: Option<VendorApp> },
    ChildCount,
    DescendantCount(String),
    DynamicProperties(Vec<String>),
    Lock { duration_seconds: u32, message: String },
    /// Adds nothing; stands in for an option that has no effect
    Noop,
}

impl RetrieveOption {
    pub fn apply(&self, view: &mut EntityView) {
        match self {
            RetrieveOption::Properties { names, decrypt } => {
                view.properties.push(PropertyRequest {
                    properties: names.clone(),
                    decrypt: *decrypt,
                    source: None,
                });
            }
            RetrieveOption::Relationships(keys) => {
                view.relationships
                    .extend(keys.iter().map(|key| SchemaKey::new(key, None)));
            }
            RetrieveOption::Labels => view.labels = true,
            RetrieveOption::Links => view.links = true,
            RetrieveOption::Children { type_name, ids } => {
                view.children.push(ChildRequest {
                    type_name: type_name.clone(),
                    ids: ids.clone(),
                });
            }
            RetrieveOption::View(name) => view.name = name.clone(),
            RetrieveOption::Summary => view.summary = true,
            RetrieveOption::Datum => view.datum = true,
            RetrieveOption::TotalRelationshipCount => view.relationship_count = true,
            RetrieveOption::RelationshipCount {
                relationship,
                source,
            } => {
                view.relationship_count_types
                    .push(SchemaKey::new(relationship, source.clone()));
            }
            RetrieveOption::ChildCount => view.child_count = true,
            RetrieveOption::DescendantCount(entity_type) => {
                view.descendant_count_types
                    .push(SchemaKey::new(entity_type, None));
            }
            RetrieveOption::DynamicProperties(names) => {
                view.dynamic_properties.extend(names.iter().cloned());
            }
            RetrieveOption::Lock {
                duration_seconds,
                message,
            } => {
                view.lock = Some(LockRequest {
                    duration_seconds: *duration_seconds,
                    message: message.clone(),
                });
            }
            RetrieveOption::Noop => {}
        }
    }
}

fn names(properties: &[&str]) -> Vec<String> {
    properties.iter().map(|s| s.to_string()).collect()
}

/// Load the named properties; an empty list loads all of them
pub fn with_properties(properties: &[&str]) -> RetrieveOption {
    with_property(false, properties)
}

/// Load the named properties with secure text revealed
pub fn with_decrypted_properties(properties: &[&str]) -> RetrieveOption {
    with_property(true, properties)
}

pub fn with_property(decrypt: bool, properties: &[&str]) -> RetrieveOption {
    RetrieveOption::Properties {
        names: names(properties),
        decrypt,
    }
}

pub fn with_relationships(keys: &[&str]) -> RetrieveOption {
    RetrieveOption::Relationships(names(keys))
}

pub fn with_labels() -> RetrieveOption {
    RetrieveOption::Labels
}

pub fn with_links() -> RetrieveOption {
    RetrieveOption::Links
}

/// Load children of one type, optionally only the given ids
pub fn with_children(type_name: &str, ids: &[&str]) -> RetrieveOption {
    RetrieveOption::Children {
        type_name: type_name.to_string(),
        ids: names(ids),
    }
}

pub fn with_view(name: &str) -> RetrieveOption {
    RetrieveOption::View(name.to_string())
}

pub fn with_summary() -> RetrieveOption {
    RetrieveOption::Summary
}

pub fn with_datum() -> RetrieveOption {
    RetrieveOption::Datum
}

pub fn with_total_relationship_count() -> RetrieveOption {
    RetrieveOption::TotalRelationshipCount
}

/// Count relationships of one type; with every argument empty this counts
/// all relationships instead
pub fn with_relationship_count(
    relationship: &str,
    app_id: &str,
    vendor_id: &str,
) -> RetrieveOption {
    if relationship.is_empty() && app_id.is_empty() && vendor_id.is_empty() {
        return with_total_relationship_count();
    }
    let source = VendorApp::new(vendor_id, app_id);
    RetrieveOption::RelationshipCount {
        relationship: relationship.to_string(),
        source: if source.is_empty() { None } else { Some(source) },
    }
}

/// Count relationships of a type owned by the caller's app
pub fn with_sibling_relationship_count(relationship: &str) -> RetrieveOption {
    RetrieveOption::RelationshipCount {
        relationship: relationship.to_string(),
        source: None,
    }
}

pub fn with_child_count() -> RetrieveOption {
    RetrieveOption::ChildCount
}

/// Count descendant entities of one type; an empty type adds nothing
pub fn with_descendant_count(entity_type: &str) -> RetrieveOption {
    if entity_type.is_empty() {
        return RetrieveOption::Noop;
    }
    RetrieveOption::DescendantCount(entity_type.to_string())
}

pub fn with_dynamic_properties(properties: &[&str]) -> RetrieveOption {
    RetrieveOption::DynamicProperties(names(properties))
}

/// Try to lock the entity for `duration_seconds`; the outcome is available
/// through [`EntityBase::lock_info`](crate::EntityBase::lock_info)
pub fn with_lock(duration_seconds: u32, message: &str) -> RetrieveOption {
    RetrieveOption::Lock {
        duration_seconds,
        message: message.to_string(),
    }
}
