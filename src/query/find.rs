use crate::protocol::{
    FindRequest, Label, Operator, Page, PropertyFilter, RelationFilter, SchemaKey, Sort, VendorApp,
};
use crate::query::retrieve::RetrieveOption;
use crate::value::PropertyValue;

/// One adjustment of a find request
#[derive(Debug, Clone, PartialEq)]
pub enum FindOption {
    Filter(PropertyFilter),
    Label(Label),
    Relation(RelationFilter),
    ChildOf(String),
    Sort(Sort),
    PerPage(u32),
    PageNumber(u32),
    Limit { limit: u32, offset: u32 },
    /// Shape the returned entities
    Retrieve(RetrieveOption),
}

impl FindOption {
    pub fn apply(&self, request: &mut FindRequest) {
        match self {
            FindOption::Filter(filter) => request.filters.push(filter.clone()),
            FindOption::Label(label) => request.labels.push(label.clone()),
            FindOption::Relation(relation) => request.relation = Some(relation.clone()),
            FindOption::ChildOf(parent) => request.parent_entity_id = Some(parent.clone()),
            FindOption::Sort(sort) => request.sort.push(sort.clone()),
            FindOption::PerPage(per_page) => {
                request.page.get_or_insert_with(Page::default).per_page = *per_page;
            }
            FindOption::PageNumber(page_number) => {
                request.page.get_or_insert_with(Page::default).page_number = *page_number;
            }
            FindOption::Limit { limit, offset } => {
                let page = request.page.get_or_insert_with(Page::default);
                page.per_page = *limit;
                page.page_number = if *limit == 0 { 0 } else { offset / limit };
            }
            FindOption::Retrieve(option) => option.apply(&mut request.view),
        }
    }
}

impl From<RetrieveOption> for FindOption {
    fn from(option: RetrieveOption) -> Self {
        FindOption::Retrieve(option)
    }
}

fn filter(property: &str, operator: Operator, values: Vec<PropertyValue>) -> FindOption {
    FindOption::Filter(PropertyFilter {
        property: property.to_string(),
        operator,
        values,
    })
}

pub fn where_equals(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::Equal, vec![value.into()])
}

pub fn where_not_equals(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::NotEqual, vec![value.into()])
}

pub fn where_greater_than(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::GreaterThan, vec![value.into()])
}

pub fn where_greater_than_or_equals(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::GreaterThanOrEqual, vec![value.into()])
}

pub fn where_less_than(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::LessThan, vec![value.into()])
}

pub fn where_less_than_or_equals(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::LessThanOrEqual, vec![value.into()])
}

pub fn where_contains(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::Contains, vec![value.into()])
}

pub fn where_not_contains(property: &str, value: impl Into<PropertyValue>) -> FindOption {
    filter(property, Operator::NotContains, vec![value.into()])
}

pub fn where_starts_with(property: &str, value: &str) -> FindOption {
    filter(property, Operator::StartsWith, vec![PropertyValue::text(value)])
}

pub fn where_ends_with(property: &str, value: &str) -> FindOption {
    filter(property, Operator::EndsWith, vec![PropertyValue::text(value)])
}

pub fn where_in<V: Into<PropertyValue>>(property: &str, values: Vec<V>) -> FindOption {
    filter(property, Operator::In, values.into_iter().map(Into::into).collect())
}

pub fn where_not_in<V: Into<PropertyValue>>(property: &str, values: Vec<V>) -> FindOption {
    filter(property, Operator::NotIn, values.into_iter().map(Into::into).collect())
}

/// Inclusive range filter
pub fn where_between(
    property: &str,
    lower: impl Into<PropertyValue>,
    upper: impl Into<PropertyValue>,
) -> FindOption {
    filter(property, Operator::Between, vec![lower.into(), upper.into()])
}

pub fn with_label(name: &str, value: &str) -> FindOption {
    FindOption::Label(Label {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn relationship_key(relationship: &str, vendor_id: &str, app_id: &str) -> SchemaKey {
    let source = VendorApp::new(vendor_id, app_id);
    SchemaKey::new(relationship, if source.is_empty() { None } else { Some(source) })
}

/// Entities that `entity_id` has a relationship to
pub fn relation_of(
    entity_id: &str,
    relationship: &str,
    vendor_id: &str,
    app_id: &str,
) -> FindOption {
    FindOption::Relation(RelationFilter {
        source_id: entity_id.to_string(),
        destination_id: String::new(),
        relationship: relationship_key(relationship, vendor_id, app_id),
    })
}

/// Entities that have a relationship to `entity_id`
pub fn relation_to(
    entity_id: &str,
    relationship: &str,
    vendor_id: &str,
    app_id: &str,
) -> FindOption {
    FindOption::Relation(RelationFilter {
        source_id: String::new(),
        destination_id: entity_id.to_string(),
        relationship: relationship_key(relationship, vendor_id, app_id),
    })
}

pub fn sibling_relation_of(entity_id: &str, relationship: &str) -> FindOption {
    relation_of(entity_id, relationship, "", "")
}

pub fn sibling_relation_to(entity_id: &str, relationship: &str) -> FindOption {
    relation_to(entity_id, relationship, "", "")
}

pub fn child_of(entity_id: &str) -> FindOption {
    FindOption::ChildOf(entity_id.to_string())
}

pub fn sort_by(property: &str, descending: bool) -> FindOption {
    FindOption::Sort(Sort {
        property: property.to_string(),
        descending,
    })
}

pub fn per_page(per_page: u32) -> FindOption {
    FindOption::PerPage(per_page)
}

/// Zero-based page index
pub fn page_number(page_number: u32) -> FindOption {
    FindOption::PageNumber(page_number)
}

/// Page of `limit` entities starting at `offset`, rounded down to a page boundary
pub fn limit(limit: u32, offset: u32) -> FindOption {
    FindOption::Limit { limit, offset }
}
