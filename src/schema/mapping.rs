//! Static field tables for record types.
//!
//! A record describes its fields once through [`Mapping`]; the same table
//! drives schema derivation, encoding and decoding so the three can never
//! disagree about names, prefixes or flattening.

use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::codec::child::ChildRecord;
use crate::log_codec_warn;
use crate::log_schema_warn;
use crate::protocol::{Child, Property};
use crate::schema::field_options::{snake_case, FieldOptions};
use crate::schema::types::{Field, TypeDefinition};
use crate::value::{FieldValue, PropertyValue};

/// An application record that can be stored as an entity.
///
/// ```ignore
/// impl Record for Customer {
///     fn describe(m: &mut Mapping<Self>) {
///         m.field("Name", "", |c| &c.name, |c| &mut c.name)
///             .field("Email", ",unique,pii", |c| &c.email, |c| &mut c.email)
///             .nested("Address", "", |c| &c.address, |c| &mut c.address);
///     }
/// }
/// ```
pub trait Record: Sized + Send + Sync + 'static {
    /// Registration metadata; defaults to the Rust type name
    fn definition() -> TypeDefinition {
        TypeDefinition::from_type_path(std::any::type_name::<Self>())
    }

    /// Declare the record's fields
    fn describe(mapping: &mut Mapping<Self>);
}

/// Fields collected while deriving a schema
#[derive(Debug, Default)]
pub(crate) struct SchemaCollector {
    pub fields: Vec<Field>,
    pub system_fields: Vec<Field>,
    pub child_types: Vec<String>,
}

impl SchemaCollector {
    fn push(&mut self, field: Field, system: bool) {
        let target = if system {
            &mut self.system_fields
        } else {
            &mut self.fields
        };
        if target.iter().any(|f| f.name == field.name) {
            log_schema_warn!(
                "Duplicate field '{}' ignored, first declaration wins",
                field.name
            );
            return;
        }
        target.push(field);
    }

    fn push_child_type(&mut self, type_name: String) {
        if self.child_types.contains(&type_name) {
            log_schema_warn!("Duplicate child collection '{}' ignored", type_name);
            return;
        }
        self.child_types.push(type_name);
    }
}

/// Properties and children produced by encoding one record
#[derive(Debug, Default)]
pub(crate) struct EncodeOutput {
    pub properties: Vec<Property>,
    /// Properties of `_`-prefixed fields, never sent as ordinary properties
    pub system: Vec<Property>,
    pub children: Vec<Child>,
}

/// Response data a record is decoded from
pub(crate) struct DecodeInput<'a> {
    pub properties: &'a HashMap<String, PropertyValue>,
    pub children: &'a [Child],
}

impl DecodeInput<'_> {
    fn has_prefix(&self, prefix: &str) -> bool {
        self.properties.keys().any(|k| k.starts_with(prefix))
    }
}

pub(crate) trait MappedField<R>: Send + Sync {
    fn describe(&self, prefix: &str, out: &mut SchemaCollector);
    fn encode(&self, record: &R, prefix: &str, out: &mut EncodeOutput);
    fn decode(&self, record: &mut R, prefix: &str, input: &DecodeInput<'_>);
}

type MappingCache = HashMap<TypeId, &'static (dyn Any + Send + Sync)>;

/// Field tables built so far, one per record type for the life of the process
static MAPPINGS: Lazy<RwLock<MappingCache>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// The ordered field table of a record type
pub struct Mapping<R> {
    fields: Vec<Box<dyn MappedField<R>>>,
}

impl<R: Record> Mapping<R> {
    /// Build the table by running the record's own description
    pub(crate) fn build() -> Self {
        let mut mapping = Mapping { fields: Vec::new() };
        R::describe(&mut mapping);
        mapping
    }

    /// The table of `R`, described once and shared afterwards
    pub(crate) fn cached() -> &'static Mapping<R> {
        let type_id = TypeId::of::<R>();
        let cached = lookup::<R>(&MAPPINGS.read().unwrap_or_else(PoisonError::into_inner));
        if let Some(mapping) = cached {
            return mapping;
        }

        let mut mappings = MAPPINGS.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(mapping) = lookup::<R>(&mappings) {
            return mapping;
        }
        let mapping: &'static Mapping<R> = Box::leak(Box::new(Self::build()));
        mappings.insert(type_id, mapping);
        mapping
    }

    /// A field stored as a single property.
    ///
    /// `declared` is the field's own name, used when the annotation does not
    /// override it; `annotation` is the comma separated metadata.
    pub fn field<T: FieldValue>(
        &mut self,
        declared: &str,
        annotation: &str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        if let Some(options) = FieldOptions::resolve(declared, annotation) {
            self.fields.push(Box::new(ScalarField {
                options,
                get,
                get_mut,
            }));
        }
        self
    }

    /// A nested record whose fields are stored under `name.` prefixed properties
    pub fn nested<N: Record>(
        &mut self,
        declared: &str,
        annotation: &str,
        get: fn(&R) -> &N,
        get_mut: fn(&mut R) -> &mut N,
    ) -> &mut Self {
        if let Some(options) = FieldOptions::resolve(declared, annotation) {
            self.fields.push(Box::new(NestedField {
                options,
                get,
                get_mut,
                inner: Mapping::<N>::build(),
            }));
        }
        self
    }

    /// A nested record that may be absent; it is created on decode when any
    /// of its properties are present
    pub fn nested_optional<N: Record + Default>(
        &mut self,
        declared: &str,
        annotation: &str,
        get: fn(&R) -> &Option<N>,
        get_mut: fn(&mut R) -> &mut Option<N>,
    ) -> &mut Self {
        if let Some(options) = FieldOptions::resolve(declared, annotation) {
            self.fields.push(Box::new(OptionalNestedField {
                options,
                get,
                get_mut,
                inner: Mapping::<N>::build(),
            }));
        }
        self
    }

    /// Flatten another record's fields into this one at the current prefix
    pub fn embed<N: Record>(
        &mut self,
        get: fn(&R) -> &N,
        get_mut: fn(&mut R) -> &mut N,
    ) -> &mut Self {
        self.fields.push(Box::new(EmbeddedField {
            get,
            get_mut,
            inner: Mapping::<N>::build(),
        }));
        self
    }

    /// A repeated child record collection, stored as one Child per element
    pub fn children<C: ChildRecord>(
        &mut self,
        declared: &str,
        annotation: &str,
        get: fn(&R) -> &Vec<C>,
        get_mut: fn(&mut R) -> &mut Vec<C>,
    ) -> &mut Self {
        if let Some(options) = FieldOptions::resolve(declared, annotation) {
            self.fields.push(Box::new(ChildrenField {
                options,
                get,
                get_mut,
            }));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn describe_into(&self, prefix: &str, out: &mut SchemaCollector) {
        for field in &self.fields {
            field.describe(prefix, out);
        }
    }

    pub(crate) fn encode_into(&self, record: &R, prefix: &str, out: &mut EncodeOutput) {
        for field in &self.fields {
            field.encode(record, prefix, out);
        }
    }

    pub(crate) fn decode_from(&self, record: &mut R, prefix: &str, input: &DecodeInput<'_>) {
        for field in &self.fields {
            field.decode(record, prefix, input);
        }
    }
}

fn lookup<R: Record>(mappings: &MappingCache) -> Option<&'static Mapping<R>> {
    let entry: &'static (dyn Any + Send + Sync) = *mappings.get(&TypeId::of::<R>())?;
    entry.downcast_ref()
}

struct ScalarField<R, T> {
    options: FieldOptions,
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R: Record, T: FieldValue> MappedField<R> for ScalarField<R, T> {
    fn describe(&self, prefix: &str, out: &mut SchemaCollector) {
        let field = Field {
            name: self.options.full_name(prefix),
            data_type: T::data_type(),
            classification: self.options.classification(T::classification()),
            options: self.options.field_options(&T::implied_options()),
        };
        out.push(field, self.options.is_system());
    }

    fn encode(&self, record: &R, prefix: &str, out: &mut EncodeOutput) {
        let value = (self.get)(record).to_value();
        if value.is_empty() && self.options.skip_when_empty() {
            return;
        }
        let property = Property::new(self.options.full_name(prefix), value);
        if self.options.is_system() {
            out.system.push(property);
        } else {
            out.properties.push(property);
        }
    }

    fn decode(&self, record: &mut R, prefix: &str, input: &DecodeInput<'_>) {
        let name = self.options.full_name(prefix);
        let Some(value) = input.properties.get(&name) else {
            return;
        };
        match T::from_value(value) {
            Ok(native) => *(self.get_mut)(record) = native,
            Err(e) => log_codec_warn!("Skipping property '{}': {}", name, e),
        }
    }
}

struct NestedField<R, N> {
    options: FieldOptions,
    get: fn(&R) -> &N,
    get_mut: fn(&mut R) -> &mut N,
    inner: Mapping<N>,
}

impl<R: Record, N: Record> MappedField<R> for NestedField<R, N> {
    fn describe(&self, prefix: &str, out: &mut SchemaCollector) {
        let prefix = format!("{}.", self.options.full_name(prefix));
        self.inner.describe_into(&prefix, out);
    }

    fn encode(&self, record: &R, prefix: &str, out: &mut EncodeOutput) {
        let prefix = format!("{}.", self.options.full_name(prefix));
        self.inner.encode_into((self.get)(record), &prefix, out);
    }

    fn decode(&self, record: &mut R, prefix: &str, input: &DecodeInput<'_>) {
        let prefix = format!("{}.", self.options.full_name(prefix));
        self.inner.decode_from((self.get_mut)(record), &prefix, input);
    }
}

struct OptionalNestedField<R, N> {
    options: FieldOptions,
    get: fn(&R) -> &Option<N>,
    get_mut: fn(&mut R) -> &mut Option<N>,
    inner: Mapping<N>,
}

impl<R: Record, N: Record + Default> MappedField<R> for OptionalNestedField<R, N> {
    fn describe(&self, prefix: &str, out: &mut SchemaCollector) {
        let prefix = format!("{}.", self.options.full_name(prefix));
        self.inner.describe_into(&prefix, out);
    }

    fn encode(&self, record: &R, prefix: &str, out: &mut EncodeOutput) {
        if let Some(nested) = (self.get)(record) {
            let prefix = format!("{}.", self.options.full_name(prefix));
            self.inner.encode_into(nested, &prefix, out);
        }
    }

    fn decode(&self, record: &mut R, prefix: &str, input: &DecodeInput<'_>) {
        let prefix = format!("{}.", self.options.full_name(prefix));
        if !input.has_prefix(&prefix) {
            return;
        }
        let nested = (self.get_mut)(record).get_or_insert_with(N::default);
        self.inner.decode_from(nested, &prefix, input);
    }
}

struct EmbeddedField<R, N> {
    get: fn(&R) -> &N,
    get_mut: fn(&mut R) -> &mut N,
    inner: Mapping<N>,
}

impl<R: Record, N: Record> MappedField<R> for EmbeddedField<R, N> {
    fn describe(&self, prefix: &str, out: &mut SchemaCollector) {
        self.inner.describe_into(prefix, out);
    }

    fn encode(&self, record: &R, prefix: &str, out: &mut EncodeOutput) {
        self.inner.encode_into((self.get)(record), prefix, out);
    }

    fn decode(&self, record: &mut R, prefix: &str, input: &DecodeInput<'_>) {
        self.inner.decode_from((self.get_mut)(record), prefix, input);
    }
}

struct ChildrenField<R, C> {
    options: FieldOptions,
    get: fn(&R) -> &Vec<C>,
    get_mut: fn(&mut R) -> &mut Vec<C>,
}

impl<R, C> ChildrenField<R, C> {
    fn type_name(&self, prefix: &str) -> String {
        snake_case(&self.options.full_name(prefix))
    }
}

impl<R: Record, C: ChildRecord> MappedField<R> for ChildrenField<R, C> {
    fn describe(&self, prefix: &str, out: &mut SchemaCollector) {
        out.push_child_type(self.type_name(prefix));
    }

    fn encode(&self, record: &R, prefix: &str, out: &mut EncodeOutput) {
        let type_name = self.type_name(prefix);
        for (index, item) in (self.get)(record).iter().enumerate() {
            match item.to_child_data() {
                Ok(data) => out.children.push(Child {
                    type_name: type_name.clone(),
                    child_id: item.child_id(),
                    aggregate_value: item.aggregate_value(),
                    data,
                }),
                Err(e) => log_codec_warn!("Skipping {} child #{}: {}", type_name, index, e),
            }
        }
    }

    fn decode(&self, record: &mut R, prefix: &str, input: &DecodeInput<'_>) {
        let type_name = self.type_name(prefix);
        let mut matched = false;
        let mut items = Vec::new();
        for child in input.children.iter().filter(|c| c.type_name == type_name) {
            matched = true;
            match C::from_child_data(&child.data) {
                Ok(mut item) => {
                    if !child.child_id.is_empty() {
                        item.set_child_id(&child.child_id);
                    }
                    if let Some(value) = child.aggregate_value {
                        item.set_aggregate_value(value);
                    }
                    items.push(item);
                }
                Err(e) => {
                    log_codec_warn!("Skipping {} child '{}': {}", type_name, child.child_id, e)
                }
            }
        }
        if matched {
            *(self.get_mut)(record) = items;
        }
    }
}
