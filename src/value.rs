//! Typed property values and the conversions between them and native field types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{EntityError, EntityResult};
use crate::schema::types::{Classification, DataType, FieldOption};
use crate::types::{Amount, IntSet, SecretString, StringSet, VerifyString};

/// The value union carried by a property.
///
/// Only the members relevant to the field's data type are populated; a value
/// with every member at its zero value is considered empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub text: String,
    pub secure_text: String,
    pub int: i64,
    pub float: f64,
    pub boolean: bool,
    pub time: Option<DateTime<Utc>>,
    pub strings: Vec<String>,
    pub ints: Vec<i64>,
    pub map: BTreeMap<String, Vec<u8>>,
    pub bytes: Vec<u8>,
}

impl PropertyValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn secure(masked: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            text: masked.into(),
            secure_text: original.into(),
            ..Self::default()
        }
    }

    pub fn int(int: i64) -> Self {
        Self {
            int,
            ..Self::default()
        }
    }

    pub fn float(float: f64) -> Self {
        Self {
            float,
            ..Self::default()
        }
    }

    pub fn boolean(boolean: bool) -> Self {
        Self {
            boolean,
            ..Self::default()
        }
    }

    pub fn time(time: DateTime<Utc>) -> Self {
        Self {
            time: Some(time),
            ..Self::default()
        }
    }

    pub fn amount(amount: &Amount) -> Self {
        Self {
            text: amount.currency.clone(),
            int: amount.units,
            ..Self::default()
        }
    }

    pub fn strings(strings: Vec<String>) -> Self {
        Self {
            strings,
            ..Self::default()
        }
    }

    pub fn ints(ints: Vec<i64>) -> Self {
        Self {
            ints,
            ..Self::default()
        }
    }

    pub fn map(map: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    /// True when no member carries a value
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.secure_text.is_empty()
            && self.int == 0
            && self.float == 0.0
            && !self.boolean
            && self.time.is_none()
            && self.strings.is_empty()
            && self.ints.is_empty()
            && self.map.is_empty()
            && self.bytes.is_empty()
    }

    /// Best-effort JSON rendering used by generic results.
    ///
    /// Later members win when several are set, so secure text takes precedence
    /// over its masked form.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        let mut out = Value::Null;
        if !self.text.is_empty() {
            out = Value::String(self.text.clone());
        }
        if self.int != 0 {
            out = Value::from(self.int);
        }
        if self.boolean {
            out = Value::Bool(true);
        }
        if self.float != 0.0 {
            out = Value::from(self.float);
        }
        if !self.secure_text.is_empty() {
            out = Value::String(self.secure_text.clone());
        }
        if !self.strings.is_empty() {
            out = Value::from(self.strings.clone());
        }
        if !self.ints.is_empty() {
            out = Value::from(self.ints.clone());
        }
        if !self.map.is_empty() {
            out = Value::Object(
                self.map
                    .iter()
                    .map(|(k, v)| {
                        let text = String::from_utf8_lossy(v).into_owned();
                        (k.clone(), Value::String(text))
                    })
                    .collect(),
            );
        }
        if let Some(time) = self.time {
            out = Value::String(time.to_rfc3339());
        }
        out
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        PropertyValue::text(text)
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        PropertyValue::text(text)
    }
}

impl From<i64> for PropertyValue {
    fn from(int: i64) -> Self {
        PropertyValue::int(int)
    }
}

impl From<i32> for PropertyValue {
    fn from(int: i32) -> Self {
        PropertyValue::int(i64::from(int))
    }
}

impl From<bool> for PropertyValue {
    fn from(boolean: bool) -> Self {
        PropertyValue::boolean(boolean)
    }
}

impl From<f64> for PropertyValue {
    fn from(float: f64) -> Self {
        PropertyValue::float(float)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(time: DateTime<Utc>) -> Self {
        PropertyValue::time(time)
    }
}

/// A native type that can be stored in a single property.
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// Data type registered for fields of this type
    fn data_type() -> DataType;

    /// Classification used when the annotation does not set one
    fn classification() -> Classification {
        Classification::Anonymous
    }

    /// Field options always implied by this type
    fn implied_options() -> Vec<FieldOption> {
        Vec::new()
    }

    fn to_value(&self) -> PropertyValue;

    /// Rebuild a native value; errors are treated as non-fatal skips by the decoder
    fn from_value(value: &PropertyValue) -> EntityResult<Self>;
}

impl FieldValue for String {
    fn data_type() -> DataType {
        DataType::Text
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::text(self.clone())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.text.clone())
    }
}

impl FieldValue for i64 {
    fn data_type() -> DataType {
        DataType::Number
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::int(*self)
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.int)
    }
}

macro_rules! narrow_int_field {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn data_type() -> DataType {
                    DataType::Number
                }

                fn to_value(&self) -> PropertyValue {
                    PropertyValue::int(i64::from(*self))
                }

                fn from_value(value: &PropertyValue) -> EntityResult<Self> {
                    <$ty>::try_from(value.int).map_err(|_| {
                        EntityError::Codec(format!(
                            "{} does not fit in {}",
                            value.int,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

narrow_int_field!(i32, u32, i16, u16);

impl FieldValue for bool {
    fn data_type() -> DataType {
        DataType::Boolean
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::boolean(*self)
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.boolean)
    }
}

impl FieldValue for f64 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::float(*self)
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.float)
    }
}

impl FieldValue for f32 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::float(f64::from(*self))
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.float as f32)
    }
}

// The Unix epoch is the zero time and encodes as an empty value
impl FieldValue for DateTime<Utc> {
    fn data_type() -> DataType {
        DataType::Time
    }

    fn to_value(&self) -> PropertyValue {
        if self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0 {
            PropertyValue::default()
        } else {
            PropertyValue::time(*self)
        }
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.time.unwrap_or_default())
    }
}

impl FieldValue for Option<DateTime<Utc>> {
    fn data_type() -> DataType {
        DataType::Time
    }

    fn to_value(&self) -> PropertyValue {
        match self {
            Some(time) => PropertyValue::time(*time),
            None => PropertyValue::default(),
        }
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.time)
    }
}

impl FieldValue for SecretString {
    fn data_type() -> DataType {
        DataType::Text
    }

    fn classification() -> Classification {
        Classification::Secure
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::secure(self.masked.clone(), self.original.clone())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(SecretString::new(&value.secure_text, &value.text))
    }
}

impl FieldValue for VerifyString {
    fn data_type() -> DataType {
        DataType::SecureText
    }

    fn classification() -> Classification {
        Classification::Secure
    }

    fn implied_options() -> Vec<FieldOption> {
        vec![FieldOption::Verify]
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::secure("", self.original.clone())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(VerifyString::new(&value.secure_text))
    }
}

impl FieldValue for Amount {
    fn data_type() -> DataType {
        DataType::Amount
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::amount(self)
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(Amount::new(&value.text, value.int))
    }
}

impl FieldValue for HashMap<String, String> {
    fn data_type() -> DataType {
        DataType::KeyValue
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.as_bytes().to_vec()))
                .collect(),
        )
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value
            .map
            .iter()
            .map(|(k, v)| (k.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect())
    }
}

impl FieldValue for BTreeMap<String, String> {
    fn data_type() -> DataType {
        DataType::KeyValue
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.as_bytes().to_vec()))
                .collect(),
        )
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value
            .map
            .iter()
            .map(|(k, v)| (k.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect())
    }
}

impl FieldValue for BTreeMap<String, Vec<u8>> {
    fn data_type() -> DataType {
        DataType::KeyValue
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::map(self.clone())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.map.clone())
    }
}

impl FieldValue for Vec<String> {
    fn data_type() -> DataType {
        DataType::StringSet
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::strings(self.clone())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.strings.clone())
    }
}

impl FieldValue for StringSet {
    fn data_type() -> DataType {
        DataType::StringSet
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::strings(self.values())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(StringSet::new(value.strings.iter().cloned()))
    }
}

impl FieldValue for Vec<i64> {
    fn data_type() -> DataType {
        DataType::IntSet
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::ints(self.clone())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.ints.clone())
    }
}

impl FieldValue for IntSet {
    fn data_type() -> DataType {
        DataType::IntSet
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::ints(self.values())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(IntSet::new(value.ints.iter().copied()))
    }
}

impl FieldValue for Vec<u8> {
    fn data_type() -> DataType {
        DataType::Bytes
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::bytes(self.clone())
    }

    fn from_value(value: &PropertyValue) -> EntityResult<Self> {
        Ok(value.bytes.clone())
    }
}
