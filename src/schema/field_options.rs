//! Declarative field metadata.
//!
//! A field is described by its declared name plus a comma separated annotation
//! such as `"email,omitempty,unique,pii"`. The first token overrides the name
//! (`-` skips the field, empty keeps the derived name); the rest are flags.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::log_schema_debug;
use crate::schema::types::{Classification, FieldOption};

static MATCH_FIRST_CAP: Lazy<Regex> =
    Lazy::new(|| Regex::new("(.)([A-Z][a-z]+)").expect("static pattern"));
static MATCH_ALL_CAP: Lazy<Regex> =
    Lazy::new(|| Regex::new("([a-z0-9])([A-Z])").expect("static pattern"));

/// Convert a declared name to its stored form, `AddressCountryCode` to
/// `address_country_code`.
pub fn snake_case(input: &str) -> String {
    let snake = MATCH_FIRST_CAP.replace_all(input, "${1}_${2}");
    let snake = MATCH_ALL_CAP.replace_all(&snake, "${1}_${2}");
    snake.to_lowercase()
}

/// Resolved metadata for one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Stored name, without any nesting prefix
    pub name: String,

    pub omit_empty: bool,

    pub unique: bool,
    pub indexed: bool,
    pub searchable: bool,
    pub immutable: bool,
    pub required: bool,
    pub reverse_lookup: bool,
    pub verify: bool,

    pub personal: bool,
    pub user_input: bool,
    pub secure: bool,
    pub identifier: bool,
}

impl FieldOptions {
    /// Resolve the annotation for a field declared as `declared`.
    ///
    /// Returns `None` when the field is excluded with `-`.
    pub fn resolve(declared: &str, annotation: &str) -> Option<Self> {
        let mut options = FieldOptions::default();

        for (i, part) in annotation.split(',').enumerate() {
            let part = part.trim();
            if i == 0 {
                match part {
                    "" => options.name = snake_case(declared),
                    "-" => return None,
                    name => options.name = name.to_lowercase(),
                }
                continue;
            }

            match part {
                "omitempty" => options.omit_empty = true,
                "unique" => options.unique = true,
                "indexed" => options.indexed = true,
                "searchable" => options.searchable = true,
                "immutable" => options.immutable = true,
                "required" => options.required = true,
                "lookup" => options.reverse_lookup = true,
                "verify" => options.verify = true,
                "pii" | "personal" | "gdpr" => options.personal = true,
                "user" => options.user_input = true,
                "secure" => options.secure = true,
                "id" => options.identifier = true,
                "" => {}
                other => {
                    log_schema_debug!("Ignoring unknown field flag '{}' on {}", other, declared)
                }
            }
        }

        if options.name.is_empty() {
            return None;
        }
        Some(options)
    }

    /// Options for a field that was declared by name only
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// System fields (leading `_`) are extracted but never registered
    pub fn is_system(&self) -> bool {
        self.name.starts_with('_')
    }

    /// Full name under a dotted nesting prefix
    pub fn full_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.name)
    }

    /// Classification after applying annotation hints over the value's default
    pub fn classification(&self, default: Classification) -> Classification {
        if self.identifier {
            Classification::ID
        } else if self.secure {
            Classification::Secure
        } else if self.personal {
            Classification::Personal
        } else if self.user_input {
            Classification::UserInput
        } else {
            default
        }
    }

    /// Field options selected by the annotation, merged with `implied`
    pub fn field_options(&self, implied: &[FieldOption]) -> Vec<FieldOption> {
        let flags = [
            (self.unique, FieldOption::Unique),
            (self.indexed, FieldOption::Indexed),
            (self.immutable, FieldOption::Immutable),
            (self.required, FieldOption::Required),
            (self.reverse_lookup, FieldOption::ReverseLookup),
            (self.searchable, FieldOption::Searchable),
            (self.verify, FieldOption::Verify),
        ];

        let mut options: Vec<FieldOption> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, option)| *option)
            .collect();
        for option in implied {
            if !options.contains(option) {
                options.push(*option);
            }
        }
        options
    }

    /// Whether an empty value should be dropped from encoded output
    pub fn skip_when_empty(&self) -> bool {
        self.omit_empty && !self.required
    }
}
