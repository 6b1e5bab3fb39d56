use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensitive text stored alongside a displayable masked form.
///
/// The store receives the masked form as plain text and the original as
/// secure text, which is only returned when decryption is requested.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretString {
    pub masked: String,
    pub original: String,
}

impl SecretString {
    pub fn new(original: &str, masked: &str) -> Self {
        Self {
            masked: masked.to_string(),
            original: original.to_string(),
        }
    }

    /// Build a secret whose masked form keeps the first and last character of
    /// every word, e.g. `John Doe` becomes `J**n D*e`.
    pub fn masked_from(original: &str) -> Self {
        let masked = original
            .split(' ')
            .map(mask_word)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            masked,
            original: original.to_string(),
        }
    }

    /// The original text when it was loaded, otherwise the masked form
    pub fn reveal(&self) -> &str {
        if self.original.is_empty() {
            &self.masked
        } else {
            &self.original
        }
    }

    pub fn is_empty(&self) -> bool {
        self.masked.is_empty() && self.original.is_empty()
    }
}

fn mask_word(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= 2 {
        return "*".repeat(chars.len());
    }
    let mut masked = String::with_capacity(word.len());
    masked.push(chars[0]);
    masked.extend(std::iter::repeat('*').take(chars.len() - 2));
    masked.push(chars[chars.len() - 1]);
    masked
}

// Never print the original through Debug
impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SecretString")
            .field("masked", &self.masked)
            .finish_non_exhaustive()
    }
}

/// Text the store can verify against but never returns.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyString {
    pub original: String,
}

impl VerifyString {
    pub fn new(original: &str) -> Self {
        Self {
            original: original.to_string(),
        }
    }
}

impl fmt::Debug for VerifyString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VerifyString").finish_non_exhaustive()
    }
}
