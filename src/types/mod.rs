//! Value types with dedicated handling in the property codec.

mod amount;
mod secret;
mod sets;

pub use amount::Amount;
pub use secret::{SecretString, VerifyString};
pub use sets::{IntSet, StringSet};
