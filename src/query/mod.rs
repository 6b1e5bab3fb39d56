//! Composable options that shape read, search and write requests.
//!
//! Each option applies itself onto a mutable request. Options are applied in
//! order; list-valued parts of the request accumulate.

pub mod find;
pub mod mutate;
pub mod retrieve;

pub use find::FindOption;
pub use mutate::MutateOption;
pub use retrieve::{RetrieveBy, RetrieveOption};
