//! Per-record entity state carried alongside application fields.
//!
//! Records embed an [`EntityBase`] and expose it through [`Entity`]. The base
//! holds the remote id, the one-shot collections attached to the next write
//! and the snapshot used to compute partial updates.

mod base;

pub use base::{EntityBase, EntitySnapshot};

use chrono::{DateTime, Utc};

use crate::schema::mapping::Record;

/// A record stored as a top-level entity
pub trait Entity: Record {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    fn entity_id(&self) -> &str {
        &self.base().entity_id
    }
}

/// An entity whose writes are recorded as points of a time series
pub trait TimeSeriesRecord: Entity {
    /// The instant the record's values were observed
    fn time_series_input_time(&self) -> DateTime<Utc>;
}
