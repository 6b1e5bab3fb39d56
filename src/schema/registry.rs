//! Process-wide cache of derived schemas and their remote registration state.
//!
//! Each record type is derived once and defined on the store at most once per
//! successful round trip. Every entry owns its own completion cell, so callers
//! only wait for the types they actually use.

use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::OnceCell;

use crate::error::{EntityError, EntityResult};
use crate::protocol::{Authorization, DefineSchemaRequest};
use crate::schema::deriver::derive_schema;
use crate::schema::mapping::Record;
use crate::schema::types::Schema;
use crate::transport::Transport;
use crate::{log_registry_debug, log_registry_error, log_registry_info};

static GLOBAL_REGISTRY: Lazy<Arc<SchemaRegistry>> = Lazy::new(|| Arc::new(SchemaRegistry::new()));

/// Remote registration state of one record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Derived locally, not yet defined on the store
    Pending,
    /// A define call is in progress
    InFlight,
    /// Defined, server-assigned fields merged back
    Synced,
}

/// A record type that can be handed to [`SchemaRegistry::register_types`]
#[derive(Clone, Copy)]
pub struct TypeRegistration {
    type_id: TypeId,
    type_path: &'static str,
    derive: fn() -> Schema,
}

impl TypeRegistration {
    pub fn of<R: Record>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            type_path: std::any::type_name::<R>(),
            derive: derive_schema::<R>,
        }
    }

    pub fn type_path(&self) -> &'static str {
        self.type_path
    }
}

/// Cached schema and sync state for one record type
pub struct RegistryEntry {
    type_key: String,
    schema: RwLock<Schema>,
    state: Mutex<SyncState>,
    synced: OnceCell<()>,
}

impl RegistryEntry {
    fn new(schema: Schema) -> Self {
        Self {
            type_key: schema.type_name.clone(),
            schema: RwLock::new(schema),
            state: Mutex::new(SyncState::Pending),
            synced: OnceCell::new(),
        }
    }

    /// Type name the entry was registered under
    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    /// Snapshot of the cached schema
    pub fn schema(&self) -> EntityResult<Schema> {
        let schema = self
            .schema
            .read()
            .map_err(|_| EntityError::Registry("Failed to acquire schema lock".to_string()))?;
        Ok(schema.clone())
    }

    pub fn state(&self) -> EntityResult<SyncState> {
        let state = self
            .state
            .lock()
            .map_err(|_| EntityError::Registry("Failed to acquire state lock".to_string()))?;
        Ok(*state)
    }

    fn set_state(&self, next: SyncState) -> EntityResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| EntityError::Registry("Failed to acquire state lock".to_string()))?;
        *state = next;
        Ok(())
    }

    fn merge(&self, defined: Schema) -> EntityResult<()> {
        let mut schema = self
            .schema
            .write()
            .map_err(|_| EntityError::Registry("Failed to acquire schema lock".to_string()))?;
        schema.merge_defined(defined);
        Ok(())
    }
}

/// Shared registry of record schemas
pub struct SchemaRegistry {
    entries: Mutex<HashMap<TypeId, Arc<RegistryEntry>>>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The registry shared by every connection in the process
    pub fn global() -> Arc<SchemaRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    fn lock_entries(&self) -> EntityResult<MutexGuard<'_, HashMap<TypeId, Arc<RegistryEntry>>>> {
        self.entries
            .lock()
            .map_err(|_| EntityError::Registry("Failed to acquire registry lock".to_string()))
    }

    fn register_one(
        &self,
        registration: &TypeRegistration,
    ) -> EntityResult<(Arc<RegistryEntry>, bool)> {
        let mut entries = self.lock_entries()?;
        if let Some(existing) = entries.get(&registration.type_id) {
            return Ok((existing.clone(), false));
        }

        let schema = (registration.derive)();
        log_registry_info!(
            "Registered type {} as schema '{}'",
            registration.type_path,
            schema.type_name
        );
        let entry = Arc::new(RegistryEntry::new(schema));
        entries.insert(registration.type_id, entry.clone());
        Ok((entry, true))
    }

    /// Derive and cache the schemas of `types`.
    ///
    /// Types already known are skipped without re-deriving. Returns the number
    /// of newly registered types.
    pub fn register_types(&self, types: &[TypeRegistration]) -> EntityResult<usize> {
        let mut added = 0;
        for registration in types {
            if self.register_one(registration)?.1 {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Register `R` if needed and return its entry
    pub fn register<R: Record>(&self) -> EntityResult<Arc<RegistryEntry>> {
        Ok(self.register_one(&TypeRegistration::of::<R>())?.0)
    }

    pub fn entry<R: Record>(&self) -> EntityResult<Option<Arc<RegistryEntry>>> {
        let entries = self.lock_entries()?;
        Ok(entries.get(&TypeId::of::<R>()).cloned())
    }

    pub fn schema<R: Record>(&self) -> EntityResult<Option<Schema>> {
        match self.entry::<R>()? {
            Some(entry) => Ok(Some(entry.schema()?)),
            None => Ok(None),
        }
    }

    pub fn state<R: Record>(&self) -> EntityResult<Option<SyncState>> {
        match self.entry::<R>()? {
            Some(entry) => Ok(Some(entry.state()?)),
            None => Ok(None),
        }
    }

    pub fn registered_count(&self) -> EntityResult<usize> {
        Ok(self.lock_entries()?.len())
    }

    fn pending(&self) -> EntityResult<Vec<Arc<RegistryEntry>>> {
        let entries = self.lock_entries()?;
        let mut pending = Vec::new();
        for entry in entries.values() {
            if entry.state()? == SyncState::Pending {
                pending.push(entry.clone());
            }
        }
        Ok(pending)
    }

    /// Define every pending schema on the store.
    ///
    /// All pending types are attempted concurrently; a failure for one type
    /// leaves it pending and does not affect the others. Returns the number of
    /// types synced, or the first failure after all attempts finished.
    pub async fn sync_schema(
        &self,
        transport: &dyn Transport,
        authorization: &Authorization,
    ) -> EntityResult<usize> {
        let pending = self.pending()?;
        if pending.is_empty() {
            return Ok(0);
        }
        log_registry_debug!("Syncing {} pending schemas", pending.len());

        let results = futures::future::join_all(
            pending
                .iter()
                .map(|entry| sync_entry(entry, transport, authorization)),
        )
        .await;

        let mut synced = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(()) => synced += 1,
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(synced),
        }
    }

    /// Register `R` if needed and wait until its schema is defined.
    ///
    /// Only the first callers of a type wait on the store; afterwards this
    /// returns the cached schema immediately.
    pub async fn ensure_registered<R: Record>(
        &self,
        transport: &dyn Transport,
        authorization: &Authorization,
    ) -> EntityResult<Schema> {
        let entry = self.register::<R>()?;
        sync_entry(&entry, transport, authorization).await?;
        entry.schema()
    }
}

async fn sync_entry(
    entry: &RegistryEntry,
    transport: &dyn Transport,
    authorization: &Authorization,
) -> EntityResult<()> {
    entry
        .synced
        .get_or_try_init(|| define_entry(entry, transport, authorization))
        .await?;
    Ok(())
}

async fn define_entry(
    entry: &RegistryEntry,
    transport: &dyn Transport,
    authorization: &Authorization,
) -> EntityResult<()> {
    entry.set_state(SyncState::InFlight)?;
    let request = DefineSchemaRequest {
        authorization: authorization.clone(),
        schema: entry.schema()?,
    };

    match transport.define_schema(request).await {
        Ok(defined) => {
            entry.merge(defined)?;
            entry.set_state(SyncState::Synced)?;
            log_registry_info!("Schema '{}' synced", entry.type_key);
            Ok(())
        }
        Err(e) => {
            // Leave the type retryable by a later sync
            entry.set_state(SyncState::Pending)?;
            log_registry_error!("Failed to sync schema '{}': {}", entry.type_key, e);
            Err(e)
        }
    }
}
