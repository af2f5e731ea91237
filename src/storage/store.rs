// LedgerStore - Persistent key-value storage using sled
//
// Provides typed access for storing:
// - The token ledger snapshot
// - The event log, one entry per sequence number
// - Local account keypairs, by label
// - The config the ledger was created with

use crate::account::{Address, Keypair};
use crate::config::TokenConfig;
use crate::token::{EventRecord, TokenLedger};
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const LEDGER: &[u8] = b"ledger:state";
    pub const CONFIG: &[u8] = b"ledger:config";
    pub const EVENT_PREFIX: &[u8] = b"ledger:event:";
    pub const KEYPAIR_PREFIX: &[u8] = b"account:keypair:";

    /// Big-endian sequence so prefix scans come back in order
    pub fn event(sequence: u64) -> Vec<u8> {
        [EVENT_PREFIX, &sequence.to_be_bytes()].concat()
    }
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent store for a single token ledger and its local accounts.
///
/// Uses sled for crash-safe, embedded storage. Snapshot writes replace the
/// whole ledger under one key, so a reader never sees half an operation.
#[derive(Clone)]
pub struct LedgerStore {
    db: sled::Db,
}

impl LedgerStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    // ========================================================================
    // LEDGER PERSISTENCE
    // ========================================================================

    /// Whether a ledger has been initialised in this store
    pub fn has_ledger(&self) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(keys::LEDGER)?)
    }

    /// Save the ledger snapshot together with the events produced since the
    /// last save. Both land in one batch or neither does.
    pub fn save_ledger(&self, ledger: &TokenLedger, events: &[EventRecord]) -> Result<(), StoreError> {
        let mut batch = sled::Batch::default();
        let bytes = ledger
            .to_bytes()
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        batch.insert(keys::LEDGER, bytes);
        for record in events {
            let bytes = postcard::to_allocvec(record)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
            batch.insert(keys::event(record.sequence()), bytes);
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    /// Load the ledger snapshot
    pub fn load_ledger(&self) -> Result<Option<TokenLedger>, StoreError> {
        match self.get_raw(keys::LEDGER)? {
            Some(bytes) => {
                let ledger = TokenLedger::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(ledger))
            }
            None => Ok(None),
        }
    }

    /// Stored events in sequence order, or only the most recent `limit`
    pub fn load_events(&self, limit: Option<usize>) -> Result<Vec<EventRecord>, StoreError> {
        let decode = |item: sled::Result<(sled::IVec, sled::IVec)>| -> Result<EventRecord, StoreError> {
            let (_, value) = item?;
            postcard::from_bytes(&value).map_err(|e| StoreError::DeserializationFailed(e.to_string()))
        };

        let scan = self.db.scan_prefix(keys::EVENT_PREFIX);
        match limit {
            Some(n) => {
                let mut records = scan.rev().take(n).map(decode).collect::<Result<Vec<_>, _>>()?;
                records.reverse();
                Ok(records)
            }
            None => scan.map(decode).collect(),
        }
    }

    // ========================================================================
    // CONFIG PERSISTENCE
    // ========================================================================

    pub fn save_config(&self, config: &TokenConfig) -> Result<(), StoreError> {
        let bytes = config
            .to_bytes()
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::CONFIG, &bytes)
    }

    pub fn load_config(&self) -> Result<Option<TokenConfig>, StoreError> {
        match self.get_raw(keys::CONFIG)? {
            Some(bytes) => {
                let config = TokenConfig::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // ACCOUNT KEYS
    // ========================================================================

    /// Save a keypair with a label
    pub fn save_keypair(&self, label: &str, keypair: &Keypair) -> Result<(), StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        self.put_raw(&key, &keypair.to_bytes())
    }

    /// Load a keypair by label
    pub fn load_keypair(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        match self.get_raw(&key)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// All stored accounts as (label, address), in label order
    pub fn list_accounts(&self) -> Result<Vec<(String, Address)>, StoreError> {
        let mut accounts = Vec::new();
        for result in self.db.scan_prefix(keys::KEYPAIR_PREFIX) {
            let (key, value) = result?;
            let label = String::from_utf8_lossy(&key[keys::KEYPAIR_PREFIX.len()..]).into_owned();
            let keypair = Keypair::from_bytes(&value)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
            accounts.push((label, Address::from_public_key(&keypair.public_key())));
        }
        Ok(accounts)
    }
}
