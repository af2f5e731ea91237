// Storage module - PERSISTENCE
// Ledger snapshots, local keys and config in sled

mod store;

pub use store::{LedgerStore, StorageStats, StoreError};
