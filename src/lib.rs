//! DeFier (DFR) token ledger
//!
//! A fungible token where every ordinary transfer pays a fee and burns a
//! share of the amount, and a single governance address controls both
//! rates, can move funds without either, and can hand its role over.
//!
//! - [`token`]: the ledger, fee schedule, events and unit conversion
//! - [`account`]: addresses and the ed25519 keys behind them
//! - [`storage`]: sled persistence for snapshots, keys and config
//! - [`service`]: single-writer task giving callers a serialized history
//! - [`config`]: construction parameters

pub mod account;
pub mod config;
pub mod service;
pub mod storage;
pub mod token;
