//! Single-writer service around a [`TokenLedger`]
//!
//! One tokio task owns the ledger. Every call is shipped to it over an
//! `mpsc` channel and answered on a `oneshot`, so operations run one at a
//! time in arrival order no matter how many handles are in use. When a
//! [`LedgerStore`] is attached, the snapshot and the new events are saved
//! after each successful mutation and before the caller gets its reply. A
//! failed save rolls the in-memory ledger back, so the operation has no
//! effect anywhere.

use crate::account::Address;
use crate::storage::{LedgerStore, StoreError};
use crate::token::{Amount, BasisPoints, EventRecord, TokenError, TokenLedger, TokenResult, TransferReceipt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

const QUEUE_DEPTH: usize = 256;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Ledger service is closed")]
    Closed,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Failed to persist ledger: {0}")]
    Store(#[from] StoreError),
}

type Job = Box<dyn FnOnce(&mut TokenLedger, Option<&LedgerStore>) + Send>;

enum Command {
    Run(Job),
    Stop,
}

/// Cloneable handle for submitting operations to the ledger task
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::Sender<Command>,
}

/// The running ledger task
pub struct LedgerService {
    handle: LedgerHandle,
    task: JoinHandle<TokenLedger>,
}

impl LedgerService {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(ledger: TokenLedger, store: Option<LedgerStore>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Command>(QUEUE_DEPTH);

        let task = tokio::spawn(async move {
            let mut ledger = ledger;
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Run(job) => job(&mut ledger, store.as_ref()),
                    Command::Stop => break,
                }
            }
            if let Some(store) = store.as_ref() {
                if let Err(e) = store.flush() {
                    error!(error = %e, "failed to flush ledger store on shutdown");
                }
            }
            debug!(sequence = ledger.sequence(), "ledger service stopped");
            ledger
        });

        Self {
            handle: LedgerHandle { tx },
            task,
        }
    }

    pub fn handle(&self) -> LedgerHandle {
        self.handle.clone()
    }

    /// Stop the task after already-queued operations and return the ledger
    pub async fn shutdown(self) -> Result<TokenLedger, ServiceError> {
        // Ignore a send failure: the task may already be gone
        let _ = self.handle.tx.send(Command::Stop).await;
        self.task.await.map_err(|_| ServiceError::Closed)
    }
}

impl LedgerHandle {
    async fn submit(&self, job: Job) -> Result<(), ServiceError> {
        self.tx
            .send(Command::Run(job))
            .await
            .map_err(|_| ServiceError::Closed)
    }

    /// Run a read-only closure against the ledger
    pub async fn read<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&TokenLedger) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(Box::new(move |ledger: &mut TokenLedger, _: Option<&LedgerStore>| {
            let _ = reply_tx.send(f(&*ledger));
        }))
        .await?;
        reply_rx.await.map_err(|_| ServiceError::Closed)
    }

    /// Run a mutating closure and persist the result if it succeeded
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut TokenLedger) -> TokenResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(Box::new(move |ledger: &mut TokenLedger, store: Option<&LedgerStore>| {
            let result = match store {
                Some(store) => apply_persisted(ledger, f, |state: &TokenLedger, events: &[EventRecord]| {
                    store.save_ledger(state, events)
                }),
                None => f(ledger).map_err(ServiceError::Token),
            };
            let _ = reply_tx.send(result);
        }))
        .await?;
        reply_rx.await.map_err(|_| ServiceError::Closed)?
    }

    // ========================================================================
    // TYPED OPERATIONS
    // ========================================================================

    pub async fn balance_of(&self, address: Address) -> Result<Amount, ServiceError> {
        self.read(move |ledger| ledger.balance_of(&address)).await
    }

    pub async fn total_supply(&self) -> Result<Amount, ServiceError> {
        self.read(|ledger| ledger.total_supply()).await
    }

    pub async fn governance_address(&self) -> Result<Address, ServiceError> {
        self.read(|ledger| ledger.governance_address()).await
    }

    /// Clone of the current ledger state
    pub async fn snapshot(&self) -> Result<TokenLedger, ServiceError> {
        self.read(|ledger| ledger.clone()).await
    }

    pub async fn transfer(&self, caller: Address, to: Address, amount: Amount) -> Result<TransferReceipt, ServiceError> {
        self.mutate(move |ledger| ledger.transfer(&caller, &to, amount)).await
    }

    pub async fn transfer_no_fee_no_burn(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ServiceError> {
        self.mutate(move |ledger| ledger.transfer_no_fee_no_burn(&caller, &from, &to, amount))
            .await
    }

    pub async fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), ServiceError> {
        self.mutate(move |ledger| ledger.approve(&owner, &spender, amount)).await
    }

    pub async fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, ServiceError> {
        self.mutate(move |ledger| ledger.transfer_from(&spender, &from, &to, amount))
            .await
    }

    pub async fn set_fee_rate(&self, caller: Address, rate: BasisPoints) -> Result<(), ServiceError> {
        self.mutate(move |ledger| ledger.set_fee_rate(&caller, rate)).await
    }

    pub async fn set_burn_rate(&self, caller: Address, rate: BasisPoints) -> Result<(), ServiceError> {
        self.mutate(move |ledger| ledger.set_burn_rate(&caller, rate)).await
    }

    pub async fn change_governance_address(&self, caller: Address, new_address: Address) -> Result<(), ServiceError> {
        self.mutate(move |ledger| ledger.change_governance_address(&caller, &new_address))
            .await
    }
}

/// Run `f`, then hand the new state and its events to `persist`. If
/// persisting fails the ledger is restored to its state before `f`.
fn apply_persisted<T, F, P>(ledger: &mut TokenLedger, f: F, persist: P) -> Result<T, ServiceError>
where
    F: FnOnce(&mut TokenLedger) -> TokenResult<T>,
    P: FnOnce(&TokenLedger, &[EventRecord]) -> Result<(), StoreError>,
{
    let checkpoint = ledger.clone();
    let value = f(&mut *ledger)?;
    let events = ledger.take_events();

    if let Err(e) = persist(&*ledger, &events) {
        error!(error = %e, sequence = ledger.sequence(), "failed to persist ledger, rolling back");
        *ledger = checkpoint;
        return Err(ServiceError::Store(e));
    }
    Ok(value)
}
