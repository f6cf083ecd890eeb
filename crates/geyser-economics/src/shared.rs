// crates/geyser-economics/src/shared.rs
//
// SharedEngine: the accounting engine behind an async mutex.
//
// Each mutating call holds the lock for its whole duration, so calls from
// concurrent tokio tasks are serialized and never observe half-applied
// state. Events recorded by a call are drained after it finishes and
// published on a broadcast channel for subscribers (audit log, UI).

use std::sync::Arc;

use geyser_core::{AccountId, Amount, GeyserError, GeyserEvent, Timestamp};
use tokio::sync::{broadcast, Mutex};

use crate::engine::{
    AccountingEngine, AccountingSnapshot, PoolSummary, StakeReceipt, UnstakeReceipt,
};

/// Cloneable async handle to a single engine instance.
#[derive(Clone)]
pub struct SharedEngine {
    engine: Arc<Mutex<AccountingEngine>>,
    events: broadcast::Sender<GeyserEvent>,
}

impl SharedEngine {
    /// Wrap `engine`, buffering up to `event_capacity` unread events per
    /// subscriber.
    pub fn new(engine: AccountingEngine, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            engine: Arc::new(Mutex::new(engine)),
            events,
        }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<GeyserEvent> {
        self.events.subscribe()
    }

    pub async fn stake(
        &self,
        account: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<StakeReceipt, GeyserError> {
        let mut engine = self.engine.lock().await;
        let result = engine.stake(account, amount, data, now);
        self.publish(&mut engine);
        result
    }

    pub async fn unstake(
        &self,
        account: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<UnstakeReceipt, GeyserError> {
        let mut engine = self.engine.lock().await;
        let result = engine.unstake(account, amount, data, now);
        self.publish(&mut engine);
        result
    }

    pub async fn unstake_max(
        &self,
        account: &AccountId,
        data: &str,
        now: Timestamp,
    ) -> Result<UnstakeReceipt, GeyserError> {
        let mut engine = self.engine.lock().await;
        let result = engine.unstake_max(account, data, now);
        self.publish(&mut engine);
        result
    }

    pub async fn lock_funds(
        &self,
        funder: &AccountId,
        amount: Amount,
        data: &str,
        now: Timestamp,
    ) -> Result<Amount, GeyserError> {
        let mut engine = self.engine.lock().await;
        let result = engine.lock_funds(funder, amount, data, now);
        self.publish(&mut engine);
        result
    }

    pub async fn update_accounting(
        &self,
        account: &AccountId,
        now: Timestamp,
    ) -> Result<AccountingSnapshot, GeyserError> {
        let mut engine = self.engine.lock().await;
        let result = engine.update_accounting(account, now);
        self.publish(&mut engine);
        result
    }

    pub async fn unstake_query(
        &self,
        account: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, GeyserError> {
        self.engine.lock().await.unstake_query(account, amount, now)
    }

    pub async fn summary(&self) -> PoolSummary {
        self.engine.lock().await.summary()
    }

    /// Run a read-only query against the engine.
    pub async fn read<T>(&self, query: impl FnOnce(&AccountingEngine) -> T) -> T {
        let engine = self.engine.lock().await;
        query(&engine)
    }

    fn publish(&self, engine: &mut AccountingEngine) {
        for event in engine.drain_events() {
            // No subscribers is not an error: the event is still logged.
            tracing::debug!("Event: {}", event);
            let _ = self.events.send(event);
        }
    }
}
