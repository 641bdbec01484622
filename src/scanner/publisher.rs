use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::models::RecordList;

use super::{PipelineEvent, PipelineState, ScanError};

/// Change notifications delivered to subscribers, in mutation order.
#[derive(Debug, Clone)]
pub enum ScannerEvent {
    StateChanged(PipelineState),
    RecordsChanged(Arc<RecordList>),
    /// The record list changed in memory but could not be persisted.
    PersistFailed(String),
}

struct PublisherInner {
    state: PipelineState,
    records: Arc<RecordList>,
    subscribers: Vec<UnboundedSender<ScannerEvent>>,
}

impl PublisherInner {
    fn broadcast(&mut self, event: ScannerEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

/// Owner of the current pipeline state and record list.
///
/// Every mutation is broadcast while the lock is held, so each subscriber
/// receives events in exactly the order the mutations happened. Channels are
/// unbounded: nothing is coalesced or dropped.
#[derive(Clone)]
pub struct StatePublisher {
    inner: Arc<Mutex<PublisherInner>>,
}

impl StatePublisher {
    pub fn new(records: RecordList) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PublisherInner {
                state: PipelineState::Idle,
                records: Arc::new(records),
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PublisherInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state.clone()
    }

    pub fn records(&self) -> Arc<RecordList> {
        self.lock().records.clone()
    }

    /// Register an observer. The receiver first gets the current state and
    /// record list, then every subsequent change.
    pub fn subscribe(&self) -> UnboundedReceiver<ScannerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // The receiver is alive, so these sends cannot fail.
        let _ = tx.send(ScannerEvent::StateChanged(inner.state.clone()));
        let _ = tx.send(ScannerEvent::RecordsChanged(inner.records.clone()));
        inner.subscribers.push(tx);
        rx
    }

    /// Apply `event` to the current state and notify on change. The check and
    /// the update happen under one lock.
    pub fn apply(&self, event: PipelineEvent) -> Result<PipelineState, ScanError> {
        let mut inner = self.lock();
        match inner.state.next(event)? {
            Some(next) => {
                inner.state = next.clone();
                inner.broadcast(ScannerEvent::StateChanged(next.clone()));
                Ok(next)
            }
            None => Ok(inner.state.clone()),
        }
    }

    pub fn set_records(&self, records: RecordList) {
        let records = Arc::new(records);
        let mut inner = self.lock();
        inner.records = records.clone();
        inner.broadcast(ScannerEvent::RecordsChanged(records));
    }

    pub fn report_persist_failure(&self, message: String) {
        self.lock().broadcast(ScannerEvent::PersistFailed(message));
    }
}
