//! # IPC Event Handler
//!
//! Feeds channel events into a [`HistoryRepository`].
//!
//! Notarized headers are routed through a [`ChannelBlockTracker`]: the
//! repository subscribes to it exactly as it would to a real block tracker,
//! so the same handlers run whichever way the events arrive.
//!
//! The handler never spawns threads. Callers drive it with
//! [`process_available`](HistoryEventHandler::process_available) or park a
//! thread of their own in [`run`](HistoryEventHandler::run).

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::HistoryError;
use crate::ipc::payloads::*;
use crate::ports::inbound::HistoryRepository;
use crate::ports::outbound::{BlockTracker, NotarizedHeadersHandler};

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Header and hash lists of a notarized batch differ in length.
    #[error("notarized batch has {headers} headers but {hashes} hashes")]
    MismatchedHeaderHashes { headers: usize, hashes: usize },

    /// Recording a committed block failed.
    #[error("cannot record block: {0}")]
    Record(#[from] HistoryError),
}

/// Creates the channel the commit path and the block tracker publish into.
pub fn history_channel() -> (Sender<HistoryEvent>, Receiver<HistoryEvent>) {
    mpsc::channel()
}

/// Block tracker that delivers notarized batches received over IPC.
#[derive(Default)]
pub struct ChannelBlockTracker {
    cross_handlers: Mutex<Vec<NotarizedHeadersHandler>>,
    self_handlers: Mutex<Vec<NotarizedHeadersHandler>>,
}

impl ChannelBlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke every handler subscribed to the payload's kind.
    pub fn dispatch(&self, payload: &NotarizedHeadersPayload) {
        let handlers = match payload.kind {
            NotarizationKind::CrossShard => self.cross_handlers.lock().clone(),
            NotarizationKind::SelfShard => self.self_handlers.lock().clone(),
        };
        for handler in handlers {
            handler(payload.shard_id, &payload.headers, &payload.header_hashes);
        }
    }

    pub fn handler_count(&self, kind: NotarizationKind) -> usize {
        match kind {
            NotarizationKind::CrossShard => self.cross_handlers.lock().len(),
            NotarizationKind::SelfShard => self.self_handlers.lock().len(),
        }
    }
}

impl BlockTracker for ChannelBlockTracker {
    fn register_cross_notarized_headers_handler(&self, handler: NotarizedHeadersHandler) {
        self.cross_handlers.lock().push(handler);
    }

    fn register_self_notarized_headers_handler(&self, handler: NotarizedHeadersHandler) {
        self.self_handlers.lock().push(handler);
    }
}

/// History Lookup IPC Handler
pub struct HistoryEventHandler {
    repository: Arc<dyn HistoryRepository>,
    tracker: ChannelBlockTracker,
    receiver: Receiver<HistoryEvent>,
}

impl HistoryEventHandler {
    /// Create a handler and subscribe `repository` to its block tracker.
    pub fn new(repository: Arc<dyn HistoryRepository>, receiver: Receiver<HistoryEvent>) -> Self {
        let tracker = ChannelBlockTracker::new();
        repository.register_to_block_tracker(&tracker);
        Self {
            repository,
            tracker,
            receiver,
        }
    }

    pub fn tracker(&self) -> &ChannelBlockTracker {
        &self.tracker
    }

    /// Handle a single event.
    pub fn handle(&self, event: HistoryEvent) -> Result<(), HandlerError> {
        match event {
            HistoryEvent::BlockCommitted(payload) => {
                self.repository
                    .record_block(&payload.header_hash, &payload.header, &payload.body)?;
                Ok(())
            }
            HistoryEvent::NotarizedHeaders(payload) => {
                if payload.headers.len() != payload.header_hashes.len() {
                    return Err(HandlerError::MismatchedHeaderHashes {
                        headers: payload.headers.len(),
                        hashes: payload.header_hashes.len(),
                    });
                }
                self.tracker.dispatch(&payload);
                Ok(())
            }
        }
    }

    /// Drain every event already queued, without blocking.
    ///
    /// Returns the number of events handled successfully.
    pub fn process_available(&self) -> usize {
        let mut handled = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.handle_logged(event) {
                        handled += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("[qc-03] History event channel closed");
                    break;
                }
            }
        }
        handled
    }

    /// Block on the channel until every sender is dropped.
    pub fn run(&self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.receiver.recv() {
            if self.handle_logged(event) {
                handled += 1;
            }
        }
        debug!("[qc-03] History event loop stopped after {} events", handled);
        handled
    }

    fn handle_logged(&self, event: HistoryEvent) -> bool {
        match self.handle(event) {
            Ok(()) => true,
            Err(err @ HandlerError::MismatchedHeaderHashes { .. }) => {
                warn!("[qc-03] Dropping notarized batch: {}", err);
                false
            }
            Err(err) => {
                error!("[qc-03] {}", err);
                false
            }
        }
    }
}
