//! Unbounded or bounded mpsc channel behind one interface.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::TaskWithId;
use crate::ports::Listener;

/// One queued submission.
pub(super) struct Dispatch {
    pub(super) task: TaskWithId,
    pub(super) listener: Arc<dyn Listener>,
}

pub(super) enum DispatchSender {
    Unbounded(mpsc::UnboundedSender<Dispatch>),
    Bounded(mpsc::Sender<Dispatch>),
}

pub(super) enum DispatchReceiver {
    Unbounded(mpsc::UnboundedReceiver<Dispatch>),
    Bounded(mpsc::Receiver<Dispatch>),
}

pub(super) fn channel(capacity: Option<usize>) -> (DispatchSender, DispatchReceiver) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (DispatchSender::Bounded(tx), DispatchReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (DispatchSender::Unbounded(tx), DispatchReceiver::Unbounded(rx))
        }
    }
}

impl DispatchSender {
    /// Waits for room on a bounded channel. Hands the dispatch back when the
    /// receiving side is gone.
    pub(super) async fn send(&self, dispatch: Dispatch) -> Result<(), Dispatch> {
        match self {
            DispatchSender::Unbounded(tx) => tx.send(dispatch).map_err(|err| err.0),
            DispatchSender::Bounded(tx) => tx.send(dispatch).await.map_err(|err| err.0),
        }
    }
}

impl DispatchReceiver {
    pub(super) async fn recv(&mut self) -> Option<Dispatch> {
        match self {
            DispatchReceiver::Unbounded(rx) => rx.recv().await,
            DispatchReceiver::Bounded(rx) => rx.recv().await,
        }
    }
}
