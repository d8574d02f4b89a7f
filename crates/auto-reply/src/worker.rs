//! Single-writer queue in front of the [`Dispatcher`].
//!
//! Transports may deliver messages concurrently; funnelling them through one
//! task keeps history and snapshot updates in arrival order.

use {
    threadsage_common::types::InboundMessage,
    tokio::{
        sync::{mpsc, oneshot},
        task::JoinHandle,
    },
    tracing::{debug, info},
};

use crate::dispatcher::{Dispatcher, Outcome};

/// Default queue depth before senders wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
#[error("dispatch worker has stopped")]
pub struct WorkerStopped;

struct Job {
    msg: InboundMessage,
    reply: oneshot::Sender<Outcome>,
}

/// Cheap to clone; every clone feeds the same worker.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<Job>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("msg", &self.msg).finish_non_exhaustive()
    }
}

impl DispatchHandle {
    /// Queue `msg` and wait for its outcome.
    pub async fn dispatch(&self, msg: InboundMessage) -> Result<Outcome, WorkerStopped> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Job { msg, reply })
            .await
            .map_err(|_| WorkerStopped)?;
        rx.await.map_err(|_| WorkerStopped)
    }
}

pub struct DispatchWorker;

impl DispatchWorker {
    /// Spawn the worker task. It exits once every handle has been dropped.
    pub fn spawn(dispatcher: Dispatcher, capacity: usize) -> (DispatchHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity.max(1));
        let task = tokio::spawn(async move {
            while let Some(Job { msg, reply }) = rx.recv().await {
                let outcome = dispatcher.handle(&msg).await;
                if reply.send(outcome).is_err() {
                    debug!("caller went away before the reply was ready");
                }
            }
            info!("dispatch worker stopped");
        });
        (DispatchHandle { tx }, task)
    }
}
