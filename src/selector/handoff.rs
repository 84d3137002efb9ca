use log::debug;
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::error::TaskError;
use crate::metrics::{METRICS, RuntimeMetrics};
use crate::schema::Outcome;

/// How a worker hands its single result to the selector.
///
/// - `Buffered`: one-slot buffer. The worker's send never waits. A value
///   that arrives after the reader gave up is handed back to the worker
///   and dropped there.
/// - `Rendezvous`: the worker's send completes only once somebody took the
///   value. When the reader gives up, a drainer task takes over the
///   receiving end and performs that one receive.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HandoffStrategy {
    #[default]
    Buffered,
    Rendezvous,
}

/// Terminal state of a selector worker, seen from the worker's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerFate {
    /// The value was accepted by the handoff before the reader left.
    Delivered,
    /// The reader was gone; the value was dropped without blocking.
    Discarded,
    /// The reader was gone; a drainer received the value instead.
    Drained,
}

/// Who completed a rendezvous receive.
#[derive(Debug, Clone, Copy)]
enum Taker {
    Reader,
    Drainer,
}

type Ack = oneshot::Sender<Taker>;

pub(crate) enum HandoffTx<T> {
    Buffered(oneshot::Sender<Outcome<T>>),
    Rendezvous(oneshot::Sender<(Outcome<T>, Ack)>),
}

pub(crate) enum HandoffRx<T> {
    Buffered(oneshot::Receiver<Outcome<T>>),
    Rendezvous(oneshot::Receiver<(Outcome<T>, Ack)>),
}

pub(crate) fn channel<T>(strategy: HandoffStrategy) -> (HandoffTx<T>, HandoffRx<T>) {
    match strategy {
        HandoffStrategy::Buffered => {
            let (tx, rx) = oneshot::channel();
            (HandoffTx::Buffered(tx), HandoffRx::Buffered(rx))
        }
        HandoffStrategy::Rendezvous => {
            let (tx, rx) = oneshot::channel();
            (HandoffTx::Rendezvous(tx), HandoffRx::Rendezvous(rx))
        }
    }
}

impl<T> HandoffTx<T> {
    /// Delivers the worker's outcome. Consumes the sender: the worker is
    /// the only writer and writes at most once.
    pub(crate) async fn deliver(self, outcome: Outcome<T>) -> WorkerFate {
        let fate = match self {
            HandoffTx::Buffered(tx) => match tx.send(outcome) {
                Ok(()) => WorkerFate::Delivered,
                Err(_late) => WorkerFate::Discarded,
            },
            HandoffTx::Rendezvous(tx) => {
                let (ack_tx, ack_rx) = oneshot::channel();
                if tx.send((outcome, ack_tx)).is_err() {
                    WorkerFate::Discarded
                } else {
                    match ack_rx.await {
                        Ok(Taker::Reader) => WorkerFate::Delivered,
                        Ok(Taker::Drainer) => WorkerFate::Drained,
                        Err(_) => WorkerFate::Discarded,
                    }
                }
            }
        };

        match fate {
            WorkerFate::Delivered => RuntimeMetrics::incr(&METRICS.workers_delivered),
            WorkerFate::Discarded | WorkerFate::Drained => {
                RuntimeMetrics::incr(&METRICS.late_deliveries)
            }
        }
        fate
    }
}

impl<T: Send + 'static> HandoffRx<T> {
    /// Waits for the worker's outcome.
    ///
    /// Cancel safe: dropping the returned future before completion leaves
    /// the receiver usable, which is what lets `abandon` hand it to a
    /// drainer after a timeout.
    pub(crate) async fn recv(&mut self) -> Result<Outcome<T>, TaskError> {
        match self {
            HandoffRx::Buffered(rx) => rx.await.map_err(|_| TaskError::Abandoned),
            HandoffRx::Rendezvous(rx) => {
                let (outcome, ack) = rx.await.map_err(|_| TaskError::Abandoned)?;
                let _ = ack.send(Taker::Reader);
                Ok(outcome)
            }
        }
    }

    /// Gives up on the worker without ever leaving it blocked.
    ///
    /// Buffered: dropping the receiver is enough, the worker's send fails
    /// fast. Rendezvous: the receiver moves into a drainer which is now the
    /// only party able to receive, so the single value is taken once.
    pub(crate) fn abandon(self) {
        match self {
            HandoffRx::Buffered(rx) => drop(rx),
            HandoffRx::Rendezvous(rx) => {
                tokio::spawn(async move {
                    if let Ok((outcome, ack)) = rx.await {
                        RuntimeMetrics::incr(&METRICS.drained);
                        debug!("drainer took late outcome (success={})", outcome.is_success());
                        let _ = ack.send(Taker::Drainer);
                    }
                });
            }
        }
    }
}
