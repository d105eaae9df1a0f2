use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Why an entity left the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementOutcome {
    /// Reached the final waypoint.
    Arrived,
    /// Cancelled through `stop_movement`.
    Stopped,
    /// Could neither advance nor slide around an obstacle.
    Blocked,
    /// The entity no longer resolved in the world.
    Vanished,
    /// The controller was dropped while the entity was still moving.
    Abandoned,
}

impl MovementOutcome {
    /// Return `true` only for [`MovementOutcome::Arrived`].
    pub fn is_arrival(self) -> bool {
        self == Self::Arrived
    }
}

/// Resolves once a movement started by `move_to` ends.
///
/// Await it from async code, or poll it from a tick loop with
/// [`MoveCompletion::try_outcome`].
#[derive(Debug)]
pub struct MoveCompletion {
    receiver: oneshot::Receiver<MovementOutcome>,
    resolved: Option<MovementOutcome>,
}

pub(crate) fn channel() -> (oneshot::Sender<MovementOutcome>, MoveCompletion) {
    let (sender, receiver) = oneshot::channel();
    (
        sender,
        MoveCompletion {
            receiver,
            resolved: None,
        },
    )
}

impl MoveCompletion {
    /// Return the outcome if the movement has already ended.
    pub fn try_outcome(&mut self) -> Option<MovementOutcome> {
        if self.resolved.is_none() {
            self.resolved = match self.receiver.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Closed) => Some(MovementOutcome::Abandoned),
                Err(oneshot::error::TryRecvError::Empty) => None,
            };
        }
        self.resolved
    }

    /// Return `true` once the movement has ended.
    pub fn is_done(&mut self) -> bool {
        self.try_outcome().is_some()
    }
}

impl Future for MoveCompletion {
    type Output = MovementOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.resolved {
            return Poll::Ready(outcome);
        }
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(result) => {
                let outcome = result.unwrap_or(MovementOutcome::Abandoned);
                self.resolved = Some(outcome);
                Poll::Ready(outcome)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
