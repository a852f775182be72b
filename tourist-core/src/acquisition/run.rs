use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tourist_model::{PhotoID, PinID, TouristEvent};
use tracing::error;

/// Progress of a single run, in emission order.
///
/// A run emits zero or more item events followed by exactly one terminal
/// event. `index` is the entry's position in the searched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionEvent {
    PhotoAcquired { photo_id: PhotoID, index: usize },
    AcquisitionFailed { index: usize, reason: String },
    AcquisitionComplete {
        success_count: usize,
        failure_count: usize,
    },
    AcquisitionAborted { reason: String },
}

impl AcquisitionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AcquisitionEvent::AcquisitionComplete { .. }
                | AcquisitionEvent::AcquisitionAborted { .. }
        )
    }

    pub fn into_tourist_event(self, pin_id: PinID) -> TouristEvent {
        match self {
            AcquisitionEvent::PhotoAcquired { photo_id, .. } => {
                TouristEvent::PhotoAcquired { pin_id, photo_id }
            }
            AcquisitionEvent::AcquisitionFailed { index, reason } => {
                TouristEvent::AcquisitionFailed {
                    pin_id,
                    index,
                    reason,
                }
            }
            AcquisitionEvent::AcquisitionComplete {
                success_count,
                failure_count,
            } => TouristEvent::AcquisitionComplete {
                pin_id,
                success_count,
                failure_count,
            },
            AcquisitionEvent::AcquisitionAborted { reason } => {
                TouristEvent::AcquisitionAborted { pin_id, reason }
            }
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    Complete {
        success_count: usize,
        failure_count: usize,
        photo_ids: Vec<PhotoID>,
    },
    /// The search failed or found nothing; no photo was committed.
    Aborted { reason: String },
}

impl AcquisitionOutcome {
    /// An aborted run, or one where every selected entry failed. A run that
    /// selected nothing is not a failure.
    pub fn is_failure(&self) -> bool {
        match self {
            AcquisitionOutcome::Complete {
                success_count,
                failure_count,
                ..
            } => *success_count == 0 && *failure_count > 0,
            AcquisitionOutcome::Aborted { .. } => true,
        }
    }

    pub fn success_count(&self) -> usize {
        match self {
            AcquisitionOutcome::Complete { success_count, .. } => {
                *success_count
            }
            AcquisitionOutcome::Aborted { .. } => 0,
        }
    }

    pub fn failure_count(&self) -> usize {
        match self {
            AcquisitionOutcome::Complete { failure_count, .. } => {
                *failure_count
            }
            AcquisitionOutcome::Aborted { .. } => 0,
        }
    }

    pub fn photo_ids(&self) -> &[PhotoID] {
        match self {
            AcquisitionOutcome::Complete { photo_ids, .. } => photo_ids,
            AcquisitionOutcome::Aborted { .. } => &[],
        }
    }

    pub(crate) fn terminal_event(&self) -> AcquisitionEvent {
        match self {
            AcquisitionOutcome::Complete {
                success_count,
                failure_count,
                ..
            } => AcquisitionEvent::AcquisitionComplete {
                success_count: *success_count,
                failure_count: *failure_count,
            },
            AcquisitionOutcome::Aborted { reason } => {
                AcquisitionEvent::AcquisitionAborted {
                    reason: reason.clone(),
                }
            }
        }
    }
}

/// Handle to a spawned run.
///
/// Polling it as a [`Stream`] yields the run's events; [`finish`] waits for
/// the terminal outcome. Dropping the handle does not cancel the run.
///
/// [`finish`]: AcquisitionRun::finish
#[derive(Debug)]
pub struct AcquisitionRun {
    pin_id: PinID,
    events: UnboundedReceiverStream<AcquisitionEvent>,
    task: JoinHandle<AcquisitionOutcome>,
}

impl AcquisitionRun {
    pub(crate) fn new(
        pin_id: PinID,
        events: UnboundedReceiverStream<AcquisitionEvent>,
        task: JoinHandle<AcquisitionOutcome>,
    ) -> Self {
        Self {
            pin_id,
            events,
            task,
        }
    }

    pub fn pin_id(&self) -> PinID {
        self.pin_id
    }

    pub async fn finish(self) -> AcquisitionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "[acquire] run for pin {} did not finish: {}",
                    self.pin_id, err
                );
                AcquisitionOutcome::Aborted {
                    reason: format!("acquisition task failed: {err}"),
                }
            }
        }
    }
}

impl Stream for AcquisitionRun {
    type Item = AcquisitionEvent;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}
