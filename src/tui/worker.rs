//! Background assessment worker.
//!
//! Model loading can block for up to the configured timeout, so each
//! assessment runs on its own thread and reports progress over a channel
//! while the TUI keeps drawing.

use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::{AssessmentService, ModelSlot};
use crate::domain::{PatientProfile, RiskAssessment};
use crate::CardioError;

/// Progress updates from the assessment worker.
#[derive(Debug, Clone)]
pub enum AssessmentProgress {
    /// Acquiring the classifier (first run loads the artifact)
    LoadingModel,
    /// Encoding, predicting, scoring
    Scoring,
    /// Finished; the profile is handed back for the session
    Complete(Box<(PatientProfile, RiskAssessment)>),
    /// Failed; the profile is kept so the user can retry
    Failed {
        message: String,
        profile: Box<PatientProfile>,
    },
}

/// Reported when the worker thread exits without a result.
pub const WORKER_STOPPED: &str = "Assessment worker stopped unexpectedly";

impl AssessmentProgress {
    /// `Complete` and `Failed` end a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Failed { .. })
    }
}

/// Handle to a running assessment worker.
pub struct AssessmentWorkerHandle {
    progress_rx: Receiver<AssessmentProgress>,
    /// Kept for retry if the worker dies mid-run
    profile: PatientProfile,
    finished: Cell<bool>,
    _handle: JoinHandle<()>,
}

impl AssessmentWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    ///
    /// A worker that hangs up before sending `Complete` or `Failed` is
    /// reported once as `Failed` carrying the submitted profile. Nothing is
    /// returned after a terminal update.
    #[must_use]
    pub fn try_recv(&self) -> Option<AssessmentProgress> {
        if self.finished.get() {
            return None;
        }
        match self.progress_rx.try_recv() {
            Ok(update) => {
                self.finished.set(update.is_terminal());
                Some(update)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("{WORKER_STOPPED}");
                self.finished.set(true);
                Some(AssessmentProgress::Failed {
                    message: WORKER_STOPPED.to_string(),
                    profile: Box::new(self.profile.clone()),
                })
            }
        }
    }

    /// A handle whose worker sent `sent` and then exited.
    #[cfg(test)]
    pub(crate) fn stopped(profile: PatientProfile, sent: Vec<AssessmentProgress>) -> Self {
        let (tx, rx) = mpsc::channel();
        for update in sent {
            tx.send(update).expect("send");
        }
        drop(tx);
        Self {
            progress_rx: rx,
            profile,
            finished: Cell::new(false),
            _handle: thread::spawn(|| {}),
        }
    }
}

/// Runs assessments off the UI thread.
pub struct AssessmentWorker;

impl AssessmentWorker {
    /// Spawn a background assessment for `profile`.
    pub fn spawn(model: Arc<ModelSlot>, profile: PatientProfile) -> AssessmentWorkerHandle {
        let (tx, rx) = mpsc::channel();
        let retained = profile.clone();

        let handle = thread::spawn(move || {
            Self::run_with_progress(&model, profile, &tx);
        });

        AssessmentWorkerHandle {
            progress_rx: rx,
            profile: retained,
            finished: Cell::new(false),
            _handle: handle,
        }
    }

    fn run_with_progress(
        model: &ModelSlot,
        profile: PatientProfile,
        tx: &Sender<AssessmentProgress>,
    ) {
        let _ = tx.send(AssessmentProgress::LoadingModel);

        let result = model
            .get_or_load()
            .map_err(CardioError::from)
            .and_then(|classifier| {
                let _ = tx.send(AssessmentProgress::Scoring);
                AssessmentService::new(classifier).assess(&profile)
            });

        let message = match result {
            Ok(assessment) => AssessmentProgress::Complete(Box::new((profile, assessment))),
            Err(e) => {
                tracing::warn!("Assessment failed: {e}");
                AssessmentProgress::Failed {
                    message: e.to_string(),
                    profile: Box::new(profile),
                }
            }
        };
        let _ = tx.send(message);
    }
}
