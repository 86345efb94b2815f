#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Final-score submission for finished arcade sessions.
//!
//! A session result is delivered at most once. Forced terminations use the
//! detached path so shutdown never waits on delivery, and failed deliveries
//! fall back to a local [`StagingArea`].

mod staging;

use std::{io::Write, sync::mpsc::Sender};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use wegen_arcade_core::{EndReason, SessionResult};

pub use staging::{StagingArea, StagingError};

/// Wire payload carrying the final score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePayload {
    /// Final score after the end-of-run bonus.
    pub score: u32,
}

/// Score payload tagged with the identity of the submitting player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    /// Identity of the player the score belongs to.
    pub player: String,
    /// Score payload.
    #[serde(flatten)]
    pub payload: ScorePayload,
}

impl ScoreSubmission {
    /// Builds the submission for a finished session.
    #[must_use]
    pub fn new(player: impl Into<String>, result: &SessionResult) -> Self {
        Self {
            player: player.into(),
            payload: ScorePayload {
                score: result.score,
            },
        }
    }

    /// Submitted score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.payload.score
    }
}

/// Failures reported by score sinks.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The sink cannot reach its destination.
    #[error("score sink is offline")]
    Offline,
    /// The receiving side hung up.
    #[error("score receiver disconnected")]
    Disconnected,
    /// Writing the payload failed.
    #[error("failed to write score payload")]
    Io(#[from] std::io::Error),
    /// Encoding the payload failed.
    #[error("failed to encode score payload")]
    Encode(#[from] serde_json::Error),
}

/// Destination for final scores.
pub trait ScoreSink {
    /// Delivers the submission and reports whether it was accepted.
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError>;

    /// Hands the submission off without waiting for acknowledgement.
    ///
    /// Used while the host is terminating. Sinks without a cheaper path
    /// fall back to [`ScoreSink::submit`].
    fn submit_detached(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        self.submit(submission)
    }
}

/// Sink forwarding submissions to a channel consumed elsewhere.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<ScoreSubmission>,
}

impl ChannelSink {
    /// Creates a sink over the sending half of a channel.
    #[must_use]
    pub const fn new(sender: Sender<ScoreSubmission>) -> Self {
        Self { sender }
    }
}

impl ScoreSink for ChannelSink {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        self.sender
            .send(submission.clone())
            .map_err(|_| SubmitError::Disconnected)
    }
}

/// Sink writing each submission as one JSON line.
#[derive(Debug)]
pub struct JsonLineSink<W> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    /// Creates a sink over the provided writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ScoreSink for JsonLineSink<W> {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        serde_json::to_writer(&mut self.writer, submission)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn submit_detached(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        serde_json::to_writer(&mut self.writer, submission)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Sink that is never reachable. Every submission ends up staged.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineSink;

impl ScoreSink for OfflineSink {
    fn submit(&mut self, _submission: &ScoreSubmission) -> Result<(), SubmitError> {
        Err(SubmitError::Offline)
    }
}

/// How a session result left the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The sink accepted the submission.
    Sent,
    /// The submission was handed off on the detached path.
    Detached,
    /// The sink failed and the submission was written to staging.
    Staged,
    /// The sink failed and no staging area was configured.
    Dropped,
    /// A result was already delivered for this session.
    Duplicate,
}

/// Delivers one session's result at most once.
#[derive(Debug)]
pub struct Submission<S> {
    sink: S,
    staging: Option<StagingArea>,
    player: String,
    delivered: bool,
    unsaved: Vec<ScoreSubmission>,
}

impl<S: ScoreSink> Submission<S> {
    /// Creates a submission for `player` without local staging.
    #[must_use]
    pub fn new(sink: S, player: impl Into<String>) -> Self {
        Self {
            sink,
            staging: None,
            player: player.into(),
            delivered: false,
            unsaved: Vec::new(),
        }
    }

    /// Stages failed deliveries in the provided area.
    #[must_use]
    pub fn with_staging(mut self, staging: StagingArea) -> Self {
        self.staging = Some(staging);
        self
    }

    /// Whether a result was already handed to this submission.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Staged submissions that could not be written back to the staging file.
    ///
    /// They are retried on the next [`Submission::flush_staged`].
    #[must_use]
    pub fn unsaved(&self) -> &[ScoreSubmission] {
        &self.unsaved
    }

    /// Borrows the sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Delivers the result, choosing the detached path for forced terminations.
    ///
    /// Sink failures are absorbed by staging. Only a failure to stage is
    /// returned to the caller, and the result may then be delivered again.
    pub fn deliver(&mut self, result: &SessionResult) -> Result<Delivery, StagingError> {
        if self.delivered {
            debug!(score = result.score, "result already delivered");
            return Ok(Delivery::Duplicate);
        }

        let submission = ScoreSubmission::new(self.player.clone(), result);
        let detached = result.reason == EndReason::ForcedTermination;
        let outcome = if detached {
            self.sink.submit_detached(&submission)
        } else {
            self.sink.submit(&submission)
        };

        match outcome {
            Ok(()) => {
                info!(score = submission.score(), detached, "score submitted");
                self.delivered = true;
                Ok(if detached {
                    Delivery::Detached
                } else {
                    Delivery::Sent
                })
            }
            Err(error) => {
                warn!(%error, score = submission.score(), "score submission failed");
                match &self.staging {
                    Some(staging) => {
                        staging.stage(&submission)?;
                        info!(path = %staging.path().display(), "score staged for later delivery");
                        self.delivered = true;
                        Ok(Delivery::Staged)
                    }
                    None => Ok(Delivery::Dropped),
                }
            }
        }
    }

    /// Retries every staged submission and keeps the ones that fail again.
    ///
    /// Entries stay on disk until the retry pass finishes. Entries that could
    /// not be written back are kept in [`Submission::unsaved`] and returned
    /// with the error. Returns the number of submissions the sink accepted.
    pub fn flush_staged(&mut self) -> Result<usize, StagingError> {
        let Some(staging) = &self.staging else {
            return Ok(0);
        };

        let sink = &mut self.sink;
        let mut accepted = 0;
        let mut retry = |submission: &ScoreSubmission| match sink.submit(submission) {
            Ok(()) => {
                accepted += 1;
                true
            }
            Err(error) => {
                warn!(%error, "staged submission still undeliverable");
                false
            }
        };

        self.unsaved.retain(|submission| !retry(submission));
        let drained = staging.drain(&mut retry);

        if let Err(error) = drained {
            self.unsaved.extend_from_slice(error.pending());
            return Err(error);
        }

        for submission in std::mem::take(&mut self.unsaved) {
            if let Err(error) = staging.stage(&submission) {
                warn!(%error, score = submission.score(), "staged submission kept in memory");
                self.unsaved.push(submission);
            }
        }
        Ok(accepted)
    }
}
