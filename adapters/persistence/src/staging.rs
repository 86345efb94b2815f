//! Local JSON-lines staging for submissions that could not be delivered.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::ScoreSubmission;

/// Failures raised while staging or draining submissions.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The staging file could not be read or written.
    #[error("staging file {path} is not accessible")]
    Io {
        /// Location of the staging file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A submission could not be encoded.
    #[error("failed to encode staged submission")]
    Encode(#[source] serde_json::Error),
    /// Submissions read from the staging file could not be written back.
    #[error("failed to write {} staged submissions back to {path}", .pending.len())]
    WriteBack {
        /// Location of the staging file.
        path: PathBuf,
        /// Submissions that are no longer guaranteed to be on disk.
        pending: Vec<ScoreSubmission>,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl StagingError {
    /// Submissions the failed operation could not persist.
    #[must_use]
    pub fn pending(&self) -> &[ScoreSubmission] {
        match self {
            Self::WriteBack { pending, .. } => pending,
            Self::Io { .. } | Self::Encode(_) => &[],
        }
    }
}

/// File holding undelivered submissions, one JSON object per line.
#[derive(Clone, Debug)]
pub struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    /// Creates a staging area backed by the file at `path`.
    ///
    /// The file is created lazily on the first staged submission.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the staging file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a submission to the staging file.
    pub fn stage(&self, submission: &ScoreSubmission) -> Result<(), StagingError> {
        let line = serde_json::to_string(submission).map_err(StagingError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        writeln!(file, "{line}").map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), score = submission.score(), "submission staged");
        Ok(())
    }

    /// Reads every staged submission without removing it.
    ///
    /// A missing file yields an empty list. Lines that fail to decode are
    /// skipped with a warning so one corrupt entry cannot block the rest.
    pub fn load(&self) -> Result<Vec<ScoreSubmission>, StagingError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        let mut staged = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| self.io_error(source))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScoreSubmission>(&line) {
                Ok(submission) => staged.push(submission),
                Err(error) => warn!(line = index + 1, %error, "skipping malformed staged submission"),
            }
        }
        Ok(staged)
    }

    /// Offers every staged submission to `accept` and keeps the rejected ones.
    ///
    /// The file is only replaced once every entry has been offered, and the
    /// replacement is written beside it and renamed into place. If that fails
    /// the rejected entries travel back in [`StagingError::WriteBack`].
    /// Returns the number of accepted submissions.
    pub fn drain(
        &self,
        mut accept: impl FnMut(&ScoreSubmission) -> bool,
    ) -> Result<usize, StagingError> {
        let staged = self.load()?;
        if staged.is_empty() {
            return Ok(0);
        }

        let total = staged.len();
        let rejected: Vec<_> = staged
            .into_iter()
            .filter(|submission| !accept(submission))
            .collect();

        if let Err(source) = self.replace(&rejected) {
            return Err(StagingError::WriteBack {
                path: self.path.clone(),
                pending: rejected,
                source,
            });
        }
        debug!(
            path = %self.path.display(),
            kept = rejected.len(),
            "staging drained"
        );
        Ok(total - rejected.len())
    }

    fn replace(&self, submissions: &[ScoreSubmission]) -> io::Result<()> {
        if submissions.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            };
        }

        let scratch = self.scratch_path();
        let written =
            write_lines(&scratch, submissions).and_then(|()| fs::rename(&scratch, &self.path));
        if written.is_err() {
            let _ = fs::remove_file(&scratch);
        }
        written
    }

    fn scratch_path(&self) -> PathBuf {
        let mut scratch = self.path.clone().into_os_string();
        scratch.push(".tmp");
        PathBuf::from(scratch)
    }

    fn io_error(&self, source: io::Error) -> StagingError {
        StagingError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_lines(path: &Path, submissions: &[ScoreSubmission]) -> io::Result<()> {
    let mut file = File::create(path)?;
    for submission in submissions {
        serde_json::to_writer(&mut file, submission)?;
        file.write_all(b"\n")?;
    }
    file.sync_all()
}
