use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a comparison or suite run.
///
/// Every variant is fatal to the run that raised it; nothing is retried.
/// Transient benchmark noise is expected to wash out in the trial loop, not
/// through retry logic.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The executable could not be started at all (missing, not executable).
    #[error("failed to launch `{}`: {source}", .exe.display())]
    Spawn {
        exe: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The run was asked for something it cannot iterate or pair up.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The monotonic clock reported an end earlier than the start; the trial
    /// duration is undefined and must not be recorded.
    #[error("inconsistent trial timing for `{}`", .exe.display())]
    Timing { exe: PathBuf },

    /// A worker failed; `index` names the variant so the report can say which
    /// side of the comparison broke.
    #[error("variant {index} failed: {source}")]
    Variant {
        index: usize,
        #[source]
        source: Box<HarnessError>,
    },

    /// A worker ended without sending its series over the result channel.
    #[error("worker for variant {index} exited without reporting a result")]
    WorkerVanished { index: usize },

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
