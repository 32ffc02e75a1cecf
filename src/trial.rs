//! Single timed execution of an external benchmark binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::debug;

use crate::error::{HarnessError, Result};

/// How spawned benchmark processes are bound to a logical core.
///
/// With a wrapper, the child is invoked as `<wrapper> -c <core> <exe> ...`,
/// so a missing benchmark path surfaces as the wrapper's non-zero exit rather
/// than a spawn failure; the spawn error path only fires when the wrapper
/// itself cannot be started.
#[derive(Clone, Debug)]
pub enum Pinning {
    /// Prefix every invocation with `<wrapper> -c <core>`.
    Wrapper(PathBuf),
    /// Run the executable directly. Timings become scheduler-sensitive;
    /// intended for environments without an affinity wrapper.
    Disabled,
}

impl Default for Pinning {
    fn default() -> Self {
        Pinning::Wrapper(PathBuf::from("taskset"))
    }
}

impl Pinning {
    fn command(&self, core: u32, exe: &Path) -> Command {
        match self {
            Pinning::Wrapper(wrapper) => {
                let mut cmd = Command::new(wrapper);
                cmd.arg("-c").arg(core.to_string()).arg(exe);
                cmd
            }
            Pinning::Disabled => Command::new(exe),
        }
    }
}

/// Run `exe` once on `core` and return the elapsed wall-clock seconds.
///
/// The timer is armed immediately before the spawn and read immediately after
/// the child exits. A spawn failure propagates as [`HarnessError::Spawn`],
/// never as a zero or uninitialized duration. The benchmark's own exit status
/// is not a trial failure; it is logged at debug level and the timing kept.
pub fn run_trial(exe: &Path, core: u32, args: &[String], pinning: &Pinning) -> Result<f64> {
    let mut cmd = pinning.command(core, exe);
    cmd.args(args).stdout(Stdio::null());

    let begin = Instant::now();
    let status = cmd.status().map_err(|source| HarnessError::Spawn {
        exe: exe.to_path_buf(),
        source,
    })?;
    let end = Instant::now();

    let elapsed = end
        .checked_duration_since(begin)
        .ok_or_else(|| HarnessError::Timing {
            exe: exe.to_path_buf(),
        })?;

    if !status.success() {
        debug!(exe = %exe.display(), core, ?status, "benchmark exited non-zero");
    }
    debug!(exe = %exe.display(), core, secs = elapsed.as_secs_f64(), "trial complete");

    Ok(elapsed.as_secs_f64())
}
