//! Two-way worker pool: one driver per variant, joined through a bounded
//! result channel.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use tracing::info;

use crate::driver::DriverSpec;
use crate::error::{HarnessError, Result};
use crate::trial::Pinning;

/// Number of variants in one comparison. The variant index doubles as the
/// logical core the variant's children are pinned to.
pub const VARIANTS: usize = 2;

/// One comparison run: two executables measured under the same driver spec.
#[derive(Clone, Debug)]
pub struct ComparisonSpec {
    pub executables: [PathBuf; VARIANTS],
    pub driver: DriverSpec,
    pub pinning: Pinning,
}

/// Both result series, indexed by variant.
#[derive(Clone, Debug)]
pub struct ComparisonResult {
    pub series: [Vec<f64>; VARIANTS],
}

/// Run both variants in parallel and collect their series.
///
/// Results are paired by variant index, never by completion order: a slow
/// variant 0 does not swap places with variant 1. Both workers are drained
/// before any error is reported, so a failing variant still leaves the run
/// terminating deterministically, and the error names the variant that broke.
pub fn run_comparison(spec: &ComparisonSpec) -> Result<ComparisonResult> {
    let (tx, rx) = mpsc::sync_channel::<(usize, Result<Vec<f64>>)>(VARIANTS);

    let mut workers = Vec::with_capacity(VARIANTS);
    for (index, exe) in spec.executables.iter().cloned().enumerate() {
        let driver = spec.driver.clone();
        let pinning = spec.pinning.clone();
        let tx = tx.clone();
        let worker = thread::Builder::new()
            .name(format!("variant-{index}"))
            .spawn(move || {
                info!(variant = index, exe = %exe.display(), "worker running");
                let outcome = driver.run(&exe, index as u32, &pinning);
                // Capacity equals the sender count, one message each; the
                // send cannot block. It only fails if the receiver is gone.
                let _ = tx.send((index, outcome));
            })
            .map_err(HarnessError::Io)?;
        workers.push(worker);
    }
    drop(tx);

    let mut slots: [Option<Result<Vec<f64>>>; VARIANTS] = [None, None];
    for _ in 0..VARIANTS {
        match rx.recv() {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            // All senders gone; a worker died without reporting.
            Err(mpsc::RecvError) => break,
        }
    }

    for worker in workers {
        let _ = worker.join();
    }

    let mut series: [Vec<f64>; VARIANTS] = [Vec::new(), Vec::new()];
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(values)) => series[index] = values,
            Some(Err(source)) => {
                return Err(HarnessError::Variant {
                    index,
                    source: Box::new(source),
                })
            }
            None => return Err(HarnessError::WorkerVanished { index }),
        }
    }

    Ok(ComparisonResult { series })
}
