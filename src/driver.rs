//! Per-variant measurement loops: the sweep and simple drivers.

use std::num::NonZeroUsize;
use std::path::Path;

use clap::ValueEnum;
use tracing::debug;

use crate::error::Result;
use crate::sweep::SweepConfig;
use crate::trial::{run_trial, Pinning};

/// Reduction applied to each fixed-size batch of trial durations.
///
/// Kept behind a name so the sweep driver's control flow never changes when a
/// different reducer is chosen.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum Reducer {
    /// Median; even-sized batches average the two middle values.
    #[default]
    Median,
    /// Arithmetic mean. More noise-sensitive than the median.
    Mean,
}

impl Reducer {
    /// Collapse one non-empty batch to a single value. `samples` is scratch
    /// and may be reordered.
    pub fn reduce(&self, samples: &mut [f64]) -> f64 {
        match self {
            Reducer::Median => median(samples),
            Reducer::Mean => samples.iter().sum::<f64>() / samples.len() as f64,
        }
    }
}

fn median(samples: &mut [f64]) -> f64 {
    debug_assert!(!samples.is_empty());
    samples.sort_by(|a, b| a.total_cmp(b));
    let mid = samples.len() / 2;
    if samples.len() % 2 == 0 {
        (samples[mid - 1] + samples[mid]) / 2.0
    } else {
        samples[mid]
    }
}

/// Work order for one variant: what to run and how often.
#[derive(Clone, Debug)]
pub enum DriverSpec {
    /// One reduced entry per sweep value, sweep order preserved.
    Sweep {
        sweep: SweepConfig,
        trials: NonZeroUsize,
        reducer: Reducer,
    },
    /// `trials` raw timings, trial order preserved, no aggregation.
    Simple { trials: NonZeroUsize },
}

impl DriverSpec {
    /// Run the full measurement loop for one variant on `core`.
    pub fn run(&self, exe: &Path, core: u32, pinning: &Pinning) -> Result<Vec<f64>> {
        match self {
            DriverSpec::Sweep {
                sweep,
                trials,
                reducer,
            } => run_sweep(exe, core, pinning, sweep, *trials, *reducer),
            DriverSpec::Simple { trials } => run_simple(exe, core, pinning, *trials),
        }
    }
}

fn run_sweep(
    exe: &Path,
    core: u32,
    pinning: &Pinning,
    sweep: &SweepConfig,
    trials: NonZeroUsize,
    reducer: Reducer,
) -> Result<Vec<f64>> {
    let mut series = Vec::with_capacity(sweep.len());
    // Scratch buffer reused across sweep points.
    let mut batch = vec![0.0; trials.get()];

    for value in sweep.values() {
        let mut args = vec![value.to_string()];
        if let Some(extra) = &sweep.extra {
            args.push(extra.clone());
        }

        for slot in batch.iter_mut() {
            *slot = run_trial(exe, core, &args, pinning)?;
        }

        let reduced = reducer.reduce(&mut batch);
        debug!(core, value, reduced, "sweep point done");
        series.push(reduced);
    }

    Ok(series)
}

fn run_simple(exe: &Path, core: u32, pinning: &Pinning, trials: NonZeroUsize) -> Result<Vec<f64>> {
    let mut series = Vec::with_capacity(trials.get());
    for _ in 0..trials.get() {
        series.push(run_trial(exe, core, &[], pinning)?);
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(trials: usize) -> NonZeroUsize {
        NonZeroUsize::new(trials).unwrap()
    }

    #[test]
    fn median_of_odd_batch() {
        let mut samples = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(Reducer::Median.reduce(&mut samples), 3.0);
    }

    #[test]
    fn median_of_even_batch_averages_the_middle_pair() {
        let mut samples = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(Reducer::Median.reduce(&mut samples), 2.5);
    }

    #[test]
    fn median_of_one_sample_is_that_sample() {
        let mut samples = [0.25];
        assert_eq!(Reducer::Median.reduce(&mut samples), 0.25);
    }

    #[test]
    fn mean_reducer() {
        let mut samples = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(Reducer::Mean.reduce(&mut samples), 2.5);
    }

    #[cfg(unix)]
    mod with_processes {
        use super::*;
        use std::fs;
        use std::path::{Path, PathBuf};

        fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
            use std::os::unix::fs::PermissionsExt;
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn simple_driver_yields_one_raw_entry_per_trial() {
            let dir = tempfile::tempdir().unwrap();
            let exe = script(dir.path(), "quick", "exit 0");

            for trials in [1usize, 2, 5] {
                let spec = DriverSpec::Simple {
                    trials: batch(trials),
                };
                let series = spec.run(&exe, 0, &Pinning::Disabled).unwrap();
                assert_eq!(series.len(), trials);
                assert!(series.iter().all(|&s| s >= 0.0));
            }
        }

        #[test]
        fn sweep_series_length_tracks_values_not_batch_size() {
            let dir = tempfile::tempdir().unwrap();
            let exe = script(dir.path(), "quick", "exit 0");
            let sweep = SweepConfig::new(100, 50);

            for trials in [1usize, 4] {
                let spec = DriverSpec::Sweep {
                    sweep: sweep.clone(),
                    trials: batch(trials),
                    reducer: Reducer::Median,
                };
                let series = spec.run(&exe, 0, &Pinning::Disabled).unwrap();
                assert_eq!(series.len(), sweep.len());
            }
        }

        #[test]
        fn sweep_driver_forwards_value_and_extra_argument() {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("calls.log");
            let exe = script(
                dir.path(),
                "record",
                &format!("echo \"$1 $2\" >> {}", log.display()),
            );

            let spec = DriverSpec::Sweep {
                sweep: SweepConfig::new(6, 2).with_extra("7"),
                trials: batch(1),
                reducer: Reducer::Median,
            };
            spec.run(&exe, 0, &Pinning::Disabled).unwrap();

            assert_eq!(fs::read_to_string(&log).unwrap(), "0 7\n2 7\n4 7\n");
        }

        #[test]
        fn empty_sweep_yields_an_empty_series() {
            let dir = tempfile::tempdir().unwrap();
            let exe = script(dir.path(), "quick", "exit 0");

            let spec = DriverSpec::Sweep {
                sweep: SweepConfig::new(0, 1),
                trials: batch(3),
                reducer: Reducer::Median,
            };
            assert!(spec.run(&exe, 0, &Pinning::Disabled).unwrap().is_empty());
        }

        #[test]
        fn spawn_failure_aborts_the_driver() {
            let spec = DriverSpec::Simple { trials: batch(3) };
            let err = spec
                .run(Path::new("/no/such/benchmark"), 0, &Pinning::Disabled)
                .unwrap_err();
            assert!(matches!(err, crate::error::HarnessError::Spawn { .. }));
        }
    }
}
