use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pinbench::discover;
use pinbench::driver::{DriverSpec, Reducer};
use pinbench::plot::{self, GraphMode};
use pinbench::pool::{run_comparison, ComparisonSpec};
use pinbench::schema::{ComparisonReport, RunMeta, VariantSeries};
use pinbench::suite::{self, SuiteConfig};
use pinbench::sweep::SweepConfig;
use pinbench::trial::Pinning;

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare the two implementations of one benchmark and render a chart.
    Graph {
        /// Numeric identifier of the benchmark pair.
        #[arg(value_name = "TEST_ID")]
        test_id: String,

        /// Directory holding the benchmark executables.
        #[arg(long, value_name = "DIR", default_value = "install/bin")]
        bin_dir: PathBuf,

        /// Sweep upper bound (exclusive). Omit to run without a sweep.
        #[arg(short = 'n', long = "sweep-stop")]
        stop: Option<u64>,

        /// Sweep step.
        #[arg(short = 's', long = "sweep-step", default_value_t = 1)]
        step: u64,

        /// Trials per sweep point, or total trials when no sweep is given.
        #[arg(short = 'i', long, default_value_t = 20)]
        trials: usize,

        /// Extra argument forwarded verbatim to the benchmark binary.
        #[arg(short = 'y', long)]
        extra: Option<String>,

        /// Batch reduction for swept runs.
        #[arg(long, value_enum, default_value_t = Reducer::Median)]
        reduce: Reducer,

        /// Chart output path (.png or .svg).
        #[arg(long, default_value = "graph.png")]
        out: PathBuf,

        /// Also write the measured series as pretty JSON.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Skip the affinity wrapper (timings become scheduler-sensitive).
        #[arg(long)]
        no_pin: bool,
    },

    /// Run the standard benchmark battery, one chart per identifier.
    Batch {
        #[arg(long, value_name = "DIR", default_value = "install/bin")]
        bin_dir: PathBuf,

        /// Directory the chart files are written into.
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Sweep upper bound for the swept families.
        #[arg(short = 'n', long = "sweep-stop", default_value_t = 1000)]
        stop: u64,

        #[arg(short = 's', long = "sweep-step", default_value_t = 50)]
        step: u64,

        #[arg(short = 'i', long, default_value_t = 10)]
        trials: usize,

        /// Yield count forwarded to the families that take one.
        #[arg(short = 'y', long, default_value_t = 20)]
        extra: u64,

        #[arg(long)]
        no_pin: bool,
    },

    /// Run the correctness-test battery and report an aggregate verdict.
    Check {
        /// Identifiers of the tests to run; all digit-prefixed tests if empty.
        test_ids: Vec<String>,

        /// Directory holding the test executables.
        #[arg(long, value_name = "DIR", default_value = "build")]
        build_dir: PathBuf,

        /// Discard test output.
        #[arg(long)]
        quiet: bool,

        /// Run every test under valgrind.
        #[arg(long)]
        valgrind: bool,

        /// Arguments passed to each test executable.
        #[arg(long, num_args = 1.., default_values_t = [String::from("10"), String::from("10")])]
        args: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "pinbench")]
#[command(about = "CPU-pinned two-way benchmark harness with chart output")]
struct Args {
    /// Verbose logging (per-trial timings, child exit codes).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

/// The benchmark identifiers of the standard battery.
const BATTERY: &[&str] = &["11", "12", "21", "22", "23", "31", "32"];

/// Sweep shape per benchmark family: 2x and 5x sweep the thread count, 3x
/// additionally forwards the yield count, 1x takes no arguments at all.
fn battery_sweep(id: &str, stop: u64, step: u64, extra: u64) -> Option<SweepConfig> {
    match id.chars().next() {
        Some('2') | Some('5') => Some(SweepConfig::new(stop, step)),
        Some('3') => Some(SweepConfig::new(stop, step).with_extra(extra.to_string())),
        _ => None,
    }
}

struct GraphJob {
    bin_dir: PathBuf,
    test_id: String,
    sweep: Option<SweepConfig>,
    trials: NonZeroUsize,
    reduce: Reducer,
    pinning: Pinning,
    out: PathBuf,
    report: Option<PathBuf>,
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_else(|| path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn now_utc() -> String {
    // Good enough for reports without pulling in chrono.
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn run_graph(job: &GraphJob) -> Result<()> {
    if let Some(sweep) = &job.sweep {
        sweep.validate()?;
        if sweep.is_empty() {
            bail!("sweep upper bound must be positive when a sweep is requested");
        }
    }

    let executables = discover::find_pair(&job.bin_dir, &job.test_id)?;
    let labels = [stem(&executables[0]), stem(&executables[1])];

    let driver = match &job.sweep {
        Some(sweep) => DriverSpec::Sweep {
            sweep: sweep.clone(),
            trials: job.trials,
            reducer: job.reduce,
        },
        None => DriverSpec::Simple { trials: job.trials },
    };
    let mode = GraphMode::select(job.sweep.is_some());
    info!(test = %job.test_id, mode = mode.as_str(), "running comparison");

    let spec = ComparisonSpec {
        executables,
        driver,
        pinning: job.pinning.clone(),
    };
    let result = run_comparison(&spec)
        .with_context(|| format!("comparison `{}` aborted", job.test_id))?;

    let abscissa: Vec<u64> = job
        .sweep
        .as_ref()
        .map(|sweep| sweep.values().collect())
        .unwrap_or_default();
    plot::render(
        mode,
        &result,
        [labels[0].as_str(), labels[1].as_str()],
        &abscissa,
        &job.out,
    )
    .with_context(|| format!("rendering `{}`", job.out.display()))?;
    info!(chart = %job.out.display(), "chart written");

    if let Some(path) = &job.report {
        let report = ComparisonReport {
            run: RunMeta {
                schema_version: 1,
                harness_version: env!("CARGO_PKG_VERSION").to_string(),
                mode: mode.as_str().to_string(),
                reducer: job
                    .sweep
                    .as_ref()
                    .map(|_| format!("{:?}", job.reduce).to_lowercase()),
                trials: job.trials.get(),
                timestamp_utc: now_utc(),
            },
            abscissa: job.sweep.as_ref().map(|sweep| sweep.values().collect()),
            variants: result
                .series
                .iter()
                .enumerate()
                .map(|(index, values)| VariantSeries {
                    label: labels[index].clone(),
                    core: index as u32,
                    values: values.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("writing `{}`", path.display()))?;
        info!(report = %path.display(), "report written");
    }

    Ok(())
}

fn run_batch(
    bin_dir: &Path,
    out_dir: &Path,
    stop: u64,
    step: u64,
    trials: NonZeroUsize,
    extra: u64,
    pinning: &Pinning,
) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating `{}`", out_dir.display()))?;

    for id in BATTERY {
        let job = GraphJob {
            bin_dir: bin_dir.to_path_buf(),
            test_id: (*id).to_string(),
            sweep: battery_sweep(id, stop, step, extra),
            trials,
            reduce: Reducer::Median,
            pinning: pinning.clone(),
            out: out_dir.join(format!("graph_{id}.png")),
            report: None,
        };
        run_graph(&job)?;
    }
    Ok(())
}

fn status(passed: bool) -> ColoredString {
    if passed {
        "[OK]".green()
    } else {
        "[FAILED]".red()
    }
}

fn run_check(build_dir: &Path, ids: &[String], cfg: &SuiteConfig) -> Result<()> {
    let tests = discover::find_tests(build_dir, ids)?;
    if tests.is_empty() {
        bail!("no test executables found in `{}`", build_dir.display());
    }
    info!(count = tests.len(), "running test battery");

    let outcomes = suite::run_suite(&tests, cfg)?;
    for outcome in &outcomes {
        println!("{}... {}", outcome.exe.display(), status(outcome.passed));
    }

    let ok = suite::verdict(&outcomes);
    println!("{}", status(ok));
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    match args.cmd {
        Command::Graph {
            test_id,
            bin_dir,
            stop,
            step,
            trials,
            extra,
            reduce,
            out,
            report,
            no_pin,
        } => {
            let trials =
                NonZeroUsize::new(trials).context("trial count must be at least 1")?;
            let sweep = stop.map(|stop| {
                let sweep = SweepConfig::new(stop, step);
                match &extra {
                    Some(extra) => sweep.with_extra(extra.clone()),
                    None => sweep,
                }
            });
            let pinning = if no_pin {
                Pinning::Disabled
            } else {
                Pinning::default()
            };
            run_graph(&GraphJob {
                bin_dir,
                test_id,
                sweep,
                trials,
                reduce,
                pinning,
                out,
                report,
            })
        }
        Command::Batch {
            bin_dir,
            out_dir,
            stop,
            step,
            trials,
            extra,
            no_pin,
        } => {
            let trials =
                NonZeroUsize::new(trials).context("trial count must be at least 1")?;
            let pinning = if no_pin {
                Pinning::Disabled
            } else {
                Pinning::default()
            };
            run_batch(&bin_dir, &out_dir, stop, step, trials, extra, &pinning)
        }
        Command::Check {
            test_ids,
            build_dir,
            quiet,
            valgrind,
            args,
        } => {
            let cfg = SuiteConfig {
                args,
                valgrind,
                quiet,
            };
            run_check(&build_dir, &test_ids, &cfg)
        }
    }
}
