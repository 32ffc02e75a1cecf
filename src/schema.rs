use serde::{Deserialize, Serialize};

/// Run-level metadata attached to every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub harness_version: String,
    /// "line" or "box".
    pub mode: String,
    /// Reducer name for swept runs; absent for raw runs.
    pub reducer: Option<String>,
    pub trials: usize,
    pub timestamp_utc: String,
}

/// One variant's measured series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSeries {
    pub label: String,
    /// Logical core the variant's children were pinned to.
    pub core: u32,
    pub values: Vec<f64>,
}

/// Everything one comparison run produces, minus the chart itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub run: RunMeta,
    /// Sweep values, aligned with each variant's series; absent in box mode.
    pub abscissa: Option<Vec<u64>>,
    pub variants: Vec<VariantSeries>,
}
