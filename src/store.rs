//! Report record store
//!
//! Run-scoped, append-only mapping from a source name (a filename or a
//! well-known report id) to the records extracted from it, in insertion order.
//! Renderers read `store.get(source)` and project the fields they need.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single extracted metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl MetricValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }
}

impl From<Option<u64>> for MetricValue {
    fn from(v: Option<u64>) -> Self {
        // counts beyond i64 cannot be represented and read as absent
        v.and_then(|n| i64::try_from(n).ok())
            .map(MetricValue::Int)
            .unwrap_or(MetricValue::Null)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(v: Option<f64>) -> Self {
        v.map(MetricValue::Float).unwrap_or(MetricValue::Null)
    }
}

impl From<Option<String>> for MetricValue {
    fn from(v: Option<String>) -> Self {
        v.map(MetricValue::Text).unwrap_or(MetricValue::Null)
    }
}

/// Input genome statistics from the Kchooser report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenomeSummary {
    pub total_genomes: Option<u64>,
    pub median_genome: Option<String>,
    pub median_genome_length: Option<u64>,
    pub shortest_genome: Option<String>,
    pub shortest_genome_length: Option<u64>,
}

/// Optimum k-mer size chosen by Kchooser; `None` when the report has no verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimumK {
    pub k: Option<u32>,
}

/// `key: value` integer counts from one `COUNT_*` file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    pub values: IndexMap<String, i64>,
}

impl CountRecord {
    pub fn get(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }
}

/// Core / non-core SNP counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreSnpSummary {
    pub core_snps: Option<u64>,
    pub non_core_snps: Option<u64>,
    /// Genome fraction threshold for the majority count
    pub fraction: Option<f64>,
    /// SNPs present in at least `fraction` of genomes
    pub fraction_snps: Option<u64>,
}

/// Per-node SNP statistics from a `Node_*` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub node: Option<String>,
    pub number_targets: Option<u64>,
    pub number_snps: Option<u64>,
}

/// One record extracted from one report fragment. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportRecord {
    GenomeSummary(GenomeSummary),
    OptimumK(OptimumK),
    Counts(CountRecord),
    CoreSnpSummary(CoreSnpSummary),
    NodeSummary(NodeSummary),
}

impl ReportRecord {
    /// Flat `(metric, value)` view with report-facing names. Absent fields are `Null`.
    pub fn fields(&self) -> Vec<(String, MetricValue)> {
        match self {
            ReportRecord::GenomeSummary(g) => vec![
                ("Total Genomes".into(), g.total_genomes.into()),
                ("Median Genome".into(), g.median_genome.clone().into()),
                ("Median Genome Length".into(), g.median_genome_length.into()),
                ("Shortest Genome".into(), g.shortest_genome.clone().into()),
                ("Shortest Genome Length".into(), g.shortest_genome_length.into()),
            ],
            ReportRecord::OptimumK(k) => {
                vec![("Optimum k".into(), k.k.map(u64::from).into())]
            }
            ReportRecord::Counts(c) => c
                .values
                .iter()
                .map(|(k, v)| (k.clone(), MetricValue::Int(*v)))
                .collect(),
            ReportRecord::CoreSnpSummary(s) => vec![
                ("core_SNPs".into(), s.core_snps.into()),
                ("non_core_SNPs".into(), s.non_core_snps.into()),
                ("fraction".into(), s.fraction.into()),
                ("fraction_SNPs".into(), s.fraction_snps.into()),
            ],
            ReportRecord::NodeSummary(n) => vec![
                ("node".into(), n.node.clone().into()),
                ("NumberTargets".into(), n.number_targets.into()),
                ("NumberSNPs".into(), n.number_snps.into()),
            ],
        }
    }

    /// Value of one flat field, `None` if the record has no such field.
    #[cfg(test)]
    pub fn field(&self, name: &str) -> Option<MetricValue> {
        self.fields().into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Names of expected fields the parser could not fill.
    pub fn missing_fields(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .filter(|(_, v)| v.is_null())
            .map(|(k, _)| k)
            .collect()
    }
}

/// Append-only store of extracted records keyed by source name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportStore {
    sources: IndexMap<String, Vec<ReportRecord>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` under `source`. Never overwrites: repeated sources accumulate.
    pub fn append(&mut self, source: impl Into<String>, record: ReportRecord) {
        self.sources.entry(source.into()).or_default().push(record);
    }

    /// Records for `source` in insertion order (empty if unknown).
    pub fn get(&self, source: &str) -> &[ReportRecord] {
        self.sources.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First record for `source`.
    pub fn first(&self, source: &str) -> Option<&ReportRecord> {
        self.get(source).first()
    }

    #[cfg(test)]
    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    /// Sources in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ReportRecord])> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
