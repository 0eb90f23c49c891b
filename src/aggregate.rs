//! Report aggregation driver
//!
//! Fills one [`ReportStore`] from the two Kchooser report paths and every
//! parseable file in the kSNP4 work directory, then wraps it together with the
//! renderer projections into an [`AggregatedReport`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;
use crate::organize::sorted_entries;
use crate::parsers::{work_dir_parsers, GenomeSummaryParser, OptimumKParser, ReportParser};
use crate::store::{ReportRecord, ReportStore};
use crate::summary::ReportSummary;

/// Store key of the Kchooser genome statistics.
pub const KCHOOSER_KEY: &str = "kchooser_report";
/// Store key of the optimum-k outcome.
pub const OPTIMUM_K_KEY: &str = "optimum_k";

/// Inputs of one aggregation run.
#[derive(Debug, Clone)]
pub struct AggregationInputs {
    pub work_dir: PathBuf,
    pub kchooser_report: PathBuf,
    pub optimum_k_report: PathBuf,
}

/// Populate a fresh store. Missing inputs are reported and their step skipped.
pub fn aggregate(inputs: &AggregationInputs) -> ReportStore {
    let mut store = ReportStore::new();

    parse_named_report(&mut store, KCHOOSER_KEY, &GenomeSummaryParser, &inputs.kchooser_report);
    parse_named_report(&mut store, OPTIMUM_K_KEY, &OptimumKParser, &inputs.optimum_k_report);
    if let Some(ReportRecord::OptimumK(k)) = store.first(OPTIMUM_K_KEY) {
        match k.k {
            Some(k) => log::info!("Optimum value of k: {}", k),
            None => log::warn!("Optimum value of k not found"),
        }
    }

    scan_work_dir(&mut store, &inputs.work_dir);

    if store.is_empty() {
        log::warn!("No report sources found; the report will be empty");
    } else {
        log::info!("Aggregated {} report sources", store.len());
    }
    store
}

fn parse_named_report(
    store: &mut ReportStore,
    key: &str,
    parser: &dyn ReportParser,
    path: &Path,
) {
    if !path.is_file() {
        log::warn!("{}", PipelineError::missing("Report", path));
        return;
    }
    match parser.parse(path) {
        Ok(record) => store.append(key, record),
        Err(e) => log::warn!("{:#}", e),
    }
}

fn scan_work_dir(store: &mut ReportStore, work_dir: &Path) {
    if !work_dir.is_dir() {
        log::warn!("{}", PipelineError::missing("Work directory", work_dir));
        return;
    }
    let entries = match sorted_entries(work_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("{:#}", e);
            return;
        }
    };

    let parsers = work_dir_parsers();
    for path in entries.iter().filter(|p| p.is_file()) {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        for parser in parsers.iter().filter(|p| p.can_parse(&name)) {
            log::debug!("Parsing {} as {}", name, parser.format_name());
            match parser.parse(path) {
                Ok(record) => store.append(parser.store_key(&name), record),
                Err(e) => log::warn!("{:#}", e),
            }
        }
    }
}

/// Serialized output of `aggregate-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub version: String,
    pub generated_at: String,
    pub work_dir: String,
    pub records: ReportStore,
    pub summary: ReportSummary,
}

impl AggregatedReport {
    pub fn from_inputs(inputs: &AggregationInputs) -> Self {
        let records = aggregate(inputs);
        let summary = ReportSummary::from_store(&records);
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            work_dir: inputs.work_dir.display().to_string(),
            records,
            summary,
        }
    }

    /// Write the report as JSON, pretty unless `compact`, gzipped when `gzip`.
    pub fn save<P: AsRef<Path>>(&self, path: P, compact: bool, gzip: bool) -> Result<()> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::{BufWriter, Write};

        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create report: {}", path.display()))?;

        if gzip {
            let mut encoder = GzEncoder::new(file, Compression::default());
            self.write_json(&mut encoder, compact)?;
            encoder.finish()?;
        } else {
            let mut writer = BufWriter::new(file);
            self.write_json(&mut writer, compact)?;
            writer.flush()?;
        }
        Ok(())
    }

    fn write_json<W: std::io::Write>(&self, writer: W, compact: bool) -> serde_json::Result<()> {
        if compact {
            serde_json::to_writer(writer, self)
        } else {
            serde_json::to_writer_pretty(writer, self)
        }
    }
}
