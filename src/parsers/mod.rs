//! Report fragment parsers.
//!
//! kSNP4 scatters its summary numbers across free-text reports and small
//! `key: value` count files. Each format gets one [`ReportParser`]; all of
//! them degrade to partial records instead of failing on unexpected content.
//!
//! Work-directory files are dispatched by filename through
//! [`work_dir_parsers()`]. The Kchooser report lives elsewhere and is parsed
//! explicitly by the aggregation driver.

mod core_snps;
mod counts;
mod kchooser;
mod node;

use anyhow::Context;
use std::path::Path;

use crate::store::ReportRecord;

pub use core_snps::{CoreSnpSummaryParser, CORE_SNP_COUNT_FILE, CORE_SNP_SUMMARY_KEY};
pub use counts::CountFileParser;
pub use kchooser::{parse_optimum_k, GenomeSummaryParser, OptimumKParser, KCHOOSER_REPORT_NAME};
pub use node::NodeFileParser;

/// Trait for parsing one report format into a [`ReportRecord`].
///
/// # Example
/// ```ignore
/// pub struct MyReportParser;
///
/// impl ReportParser for MyReportParser {
///     fn format_name(&self) -> &str { "my_report" }
///     fn can_parse(&self, file_name: &str) -> bool { file_name.starts_with("MY_") }
///     fn parse_text(&self, source: &str, text: &str) -> ReportRecord { /* ... */ }
/// }
/// ```
pub trait ReportParser {
    /// Human-readable name of the format
    fn format_name(&self) -> &str;

    /// Whether a work-directory file with this name is in this format.
    fn can_parse(&self, file_name: &str) -> bool;

    /// Extract a record from report text. Never fails; unmatched fields stay empty.
    fn parse_text(&self, source: &str, text: &str) -> ReportRecord;

    /// Store key for records parsed from `file_name`.
    fn store_key(&self, file_name: &str) -> String {
        file_name.to_string()
    }

    /// Read `path` and parse it. Only I/O problems are errors.
    fn parse(&self, path: &Path) -> anyhow::Result<ReportRecord> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let record = self.parse_text(&source, &text);
        let missing = record.missing_fields();
        if !missing.is_empty() {
            log::warn!(
                "{} ({}): unmatched fields: {}",
                source,
                self.format_name(),
                missing.join(", ")
            );
        }
        Ok(record)
    }
}

/// Parsers applied to files in the kSNP4 work directory.
pub fn work_dir_parsers() -> Vec<Box<dyn ReportParser>> {
    vec![
        Box::new(CountFileParser),
        Box::new(CoreSnpSummaryParser),
        Box::new(NodeFileParser),
    ]
}

/// Parse an unsigned integer capture, logging instead of failing on overflow.
pub(crate) fn capture_u64(source: &str, field: &str, raw: Option<&str>) -> Option<u64> {
    let raw = raw?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("{}: cannot read {} from '{}': {}", source, field, raw, e);
            None
        }
    }
}
