//! Parser for the core / non-core SNP summary.
//!
//! Reads three sentences from `COUNT_coreSNPs`:
//! `Number core SNPs: N`, `Number non-core SNPs: N` and
//! `Number SNPs in at least a fraction F of genomes: N`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture_u64, ReportParser};
use crate::store::{CoreSnpSummary, ReportRecord};

/// kSNP4 count file holding the core / non-core summary.
pub const CORE_SNP_COUNT_FILE: &str = "COUNT_coreSNPs";

/// Store key for the parsed summary.
pub const CORE_SNP_SUMMARY_KEY: &str = "core_snp_summary";

static CORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Number core SNPs:\s*(\d+)").expect("valid regex"));
static NON_CORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Number non-core SNPs:\s*(\d+)").expect("valid regex"));
static FRACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Number SNPs in at least a fraction ([\d.]+) of genomes:\s*(\d+)")
        .expect("valid regex")
});

pub struct CoreSnpSummaryParser;

impl ReportParser for CoreSnpSummaryParser {
    fn format_name(&self) -> &str {
        "core_snp_summary"
    }

    fn can_parse(&self, file_name: &str) -> bool {
        file_name == CORE_SNP_COUNT_FILE
    }

    fn store_key(&self, _file_name: &str) -> String {
        CORE_SNP_SUMMARY_KEY.to_string()
    }

    fn parse_text(&self, source: &str, text: &str) -> ReportRecord {
        let group = |re: &Lazy<Regex>, i: usize| {
            re.captures(text).and_then(|c| c.get(i)).map(|m| m.as_str())
        };

        let fraction = group(&FRACTION, 1).and_then(|raw| match raw.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("{}: '{}' is not a genome fraction", source, raw);
                None
            }
        });

        ReportRecord::CoreSnpSummary(CoreSnpSummary {
            core_snps: capture_u64(source, "core_SNPs", group(&CORE, 1)),
            non_core_snps: capture_u64(source, "non_core_SNPs", group(&NON_CORE, 1)),
            fraction,
            fraction_snps: capture_u64(source, "fraction_SNPs", group(&FRACTION, 2)),
        })
    }
}
