//! Parsers for the Kchooser4 report.
//!
//! The report is free text. Genome statistics come from fixed sentences:
//! `There were N genomes`, `The median length genome was X`, `Its length is N`,
//! `The shortest genomes is X its length is N`. The chosen k-mer size comes
//! from `The optimum value of k is N`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture_u64, ReportParser};
use crate::store::{GenomeSummary, OptimumK, ReportRecord};

static GENOME_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"There were (\d+) genomes").expect("valid regex"));
static MEDIAN_GENOME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"The median length genome was (\S+)").expect("valid regex"));
static MEDIAN_LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Its length is (\d+)").expect("valid regex"));
static SHORTEST_GENOME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"The shortest genomes is (\S+) its length is (\d+)").expect("valid regex")
});
static OPTIMUM_K: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"The optimum value of k is (\d+)").expect("valid regex"));

/// Kchooser report file name as produced in the clean data directory.
pub const KCHOOSER_REPORT_NAME: &str = "Kchooser4_ksnp4_input_file.report";

/// Genome count, median and shortest genome statistics.
pub struct GenomeSummaryParser;

impl ReportParser for GenomeSummaryParser {
    fn format_name(&self) -> &str {
        "kchooser_genome_summary"
    }

    fn can_parse(&self, file_name: &str) -> bool {
        file_name.starts_with("Kchooser") && file_name.ends_with(".report")
    }

    fn parse_text(&self, source: &str, text: &str) -> ReportRecord {
        let shortest = SHORTEST_GENOME.captures(text);

        ReportRecord::GenomeSummary(GenomeSummary {
            total_genomes: capture_u64(
                source,
                "Total Genomes",
                first_capture(&GENOME_COUNT, text).as_deref(),
            ),
            median_genome: first_capture(&MEDIAN_GENOME, text),
            median_genome_length: capture_u64(
                source,
                "Median Genome Length",
                first_capture(&MEDIAN_LENGTH, text).as_deref(),
            ),
            shortest_genome: shortest
                .as_ref()
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
            shortest_genome_length: capture_u64(
                source,
                "Shortest Genome Length",
                shortest.as_ref().and_then(|c| c.get(2)).map(|m| m.as_str()),
            ),
        })
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Optimum k-mer size.
pub struct OptimumKParser;

impl ReportParser for OptimumKParser {
    fn format_name(&self) -> &str {
        "kchooser_optimum_k"
    }

    fn can_parse(&self, file_name: &str) -> bool {
        GenomeSummaryParser.can_parse(file_name)
    }

    fn parse_text(&self, _source: &str, text: &str) -> ReportRecord {
        ReportRecord::OptimumK(OptimumK { k: parse_optimum_k(text) })
    }
}

/// First `The optimum value of k is N` in the report, line by line.
pub fn parse_optimum_k(text: &str) -> Option<u32> {
    text.lines()
        .find_map(|line| OPTIMUM_K.captures(line))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
There were 12 genomes
The median length genome was 1280.5001
Its length is 2821361
The shortest genomes is 1280.4999 its length is 2750112
The optimum value of k is 19
";

    #[test]
    fn test_full_genome_summary() {
        let record = GenomeSummaryParser.parse_text("report", REPORT);
        assert_eq!(
            record,
            ReportRecord::GenomeSummary(GenomeSummary {
                total_genomes: Some(12),
                median_genome: Some("1280.5001".into()),
                median_genome_length: Some(2821361),
                shortest_genome: Some("1280.4999".into()),
                shortest_genome_length: Some(2750112),
            })
        );
    }

    #[test]
    fn test_partial_genome_summary() {
        let record = GenomeSummaryParser.parse_text("report", "There were 12 genomes");
        assert_eq!(
            record,
            ReportRecord::GenomeSummary(GenomeSummary {
                total_genomes: Some(12),
                ..Default::default()
            })
        );
        assert_eq!(record.missing_fields().len(), 4);
    }

    #[test]
    fn test_optimum_k() {
        assert_eq!(parse_optimum_k(REPORT), Some(19));
        assert_eq!(
            OptimumKParser.parse_text("report", REPORT),
            ReportRecord::OptimumK(OptimumK { k: Some(19) })
        );
    }

    #[test]
    fn test_optimum_k_not_found() {
        assert_eq!(parse_optimum_k("There were 12 genomes\n"), None);
        assert_eq!(parse_optimum_k(""), None);
        assert_eq!(
            OptimumKParser.parse_text("report", "nothing"),
            ReportRecord::OptimumK(OptimumK { k: None })
        );
    }

    #[test]
    fn test_can_parse() {
        assert!(GenomeSummaryParser.can_parse(KCHOOSER_REPORT_NAME));
        assert!(!GenomeSummaryParser.can_parse("COUNT_SNPs"));
    }
}
