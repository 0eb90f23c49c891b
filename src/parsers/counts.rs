//! Parser for kSNP4 `COUNT_*` files.
//!
//! Format: one `key: value` pair per line, blank lines skipped. Each line is
//! split on the first `": "`; values are integers. One record per file.

use super::ReportParser;
use crate::naming::first_token;
use crate::store::{CountRecord, ReportRecord};

pub struct CountFileParser;

impl ReportParser for CountFileParser {
    fn format_name(&self) -> &str {
        "count_file"
    }

    fn can_parse(&self, file_name: &str) -> bool {
        first_token(file_name) == "COUNT"
    }

    fn parse_text(&self, source: &str, text: &str) -> ReportRecord {
        let mut record = CountRecord::default();

        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(": ") else {
                log::warn!("{}:{}: no 'key: value' separator, skipping", source, i + 1);
                continue;
            };
            match value.trim().parse::<i64>() {
                Ok(v) => {
                    record.values.insert(key.trim().to_string(), v);
                }
                Err(_) => {
                    log::warn!(
                        "{}:{}: '{}' is not an integer count for '{}', skipping",
                        source,
                        i + 1,
                        value.trim(),
                        key.trim()
                    );
                }
            }
        }

        ReportRecord::Counts(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(record: ReportRecord) -> Vec<(String, i64)> {
        match record {
            ReportRecord::Counts(c) => c.values.into_iter().collect(),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_parse_count_file() {
        let text = "Number core SNPs: 1520\n\nNumber non-core SNPs: 48211\nNumber SNPs in at least a fraction 0.5 of genomes: 30117\n";
        let parsed = values(CountFileParser.parse_text("COUNT_coreSNPs", text));
        assert_eq!(
            parsed,
            vec![
                ("Number core SNPs".to_string(), 1520),
                ("Number non-core SNPs".to_string(), 48211),
                ("Number SNPs in at least a fraction 0.5 of genomes".to_string(), 30117),
            ]
        );
    }

    #[test]
    fn test_split_on_first_separator_only() {
        let parsed = values(CountFileParser.parse_text("COUNT_x", "a: b: 3\nNumber_SNPs: 12\n"));
        // "b: 3" is not an integer, so only the second line survives
        assert_eq!(parsed, vec![("Number_SNPs".to_string(), 12)]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let parsed = values(CountFileParser.parse_text("COUNT_x", "garbage\nNumber_SNPs:  7 \n"));
        assert_eq!(parsed, vec![("Number_SNPs".to_string(), 7)]);
    }

    #[test]
    fn test_empty_file_gives_empty_record() {
        assert!(values(CountFileParser.parse_text("COUNT_x", "")).is_empty());
    }

    #[test]
    fn test_can_parse() {
        assert!(CountFileParser.can_parse("COUNT_Homoplastic_SNPs.SNPs_all.ML"));
        assert!(!CountFileParser.can_parse("COUNTS_x"));
        assert!(!CountFileParser.can_parse("Node_SNP_counts"));
    }
}
