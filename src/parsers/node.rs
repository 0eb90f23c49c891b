//! Parser for `Node_*` files (`node: <id>`, `NumberTargets: N`, `NumberSNPs: N`).

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture_u64, ReportParser};
use crate::naming::first_token;
use crate::store::{NodeSummary, ReportRecord};

static NODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"node:\s+(\S+)").expect("valid regex"));
static TARGETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"NumberTargets:\s+(\d+)").expect("valid regex"));
static SNPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"NumberSNPs:\s+(\d+)").expect("valid regex"));

pub struct NodeFileParser;

impl ReportParser for NodeFileParser {
    fn format_name(&self) -> &str {
        "node_file"
    }

    fn can_parse(&self, file_name: &str) -> bool {
        first_token(file_name) == "Node"
    }

    fn parse_text(&self, source: &str, text: &str) -> ReportRecord {
        let group = |re: &Lazy<Regex>| re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str());

        ReportRecord::NodeSummary(NodeSummary {
            node: group(&NODE).map(str::to_string),
            number_targets: capture_u64(source, "NumberTargets", group(&TARGETS)),
            number_snps: capture_u64(source, "NumberSNPs", group(&SNPS)),
        })
    }
}
