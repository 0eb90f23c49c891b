//! Artifact classification
//!
//! Maps one kSNP4 output file to the output folders it belongs in. This is a
//! multi-label classification: every rule in [`RULES`] is evaluated, and each
//! one that fires contributes a placement. Files no rule recognizes get an
//! empty set and are ignored by the router.

use crate::naming::{first_token, split_ext, OutputType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file produced by the upstream SNP pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub size_bytes: u64,
    pub is_regular_file: bool,
    /// Extension with its leading dot, empty if none
    pub extension: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        let name = name.into();
        let extension = split_ext(&name).1.to_string();
        Self {
            name,
            size_bytes,
            is_regular_file: true,
            extension,
        }
    }

    /// Build from a path on disk (symlinks are followed).
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut artifact = Artifact::new(name, meta.len());
        artifact.is_regular_file = meta.is_file();
        Ok(artifact)
    }

    pub fn first_token(&self) -> &str {
        first_token(&self.name)
    }
}

/// Output folders an artifact can be copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationCategory {
    AllSnps,
    CoreSnps,
    MajoritySnps,
    ClusterInformation,
    Homoplasy,
    Trees,
    NewickFiles,
    Vcfs,
    IntermediateFiles,
}

/// Where one copy of an artifact lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub category: DestinationCategory,
    /// SNP set scoping the category, when the category is scoped at all
    pub output_type: Option<OutputType>,
}

impl Placement {
    pub fn new(category: DestinationCategory) -> Self {
        Self { category, output_type: None }
    }

    pub fn scoped(category: DestinationCategory, output_type: Option<OutputType>) -> Self {
        Self { category, output_type }
    }

    /// Directory relative to the destination root.
    ///
    /// Scoped categories without a known output type fall back to the root.
    /// Trees nest under `<Type>/Trees/`, with Newick one level deeper in
    /// `Newick_Files/`, rather than the legacy `<Type>/` and `<Type>/Newick_Files/`.
    pub fn relative_dir(&self) -> PathBuf {
        let scope = || -> PathBuf {
            self.output_type
                .map(|t| PathBuf::from(t.dir_name()))
                .unwrap_or_default()
        };
        match self.category {
            DestinationCategory::AllSnps => PathBuf::from("All_SNPs"),
            DestinationCategory::CoreSnps => PathBuf::from("Core_SNPs"),
            DestinationCategory::MajoritySnps => PathBuf::from("Majority_SNPs"),
            DestinationCategory::ClusterInformation => scope().join("Cluster_Information"),
            DestinationCategory::Homoplasy => scope().join("Homoplasy"),
            DestinationCategory::Trees => scope().join("Trees"),
            DestinationCategory::NewickFiles => scope().join("Trees").join("Newick_Files"),
            DestinationCategory::Vcfs => PathBuf::from("VCFs"),
            DestinationCategory::IntermediateFiles => PathBuf::from("Intermediate_Files"),
        }
    }
}

/// One row of the routing table.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Artifact) -> bool,
    pub place: fn(&Artifact) -> Placement,
}

/// Length of `SNPs_in_majority0.N`
const MAJORITY_FIXED_LEN: usize = 19;
const MAJORITY_FIXED_PREFIX: &str = "SNPs_in_majority0.";

/// Routing table, in priority order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "all_snps",
        matches: |a| matches!(a.first_token(), "All" | "nonCore") || a.name.starts_with("SNPs_all"),
        place: |_| Placement::new(DestinationCategory::AllSnps),
    },
    Rule {
        // zero-byte annotate files are dropped
        name: "annotations",
        matches: |a| a.first_token() == "annotate" && a.size_bytes > 0,
        place: |_| Placement::new(DestinationCategory::IntermediateFiles),
    },
    Rule {
        name: "cluster_information",
        matches: |a| matches!(a.first_token(), "ClusterInfo.SNPs" | "ClusterInfo.core"),
        place: |a| Placement::scoped(DestinationCategory::ClusterInformation, OutputType::infer(&a.name)),
    },
    Rule {
        name: "core_snps",
        matches: |a| matches!(a.first_token(), "core" | "nonCore"),
        place: |_| Placement::new(DestinationCategory::CoreSnps),
    },
    Rule {
        name: "intermediate",
        matches: |a| matches!(a.first_token(), "COUNT" | "tip" | "Node" | "NJ.dist.matrix"),
        place: |_| Placement::new(DestinationCategory::IntermediateFiles),
    },
    Rule {
        name: "homoplasy",
        matches: |a| a.first_token() == "Homoplasy",
        place: |a| Placement::scoped(DestinationCategory::Homoplasy, OutputType::infer(&a.name)),
    },
    Rule {
        name: "majority_snps",
        matches: |a| {
            (a.name.contains("SNPs_in_majority") && a.name.contains("matrix"))
                || is_fixed_majority_name(&a.name)
        },
        place: |_| Placement::new(DestinationCategory::MajoritySnps),
    },
    Rule {
        name: "vcfs",
        matches: |a| a.first_token().starts_with("VCF"),
        place: |_| Placement::new(DestinationCategory::Vcfs),
    },
];

/// Exactly `SNPs_in_majority0.<digit>`; longer variants do not match.
pub fn is_fixed_majority_name(name: &str) -> bool {
    name.len() == MAJORITY_FIXED_LEN
        && name.starts_with(MAJORITY_FIXED_PREFIX)
        && name.as_bytes()[MAJORITY_FIXED_LEN - 1].is_ascii_digit()
}

/// Every placement the routing table assigns to `artifact`, in rule order.
pub fn classify(artifact: &Artifact) -> Vec<Placement> {
    let mut placements = Vec::new();
    for rule in RULES {
        if (rule.matches)(artifact) {
            let placement = (rule.place)(artifact);
            log::debug!("{}: rule '{}' -> {:?}", artifact.name, rule.name, placement.category);
            if !placements.contains(&placement) {
                placements.push(placement);
            }
        }
    }
    placements
}

/// Tree file formats recognized by the tree pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeFormat {
    PhyloXml,
    Newick,
}

impl TreeFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".phyloxml" => Some(TreeFormat::PhyloXml),
            ".tre" | ".nwk" | ".newick" => Some(TreeFormat::Newick),
            _ => None,
        }
    }
}

/// Placement of a tree file from `clean_trees`, or `None` when its format or
/// SNP set cannot be determined.
pub fn classify_tree(artifact: &Artifact) -> Option<Placement> {
    let format = TreeFormat::from_extension(&artifact.extension)?;
    let output_type = OutputType::infer(&artifact.name)?;
    let category = match format {
        TreeFormat::PhyloXml => DestinationCategory::Trees,
        TreeFormat::Newick => DestinationCategory::NewickFiles,
    };
    Some(Placement::scoped(category, Some(output_type)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(name: &str, size: u64) -> Vec<DestinationCategory> {
        classify(&Artifact::new(name, size)).into_iter().map(|p| p.category).collect()
    }

    #[test]
    fn test_core_summary_goes_to_core_only() {
        assert_eq!(categories("core_snp_summary.txt", 10), vec![DestinationCategory::CoreSnps]);
    }

    #[test]
    fn test_vcf_prefix() {
        assert_eq!(categories("VCFcalls_run1.vcf", 10), vec![DestinationCategory::Vcfs]);
        assert_eq!(categories("VCF.SNPs_all.ref.vcf", 10), vec![DestinationCategory::Vcfs]);
    }

    #[test]
    fn test_fixed_length_majority() {
        assert_eq!(categories("SNPs_in_majority0.5", 10), vec![DestinationCategory::MajoritySnps]);
        assert!(categories("SNPs_in_majority0.55", 10).is_empty());
        assert!(categories("SNPs_in_majority0.x", 10).is_empty());
        assert_eq!(
            categories("SNP_matrix.SNPs_in_majority0.5.fasta", 10),
            vec![DestinationCategory::MajoritySnps]
        );
    }

    #[test]
    fn test_noncore_lands_in_two_categories() {
        assert_eq!(
            categories("nonCore_SNPs_matrix.fasta", 10),
            vec![DestinationCategory::AllSnps, DestinationCategory::CoreSnps]
        );
    }

    #[test]
    fn test_all_snps_prefix_and_token() {
        assert_eq!(categories("SNPs_all", 10), vec![DestinationCategory::AllSnps]);
        assert_eq!(categories("All_SNPs_annotated.html", 10), vec![DestinationCategory::AllSnps]);
    }

    #[test]
    fn test_zero_byte_annotate_is_dropped() {
        assert!(categories("annotate_list", 0).is_empty());
        assert_eq!(categories("annotate_list", 1), vec![DestinationCategory::IntermediateFiles]);
    }

    #[test]
    fn test_intermediate_tokens() {
        for name in ["COUNT_SNPs", "tip_alleles", "Node_SNP_counts", "NJ.dist.matrix"] {
            assert_eq!(categories(name, 1), vec![DestinationCategory::IntermediateFiles], "{}", name);
        }
    }

    #[test]
    fn test_scoped_categories_carry_output_type() {
        let placements = classify(&Artifact::new("ClusterInfo.core_SNPs.parsimony", 5));
        assert_eq!(
            placements,
            vec![Placement::scoped(DestinationCategory::ClusterInformation, Some(OutputType::Core))]
        );
        assert_eq!(placements[0].relative_dir(), PathBuf::from("Core_SNPs/Cluster_Information"));

        let placements = classify(&Artifact::new("Homoplasy_groups.SNPs_all.ML", 5));
        assert_eq!(placements[0].output_type, Some(OutputType::All));
        assert_eq!(placements[0].relative_dir(), PathBuf::from("All_SNPs/Homoplasy"));
    }

    #[test]
    fn test_unscoped_homoplasy_falls_back_to_root() {
        let placements = classify(&Artifact::new("Homoplasy_groups", 5));
        assert_eq!(placements[0].output_type, None);
        assert_eq!(placements[0].relative_dir(), PathBuf::from("Homoplasy"));
    }

    #[test]
    fn test_classify_is_total() {
        for name in ["", "_", "random.txt", "tree.SNPs_all.ML.tre", "\u{1F600}", "SNPs_in_majority"] {
            let _ = classify(&Artifact::new(name, 0));
        }
        assert!(categories("random.txt", 100).is_empty());
        // trees are handled by the tree pass only
        assert!(categories("tree.SNPs_all.ML.tre", 100).is_empty());
    }

    #[test]
    fn test_classify_tree() {
        let xml = classify_tree(&Artifact::new("tree.core_SNPs.ML.phyloxml", 5)).unwrap();
        assert_eq!(xml.relative_dir(), PathBuf::from("Core_SNPs/Trees"));

        let nwk = classify_tree(&Artifact::new("tree.SNPs_all.NJ.tre", 5)).unwrap();
        assert_eq!(nwk.relative_dir(), PathBuf::from("All_SNPs/Trees/Newick_Files"));

        assert!(classify_tree(&Artifact::new("tree.SNPs_all.NJ.log", 5)).is_none());
        assert!(classify_tree(&Artifact::new("tree.parsimony.tre", 5)).is_none());
    }
}
