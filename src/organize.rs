//! Output routing
//!
//! Copies a flat kSNP4 work directory into the structured output hierarchy:
//! one pass over the work directory driven by [`classify`], then a second pass
//! over the relabelled trees in `clean_trees`. Sources are never moved or
//! removed, and directories are created only when something lands in them.
//!
//! Tree layout: phyloXML lands in `<Type>/Trees/` and Newick in
//! `<Type>/Trees/Newick_Files/`. The legacy service layout put phyloXML
//! directly in `<Type>/` and Newick in `<Type>/Newick_Files/`; consumers
//! reading that layout need the extra `Trees/` level.

use crate::classify::{classify, classify_tree, Artifact, Placement, TreeFormat};
use crate::errors::PipelineError;
use crate::naming::OutputType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the tree subdirectory inside the work directory.
pub const CLEAN_TREES_DIR: &str = "clean_trees";

/// What a routing run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Regular files seen in the work directory
    pub scanned: usize,
    /// Copies made (an artifact in two categories counts twice)
    pub copied: usize,
    /// Files no rule recognized
    pub ignored: Vec<String>,
    /// Copies that failed, with the reason
    pub failed: Vec<String>,
    /// Tree files copied by the tree pass
    pub trees_copied: usize,
    /// Tree files left behind because their format or SNP set is unknown
    pub unknown_trees: Vec<String>,
    /// True when `clean_trees` was missing and the tree pass did not run
    pub tree_pass_skipped: bool,
}

impl std::fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Routed {} files: {} copies, {} trees, {} ignored, {} failed, {} unknown trees",
            self.scanned,
            self.copied,
            self.trees_copied,
            self.ignored.len(),
            self.failed.len(),
            self.unknown_trees.len()
        )?;
        if self.tree_pass_skipped {
            write!(f, " (tree pass skipped)")?;
        }
        Ok(())
    }
}

/// Routes one work directory into one destination root.
#[derive(Debug, Clone)]
pub struct OutputRouter {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub clean_trees_dir: PathBuf,
}

impl OutputRouter {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        let clean_trees_dir = source_dir.join(CLEAN_TREES_DIR);
        Self {
            source_dir,
            dest_dir: dest_dir.into(),
            clean_trees_dir,
        }
    }

    pub fn with_clean_trees_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.clean_trees_dir = dir.into();
        self
    }

    /// Run both passes.
    ///
    /// Fails with [`PipelineError::MissingInput`] only when the work directory
    /// itself is absent. A missing `clean_trees` skips the tree pass.
    pub fn route(&self) -> Result<RouteSummary> {
        if !self.source_dir.is_dir() {
            return Err(PipelineError::missing("Work directory", &self.source_dir).into());
        }

        let mut summary = RouteSummary::default();
        self.route_artifacts(&mut summary)?;
        self.route_trees(&mut summary)?;

        log::info!("{}", summary);
        Ok(summary)
    }

    fn route_artifacts(&self, summary: &mut RouteSummary) -> Result<()> {
        for path in sorted_entries(&self.source_dir)? {
            let artifact = match Artifact::from_path(&path) {
                Ok(a) => a,
                Err(e) => {
                    log::warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };
            if !artifact.is_regular_file {
                continue;
            }
            summary.scanned += 1;

            let placements = classify(&artifact);
            if placements.is_empty() {
                log::debug!("No rule for {}, skipping", artifact.name);
                summary.ignored.push(artifact.name);
                continue;
            }

            for placement in placements {
                self.copy_placed(&path, &placement, summary);
            }
        }
        Ok(())
    }

    fn route_trees(&self, summary: &mut RouteSummary) -> Result<()> {
        if !self.clean_trees_dir.is_dir() {
            log::warn!(
                "{}",
                PipelineError::missing("Clean tree directory", &self.clean_trees_dir)
            );
            summary.tree_pass_skipped = true;
            return Ok(());
        }

        for path in sorted_entries(&self.clean_trees_dir)? {
            let artifact = match Artifact::from_path(&path) {
                Ok(a) if a.is_regular_file => a,
                _ => continue,
            };

            match classify_tree(&artifact) {
                Some(placement) => {
                    if self.copy_placed(&path, &placement, summary) {
                        summary.trees_copied += 1;
                    }
                }
                None => {
                    let reason = if TreeFormat::from_extension(&artifact.extension).is_none() {
                        "unrecognized tree format"
                    } else if OutputType::infer(&artifact.name).is_none() {
                        "unknown SNP set"
                    } else {
                        "unroutable"
                    };
                    log::warn!(
                        "UNKNOWN TREE not uploaded in output dir ({}): {}",
                        reason,
                        path.display()
                    );
                    summary.unknown_trees.push(artifact.name);
                }
            }
        }
        Ok(())
    }

    /// Copy `path` into the placement's directory; failures are recorded, not raised.
    fn copy_placed(&self, path: &Path, placement: &Placement, summary: &mut RouteSummary) -> bool {
        let dir = self.dest_dir.join(placement.relative_dir());
        match copy_into(path, &dir) {
            Ok(target) => {
                log::debug!("Copied {} -> {}", path.display(), target.display());
                summary.copied += 1;
                true
            }
            Err(e) => {
                log::error!("{:#}", e);
                summary.failed.push(format!("{}: {:#}", path.display(), e));
                false
            }
        }
    }
}

/// Route `source_dir` into `dest_dir` using the default `clean_trees` location.
#[cfg(test)]
pub fn route(source_dir: &Path, dest_dir: &Path) -> Result<RouteSummary> {
    OutputRouter::new(source_dir, dest_dir).route()
}

/// Copy a file into `dir` under its own name, creating `dir` if needed.
pub fn copy_into(path: &Path, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let name = path
        .file_name()
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let target = dir.join(name);
    fs::copy(path, &target)
        .with_context(|| format!("Failed to copy {} to {}", path.display(), target.display()))?;
    Ok(target)
}

/// Entries of `dir`, sorted by path.
pub fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::is_missing_input;

    fn touch(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_route_builds_category_tree() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let w = work.path();

        touch(w, "core_SNPs_matrix.fasta", ">a\nACGT\n");
        touch(w, "nonCore_SNPs_matrix.fasta", ">a\nACGT\n");
        touch(w, "COUNT_SNPs", "Number_SNPs: 10\n");
        touch(w, "annotate_list", "");
        touch(w, "ClusterInfo.core_SNPs.ML", "x");
        touch(w, "VCF.SNPs_all.ref.vcf", "##fileformat=VCFv4.2\n");
        touch(w, "SNPs_in_majority0.5", "x");
        touch(w, "kSNP4.log", "x");
        fs::create_dir(w.join("subdir")).unwrap();

        let summary = route(w, out.path()).unwrap();
        let o = out.path();

        assert_eq!(summary.scanned, 8);
        assert!(o.join("Core_SNPs/core_SNPs_matrix.fasta").is_file());
        assert!(o.join("Core_SNPs/nonCore_SNPs_matrix.fasta").is_file());
        assert!(o.join("All_SNPs/nonCore_SNPs_matrix.fasta").is_file());
        assert!(o.join("Intermediate_Files/COUNT_SNPs").is_file());
        assert!(o.join("Core_SNPs/Cluster_Information/ClusterInfo.core_SNPs.ML").is_file());
        assert!(o.join("VCFs/VCF.SNPs_all.ref.vcf").is_file());
        assert!(o.join("Majority_SNPs/SNPs_in_majority0.5").is_file());

        // zero-byte annotate file is not routed
        assert!(!o.join("Intermediate_Files/annotate_list").exists());
        assert!(summary.ignored.contains(&"annotate_list".to_string()));
        assert!(summary.ignored.contains(&"kSNP4.log".to_string()));

        // sources are untouched
        assert!(w.join("core_SNPs_matrix.fasta").is_file());
        assert!(summary.tree_pass_skipped);
    }

    #[test]
    fn test_route_tree_pass() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let trees = work.path().join(CLEAN_TREES_DIR);
        fs::create_dir(&trees).unwrap();

        touch(&trees, "tree.core_SNPs.ML.phyloxml", "<phyloxml/>");
        touch(&trees, "tree.SNPs_all.NJ.tre", "(a,b);");
        touch(&trees, "tree.SNPs_all.NJ.log", "x");
        touch(&trees, "tree.parsimony.tre", "(a,b);");

        let summary = route(work.path(), out.path()).unwrap();
        let o = out.path();

        assert!(o.join("Core_SNPs/Trees/tree.core_SNPs.ML.phyloxml").is_file());
        assert!(o.join("All_SNPs/Trees/Newick_Files/tree.SNPs_all.NJ.tre").is_file());
        assert_eq!(summary.trees_copied, 2);
        assert_eq!(
            summary.unknown_trees,
            vec!["tree.SNPs_all.NJ.log".to_string(), "tree.parsimony.tre".to_string()]
        );
        assert!(!summary.tree_pass_skipped);
        // the tree directory itself is not a regular file in the first pass
        assert_eq!(summary.scanned, 0);
    }

    #[test]
    fn test_summary_counts_unknown_trees_apart_from_failures() {
        let summary = RouteSummary {
            scanned: 3,
            copied: 4,
            ignored: vec!["kSNP4.log".into()],
            failed: vec![],
            trees_copied: 1,
            unknown_trees: vec!["tree.parsimony.tre".into(), "tree.x.log".into()],
            tree_pass_skipped: false,
        };
        assert_eq!(
            summary.to_string(),
            "Routed 3 files: 4 copies, 1 trees, 1 ignored, 0 failed, 2 unknown trees"
        );

        let skipped = RouteSummary { tree_pass_skipped: true, ..Default::default() };
        assert!(skipped.to_string().ends_with("0 failed, 0 unknown trees (tree pass skipped)"));
    }

    #[test]
    fn test_route_missing_source_is_reported() {
        let out = tempfile::tempdir().unwrap();
        let err = route(Path::new("/definitely/not/here"), out.path()).unwrap_err();
        assert!(is_missing_input(&err));
        // nothing was created
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directories_created_on_demand_only() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        touch(work.path(), "VCF_x.vcf", "x");

        route(work.path(), out.path()).unwrap();
        let dirs: Vec<String> = fs::read_dir(out.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(dirs, vec!["VCFs".to_string()]);
    }

    #[test]
    fn test_custom_clean_trees_dir() {
        let work = tempfile::tempdir().unwrap();
        let trees = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        touch(trees.path(), "tree.majority0.5.ML.tre", "(a,b);");

        let summary = OutputRouter::new(work.path(), out.path())
            .with_clean_trees_dir(trees.path())
            .route()
            .unwrap();
        assert_eq!(summary.trees_copied, 1);
        assert!(out
            .path()
            .join("Majority_SNPs/Trees/Newick_Files/tree.majority0.5.ML.tre")
            .is_file());
    }
}
