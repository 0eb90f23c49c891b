//! Input preparation steps: clean FASTA filenames and relabelled trees.

use crate::errors::PipelineError;
use crate::naming::{first_token, Sanitizer};
use crate::newick::relabel_newick;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// One input copied into the clean directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedFile {
    /// 1-based position in the sorted source listing
    pub index: usize,
    pub original: String,
    pub cleaned: String,
}

/// Copy every file in `raw_dir` into `clean_dir` under its sanitized name.
///
/// Indices are assigned over the sorted listing of `raw_dir`, so they are
/// stable across runs on the same input.
pub fn clean_fasta_filenames(
    raw_dir: &Path,
    clean_dir: &Path,
    sanitizer: &Sanitizer,
) -> Result<Vec<CleanedFile>> {
    if !raw_dir.is_dir() {
        return Err(PipelineError::missing("Raw FASTA directory", raw_dir).into());
    }
    fs::create_dir_all(clean_dir)
        .with_context(|| format!("Failed to create directory: {}", clean_dir.display()))?;

    let mut entries: Vec<(OsString, PathBuf)> = fs::read_dir(raw_dir)
        .with_context(|| format!("Failed to read directory: {}", raw_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| (e.file_name(), e.path()))
        .collect();
    entries.sort();

    let mut cleaned = Vec::with_capacity(entries.len());
    let mut produced: HashSet<String> = HashSet::new();

    for (i, (file_name, original_path)) in entries.into_iter().enumerate() {
        let index = i + 1;
        if !original_path.is_file() {
            continue;
        }
        // Undecodable bytes become U+FFFD here and `_` after sanitizing
        let name = file_name.to_string_lossy().into_owned();

        let new_name = sanitizer.sanitize(&name, Some(index));
        if !produced.insert(new_name.clone()) {
            log::warn!("{} collides with an earlier input after cleaning ({})", name, new_name);
        }

        if new_name != name {
            log::info!("Renaming and copying: {} -> {}", name, new_name);
        } else {
            log::info!("Copying: {}", name);
        }
        let target = clean_dir.join(&new_name);
        fs::copy(&original_path, &target).with_context(|| {
            format!("Failed to copy {} to {}", original_path.display(), target.display())
        })?;

        cleaned.push(CleanedFile {
            index,
            original: name,
            cleaned: new_name,
        });
    }

    Ok(cleaned)
}

/// True for kSNP4 tree outputs (`tree.SNPs_all.ML.tre`, `tree.core_SNPs...`).
pub fn is_tree_file(name: &str) -> bool {
    let token = first_token(name);
    token == "tree" || token.starts_with("tree.")
}

/// Relabel every tree in `work_dir` into `clean_trees_dir`, returning the
/// written paths. Empty or unreadable tree files are reported and skipped.
pub fn prepare_trees(work_dir: &Path, clean_trees_dir: &Path) -> Result<Vec<PathBuf>> {
    if !work_dir.is_dir() {
        return Err(PipelineError::missing("Work directory", work_dir).into());
    }

    let mut written = Vec::new();
    for path in crate::organize::sorted_entries(work_dir)? {
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().map(|n| n.to_os_string()) else {
            continue;
        };
        if !is_tree_file(&file_name.to_string_lossy()) {
            continue;
        }

        log::info!("Reverting genome IDs {}", path.display());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Cannot read tree {}, skipping: {}", path.display(), e);
                continue;
            }
        };
        if text.trim().is_empty() {
            log::warn!(
                "{} is empty... cannot edit genome ids for phyloxml",
                path.display()
            );
            continue;
        }

        fs::create_dir_all(clean_trees_dir).with_context(|| {
            format!("Failed to create directory: {}", clean_trees_dir.display())
        })?;
        let target = clean_trees_dir.join(&file_name);
        fs::write(&target, relabel_newick(&text))
            .with_context(|| format!("Failed to write tree: {}", target.display()))?;
        written.push(target);
    }

    log::info!("Prepared {} tree files in {}", written.len(), clean_trees_dir.display());
    Ok(written)
}
