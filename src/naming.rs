//! Filename conventions shared by the sanitizer, the classifier and the tree pass.
//!
//! kSNP4 treats every `.` in an input name as a field delimiter and wants
//! exactly one extension separator; chewBBACA wants a unique prefix. Both
//! reject anything outside `[A-Za-z0-9_-]`.

use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};

/// Analysis type that selects [`SanitizeMode::Dotted`].
pub const WHOLE_GENOME_SNP_ANALYSIS: &str = "Whole Genome SNP Analysis";
/// Analysis type that selects [`SanitizeMode::Prefixed`].
pub const CHEWBBACA_ANALYSIS: &str = "chewbbaca";

/// Default extension forced onto every kSNP4 input.
pub const DEFAULT_FASTA_EXTENSION: &str = ".fasta";

/// How input filenames are normalized before the external tool sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeMode {
    /// `{index}_{stem}{ext}`: uniqueness comes from the listing index.
    Prefixed,
    /// `{stem with dots as underscores}{canonical ext}`: a single `.` survives.
    Dotted,
}

impl SanitizeMode {
    pub fn from_analysis_type(analysis_type: &str) -> Result<Self, PipelineError> {
        match analysis_type {
            WHOLE_GENOME_SNP_ANALYSIS => Ok(SanitizeMode::Dotted),
            CHEWBBACA_ANALYSIS => Ok(SanitizeMode::Prefixed),
            other => Err(PipelineError::UnknownAnalysisType(other.to_string())),
        }
    }
}

/// Filename normalizer for one invocation.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    pub mode: SanitizeMode,
    /// Extension (with leading dot) enforced in dotted mode
    pub fasta_extension: String,
}

impl Sanitizer {
    pub fn new(mode: SanitizeMode) -> Self {
        Self {
            mode,
            fasta_extension: DEFAULT_FASTA_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.fasta_extension = extension.into();
        self
    }

    /// Normalize `filename`.
    ///
    /// `index` is the 1-based position of the file in the sorted source
    /// listing; only prefixed mode uses it. A name made only of illegal
    /// characters comes back as underscores.
    pub fn sanitize(&self, filename: &str, index: Option<usize>) -> String {
        match self.mode {
            SanitizeMode::Prefixed => {
                let (stem, ext) = split_ext(filename);
                let stem = replace_illegal(stem);
                match index {
                    Some(i) => format!("{}_{}{}", i, stem, ext),
                    None => format!("{}{}", stem, ext),
                }
            }
            SanitizeMode::Dotted => {
                let (stem, ext) = split_ext(filename);
                if ext == self.fasta_extension {
                    format!("{}{}", dotted_stem(stem), ext)
                } else {
                    // Names from the API often lack the extension: append it and split again
                    let coerced = format!("{}{}", filename, self.fasta_extension);
                    let (stem, ext) = split_ext(&coerced);
                    format!("{}{}", dotted_stem(stem), ext)
                }
            }
        }
    }
}

fn dotted_stem(stem: &str) -> String {
    replace_illegal(&stem.replace('.', "_"))
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn replace_illegal(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Split a filename into `(stem, ext)` where `ext` keeps its leading dot.
///
/// Leading dots never start an extension, so `.profile` has none.
pub fn split_ext(name: &str) -> (&str, &str) {
    let Some(dot) = name.rfind('.') else {
        return (name, "");
    };
    if name[..dot].bytes().all(|b| b == b'.') {
        return (name, "");
    }
    name.split_at(dot)
}

/// Substring of `name` before its first underscore (the whole name if none).
pub fn first_token(name: &str) -> &str {
    match name.find('_') {
        Some(i) => &name[..i],
        None => name,
    }
}

/// Coarse SNP set a kSNP4 output belongs to, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputType {
    Core,
    Majority,
    All,
}

impl OutputType {
    /// Infer from substrings. `None` means unknown; callers decide what that implies.
    pub fn infer(name: &str) -> Option<Self> {
        if name.contains("core_SNPs") || name.contains("Core_SNPs") {
            Some(OutputType::Core)
        } else if name.contains("majority") {
            Some(OutputType::Majority)
        } else if name.contains("SNPs_all") {
            Some(OutputType::All)
        } else {
            None
        }
    }

    /// Top-level output directory for this SNP set.
    pub fn dir_name(&self) -> &'static str {
        match self {
            OutputType::Core => "Core_SNPs",
            OutputType::Majority => "Majority_SNPs",
            OutputType::All => "All_SNPs",
        }
    }
}
