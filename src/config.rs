//! Configuration parsing for snp-organizer
//!
//! The service hands each step a job config with the four data directories
//! and the analysis parameters. JSON (as written by the service) and YAML are
//! both accepted, chosen by file extension.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aggregate::AggregationInputs;
use crate::naming::{SanitizeMode, Sanitizer, DEFAULT_FASTA_EXTENSION};
use crate::organize::CLEAN_TREES_DIR;
use crate::parsers::KCHOOSER_REPORT_NAME;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Uploaded, unmodified FASTA files
    pub raw_fasta_dir: PathBuf,

    /// FASTA files with sanitized names; also holds the Kchooser report
    pub clean_data_dir: PathBuf,

    /// kSNP4 working directory
    pub work_data_dir: PathBuf,

    /// Root of the structured output hierarchy
    pub output_data_dir: PathBuf,

    pub params: Params,

    /// Kchooser genome statistics report (default: inside `clean_data_dir`)
    #[serde(default)]
    pub kchooser_report: Option<PathBuf>,

    /// Report holding the optimum k verdict (default: the Kchooser report)
    #[serde(default)]
    pub optimum_k_report: Option<PathBuf>,

    /// Relabelled tree directory (default: `<work_data_dir>/clean_trees`)
    #[serde(default)]
    pub clean_trees_dir: Option<PathBuf>,

    #[serde(default = "default_fasta_extension")]
    pub fasta_extension: String,
}

/// Analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// "Whole Genome SNP Analysis" or "chewbbaca"
    pub analysis_type: String,
}

fn default_fasta_extension() -> String {
    DEFAULT_FASTA_EXTENSION.to_string()
}

impl ServiceConfig {
    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: ServiceConfig = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration. Directory existence is checked by each step.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("raw_fasta_dir", &self.raw_fasta_dir),
            ("clean_data_dir", &self.clean_data_dir),
            ("work_data_dir", &self.work_data_dir),
            ("output_data_dir", &self.output_data_dir),
        ];
        for (name, dir) in required {
            if dir.as_os_str().is_empty() {
                anyhow::bail!("Config field '{}' must not be empty", name);
            }
        }

        if !self.fasta_extension.starts_with('.') {
            anyhow::bail!(
                "fasta_extension must start with '.': {}",
                self.fasta_extension
            );
        }

        self.sanitize_mode()?;
        Ok(())
    }

    pub fn sanitize_mode(&self) -> Result<SanitizeMode> {
        Ok(SanitizeMode::from_analysis_type(&self.params.analysis_type)?)
    }

    pub fn sanitizer(&self) -> Result<Sanitizer> {
        Ok(Sanitizer::new(self.sanitize_mode()?).with_extension(self.fasta_extension.clone()))
    }

    pub fn kchooser_report(&self) -> PathBuf {
        self.kchooser_report
            .clone()
            .unwrap_or_else(|| self.clean_data_dir.join(KCHOOSER_REPORT_NAME))
    }

    pub fn optimum_k_report(&self) -> PathBuf {
        self.optimum_k_report
            .clone()
            .unwrap_or_else(|| self.kchooser_report())
    }

    pub fn clean_trees_dir(&self) -> PathBuf {
        self.clean_trees_dir
            .clone()
            .unwrap_or_else(|| self.work_data_dir.join(CLEAN_TREES_DIR))
    }

    pub fn aggregation_inputs(&self) -> AggregationInputs {
        AggregationInputs {
            work_dir: self.work_data_dir.clone(),
            kchooser_report: self.kchooser_report(),
            optimum_k_report: self.optimum_k_report(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "raw_fasta_dir": "/data/raw",
        "clean_data_dir": "/data/clean",
        "work_data_dir": "/data/work",
        "output_data_dir": "/data/out",
        "params": {"analysis_type": "Whole Genome SNP Analysis"}
    }"#;

    #[test]
    fn test_parse_json_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, JSON).unwrap();

        let config = ServiceConfig::from_path(&path).unwrap();
        assert_eq!(config.sanitize_mode().unwrap(), SanitizeMode::Dotted);
        assert_eq!(
            config.kchooser_report(),
            PathBuf::from("/data/clean/Kchooser4_ksnp4_input_file.report")
        );
        assert_eq!(config.optimum_k_report(), config.kchooser_report());
        assert_eq!(config.clean_trees_dir(), PathBuf::from("/data/work/clean_trees"));
        assert_eq!(config.fasta_extension, ".fasta");
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
raw_fasta_dir: raw
clean_data_dir: clean
work_data_dir: work
output_data_dir: out
fasta_extension: .fna
clean_trees_dir: trees
params:
  analysis_type: chewbbaca
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, yaml).unwrap();

        let config = ServiceConfig::from_path(&path).unwrap();
        assert_eq!(config.sanitize_mode().unwrap(), SanitizeMode::Prefixed);
        assert_eq!(config.clean_trees_dir(), PathBuf::from("trees"));
        assert_eq!(config.fasta_extension, ".fna");
    }

    #[test]
    fn test_unknown_analysis_type_is_rejected() {
        let mut config: ServiceConfig = serde_json::from_str(JSON).unwrap();
        config.params.analysis_type = "Metagenomics".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Metagenomics"));
    }

    #[test]
    fn test_empty_directory_is_rejected() {
        let mut config: ServiceConfig = serde_json::from_str(JSON).unwrap();
        config.work_data_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
