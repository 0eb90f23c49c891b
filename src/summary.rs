//! Renderer-facing projections over a populated [`ReportStore`].
//!
//! These are the flat views the HTML tables and pie charts consume. Each one
//! reads a handful of well-known sources and tolerates their absence.

use serde::{Deserialize, Serialize};

use crate::parsers::CORE_SNP_COUNT_FILE;
use crate::store::{CoreSnpSummary, GenomeSummary, ReportRecord, ReportStore};

/// Source holding the overall SNP count.
pub const SNP_COUNT_FILE: &str = "COUNT_SNPs";

const HOMOPLASTIC_ALL_PREFIX: &str = "COUNT_Homoplastic_SNPs.SNPs_all.";
const HOMOPLASTIC_CORE_PREFIX: &str = "COUNT_Homoplastic_SNPs.core_SNPs.";
const HOMOPLASTIC_KEY: &str = "Number_Homoplastic_SNPs";

/// The "Identified SNPs" row and its two pie charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedSnps {
    pub core_snps: Option<u64>,
    pub non_core_snps: Option<u64>,
    pub majority_fraction: Option<f64>,
    pub majority_snps: Option<u64>,
    pub total_snps: Option<i64>,
    /// `total_snps - majority_snps`, clamped at zero
    pub non_majority_snps: Option<u64>,
}

/// One method row of a homoplastic SNP table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomoplasticRow {
    pub method: String,
    pub homoplastic_snps: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomoplasticTables {
    pub all_snps: Vec<HomoplasticRow>,
    pub core_snps: Vec<HomoplasticRow>,
}

/// Everything the report renderers need, in one serializable bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub genome_summary: Option<GenomeSummary>,
    pub optimum_k: Option<u32>,
    pub identified_snps: IdentifiedSnps,
    pub homoplastic_snps: HomoplasticTables,
}

impl ReportSummary {
    pub fn from_store(store: &ReportStore) -> Self {
        let optimum_k = store.get(crate::aggregate::OPTIMUM_K_KEY).iter().find_map(|r| match r {
            ReportRecord::OptimumK(k) => k.k,
            _ => None,
        });

        Self {
            genome_summary: genome_summary(store),
            optimum_k,
            identified_snps: identified_snps(store),
            homoplastic_snps: homoplastic_snps(store),
        }
    }
}

/// First genome summary parsed from the Kchooser report.
pub fn genome_summary(store: &ReportStore) -> Option<GenomeSummary> {
    store.get(crate::aggregate::KCHOOSER_KEY).iter().find_map(|r| match r {
        ReportRecord::GenomeSummary(g) => Some(g.clone()),
        _ => None,
    })
}

pub fn identified_snps(store: &ReportStore) -> IdentifiedSnps {
    let core = store
        .get(crate::parsers::CORE_SNP_SUMMARY_KEY)
        .iter()
        .find_map(|r| match r {
            ReportRecord::CoreSnpSummary(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| core_summary_from_counts(store));

    let total_snps = first_count(store, SNP_COUNT_FILE, "Number_SNPs");
    let non_majority_snps = match (total_snps, core.fraction_snps) {
        (Some(total), Some(majority)) => Some((total.max(0) as u64).saturating_sub(majority)),
        _ => None,
    };

    IdentifiedSnps {
        core_snps: core.core_snps,
        non_core_snps: core.non_core_snps,
        majority_fraction: core.fraction,
        majority_snps: core.fraction_snps,
        total_snps,
        non_majority_snps,
    }
}

/// Fallback when only the raw `COUNT_coreSNPs` counts were stored.
fn core_summary_from_counts(store: &ReportStore) -> CoreSnpSummary {
    let Some(ReportRecord::Counts(counts)) = store.first(CORE_SNP_COUNT_FILE) else {
        return CoreSnpSummary::default();
    };
    let as_u64 = |key: &str| counts.get(key).and_then(|v| u64::try_from(v).ok());

    let fraction_entry = counts
        .values
        .iter()
        .find(|(k, _)| k.starts_with("Number SNPs in at least a fraction "));

    CoreSnpSummary {
        core_snps: as_u64("Number core SNPs"),
        non_core_snps: as_u64("Number non-core SNPs"),
        fraction: fraction_entry.and_then(|(k, _)| {
            k.trim_start_matches("Number SNPs in at least a fraction ")
                .split_whitespace()
                .next()
                .and_then(|f| f.parse().ok())
        }),
        fraction_snps: fraction_entry.and_then(|(_, v)| u64::try_from(*v).ok()),
    }
}

pub fn homoplastic_snps(store: &ReportStore) -> HomoplasticTables {
    let mut tables = HomoplasticTables::default();

    for (source, records) in store.iter() {
        let table = if source.starts_with(HOMOPLASTIC_ALL_PREFIX) {
            &mut tables.all_snps
        } else if source.starts_with(HOMOPLASTIC_CORE_PREFIX) {
            &mut tables.core_snps
        } else {
            continue;
        };

        let method = source.rsplit('.').next().unwrap_or(source).to_string();
        let homoplastic_snps = records.first().and_then(|r| match r {
            ReportRecord::Counts(c) => c.get(HOMOPLASTIC_KEY),
            _ => None,
        });
        table.push(HomoplasticRow {
            method,
            homoplastic_snps,
        });
    }

    tables
}

fn first_count(store: &ReportStore, source: &str, key: &str) -> Option<i64> {
    match store.first(source) {
        Some(ReportRecord::Counts(c)) => c.get(key),
        _ => None,
    }
}
