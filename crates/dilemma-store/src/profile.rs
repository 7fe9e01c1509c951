//! Headerless two-column CSV files kept per nation in a data directory.
//!
//! - `<nation>_category_scale.csv`: `census,bias`
//! - `<nation>_policy_exclusions.csv`: `policy,change` (optional)

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, Float64Array, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use dilemma_core::{BiasProfile, PolicyRule, PolicyRules};
use tracing::{info, warn};

use crate::StoreError;

const CENSUS_LABEL: &str = "census";
const BATCH_SIZE: usize = 1024;

pub fn profile_file_name(nation: &str) -> String {
    format!("{nation}_category_scale.csv")
}

pub fn policy_file_name(nation: &str) -> String {
    format!("{nation}_policy_exclusions.csv")
}

/// Reads profile files from one directory.
pub struct ProfileStore {
    data_dir: PathBuf,
}

impl ProfileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Whether a bias profile exists for the nation. Invalid names have none.
    pub fn has_profile(&self, nation: &str) -> bool {
        validate_nation(nation).is_ok() && self.profile_path(nation).is_file()
    }

    /// Load the category biases. Rows with an empty bias are skipped.
    pub fn load_profile(&self, nation: &str) -> Result<BiasProfile, StoreError> {
        validate_nation(nation)?;
        let path = self.profile_path(nation);
        if !path.is_file() {
            return Err(StoreError::ProfileNotFound(path));
        }

        let batches = read_csv(&path, profile_schema())?;
        let mut profile = BiasProfile::new(CENSUS_LABEL);
        for batch in &batches {
            let census = string_column(batch, 0)?;
            let bias = float_column(batch, 1)?;
            for row in 0..batch.num_rows() {
                if census.is_null(row) {
                    warn!(path = %path.display(), row, "skipping row without a category");
                    continue;
                }
                let category = census.value(row);
                if bias.is_null(row) || bias.value(row).is_nan() {
                    warn!(path = %path.display(), category, "skipping category without a bias");
                    continue;
                }
                profile.insert(category, bias.value(row));
            }
        }

        info!(nation, categories = profile.len(), "loaded bias profile");
        Ok(profile)
    }

    /// Load the excluded policy reforms. A missing file means no rules.
    pub fn load_policy_rules(&self, nation: &str) -> Result<PolicyRules, StoreError> {
        validate_nation(nation)?;
        let path = self.data_dir.join(policy_file_name(nation));
        if !path.is_file() {
            return Ok(PolicyRules::default());
        }

        let batches = read_csv(&path, policy_schema())?;
        let mut rules = Vec::new();
        for batch in &batches {
            let policy = string_column(batch, 0)?;
            let change = string_column(batch, 1)?;
            for row in 0..batch.num_rows() {
                if policy.is_null(row) || change.is_null(row) {
                    continue;
                }
                rules.push(PolicyRule::new(change.value(row), policy.value(row)));
            }
        }

        let rules: PolicyRules = rules.into_iter().collect();
        info!(nation, rules = rules.len(), "loaded policy rules");
        Ok(rules)
    }

    fn profile_path(&self, nation: &str) -> PathBuf {
        self.data_dir.join(profile_file_name(nation))
    }
}

fn validate_nation(nation: &str) -> Result<(), StoreError> {
    if nation.is_empty() || !nation.chars().all(char::is_alphanumeric) {
        return Err(StoreError::InvalidNation(nation.to_string()));
    }
    Ok(())
}

fn profile_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("census", DataType::Utf8, true),
        Field::new("bias", DataType::Float64, true),
    ]))
}

fn policy_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("policy", DataType::Utf8, true),
        Field::new("change", DataType::Utf8, true),
    ]))
}

fn read_csv(path: &Path, schema: SchemaRef) -> Result<Vec<RecordBatch>, StoreError> {
    let file = File::open(path)?;
    let reader = ReaderBuilder::new(schema)
        .with_header(false)
        .with_batch_size(BATCH_SIZE)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(batches)
}

fn string_column(batch: &RecordBatch, index: usize) -> Result<&StringArray, StoreError> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| StoreError::Other(format!("column {index} is not a string column")))
}

fn float_column(batch: &RecordBatch, index: usize) -> Result<&Float64Array, StoreError> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| StoreError::Other(format!("column {index} is not a float column")))
}
