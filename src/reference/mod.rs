//! Static reference tables keyed by disease name.
//!
//! Five CSV tables back the advisory bundle: description, precautions,
//! medications, diets, and workouts. Each file has a disease column (header
//! `Disease` or `disease`) plus one or more value columns. Pandas index
//! columns (`Unnamed: 0`, empty headers) are skipped.
//!
//! A missing file loads as an empty table so one absent dataset never takes
//! down the rest of the service. A file that exists but cannot be parsed is a
//! load error.

pub mod literal;

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config::MedwiseConfig;

pub use literal::expand_list_literal;

/// One CSV row: the disease key plus the value columns in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub disease: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReferenceTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<ReferenceRow>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), Vec::new())
    }

    /// Parse a table from CSV. Disease values are trimmed but otherwise
    /// kept verbatim since lookups are exact and case-sensitive.
    pub fn from_csv_reader<R: std::io::Read>(name: &str, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().context("missing CSV header row")?.clone();
        let Some(disease_col) = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("disease"))
        else {
            bail!("table '{name}' has no disease column");
        };

        let value_cols: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != disease_col && !is_index_column(h))
            .map(|(i, _)| i)
            .collect();
        let columns = value_cols
            .iter()
            .map(|&i| headers[i].trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("bad row {} in '{name}'", line + 2))?;
            let disease = record.get(disease_col).unwrap_or("").trim().to_string();
            if disease.is_empty() {
                continue;
            }
            let values = value_cols
                .iter()
                .map(|&i| record.get(i).unwrap_or("").trim().to_string())
                .collect();
            rows.push(ReferenceRow { disease, values });
        }

        Ok(Self::new(name, columns, rows))
    }

    /// Load from disk. A missing file yields an empty table and a warning.
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(table = name, path = %path.display(), "reference table not found, using empty table");
            return Ok(Self::empty(name));
        }
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let table = Self::from_csv_reader(name, file)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::info!(table = name, rows = table.len(), "reference table loaded");
        Ok(table)
    }

    /// Rows whose disease equals `disease` exactly, in file order.
    pub fn rows_for<'a>(&'a self, disease: &'a str) -> impl Iterator<Item = &'a ReferenceRow> {
        self.rows.iter().filter(move |row| row.disease == disease)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn is_index_column(header: &str) -> bool {
    let header = header.trim();
    header.is_empty() || header.starts_with("Unnamed")
}

/// The five tables an advisory bundle is assembled from.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub description: ReferenceTable,
    pub precautions: ReferenceTable,
    pub medications: ReferenceTable,
    pub diets: ReferenceTable,
    pub workouts: ReferenceTable,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self {
            description: ReferenceTable::empty("description"),
            precautions: ReferenceTable::empty("precautions"),
            medications: ReferenceTable::empty("medications"),
            diets: ReferenceTable::empty("diets"),
            workouts: ReferenceTable::empty("workouts"),
        }
    }
}

impl ReferenceTables {
    pub fn load(config: &MedwiseConfig) -> Result<Self> {
        let data = &config.data;
        Ok(Self {
            description: ReferenceTable::load("description", &config.data_file(&data.description))?,
            precautions: ReferenceTable::load("precautions", &config.data_file(&data.precautions))?,
            medications: ReferenceTable::load("medications", &config.data_file(&data.medications))?,
            diets: ReferenceTable::load("diets", &config.data_file(&data.diets))?,
            workouts: ReferenceTable::load("workouts", &config.data_file(&data.workout))?,
        })
    }

    /// `(table name, row count)` for each table, in bundle order.
    pub fn summary(&self) -> Vec<(&str, usize)> {
        [
            &self.description,
            &self.precautions,
            &self.medications,
            &self.diets,
            &self.workouts,
        ]
        .into_iter()
        .map(|t| (t.name(), t.len()))
        .collect()
    }
}
