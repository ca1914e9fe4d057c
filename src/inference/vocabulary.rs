//! Symptom vocabulary and disease label mappings.
//!
//! Both are built once at startup from CSV files and never change afterwards.
//! Construction validates the keys so that a malformed data file is caught at
//! load time rather than producing a silently wrong feature layout.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use super::normalize::normalize_token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("symptom '{0}' appears more than once")]
    DuplicateSymptom(String),

    #[error("index {index} is assigned to both '{first}' and '{second}'")]
    DuplicateIndex {
        index: usize,
        first: String,
        second: String,
    },

    #[error("indices must cover 0..{len} without gaps, but {missing} is unassigned")]
    MissingIndex { len: usize, missing: usize },

    #[error("disease code {0} appears more than once")]
    DuplicateCode(i64),
}

/// Symptom name → feature index, dense over `[0, len)`.
#[derive(Debug, Clone, Default)]
pub struct SymptomVocabulary {
    index: HashMap<String, usize>,
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularyRecord {
    symptom: String,
    index: usize,
}

impl SymptomVocabulary {
    pub fn new(
        entries: impl IntoIterator<Item = (String, usize)>,
    ) -> Result<Self, VocabularyError> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut by_position: HashMap<usize, String> = HashMap::new();

        for (name, idx) in entries {
            if index.contains_key(&name) {
                return Err(VocabularyError::DuplicateSymptom(name));
            }
            if let Some(first) = by_position.get(&idx) {
                return Err(VocabularyError::DuplicateIndex {
                    index: idx,
                    first: first.clone(),
                    second: name,
                });
            }
            by_position.insert(idx, name.clone());
            index.insert(name, idx);
        }

        let len = index.len();
        let mut names = Vec::with_capacity(len);
        for position in 0..len {
            match by_position.remove(&position) {
                Some(name) => names.push(name),
                None => {
                    return Err(VocabularyError::MissingIndex {
                        len,
                        missing: position,
                    })
                }
            }
        }

        Ok(Self { index, names })
    }

    /// Build from an ordered list of names; the position becomes the index.
    pub fn from_names<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, VocabularyError> {
        Self::new(
            names
                .into_iter()
                .enumerate()
                .map(|(i, name)| (name.into(), i)),
        )
    }

    /// Parse `symptom,index` rows. Symptom names are canonicalized the same
    /// way user input is, so `Skin Rash` in the file matches `skin rash` typed
    /// by a user.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries = Vec::new();
        for record in rdr.deserialize::<VocabularyRecord>() {
            let record = record.context("invalid symptom vocabulary row")?;
            entries.push((normalize_token(&record.symptom), record.index));
        }
        Ok(Self::new(entries)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("failed to load symptom vocabulary from {}", path.display()))
    }

    pub fn index_of(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Classifier output code → canonical disease name.
#[derive(Debug, Clone, Default)]
pub struct DiseaseLabels {
    names: HashMap<i64, String>,
}

#[derive(Debug, Deserialize)]
struct LabelRecord {
    code: i64,
    disease: String,
}

impl DiseaseLabels {
    pub fn new(entries: impl IntoIterator<Item = (i64, String)>) -> Result<Self, VocabularyError> {
        let mut names = HashMap::new();
        for (code, disease) in entries {
            if names.insert(code, disease).is_some() {
                return Err(VocabularyError::DuplicateCode(code));
            }
        }
        Ok(Self { names })
    }

    /// Parse `code,disease` rows. Disease names are kept verbatim because the
    /// reference tables are keyed by the exact string.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries = Vec::new();
        for record in rdr.deserialize::<LabelRecord>() {
            let record = record.context("invalid disease label row")?;
            entries.push((record.code, record.disease));
        }
        Ok(Self::new(entries)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("failed to load disease labels from {}", path.display()))
    }

    pub fn name(&self, code: i64) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
