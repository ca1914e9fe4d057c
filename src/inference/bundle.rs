//! Advisory bundle assembly from the reference tables.

use serde::Serialize;

use crate::reference::{expand_list_literal, ReferenceTable, ReferenceTables};

/// Maximum number of precautions reported per disease.
pub const MAX_PRECAUTIONS: usize = 4;

/// Everything the reference data says about one disease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdvisoryBundle {
    pub description: String,
    pub precautions: Vec<String>,
    pub medications: Vec<String>,
    pub diets: Vec<String>,
    pub workouts: Vec<String>,
}

impl AdvisoryBundle {
    /// `true` when no table had anything for the disease.
    pub fn is_empty(&self) -> bool {
        self.description.is_empty()
            && self.precautions.is_empty()
            && self.medications.is_empty()
            && self.diets.is_empty()
            && self.workouts.is_empty()
    }
}

/// Look the disease up in every table independently. A table without a row
/// for it contributes an empty field and nothing else.
pub fn build_bundle(disease: &str, tables: &ReferenceTables) -> AdvisoryBundle {
    AdvisoryBundle {
        description: description(disease, &tables.description),
        precautions: precautions(disease, &tables.precautions),
        medications: list_values(disease, &tables.medications),
        diets: list_values(disease, &tables.diets),
        workouts: list_values(disease, &tables.workouts),
    }
}

fn description(disease: &str, table: &ReferenceTable) -> String {
    table
        .rows_for(disease)
        .flat_map(|row| row.values.iter())
        .filter(|v| !v.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

fn precautions(disease: &str, table: &ReferenceTable) -> Vec<String> {
    table
        .rows_for(disease)
        .flat_map(|row| row.values.iter())
        .filter(|v| !v.is_empty())
        .take(MAX_PRECAUTIONS)
        .cloned()
        .collect()
}

fn list_values(disease: &str, table: &ReferenceTable) -> Vec<String> {
    table
        .rows_for(disease)
        .flat_map(|row| row.values.iter())
        .flat_map(|cell| expand_list_literal(cell))
        .collect()
}
