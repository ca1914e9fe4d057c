//! CLI `predict` command.

use anyhow::{Context, Result};

use crate::config::MedwiseConfig;
use crate::inference::{self, Diagnosis, ReferenceContext};

pub fn predict(config: &MedwiseConfig, symptoms: &str, json: bool) -> Result<()> {
    let ctx = ReferenceContext::load(config).context("failed to load reference data")?;
    let diagnosis = inference::diagnose(&ctx, symptoms)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
        return Ok(());
    }

    println!("Predicted disease: {}", diagnosis.headline());
    match &diagnosis {
        Diagnosis::Predicted {
            advisory,
            ignored_symptoms,
            ..
        } => {
            println!();
            println!("Description: {}", or_none(&advisory.description));
            print_list("Precautions", &advisory.precautions);
            print_list("Medications", &advisory.medications);
            print_list("Diets", &advisory.diets);
            print_list("Workouts", &advisory.workouts);
            print_ignored(ignored_symptoms);
        }
        Diagnosis::UnknownDisease {
            code,
            ignored_symptoms,
        } => {
            println!("Class code {code} has no disease label.");
            print_ignored(ignored_symptoms);
        }
        Diagnosis::Unavailable {
            reason,
            ignored_symptoms,
        } => {
            println!("Reason: {reason}");
            print_ignored(ignored_symptoms);
        }
    }
    Ok(())
}

fn or_none(text: &str) -> &str {
    if text.is_empty() {
        "(none)"
    } else {
        text
    }
}

fn print_list(title: &str, items: &[String]) {
    println!();
    println!("{title}:");
    if items.is_empty() {
        println!("  (none)");
    }
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {item}", i + 1);
    }
}

fn print_ignored(ignored: &[String]) {
    if !ignored.is_empty() {
        println!();
        println!("Not recognised: {}", ignored.join(", "));
    }
}
