//! Symptom-to-disease advisor and medicine finder.
//!
//! Given a comma-separated list of symptoms, medwise predicts the most likely
//! disease with a pretrained classifier and assembles an advisory bundle for
//! it (description, precautions, medications, diets, workouts) from curated
//! reference tables. Around that core it keeps patient and pharmacy accounts,
//! pharmacy stock lists, semantic medicine search, a pharmacy locator, and
//! SMS medicine reminders.
//!
//! # Inference pipeline
//!
//! | Step | Module | Output |
//! |------|--------|--------|
//! | Normalize | [`inference::normalize`] | lowercase, underscore-joined tokens |
//! | Encode | [`inference::encoder`] | binary feature vector over the symptom vocabulary |
//! | Classify | [`classifier`] | integer class code |
//! | Resolve | [`inference::vocabulary`] | disease name, or "Unknown Disease" |
//! | Assemble | [`inference::bundle`] | advisory bundle from [`reference`] tables |
//!
//! Reference data and the classifier are loaded once at startup into an
//! immutable [`inference::ReferenceContext`]; a missing model degrades every
//! prediction to "Model not loaded" instead of failing.
//!
//! # Modules
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`db`]: SQLite storage for accounts and inventory
//! - [`api`]: axum HTTP surface
//! - [`medicines`] and [`embedding`]: semantic medicine search
//! - [`locator`]: geocoding, nearby pharmacies, distances, map links
//! - [`reminder`]: SMS reminders over Twilio

pub mod accounts;
pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod db;
pub mod embedding;
pub mod inference;
pub mod inventory;
pub mod locator;
pub mod medicines;
pub mod reference;
pub mod reminder;
pub mod server;
